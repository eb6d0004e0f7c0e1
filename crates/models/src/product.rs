use sea_orm::{entity::prelude::*, ConnectionTrait, Order, PaginatorTrait, QueryOrder, Set};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_name(name: &str) -> Result<(), errors::ModelError> {
    if name.trim().is_empty() { return Err(errors::ModelError::Validation("name required".into())); }
    if name.chars().count() > 255 { return Err(errors::ModelError::Validation("name too long (<=255)".into())); }
    Ok(())
}

/// Zero counts as "not given"; negative or non-finite prices are invalid.
pub fn validate_price(price: f64) -> Result<(), errors::ModelError> {
    if price == 0.0 { return Err(errors::ModelError::Validation("price required".into())); }
    if !price.is_finite() || price < 0.0 { return Err(errors::ModelError::Validation("invalid price".into())); }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    name: &str,
    price: f64,
    created_at: DateTime<Utc>,
) -> Result<Model, errors::ModelError> {
    validate_name(name)?;
    validate_price(price)?;
    let am = ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        price: Set(price),
        created_at: Set(created_at.into()),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Overwrite name and price. `Ok(None)` when no row has `id`.
pub async fn update_fields<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    name: &str,
    price: f64,
) -> Result<Option<Model>, errors::ModelError> {
    let Some(row) = Entity::find_by_id(id).one(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))? else {
        return Ok(None);
    };
    let mut am: ActiveModel = row.into();
    am.name = Set(name.to_string());
    am.price = Set(price);
    am.update(db).await.map(Some).map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Returns whether a row was removed.
pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<bool, errors::ModelError> {
    let res = Entity::delete_by_id(id).exec(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(res.rows_affected > 0)
}

/// One page ordered by creation time, id as tiebreaker.
pub async fn list_page<C: ConnectionTrait>(
    db: &C,
    page_idx: u64,
    per_page: u64,
    descending: bool,
) -> Result<Vec<Model>, errors::ModelError> {
    let order = if descending { Order::Desc } else { Order::Asc };
    Entity::find()
        .order_by(Column::CreatedAt, order.clone())
        .order_by(Column::Id, order)
        .paginate(db, per_page)
        .fetch_page(page_idx)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn count<C: ConnectionTrait>(db: &C) -> Result<u64, errors::ModelError> {
    Entity::find().count(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
