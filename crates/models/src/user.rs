use sea_orm::{entity::prelude::*, Set, ConnectionTrait, QueryFilter};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::role::Entity",
        from = "Column::RoleId",
        to = "crate::role::Column::Id"
    )]
    Role,
}

impl Related<crate::role::Entity> for Entity {
    fn to() -> RelationDef { Relation::Role.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Loose structural check: one `@`, non-empty local part, dotted domain,
/// no whitespace.
pub fn validate_email(email: &str) -> Result<(), errors::ModelError> {
    let invalid = || errors::ModelError::Validation("invalid email".into());
    if email.chars().any(char::is_whitespace) { return Err(invalid()); }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') { return Err(invalid()); }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) { return Err(invalid()); }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), errors::ModelError> {
    if name.trim().is_empty() { return Err(errors::ModelError::Validation("name required".into())); }
    if name.chars().count() > 128 { return Err(errors::ModelError::Validation("name too long (<=128)".into())); }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    name: &str,
    email: &str,
    password_hash: &str,
    role_id: Uuid,
) -> Result<Model, errors::ModelError> {
    validate_email(email)?;
    validate_name(name)?;
    if password_hash.trim().is_empty() { return Err(errors::ModelError::Validation("password hash required".into())); }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash.to_string()),
        role_id: Set(role_id),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<Model>, errors::ModelError> {
    Entity::find()
        .filter(Column::Email.eq(email.to_string()))
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Overwrite name, email, hash and role in one UPDATE statement.
pub async fn update_account<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    name: &str,
    email: &str,
    password_hash: &str,
    role_id: Uuid,
) -> Result<Model, errors::ModelError> {
    let am = ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash.to_string()),
        role_id: Set(role_id),
        updated_at: Set(Utc::now().into()),
        ..Default::default()
    };
    am.update(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
