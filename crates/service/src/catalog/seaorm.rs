use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use super::domain::Product;
use super::errors::CatalogError;
use super::repository::ProductRepository;
use crate::pagination::{Pagination, SortOrder};

/// Postgres-backed product store.
pub struct SeaOrmProductRepository {
    pub db: DatabaseConnection,
}

fn to_product(m: models::product::Model) -> Product {
    Product { id: m.id, name: m.name, price: m.price, created_at: m.created_at.into() }
}

#[async_trait::async_trait]
impl ProductRepository for SeaOrmProductRepository {
    async fn list_products(&self, page: Pagination, order: SortOrder) -> Result<Vec<Product>, CatalogError> {
        let (idx, per_page) = page.normalize();
        let rows = models::product::list_page(&self.db, idx, per_page, order.is_descending()).await?;
        Ok(rows.into_iter().map(to_product).collect())
    }

    async fn count_products(&self) -> Result<u64, CatalogError> {
        Ok(models::product::count(&self.db).await?)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, CatalogError> {
        let row = models::product::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| CatalogError::Repository(e.to_string()))?;
        Ok(row.map(to_product))
    }

    async fn create_product(&self, product: &Product) -> Result<(), CatalogError> {
        models::product::create(&self.db, product.id, &product.name, product.price, product.created_at).await?;
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<(), CatalogError> {
        models::product::update_fields(&self.db, product.id, &product.name, product.price)
            .await?
            .ok_or(CatalogError::NotFound)?;
        Ok(())
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, CatalogError> {
        Ok(models::product::delete(&self.db, id).await?)
    }
}
