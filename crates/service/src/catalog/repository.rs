use async_trait::async_trait;
use uuid::Uuid;

use super::domain::Product;
use super::errors::CatalogError;
use crate::pagination::{Pagination, SortOrder};

/// Product persistence consumed by [`super::ProductService`].
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// One page ordered by `created_at`, id breaking ties.
    async fn list_products(&self, page: Pagination, order: SortOrder) -> Result<Vec<Product>, CatalogError>;
    async fn count_products(&self) -> Result<u64, CatalogError>;
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, CatalogError>;
    async fn create_product(&self, product: &Product) -> Result<(), CatalogError>;
    /// Overwrite name and price of the stored record; `NotFound` if absent.
    async fn update_product(&self, product: &Product) -> Result<(), CatalogError>;
    /// Returns whether a record was removed.
    async fn delete_product(&self, id: Uuid) -> Result<bool, CatalogError>;
}

pub mod mock {
    use super::*;
    use std::sync::{Mutex, MutexGuard};

    #[derive(Default)]
    pub struct InMemoryProductStore {
        products: Mutex<Vec<Product>>,
    }

    fn lock(m: &Mutex<Vec<Product>>) -> Result<MutexGuard<'_, Vec<Product>>, CatalogError> {
        m.lock().map_err(|_| CatalogError::Repository("store lock poisoned".into()))
    }

    impl InMemoryProductStore {
        pub fn len(&self) -> usize {
            self.products.lock().map(|p| p.len()).unwrap_or(0)
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    #[async_trait]
    impl ProductRepository for InMemoryProductStore {
        async fn list_products(&self, page: Pagination, order: SortOrder) -> Result<Vec<Product>, CatalogError> {
            let mut all = lock(&self.products)?.clone();
            all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            if order.is_descending() {
                all.reverse();
            }
            let (idx, per_page) = page.normalize();
            Ok(all.into_iter().skip((idx * per_page) as usize).take(per_page as usize).collect())
        }

        async fn count_products(&self) -> Result<u64, CatalogError> {
            Ok(lock(&self.products)?.len() as u64)
        }

        async fn find_product(&self, id: Uuid) -> Result<Option<Product>, CatalogError> {
            Ok(lock(&self.products)?.iter().find(|p| p.id == id).cloned())
        }

        async fn create_product(&self, product: &Product) -> Result<(), CatalogError> {
            lock(&self.products)?.push(product.clone());
            Ok(())
        }

        async fn update_product(&self, product: &Product) -> Result<(), CatalogError> {
            let mut products = lock(&self.products)?;
            let slot = products.iter_mut().find(|p| p.id == product.id).ok_or(CatalogError::NotFound)?;
            slot.name = product.name.clone();
            slot.price = product.price;
            Ok(())
        }

        async fn delete_product(&self, id: Uuid) -> Result<bool, CatalogError> {
            let mut products = lock(&self.products)?;
            let before = products.len();
            products.retain(|p| p.id != id);
            Ok(products.len() != before)
        }
    }
}
