use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::domain::{CreateProductInput, Product, UpdateProductInput};
use super::errors::CatalogError;
use super::repository::ProductRepository;
use crate::auth::errors::ValidationErrors;
use crate::pagination::{Pagination, SortOrder};

const SEED_NAMES: [&str; 20] = [
    "Smartphone", "Laptop", "Tablet", "Smartwatch", "Headphones",
    "Camera", "Gaming Console", "TV", "Refrigerator", "Washing Machine",
    "Microwave", "Coffee Maker", "Blender", "Vacuum Cleaner", "Air Conditioner",
    "Fan", "Toaster", "Iron", "Hair Dryer", "Electric Shaver",
];

const SEED_CATEGORIES: [&str; 10] = [
    "Electronics", "Home Appliances", "Computing", "Gaming", "Audio",
    "Kitchen", "Cleaning", "Personal Care", "Office", "Sports",
];

fn check_price(errs: &mut ValidationErrors, price: f64) {
    if let Err(models::errors::ModelError::Validation(msg)) = models::product::validate_price(price) {
        errs.add("price", msg);
    }
}

/// Catalog business service. Reads are public; the HTTP layer gates writes.
pub struct ProductService {
    repo: Arc<dyn ProductRepository>,
}

impl ProductService {
    pub fn new(repo: Arc<dyn ProductRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, page: Pagination, order: SortOrder) -> Result<Vec<Product>, CatalogError> {
        self.repo.list_products(page, order).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Product, CatalogError> {
        self.repo.find_product(id).await?.ok_or(CatalogError::NotFound)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: CreateProductInput) -> Result<Product, CatalogError> {
        let mut errs = ValidationErrors::new();
        if models::product::validate_name(&input.name).is_err() {
            errs.add("name", "Field 'name' is required and must be valid");
        }
        check_price(&mut errs, input.price);
        if !errs.is_empty() {
            return Err(CatalogError::Validation(errs));
        }

        let product = Product { id: Uuid::new_v4(), name: input.name, price: input.price, created_at: Utc::now() };
        self.repo.create_product(&product).await?;
        info!(product_id = %product.id, "product_created");
        Ok(product)
    }

    /// Apply the given fields. An empty name or a zero price counts as
    /// absent; a negative price is rejected.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: UpdateProductInput) -> Result<Product, CatalogError> {
        let mut product = self.get(id).await?;
        let mut errs = ValidationErrors::new();
        match input.name {
            Some(name) if !name.is_empty() => {
                if models::product::validate_name(&name).is_err() {
                    errs.add("name", "Field 'name' must be valid");
                }
                product.name = name;
            }
            _ => {}
        }
        match input.price {
            Some(price) if price != 0.0 => {
                check_price(&mut errs, price);
                product.price = price;
            }
            _ => {}
        }
        if !errs.is_empty() {
            return Err(CatalogError::Validation(errs));
        }

        self.repo.update_product(&product).await?;
        info!(product_id = %product.id, "product_updated");
        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), CatalogError> {
        if !self.repo.delete_product(id).await? {
            return Err(CatalogError::NotFound);
        }
        info!(product_id = %id, "product_deleted");
        Ok(())
    }

    /// Fill an empty catalog with `count` random products. A catalog that
    /// already has rows is left alone. Returns how many were stored.
    #[instrument(skip(self))]
    pub async fn seed_catalog(&self, count: usize) -> Result<usize, CatalogError> {
        if self.repo.count_products().await? > 0 {
            info!("catalog already populated; skipping seed");
            return Ok(0);
        }
        let batch: Vec<Product> = {
            let mut rng = rand::thread_rng();
            (0..count)
                .map(|_| {
                    let name = format!(
                        "{} {}",
                        SEED_NAMES[rng.gen_range(0..SEED_NAMES.len())],
                        SEED_CATEGORIES[rng.gen_range(0..SEED_CATEGORIES.len())]
                    );
                    let cents: u64 = rng.gen_range(10_000..1_000_000);
                    Product { id: Uuid::new_v4(), name, price: cents as f64 / 100.0, created_at: Utc::now() }
                })
                .collect()
        };

        let mut stored = 0;
        for product in &batch {
            match self.repo.create_product(product).await {
                Ok(()) => stored += 1,
                Err(e) => warn!(name = %product.name, error = %e, "seed product rejected"),
            }
        }
        info!(stored, "catalog_seeded");
        Ok(stored)
    }
}
