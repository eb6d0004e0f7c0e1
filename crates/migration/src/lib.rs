//! Migrator registering entity migrations in dependency order:
//! `role` first, then `user` which references it, then the standalone
//! `product` catalog.
pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_role;
mod m20240101_000002_create_user;
mod m20240101_000003_create_product;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_role::Migration),
            Box::new(m20240101_000002_create_user::Migration),
            Box::new(m20240101_000003_create_product::Migration),
        ]
    }
}
