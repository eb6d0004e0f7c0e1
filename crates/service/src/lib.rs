//! Service layer for authentication, role-based authorization and the
//! product catalog.
//! - Framework independent: no axum types cross this boundary.
//! - Persistence is consumed through repository traits (`auth::repository`,
//!   `catalog::repository`).
//! - Errors are `auth::errors::AuthError` and `catalog::CatalogError`; the
//!   HTTP layer maps them.

pub mod auth;
pub mod catalog;
pub mod pagination;
