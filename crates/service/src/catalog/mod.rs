//! Product catalog: public reads, writes reserved for gated roles.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod seaorm;
pub mod service;

pub use domain::{CreateProductInput, Product, UpdateProductInput};
pub use errors::CatalogError;
pub use repository::ProductRepository;
pub use service::ProductService;
