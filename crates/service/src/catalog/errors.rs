use thiserror::Error;

use crate::auth::errors::ValidationErrors;
use models::errors::ModelError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("product not found")]
    NotFound,
    #[error("repository error: {0}")]
    Repository(String),
}

impl CatalogError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            CatalogError::Validation(_) => 2001,
            CatalogError::NotFound => 2003,
            CatalogError::Repository(_) => 2200,
        }
    }
}

impl From<ValidationErrors> for CatalogError {
    fn from(e: ValidationErrors) -> Self {
        CatalogError::Validation(e)
    }
}

impl From<ModelError> for CatalogError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => {
                let mut errs = ValidationErrors::new();
                errs.add("product", msg);
                CatalogError::Validation(errs)
            }
            ModelError::Db(msg) => CatalogError::Repository(msg),
        }
    }
}
