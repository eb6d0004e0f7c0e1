use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ErrorBody;
use service::auth::errors::AuthError;
use service::catalog::CatalogError;
use thiserror::Error;
use tracing::error;

/// HTTP face of the service errors. Internal failures are logged and
/// replaced by a generic body.
#[derive(Debug)]
pub enum ApiError {
    Auth(AuthError),
    Catalog(CatalogError),
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::Auth(e)
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        ApiError::Catalog(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(AuthError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Auth(AuthError::Unauthorized) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::Token(e)) if !e.is_operational() => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::UnresolvedRole(_)) => StatusCode::FORBIDDEN,
            ApiError::Auth(AuthError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Auth(AuthError::Conflict | AuthError::EmailAlreadyUsed) => StatusCode::CONFLICT,
            ApiError::Catalog(CatalogError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Catalog(CatalogError::NotFound) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn auth_body(err: &AuthError) -> serde_json::Value {
    match err {
        AuthError::Validation(errs) => serde_json::json!({ "errors": errs }),
        AuthError::Unauthorized => serde_json::json!(ErrorBody::new("Unauthorized")),
        AuthError::Token(e) if !e.is_operational() => serde_json::json!(ErrorBody::new("invalid token")),
        AuthError::UnresolvedRole(_) => serde_json::json!(ErrorBody::new("forbidden")),
        AuthError::NotFound => serde_json::json!(ErrorBody::new("user not found")),
        AuthError::Conflict => serde_json::json!(ErrorBody::new("user already exists")),
        AuthError::EmailAlreadyUsed => serde_json::json!(ErrorBody::new("this email is already used")),
        AuthError::Token(e) => {
            error!(code = err.code(), error = %e, "token generation failed");
            serde_json::json!(ErrorBody::new("could not generate token"))
        }
        other => {
            error!(code = other.code(), error = %other, "internal error");
            serde_json::json!(ErrorBody::new("internal server error"))
        }
    }
}

fn catalog_body(err: &CatalogError) -> serde_json::Value {
    match err {
        CatalogError::Validation(errs) => serde_json::json!({ "errors": errs }),
        CatalogError::NotFound => serde_json::json!(ErrorBody::new("product not found")),
        CatalogError::Repository(_) => {
            error!(code = err.code(), error = %err, "catalog store failure");
            serde_json::json!(ErrorBody::new("internal server error"))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Auth(e) => auth_body(e),
            ApiError::Catalog(e) => catalog_body(e),
        };
        (status, Json(body)).into_response()
    }
}

/// Short-circuit response with a plain `{"error": ..}` body.
pub fn json_error(status: StatusCode, msg: &str) -> Response {
    (status, Json(ErrorBody::new(msg))).into_response()
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("auth setup failed: {0}")]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
