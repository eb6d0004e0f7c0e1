use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use common::types::MessageBody;
use service::catalog::{CreateProductInput, Product, UpdateProductInput};
use service::pagination::{Pagination, SortOrder};

use crate::errors::ApiError;
use crate::state::ServerState;

/// Raw query values; unparsable ones fall back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
}

#[utoipa::path(get, path = "/product", tag = "product", params(("page" = Option<u32>, Query, description = "1-based page"), ("limit" = Option<u32>, Query, description = "Items per page, at most 100"), ("sort" = Option<String>, Query, description = "asc or desc by creation time")), responses((status = 200, description = "Products", body = [crate::openapi::ProductDoc])))]
pub async fn list_products(
    State(state): State<ServerState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let page = Pagination::from_query(q.page.as_deref(), q.limit.as_deref());
    let order = SortOrder::from_query(q.sort.as_deref());
    Ok(Json(state.products.list(page, order).await?))
}

#[utoipa::path(get, path = "/product/{id}", tag = "product", params(("id" = Uuid, Path, description = "Product id")), responses((status = 200, description = "Product", body = crate::openapi::ProductDoc), (status = 404, description = "Not Found")))]
pub async fn get_product(State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.products.get(id).await?))
}

#[utoipa::path(post, path = "/admin/product", tag = "product", request_body = crate::openapi::CreateProductRequest, responses((status = 201, description = "Created", body = crate::openapi::ProductDoc), (status = 400, description = "Bad Request"), (status = 403, description = "Forbidden")))]
pub async fn create_product(
    State(state): State<ServerState>,
    Json(input): Json<CreateProductInput>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = state.products.create(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(put, path = "/admin/product/{id}", tag = "product", params(("id" = Uuid, Path, description = "Product id")), request_body = crate::openapi::UpdateProductRequest, responses((status = 200, description = "Updated", body = crate::openapi::ProductDoc), (status = 400, description = "Bad Request"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found")))]
pub async fn update_product(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.products.update(id, input).await?))
}

#[utoipa::path(delete, path = "/admin/product/{id}", tag = "product", params(("id" = Uuid, Path, description = "Product id")), responses((status = 200, description = "Deleted"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found")))]
pub async fn delete_product(State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<Json<MessageBody>, ApiError> {
    state.products.delete(id).await?;
    Ok(Json(MessageBody::new("product deleted successfully")))
}
