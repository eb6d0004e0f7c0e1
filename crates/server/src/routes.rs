use axum::{
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

use crate::middleware::{enforce_roles, require_bearer_token};
use crate::openapi;
use crate::state::ServerState;

pub mod auth;
pub mod product;
pub mod user;

/// Roles allowed to change the catalog.
pub const MANAGEMENT_ROLES: [&str; 2] = ["manager", "admin"];

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: public, bearer-protected and
/// role-gated routes.
pub fn build_router(state: ServerState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/logout", post(auth::logout))
        .route("/product", get(product::list_products))
        .route("/product/:id", get(product::get_product))
        .route("/api-docs/openapi.json", get(openapi::openapi_json));

    let user = Router::new()
        .route("/user/profile", get(user::show_profile).put(user::update_profile))
        .route("/user/:id", get(user::get_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer_token));

    let management = Router::new()
        .route("/admin/product", post(product::create_product))
        .route("/admin/product/:id", put(product::update_product).delete(product::delete_product))
        .route_layer(middleware::from_fn_with_state(state.gate(MANAGEMENT_ROLES), enforce_roles));

    public
        .merge(user)
        .merge(management)
        .with_state(state)
        .layer(CorsLayer::very_permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
