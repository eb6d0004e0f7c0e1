use axum::Json;
use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct RegisterRequest { pub name: String, pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct LoginResponse { pub access_token: String }

#[derive(ToSchema)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: String,
    /// Current secret, required.
    pub password: String,
    /// Replaces the current secret when non-empty.
    pub new_password: Option<String>,
}

#[derive(ToSchema)]
pub struct ProfileDoc { pub id: Uuid, pub name: String, pub email: String, pub role_id: Uuid }

#[derive(ToSchema)]
pub struct ProductDoc { pub id: Uuid, pub name: String, pub price: f64, pub created_at: String }

#[derive(ToSchema)]
pub struct CreateProductRequest { pub name: String, pub price: f64 }

/// Empty name or zero price leaves the stored value unchanged.
#[derive(ToSchema)]
pub struct UpdateProductRequest { pub name: Option<String>, pub price: Option<f64> }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::user::show_profile,
        crate::routes::user::update_profile,
        crate::routes::user::get_user,
        crate::routes::product::list_products,
        crate::routes::product::get_product,
        crate::routes::product::create_product,
        crate::routes::product::update_product,
        crate::routes::product::delete_product,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateProfileRequest,
            ProfileDoc,
            ProductDoc,
            CreateProductRequest,
            UpdateProductRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "user"),
        (name = "product")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
