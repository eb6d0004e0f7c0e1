use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use service::auth::{
    domain::{Profile, UpdateProfileInput},
    Claims,
};

use crate::errors::ApiError;
use crate::state::ServerState;

#[utoipa::path(get, path = "/user/profile", tag = "user", responses((status = 200, description = "Own profile", body = crate::openapi::ProfileDoc), (status = 401, description = "Unauthorized"), (status = 404, description = "Not Found")))]
pub async fn show_profile(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(state.auth.show_profile(&claims.sub).await?))
}

/// The caller is always the token subject; a body cannot target anyone else.
#[utoipa::path(put, path = "/user/profile", tag = "user", request_body = crate::openapi::UpdateProfileRequest, responses((status = 200, description = "Updated", body = crate::openapi::ProfileDoc), (status = 400, description = "Bad Request"), (status = 401, description = "Unauthorized"), (status = 409, description = "Email already used")))]
pub async fn update_profile(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    Json(input): Json<UpdateProfileInput>,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(state.profiles.update_own_profile(&claims.sub, input).await?))
}

#[utoipa::path(get, path = "/user/{id}", tag = "user", params(("id" = Uuid, Path, description = "User id")), responses((status = 200, description = "User", body = crate::openapi::ProfileDoc), (status = 404, description = "Not Found")))]
pub async fn get_user(State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<Json<Profile>, ApiError> {
    Ok(Json(state.auth.get_user(id).await?))
}
