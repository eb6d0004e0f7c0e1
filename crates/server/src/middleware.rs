use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use service::auth::{GateDecision, Rejection, RoleGate};

use crate::errors::json_error;
use crate::state::ServerState;

pub const AUTH_COOKIE: &str = "auth_token";

/// Token from `Authorization: Bearer <token>`, falling back to the
/// `auth_token` cookie. A non-Bearer Authorization header yields nothing.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(h) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return h
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned);
    }
    CookieJar::from_headers(headers)
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_owned())
        .filter(|t| !t.is_empty())
}

/// Authenticated routes: any valid token, claims handed to the handler.
pub async fn require_bearer_token(State(state): State<ServerState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_owned();
    let Some(token) = bearer_token(req.headers()) else {
        tracing::warn!(path = %path, "missing Authorization header and auth_token cookie");
        return json_error(StatusCode::UNAUTHORIZED, "Unauthorized");
    };
    match state.tokens.verify(&token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => {
            tracing::warn!(path = %path, err = %e, "token validation failed");
            json_error(StatusCode::UNAUTHORIZED, "invalid token")
        }
    }
}

/// Role-gated routes. Everything short of authorization is a 403; only a
/// token without a usable role claim echoes its claims back.
pub async fn enforce_roles(State(gate): State<RoleGate>, mut req: Request, next: Next) -> Response {
    let token = bearer_token(req.headers());
    match gate.decide(token.as_deref()).await {
        GateDecision::Authorized { claims, role } => {
            tracing::debug!(sub = %claims.sub, %role, "gate passed");
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        GateDecision::Forbidden { .. } => json_error(StatusCode::FORBIDDEN, "forbidden"),
        GateDecision::Rejected(Rejection::MissingRoleClaim { claims }) => (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({ "error": "invalid token", "claims": claims })),
        )
            .into_response(),
        GateDecision::Rejected(reason) => {
            tracing::info!(path = %req.uri().path(), ?reason, "gate rejected request");
            json_error(StatusCode::FORBIDDEN, "forbidden")
        }
    }
}
