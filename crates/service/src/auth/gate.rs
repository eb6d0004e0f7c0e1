//! Role-based access gate.
//!
//! A request moves `NoToken -> TokenPresented -> {Verified, Rejected}` and a
//! verified one ends `Authorized` or `Forbidden`. Callers only ever learn
//! "forbidden"; the [`Rejection`] detail is for logs and diagnostics.

use std::sync::Arc;

use tracing::{debug, info};

use super::errors::TokenError;
use super::roles::RoleResolver;
use super::token::{Claims, TokenService};

#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    MissingToken,
    InvalidToken(TokenError),
    /// The token verified but its `role` claim is absent or not a string.
    MissingRoleClaim { claims: serde_json::Value },
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    Authorized { claims: Claims, role: String },
    Forbidden { claims: Claims },
    Rejected(Rejection),
}

impl GateDecision {
    pub fn is_authorized(&self) -> bool {
        matches!(self, GateDecision::Authorized { .. })
    }
}

/// Admits requests whose token carries one of the allowed roles.
#[derive(Clone)]
pub struct RoleGate {
    tokens: Arc<TokenService>,
    resolver: RoleResolver,
    allowed: Arc<[String]>,
}

impl RoleGate {
    pub fn new<I, S>(tokens: Arc<TokenService>, resolver: RoleResolver, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed: Vec<String> = allowed.into_iter().map(Into::into).collect();
        Self { tokens, resolver, allowed: allowed.into() }
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    fn allows(&self, role: &str) -> bool {
        self.allowed.iter().any(|a| a == role)
    }

    /// Full decision for a raw bearer token, if one was presented.
    pub async fn decide(&self, token: Option<&str>) -> GateDecision {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return GateDecision::Rejected(Rejection::MissingToken);
        };
        match self.tokens.verify(token) {
            Ok(claims) => self.authorize(claims).await,
            Err(e) => GateDecision::Rejected(Rejection::InvalidToken(e)),
        }
    }

    /// Match already-verified claims against the allow-list: the raw claim
    /// first, then whatever it resolves to.
    pub async fn authorize(&self, claims: Claims) -> GateDecision {
        let Some(raw) = claims.role_claim().map(str::to_owned) else {
            let claims = serde_json::to_value(&claims).unwrap_or(serde_json::Value::Null);
            return GateDecision::Rejected(Rejection::MissingRoleClaim { claims });
        };

        if self.allows(&raw) {
            debug!(sub = %claims.sub, role = %raw, "role matched directly");
            return GateDecision::Authorized { claims, role: raw };
        }

        match self.resolver.resolve(&raw).await {
            Ok(name) if self.allows(&name) => {
                debug!(sub = %claims.sub, claim = %raw, role = %name, "role matched after resolution");
                GateDecision::Authorized { claims, role: name }
            }
            Ok(name) => {
                info!(sub = %claims.sub, role = %name, allowed = ?self.allowed, "role not allowed");
                GateDecision::Forbidden { claims }
            }
            Err(e) => {
                info!(sub = %claims.sub, claim = %raw, error = %e, "role claim unresolved");
                GateDecision::Forbidden { claims }
            }
        }
    }
}
