use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use super::domain::RoleClaim;
use super::errors::AuthError;
use super::repository::RoleRepository;

/// Turns a role claim into a canonical role name.
///
/// Known names resolve without touching the store; anything else is taken
/// to be a role id and looked up.
#[derive(Clone)]
pub struct RoleResolver {
    roles: Arc<dyn RoleRepository>,
    known: Arc<HashSet<String>>,
}

impl RoleResolver {
    pub fn new<I, S>(roles: Arc<dyn RoleRepository>, known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let known = known.into_iter().map(Into::into).collect();
        Self { roles, known: Arc::new(known) }
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.known.contains(name)
    }

    pub fn classify(&self, raw: &str) -> RoleClaim {
        if self.is_known(raw) {
            RoleClaim::Name(raw.to_string())
        } else {
            RoleClaim::Id(raw.to_string())
        }
    }

    pub async fn resolve(&self, raw: &str) -> Result<String, AuthError> {
        self.resolve_claim(&self.classify(raw)).await
    }

    pub async fn resolve_claim(&self, claim: &RoleClaim) -> Result<String, AuthError> {
        match claim {
            RoleClaim::Name(name) => Ok(name.clone()),
            RoleClaim::Id(id) => match self.roles.find_role_by_id(id).await {
                Ok(Some(role)) => {
                    debug!(role_id = %id, role = %role.name, "role id resolved");
                    Ok(role.name)
                }
                Ok(None) => Err(AuthError::UnresolvedRole(id.clone())),
                Err(e) => {
                    warn!(role_id = %id, error = %e, "role lookup failed");
                    Err(AuthError::UnresolvedRole(id.clone()))
                }
            },
        }
    }
}
