use std::sync::Arc;

use service::auth::{
    password::CredentialVerifier,
    repository::{RoleRepository, UserRepository},
    AuthService, AuthSettings, ProfileService, RoleGate, RoleResolver, TokenService,
};
use service::catalog::{ProductRepository, ProductService};

/// Everything a handler or middleware needs, cheap to clone per request.
#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AuthService>,
    pub profiles: Arc<ProfileService>,
    pub products: Arc<ProductService>,
    pub tokens: Arc<TokenService>,
    pub resolver: RoleResolver,
}

impl ServerState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
        products: Arc<dyn ProductRepository>,
        verifier: Arc<CredentialVerifier>,
        tokens: Arc<TokenService>,
        settings: AuthSettings,
    ) -> Self {
        let resolver = RoleResolver::new(roles.clone(), settings.roles.iter().cloned());
        let profiles = ProfileService::new(users.clone(), verifier.clone(), settings.failure_delay);
        let auth = AuthService::new(users, roles, verifier, tokens.clone(), settings);
        Self {
            auth: Arc::new(auth),
            profiles: Arc::new(profiles),
            products: Arc::new(ProductService::new(products)),
            tokens,
            resolver,
        }
    }

    /// Gate admitting only tokens whose role is one of `allowed`.
    pub fn gate<I, S>(&self, allowed: I) -> RoleGate
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RoleGate::new(self.tokens.clone(), self.resolver.clone(), allowed)
    }
}
