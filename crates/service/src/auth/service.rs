use std::sync::Arc;
use std::time::Duration;

use configs::RoleClaimFormat;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::domain::{AuthSession, LoginInput, Profile, RegisterInput, Role, User};
use super::errors::{AuthError, ValidationErrors};
use super::password::CredentialVerifier;
use super::repository::{RoleRepository, UserRepository};
use super::token::TokenService;

/// Auth service settings, usually derived from `configs::AuthConfig`.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub ttl_seconds: i64,
    pub failure_delay: Duration,
    pub role_claim: RoleClaimFormat,
    pub roles: Vec<String>,
    pub default_role: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self::from_config(&configs::AuthConfig::default())
    }
}

impl AuthSettings {
    pub fn from_config(cfg: &configs::AuthConfig) -> Self {
        Self {
            ttl_seconds: cfg.jwt_expires_in,
            failure_delay: Duration::from_millis(cfg.failure_delay_ms.max(configs::MIN_FAILURE_DELAY_MS)),
            role_claim: cfg.role_claim,
            roles: cfg.roles.clone(),
            default_role: cfg.default_role.clone(),
        }
    }
}

/// Shared by login and profile re-authentication: wait out the fixed delay,
/// then report the failure. Only this request's task sleeps.
pub(crate) async fn reject_credentials(delay: Duration) -> AuthError {
    tokio::time::sleep(delay).await;
    AuthError::Unauthorized
}

/// Aggregate the common account field checks into one validation error.
pub(crate) fn check_account_fields(errs: &mut ValidationErrors, name: &str, email: &str) {
    if models::user::validate_email(email).is_err() {
        errs.add("email", "Field 'email' is required and must be valid");
    }
    if models::user::validate_name(name).is_err() {
        errs.add("name", "Field 'name' is required and must be valid");
    }
}

const DEMO_USERS: [(&str, &str, &str); 3] = [
    ("Customer User", "customer@example.com", "customer"),
    ("Manager User", "manager@example.com", "manager"),
    ("Admin User", "admin@example.com", "admin"),
];

/// Auth business service independent of web framework
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
    verifier: Arc<CredentialVerifier>,
    tokens: Arc<TokenService>,
    settings: AuthSettings,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
        verifier: Arc<CredentialVerifier>,
        tokens: Arc<TokenService>,
        settings: AuthSettings,
    ) -> Self {
        Self { users, roles, verifier, tokens, settings }
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Authenticate a user and issue a token.
    ///
    /// Unknown email and wrong password fail the same way, after the same
    /// hashing work and the same fixed delay.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::auth::{
    ///     domain::{LoginInput, RegisterInput},
    ///     password::CredentialVerifier,
    ///     repository::mock::InMemoryStore,
    ///     service::{AuthService, AuthSettings},
    ///     token::TokenService,
    /// };
    /// let store = Arc::new(InMemoryStore::with_roles(&["admin", "manager", "customer"]));
    /// let verifier = Arc::new(CredentialVerifier::new(argon2::Params::new(1024, 1, 1, None).unwrap()).unwrap());
    /// let tokens = Arc::new(TokenService::new(Some("secret")));
    /// let svc = AuthService::new(store.clone(), store, verifier, tokens.clone(), AuthSettings::default());
    /// let reg = RegisterInput { name: "N".into(), email: "u@e.com".into(), password: "Passw0rd".into() };
    /// tokio_test::block_on(svc.register(reg)).unwrap();
    /// let session = tokio_test::block_on(svc.authenticate(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert_eq!(tokens.verify(&session.token).unwrap().sub, session.user.id.to_string());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn authenticate(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = match self.users.find_user_by_email(&input.email).await? {
            Some(user) if self.verifier.verify(&input.password, &user.password_hash) => user,
            Some(_) => {
                debug!("password mismatch");
                return Err(reject_credentials(self.settings.failure_delay).await);
            }
            None => {
                // same argon2 cost as a real mismatch
                self.verifier.burn_decoy(&input.password);
                debug!("unknown email");
                return Err(reject_credentials(self.settings.failure_delay).await);
            }
        };

        let role_claim = self.role_claim_for(&user).await;
        let token = self
            .tokens
            .issue(&user.id.to_string(), &role_claim, self.settings.ttl_seconds)
            .await?;
        info!(user_id = %user.id, "user_authenticated");
        Ok(AuthSession { user: Profile::from(&user), token })
    }

    /// Encode the user's role reference the way this deployment's tokens
    /// carry it.
    async fn role_claim_for(&self, user: &User) -> String {
        let id = user.role_id.to_string();
        match self.settings.role_claim {
            RoleClaimFormat::Id => id,
            RoleClaimFormat::Name => match self.roles.find_role_by_id(&id).await {
                Ok(Some(role)) => role.name,
                Ok(None) => {
                    warn!(user_id = %user.id, role_id = %id, "user references a missing role; issuing id claim");
                    id
                }
                Err(e) => {
                    warn!(user_id = %user.id, error = %e, "role lookup failed; issuing id claim");
                    id
                }
            },
        }
    }

    /// Register a new user with the default role and a hashed password.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<Profile, AuthError> {
        let mut errs = ValidationErrors::new();
        check_account_fields(&mut errs, &input.name, &input.email);
        if input.password.is_empty() {
            errs.add("password", "Field 'password' is required and must be valid");
        }
        errs.into_result()?;

        if let Some(existing) = self.users.find_user_by_email(&input.email).await? {
            debug!(user_id = %existing.id, "email already registered");
            return Err(AuthError::Conflict);
        }

        let role = self
            .roles
            .find_role_by_name(&self.settings.default_role)
            .await?
            .ok_or_else(|| AuthError::Repository(format!("default role `{}` is not seeded", self.settings.default_role)))?;

        let user = User {
            id: Uuid::new_v4(),
            name: input.name,
            email: input.email,
            password_hash: self.verifier.hash(&input.password)?,
            role_id: role.id,
        };
        self.users.create_user(&user).await?;
        info!(user_id = %user.id, role = %role.name, "user_registered");
        Ok(Profile::from(&user))
    }

    /// Profile of the token subject.
    pub async fn show_profile(&self, subject: &str) -> Result<Profile, AuthError> {
        let id = Uuid::parse_str(subject).map_err(|_| AuthError::NotFound)?;
        self.get_user(id).await
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Profile, AuthError> {
        let user = self.users.find_user_by_id(id).await?.ok_or(AuthError::NotFound)?;
        Ok(Profile::from(&user))
    }

    /// Create every configured role that is not stored yet. Returns the
    /// roles created by this call.
    #[instrument(skip(self))]
    pub async fn seed_roles(&self) -> Result<Vec<Role>, AuthError> {
        let mut created = Vec::new();
        for name in &self.settings.roles {
            if self.roles.find_role_by_name(name).await?.is_some() {
                continue;
            }
            let role = Role { id: Uuid::new_v4(), name: name.clone() };
            match self.roles.create_role(&role).await {
                Ok(()) => {
                    info!(role = %role.name, role_id = %role.id, "role_seeded");
                    created.push(role);
                }
                Err(AuthError::Conflict) => debug!(role = %name, "role seeded concurrently"),
                Err(e) => return Err(e),
            }
        }
        Ok(created)
    }

    /// Create one demo account per staff level (customer, manager, admin),
    /// all sharing `password`. Accounts whose email exists are skipped, as are
    /// those whose role is not stored. Returns the created profiles.
    #[instrument(skip(self, password))]
    pub async fn seed_users(&self, password: &str) -> Result<Vec<Profile>, AuthError> {
        let mut created = Vec::new();
        for (name, email, role_name) in DEMO_USERS {
            if self.users.find_user_by_email(email).await?.is_some() {
                continue;
            }
            let Some(role) = self.roles.find_role_by_name(role_name).await? else {
                warn!(%email, role = %role_name, "role missing; demo user not seeded");
                continue;
            };
            let user = User {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email: email.to_string(),
                password_hash: self.verifier.hash(password)?,
                role_id: role.id,
            };
            match self.users.create_user(&user).await {
                Ok(()) => {
                    info!(user_id = %user.id, role = %role.name, "demo_user_seeded");
                    created.push(Profile::from(&user));
                }
                Err(AuthError::Conflict) => debug!(%email, "demo user seeded concurrently"),
                Err(e) => return Err(e),
            }
        }
        Ok(created)
    }
}
