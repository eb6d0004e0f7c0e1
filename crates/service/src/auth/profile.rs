use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::domain::{Profile, UpdateProfileInput, User};
use super::errors::{AuthError, ValidationErrors};
use super::password::CredentialVerifier;
use super::repository::UserRepository;
use super::service::{check_account_fields, reject_credentials};

/// Self-service changes to a user's own name, email and secret.
pub struct ProfileService {
    users: Arc<dyn UserRepository>,
    verifier: Arc<CredentialVerifier>,
    failure_delay: Duration,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UserRepository>, verifier: Arc<CredentialVerifier>, failure_delay: Duration) -> Self {
        Self { users, verifier, failure_delay }
    }

    /// Apply a profile change for the token subject `caller_subject`.
    ///
    /// The caller must prove the current secret. The role is never touched
    /// and tokens already issued stay valid until they expire.
    #[instrument(skip(self, input), fields(sub = %caller_subject))]
    pub async fn update_own_profile(&self, caller_subject: &str, input: UpdateProfileInput) -> Result<Profile, AuthError> {
        let mut errs = ValidationErrors::new();
        check_account_fields(&mut errs, &input.name, &input.email);
        if input.password.is_empty() {
            errs.add("password", "Field 'password' is required and must be valid");
        }
        errs.into_result()?;

        let id = Uuid::parse_str(caller_subject).map_err(|_| AuthError::NotFound)?;
        let current = self.users.find_user_by_id(id).await?.ok_or(AuthError::NotFound)?;

        if !self.verifier.verify(&input.password, &current.password_hash) {
            debug!("current password mismatch");
            return Err(reject_credentials(self.failure_delay).await);
        }

        if input.email != current.email {
            if let Some(owner) = self.users.find_user_by_email(&input.email).await? {
                if owner.id != current.id {
                    debug!(owner = %owner.id, "email belongs to another user");
                    return Err(AuthError::EmailAlreadyUsed);
                }
            }
        }

        let next_secret = match input.new_password.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => input.password.as_str(),
        };
        let updated = User {
            id: current.id,
            name: input.name,
            email: input.email,
            password_hash: self.verifier.hash(next_secret)?,
            role_id: current.role_id,
        };
        self.users.update_user(&updated).await?;
        info!(user_id = %updated.id, email_changed = updated.email != current.email, "profile_updated");
        Ok(Profile::from(&updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::cheap_verifier;
    use crate::auth::repository::mock::InMemoryStore;

    struct Fixture {
        store: Arc<InMemoryStore>,
        verifier: Arc<CredentialVerifier>,
        svc: ProfileService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::with_roles(&["admin", "customer"]));
        let verifier = Arc::new(cheap_verifier());
        let svc = ProfileService::new(store.clone(), verifier.clone(), Duration::from_millis(500));
        Fixture { store, verifier, svc }
    }

    async fn seed_user(f: &Fixture, email: &str, secret: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            email: email.into(),
            password_hash: f.verifier.hash(secret).unwrap(),
            role_id: f.store.role_id("customer").unwrap(),
        };
        f.store.create_user(&user).await.unwrap();
        user
    }

    fn change(name: &str, email: &str, password: &str, new_password: Option<&str>) -> UpdateProfileInput {
        UpdateProfileInput {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            new_password: new_password.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn updates_name_email_and_secret() {
        let f = fixture();
        let ana = seed_user(&f, "ana@example.com", "old-secret").await;

        let profile = f
            .svc
            .update_own_profile(&ana.id.to_string(), change("Ana Maria", "ana.m@example.com", "old-secret", Some("new-secret")))
            .await
            .unwrap();
        assert_eq!(profile.name, "Ana Maria");
        assert_eq!(profile.email, "ana.m@example.com");
        assert_eq!(profile.role_id, ana.role_id);

        let stored = f.store.user(ana.id).unwrap();
        assert!(f.verifier.verify("new-secret", &stored.password_hash));
        assert!(!f.verifier.verify("old-secret", &stored.password_hash));
    }

    #[tokio::test]
    async fn empty_new_secret_rehashes_current_one() {
        let f = fixture();
        let ana = seed_user(&f, "ana@example.com", "keep-me").await;

        f.svc
            .update_own_profile(&ana.id.to_string(), change("Ana", "ana@example.com", "keep-me", Some("")))
            .await
            .unwrap();
        let stored = f.store.user(ana.id).unwrap();
        assert_ne!(stored.password_hash, ana.password_hash);
        assert!(f.verifier.verify("keep-me", &stored.password_hash));
    }

    #[tokio::test]
    async fn email_owned_by_someone_else_is_rejected() {
        let f = fixture();
        let ana = seed_user(&f, "ana@example.com", "secret").await;
        seed_user(&f, "bob@example.com", "bob-secret").await;

        let err = f
            .svc
            .update_own_profile(&ana.id.to_string(), change("Ana", "bob@example.com", "secret", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailAlreadyUsed));
        assert_eq!(f.store.user(ana.id).unwrap(), ana);
        assert_eq!(f.store.user_updates(), 0);
    }

    #[tokio::test]
    async fn wrong_current_secret_is_unauthorized_after_delay() {
        let f = fixture();
        let ana = seed_user(&f, "ana@example.com", "secret").await;

        let started = std::time::Instant::now();
        let err = f
            .svc
            .update_own_profile(&ana.id.to_string(), change("Mallory", "mallory@example.com", "guess", Some("pwned")))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
        assert!(started.elapsed() >= Duration::from_millis(500));
        assert_eq!(f.store.user(ana.id).unwrap(), ana);
        assert_eq!(f.store.user_updates(), 0);
    }

    #[tokio::test]
    async fn unknown_caller_is_not_found() {
        let f = fixture();
        let input = change("Ana", "ana@example.com", "secret", None);
        assert!(matches!(
            f.svc.update_own_profile(&Uuid::new_v4().to_string(), input.clone()).await,
            Err(AuthError::NotFound)
        ));
        assert!(matches!(f.svc.update_own_profile("garbage", input).await, Err(AuthError::NotFound)));
    }

    #[tokio::test]
    async fn invalid_fields_are_aggregated() {
        let f = fixture();
        let ana = seed_user(&f, "ana@example.com", "secret").await;
        let err = f
            .svc
            .update_own_profile(&ana.id.to_string(), change("", "not-an-email", "", None))
            .await
            .unwrap_err();
        match err {
            AuthError::Validation(errs) => {
                assert!(errs.contains("name"));
                assert!(errs.contains("email"));
                assert!(errs.contains("password"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(f.store.user_updates(), 0);
    }
}
