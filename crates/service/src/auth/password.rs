use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, PasswordHash, Version,
};
use rand::rngs::OsRng;
use tracing::{debug, warn};

use super::errors::AuthError;

/// Salted argon2id hashing and verification of user secrets.
///
/// Holds a decoy hash so that a lookup miss can burn the same amount of
/// work as a real comparison.
#[derive(Clone)]
pub struct CredentialVerifier {
    argon: Argon2<'static>,
    decoy: Arc<str>,
}

impl CredentialVerifier {
    pub fn new(params: Params) -> Result<Self, AuthError> {
        let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);
        let decoy = argon
            .hash_password(b"decoy-credential", &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();
        Ok(Self { argon, decoy: Arc::from(decoy) })
    }

    pub fn from_config(cfg: &configs::Argon2Config) -> Result<Self, AuthError> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| AuthError::HashError(e.to_string()))?;
        Self::new(params)
    }

    /// Hash `secret` with a fresh random salt; the salt is embedded in the
    /// returned PHC string.
    ///
    /// # Examples
    /// ```
    /// use service::auth::password::CredentialVerifier;
    /// let params = argon2::Params::new(1024, 1, 1, None).unwrap();
    /// let v = CredentialVerifier::new(params).unwrap();
    /// let stored = v.hash("Passw0rd").unwrap();
    /// assert!(v.verify("Passw0rd", &stored));
    /// assert!(!v.verify("passw0rd", &stored));
    /// ```
    pub fn hash(&self, secret: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    /// `true` only when `stored` parses and matches `secret`.
    pub fn verify(&self, secret: &str, stored: &str) -> bool {
        let parsed = match PasswordHash::new(stored) {
            Ok(p) => p,
            Err(e) => {
                debug!(error = %e, "stored credential is not a valid PHC string");
                return false;
            }
        };
        self.argon.verify_password(secret.as_bytes(), &parsed).is_ok()
    }

    /// Spend one full verification against the decoy hash so an unknown
    /// account costs the same as a wrong secret.
    pub fn burn_decoy(&self, secret: &str) {
        if self.verify(secret, &self.decoy) {
            warn!("decoy hash matched a presented secret");
        }
    }
}

#[cfg(test)]
pub(crate) fn cheap_verifier() -> CredentialVerifier {
    let params = Params::new(1024, 1, 1, None).expect("valid test params");
    CredentialVerifier::new(params).expect("decoy hash")
}
