use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Field-keyed validation failures, collected before any store access so
/// the caller sees every offending field at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self { Self::default() }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn contains(&self, field: &str) -> bool { self.0.contains_key(field) }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing was recorded, otherwise the aggregated error.
    pub fn into_result(self) -> Result<(), AuthError> {
        if self.is_empty() { Ok(()) } else { Err(AuthError::Validation(self)) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, msg) in &self.0 {
            if !first { f.write_str("; ")?; }
            write!(f, "{field}: {msg}")?;
            first = false;
        }
        Ok(())
    }
}

/// Failures of token issuance and verification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed: {0}")]
    Malformed(String),
    #[error("token service has no signing secret configured")]
    Unconfigured,
    #[error("token ttl must be positive, got {0}s")]
    InvalidExpiry(i64),
    #[error("token generation did not finish within {0:?}")]
    GenerationTimeout(Duration),
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl TokenError {
    /// Operational failures on the issuing side, as opposed to a bad token
    /// presented by a caller.
    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            TokenError::Unconfigured
                | TokenError::InvalidExpiry(_)
                | TokenError::GenerationTimeout(_)
                | TokenError::Signing(_)
        )
    }
}

/// Business errors for auth workflows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("user already exists")]
    Conflict,
    #[error("this email is already used")]
    EmailAlreadyUsed,
    #[error("not found")]
    NotFound,
    #[error("invalid credentials")]
    Unauthorized,
    #[error("role `{0}` could not be resolved")]
    UnresolvedRole(String),
    #[error("hashing error: {0}")]
    HashError(String),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("repository error: {0}")]
    Repository(String),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 1001,
            AuthError::Conflict => 1002,
            AuthError::NotFound => 1003,
            AuthError::Unauthorized => 1004,
            AuthError::EmailAlreadyUsed => 1005,
            AuthError::UnresolvedRole(_) => 1007,
            AuthError::HashError(_) => 1101,
            AuthError::Token(e) if e.is_operational() => 1103,
            AuthError::Token(_) => 1102,
            AuthError::Repository(_) => 1200,
        }
    }

    /// Whether the failure is ours rather than the caller's.
    pub fn is_internal(&self) -> bool {
        match self {
            AuthError::HashError(_) | AuthError::Repository(_) => true,
            AuthError::Token(e) => e.is_operational(),
            _ => false,
        }
    }
}

impl From<models::errors::ModelError> for AuthError {
    fn from(e: models::errors::ModelError) -> Self {
        match e {
            models::errors::ModelError::Validation(msg) => {
                let mut errs = ValidationErrors::new();
                errs.add("model", msg);
                AuthError::Validation(errs)
            }
            models::errors::ModelError::Db(msg) => AuthError::Repository(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_keep_first_message_per_field() {
        let mut errs = ValidationErrors::new();
        errs.add("email", "Field 'email' is required and must be valid");
        errs.add("email", "second");
        errs.add("name", "Field 'name' is required and must be valid");
        assert_eq!(errs.fields().count(), 2);
        assert_eq!(
            errs.to_string(),
            "email: Field 'email' is required and must be valid; name: Field 'name' is required and must be valid"
        );
        assert!(matches!(errs.into_result(), Err(AuthError::Validation(_))));
    }

    #[test]
    fn empty_validation_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn operational_token_errors_are_internal() {
        assert!(AuthError::from(TokenError::Unconfigured).is_internal());
        assert!(AuthError::from(TokenError::GenerationTimeout(Duration::from_secs(5))).is_internal());
        assert!(!AuthError::from(TokenError::Expired).is_internal());
        assert_eq!(AuthError::from(TokenError::Expired).code(), 1102);
        assert_eq!(AuthError::from(TokenError::Unconfigured).code(), 1103);
    }
}
