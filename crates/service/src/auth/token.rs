use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::errors::TokenError;

/// Hard wall-clock budget for signing one token.
pub const SIGNING_TIMEOUT: Duration = Duration::from_secs(5);

/// Claim set carried by every access token.
///
/// `role` stays an untyped JSON value on the way in so the gate can tell
/// a missing or non-string claim apart from an unknown role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub role: serde_json::Value,
    pub exp: i64,
}

impl Claims {
    pub fn role_claim(&self) -> Option<&str> {
        self.role.as_str()
    }
}

/// Issues and verifies HS256 tokens with a single shared secret.
#[derive(Clone)]
pub struct TokenService {
    keys: Option<(EncodingKey, DecodingKey)>,
    validation: Validation,
    signing_timeout: Duration,
}

impl TokenService {
    /// A service without a (non-empty) secret can be built but refuses to
    /// issue or verify anything.
    pub fn new(secret: Option<&str>) -> Self {
        let keys = secret
            .filter(|s| !s.trim().is_empty())
            .map(|s| (EncodingKey::from_secret(s.as_bytes()), DecodingKey::from_secret(s.as_bytes())));
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self { keys, validation, signing_timeout: SIGNING_TIMEOUT }
    }

    pub fn with_signing_timeout(mut self, timeout: Duration) -> Self {
        self.signing_timeout = timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.keys.is_some()
    }

    /// Sign `{sub, role, exp = now + ttl_seconds}`.
    ///
    /// # Examples
    /// ```
    /// use service::auth::token::TokenService;
    /// let tokens = TokenService::new(Some("secret"));
    /// let token = tokio_test::block_on(tokens.issue("user-1", "admin", 60)).unwrap();
    /// let claims = tokens.verify(&token).unwrap();
    /// assert_eq!(claims.sub, "user-1");
    /// assert_eq!(claims.role_claim(), Some("admin"));
    /// ```
    pub async fn issue(&self, subject: &str, role_claim: &str, ttl_seconds: i64) -> Result<String, TokenError> {
        let (encoding, _) = self.keys.as_ref().ok_or(TokenError::Unconfigured)?;
        if ttl_seconds <= 0 {
            return Err(TokenError::InvalidExpiry(ttl_seconds));
        }
        let exp = Utc::now()
            .timestamp()
            .checked_add(ttl_seconds)
            .ok_or(TokenError::InvalidExpiry(ttl_seconds))?;
        let claims = Claims {
            sub: subject.to_string(),
            role: serde_json::Value::String(role_claim.to_string()),
            exp,
        };
        let key = encoding.clone();
        debug!(sub = %claims.sub, exp, "signing access token");
        sign_within(self.signing_timeout, move || {
            encode(&Header::new(Algorithm::HS256), &claims, &key).map_err(|e| TokenError::Signing(e.to_string()))
        })
        .await
    }

    /// Check signature and expiry and return the claims. Nothing from an
    /// unverified token is ever returned.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let (_, decoding) = self.keys.as_ref().ok_or(TokenError::Unconfigured)?;
        decode::<Claims>(token, decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(e.to_string()),
            })
    }
}

/// Run `sign` on the blocking pool and race it against `timeout`.
///
/// Three outcomes: the signer succeeds, the signer fails (or panics), or the
/// timer fires first. In the last case the task is left to finish on its own.
async fn sign_within<F>(timeout: Duration, sign: F) -> Result<String, TokenError>
where
    F: FnOnce() -> Result<String, TokenError> + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(sign);
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join)) => Err(TokenError::Signing(join.to_string())),
        Err(_) => {
            warn!(?timeout, "token signing timed out; abandoning signer task");
            Err(TokenError::GenerationTimeout(timeout))
        }
    }
}
