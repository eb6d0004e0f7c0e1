use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registration input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Self-service profile change. `password` is the caller's current secret;
/// an empty or absent `new_password` keeps it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfileInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub new_password: Option<String>,
}

/// Stored user record. The hash never leaves the service layer; use
/// [`Profile`] for anything outward facing.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: Uuid,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("role_id", &self.role_id)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
}

/// Outward view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role_id: Uuid,
}

impl From<&User> for Profile {
    fn from(u: &User) -> Self {
        Profile { id: u.id, name: u.name.clone(), email: u.email.clone(), role_id: u.role_id }
    }
}

/// Login result (session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: Profile,
    pub token: String,
}

/// A role claim as found in a token: either a role name or an opaque role
/// id that has to be looked up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoleClaim {
    Name(String),
    Id(String),
}

impl RoleClaim {
    pub fn as_str(&self) -> &str {
        match self {
            RoleClaim::Name(s) | RoleClaim::Id(s) => s,
        }
    }
}

impl fmt::Display for RoleClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleClaim::Name(n) => write!(f, "name:{n}"),
            RoleClaim::Id(i) => write!(f, "id:{i}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_debug_hides_hash() {
        let u = User {
            id: Uuid::nil(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            role_id: Uuid::nil(),
        };
        let dbg = format!("{u:?}");
        assert!(!dbg.contains("argon2id"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn profile_serializes_without_credential() {
        let u = User {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            role_id: Uuid::new_v4(),
        };
        let json = serde_json::to_value(Profile::from(&u)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "ana@example.com");
    }

    #[test]
    fn update_input_defaults_missing_fields() {
        let input: UpdateProfileInput = serde_json::from_str(r#"{"email":"a@b.com"}"#).unwrap();
        assert_eq!(input.email, "a@b.com");
        assert!(input.password.is_empty());
        assert!(input.new_password.is_none());
    }
}
