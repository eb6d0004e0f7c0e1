use sea_orm::{DatabaseConnection, EntityTrait};
use tracing::warn;
use uuid::Uuid;

use crate::auth::domain::{Role, User};
use crate::auth::errors::AuthError;
use crate::auth::repository::{RoleRepository, UserRepository};
use models::errors::ModelError;

/// Postgres-backed user/role store.
pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

fn to_user(m: models::user::Model) -> User {
    User { id: m.id, name: m.name, email: m.email, password_hash: m.password_hash, role_id: m.role_id }
}

fn to_role(m: models::role::Model) -> Role {
    Role { id: m.id, name: m.name }
}

fn is_unique_violation(e: &ModelError) -> bool {
    matches!(e, ModelError::Db(msg) if msg.contains("duplicate key") || msg.contains("unique constraint"))
}

#[async_trait::async_trait]
impl UserRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let res = models::user::find_by_email(&self.db, email).await?;
        Ok(res.map(to_user))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        let res = models::user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(to_user))
    }

    async fn create_user(&self, user: &User) -> Result<(), AuthError> {
        models::user::create(&self.db, user.id, &user.name, &user.email, &user.password_hash, user.role_id)
            .await
            .map_err(|e| if is_unique_violation(&e) { AuthError::Conflict } else { e.into() })?;
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), AuthError> {
        models::user::update_account(&self.db, user.id, &user.name, &user.email, &user.password_hash, user.role_id)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    warn!(user_id = %user.id, "email taken concurrently; store rejected update");
                    AuthError::EmailAlreadyUsed
                } else {
                    e.into()
                }
            })?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RoleRepository for SeaOrmAuthRepository {
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AuthError> {
        let res = models::role::find_by_name(&self.db, name).await?;
        Ok(res.map(to_role))
    }

    async fn find_role_by_id(&self, id: &str) -> Result<Option<Role>, AuthError> {
        let Ok(id) = Uuid::parse_str(id) else { return Ok(None) };
        let res = models::role::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(to_role))
    }

    async fn create_role(&self, role: &Role) -> Result<(), AuthError> {
        models::role::create(&self.db, role.id, &role.name)
            .await
            .map_err(|e| if is_unique_violation(&e) { AuthError::Conflict } else { e.into() })?;
        Ok(())
    }
}
