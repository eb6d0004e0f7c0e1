use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{Role, User};
use super::errors::AuthError;

/// User persistence consumed by the auth services.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError>;
    async fn create_user(&self, user: &User) -> Result<(), AuthError>;
    /// Replace the stored record with `user` (matched by id) in one write.
    async fn update_user(&self, user: &User) -> Result<(), AuthError>;
}

/// Role lookups. Ids arrive as raw token text, hence `&str`.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AuthError>;
    async fn find_role_by_id(&self, id: &str) -> Result<Option<Role>, AuthError>;
    async fn create_role(&self, role: &Role) -> Result<(), AuthError>;
}

/// Simple in-memory store for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, MutexGuard};

    #[derive(Default)]
    pub struct InMemoryStore {
        users: Mutex<HashMap<Uuid, User>>,
        roles: Mutex<HashMap<Uuid, Role>>,
        role_id_lookups: AtomicUsize,
        user_updates: AtomicUsize,
    }

    fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, AuthError> {
        m.lock().map_err(|_| AuthError::Repository("store lock poisoned".into()))
    }

    impl InMemoryStore {
        /// Store pre-populated with one role per name.
        pub fn with_roles(names: &[&str]) -> Self {
            let store = Self::default();
            if let Ok(mut roles) = store.roles.lock() {
                for name in names {
                    let id = Uuid::new_v4();
                    roles.insert(id, Role { id, name: name.to_string() });
                }
            }
            store
        }

        pub fn role_id(&self, name: &str) -> Option<Uuid> {
            let roles = self.roles.lock().ok()?;
            roles.values().find(|r| r.name == name).map(|r| r.id)
        }

        pub fn user(&self, id: Uuid) -> Option<User> {
            self.users.lock().ok()?.get(&id).cloned()
        }

        /// Number of `find_role_by_id` calls served so far.
        pub fn role_id_lookups(&self) -> usize {
            self.role_id_lookups.load(Ordering::SeqCst)
        }

        pub fn user_updates(&self) -> usize {
            self.user_updates.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UserRepository for InMemoryStore {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
            let users = lock(&self.users)?;
            Ok(users.values().find(|u| u.email == email).cloned())
        }

        async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
            let users = lock(&self.users)?;
            Ok(users.get(&id).cloned())
        }

        async fn create_user(&self, user: &User) -> Result<(), AuthError> {
            let mut users = lock(&self.users)?;
            if users.contains_key(&user.id) || users.values().any(|u| u.email == user.email) {
                return Err(AuthError::Conflict);
            }
            users.insert(user.id, user.clone());
            Ok(())
        }

        async fn update_user(&self, user: &User) -> Result<(), AuthError> {
            let mut users = lock(&self.users)?;
            match users.get_mut(&user.id) {
                Some(slot) => {
                    *slot = user.clone();
                    self.user_updates.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
                None => Err(AuthError::NotFound),
            }
        }
    }

    #[async_trait]
    impl RoleRepository for InMemoryStore {
        async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AuthError> {
            let roles = lock(&self.roles)?;
            Ok(roles.values().find(|r| r.name == name).cloned())
        }

        async fn find_role_by_id(&self, id: &str) -> Result<Option<Role>, AuthError> {
            self.role_id_lookups.fetch_add(1, Ordering::SeqCst);
            let Ok(id) = Uuid::parse_str(id) else { return Ok(None) };
            let roles = lock(&self.roles)?;
            Ok(roles.get(&id).cloned())
        }

        async fn create_role(&self, role: &Role) -> Result<(), AuthError> {
            let mut roles = lock(&self.roles)?;
            if roles.values().any(|r| r.name == role.name) {
                return Err(AuthError::Conflict);
            }
            roles.insert(role.id, role.clone());
            Ok(())
        }
    }
}
