//! In-memory user repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::user::{Role, User, UserId, UserRepository};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    /// email -> user ID
    email_index: HashMap<String, UserId>,
}

/// In-memory implementation of UserRepository
///
/// Both maps sit behind one lock so the email check and the insert are a
/// single step.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryUserRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository with initial users
    pub fn with_users(users: Vec<User>) -> Self {
        let mut tables = Tables::default();

        for user in users {
            tables.email_index.insert(user.email().to_string(), *user.id());
            tables.users.insert(*user.id(), user);
        }

        Self {
            tables: Arc::new(RwLock::new(tables)),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let tables = self.tables.read().await;

        Ok(tables
            .email_index
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut tables = self.tables.write().await;

        if tables.users.contains_key(user.id()) {
            return Err(DomainError::conflict(format!(
                "User with ID '{}' already exists",
                user.id()
            )));
        }

        if tables.email_index.contains_key(user.email()) {
            return Err(DomainError::conflict("Email already in use."));
        }

        tables.email_index.insert(user.email().to_string(), *user.id());
        tables.users.insert(*user.id(), user.clone());

        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let mut tables = self.tables.write().await;

        let (old_email, stored_version) = match tables.users.get(user.id()) {
            Some(stored) => (stored.email().to_string(), stored.version()),
            None => {
                return Err(DomainError::not_found(format!("User '{}' not found", user.id())));
            }
        };

        if stored_version != user.version() {
            return Err(DomainError::conflict("User was modified concurrently"));
        }

        if old_email != user.email() {
            if tables.email_index.contains_key(user.email()) {
                return Err(DomainError::conflict("Email already in use."));
            }

            tables.email_index.remove(&old_email);
            tables.email_index.insert(user.email().to_string(), *user.id());
        }

        let mut updated = user.clone();
        updated.bump_version();
        tables.users.insert(*updated.id(), updated.clone());

        Ok(updated)
    }

    async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
        let mut tables = self.tables.write().await;

        match tables.users.remove(id) {
            Some(user) => {
                tables.email_index.remove(user.email());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, DomainError> {
        let tables = self.tables.read().await;

        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| u.has_role(role))
            .cloned()
            .collect();
        users.sort_by_key(|u| u.created_at());

        Ok(users)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.tables.read().await.users.len())
    }
}
