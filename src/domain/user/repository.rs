//! User repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{User, UserId};
use super::role::Role;
use crate::domain::DomainError;

/// Repository trait for user storage
///
/// `create` must reject a second account with the same email and `update`
/// must reject a write whose version no longer matches the stored one. Both
/// report `DomainError::Conflict`.
#[async_trait]
pub trait UserRepository: Send + Sync + Debug {
    /// Get a user by their ID
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Get a user by their email (for login and uniqueness checks)
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Create a new user
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Write back a user read earlier, returning it with its new version
    async fn update(&self, user: &User) -> Result<User, DomainError>;

    /// Delete a user
    async fn delete(&self, id: &UserId) -> Result<bool, DomainError>;

    /// List users holding a role
    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, DomainError>;

    /// Count all users
    async fn count(&self) -> Result<usize, DomainError>;

    /// Check if an email is already registered
    async fn email_exists(&self, email: &str) -> Result<bool, DomainError> {
        Ok(self.get_by_email(email).await?.is_some())
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Mock user repository for testing
    #[derive(Debug, Default)]
    pub struct MockUserRepository {
        users: Arc<RwLock<HashMap<UserId, User>>>,
        should_fail: Arc<RwLock<bool>>,
    }

    impl MockUserRepository {
        /// Create a new mock repository
        pub fn new() -> Self {
            Self::default()
        }

        /// Set whether operations should fail
        pub async fn set_should_fail(&self, fail: bool) {
            *self.should_fail.write().await = fail;
        }

        async fn check_should_fail(&self) -> Result<(), DomainError> {
            if *self.should_fail.read().await {
                return Err(DomainError::storage("Mock repository configured to fail"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
            self.check_should_fail().await?;
            let users = self.users.read().await;
            Ok(users.get(id).cloned())
        }

        async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
            self.check_should_fail().await?;
            let users = self.users.read().await;
            Ok(users.values().find(|u| u.email() == email).cloned())
        }

        async fn create(&self, user: User) -> Result<User, DomainError> {
            self.check_should_fail().await?;
            let mut users = self.users.write().await;

            if users.values().any(|u| u.email() == user.email()) {
                return Err(DomainError::conflict("Email already in use."));
            }

            users.insert(*user.id(), user.clone());
            Ok(user)
        }

        async fn update(&self, user: &User) -> Result<User, DomainError> {
            self.check_should_fail().await?;
            let mut users = self.users.write().await;

            let stored = users
                .get(user.id())
                .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", user.id())))?;

            if stored.version() != user.version() {
                return Err(DomainError::conflict("User was modified concurrently"));
            }

            let mut updated = user.clone();
            updated.bump_version();
            users.insert(*updated.id(), updated.clone());
            Ok(updated)
        }

        async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
            self.check_should_fail().await?;
            let mut users = self.users.write().await;
            Ok(users.remove(id).is_some())
        }

        async fn list_by_role(&self, role: Role) -> Result<Vec<User>, DomainError> {
            self.check_should_fail().await?;
            let users = self.users.read().await;
            Ok(users.values().filter(|u| u.has_role(role)).cloned().collect())
        }

        async fn count(&self) -> Result<usize, DomainError> {
            self.check_should_fail().await?;
            Ok(self.users.read().await.len())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::domain::user::Roles;

        fn create_test_user(email: &str) -> User {
            User::new(
                UserId::generate(),
                "Test",
                email,
                "hashed_password",
                None,
                Roles::customer_default(),
            )
        }

        #[tokio::test]
        async fn test_create_and_get() {
            let repo = MockUserRepository::new();
            let user = create_test_user("a@email.com");

            repo.create(user.clone()).await.unwrap();

            let retrieved = repo.get(user.id()).await.unwrap();
            assert_eq!(retrieved.unwrap().email(), "a@email.com");
        }

        #[tokio::test]
        async fn test_should_fail() {
            let repo = MockUserRepository::new();
            repo.set_should_fail(true).await;

            let result = repo.get_by_email("a@email.com").await;
            assert!(matches!(result, Err(DomainError::Storage { .. })));
        }

        #[tokio::test]
        async fn test_stale_update_rejected() {
            let repo = MockUserRepository::new();
            let user = repo.create(create_test_user("a@email.com")).await.unwrap();

            repo.update(&user).await.unwrap();

            let result = repo.update(&user).await;
            assert!(matches!(result, Err(DomainError::Conflict { .. })));
        }
    }
}
