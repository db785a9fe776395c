//! Application state for shared services

use std::sync::Arc;

use crate::domain::user::{Role, Roles, User, UserId, UserRepository};
use crate::domain::DomainError;
use crate::infrastructure::auth::JwtGenerator;
use crate::infrastructure::user::{
    PasswordHasher, RegisterUserRequest, UpdateProfileRequest, UserService,
};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserServiceTrait>,
    pub jwt_service: Arc<dyn JwtGenerator>,
}

impl AppState {
    pub fn new(user_service: Arc<dyn UserServiceTrait>, jwt_service: Arc<dyn JwtGenerator>) -> Self {
        Self {
            user_service,
            jwt_service,
        }
    }
}

/// Trait for user service operations
#[async_trait::async_trait]
pub trait UserServiceTrait: Send + Sync {
    async fn register(&self, request: RegisterUserRequest) -> Result<User, DomainError>;
    async fn create_with_roles(
        &self,
        request: RegisterUserRequest,
        roles: Roles,
    ) -> Result<User, DomainError>;
    async fn authenticate(&self, email: &str, password: &str)
        -> Result<Option<User>, DomainError>;
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError>;
    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, DomainError>;
    async fn count(&self) -> Result<usize, DomainError>;
    async fn update_profile(
        &self,
        user: User,
        request: UpdateProfileRequest,
    ) -> Result<User, DomainError>;
    async fn toggle_buy(&self, user: User) -> Result<User, DomainError>;
    async fn edit_permissions(&self, user: User, requested: Vec<Role>)
        -> Result<User, DomainError>;
}

#[async_trait::async_trait]
impl<R, H> UserServiceTrait for UserService<R, H>
where
    R: UserRepository + 'static,
    H: PasswordHasher + 'static,
{
    async fn register(&self, request: RegisterUserRequest) -> Result<User, DomainError> {
        UserService::register(self, request).await
    }

    async fn create_with_roles(
        &self,
        request: RegisterUserRequest,
        roles: Roles,
    ) -> Result<User, DomainError> {
        UserService::create_with_roles(self, request, roles).await
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, DomainError> {
        UserService::authenticate(self, email, password).await
    }

    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        UserService::get(self, id).await
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, DomainError> {
        UserService::list_by_role(self, role).await
    }

    async fn count(&self) -> Result<usize, DomainError> {
        UserService::count(self).await
    }

    async fn update_profile(
        &self,
        user: User,
        request: UpdateProfileRequest,
    ) -> Result<User, DomainError> {
        UserService::update_profile(self, user, request).await
    }

    async fn toggle_buy(&self, user: User) -> Result<User, DomainError> {
        UserService::toggle_buy(self, user).await
    }

    async fn edit_permissions(
        &self,
        user: User,
        requested: Vec<Role>,
    ) -> Result<User, DomainError> {
        UserService::edit_permissions(self, user, requested).await
    }
}
