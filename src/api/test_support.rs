//! Shared fixtures for HTTP-level tests

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::Response;
use serde_json::Value;

use super::state::AppState;
use crate::domain::user::{Roles, User, UserId, UserRepository};
use crate::infrastructure::auth::{JwtConfig, JwtGenerator, JwtService};
use crate::infrastructure::user::{Argon2Hasher, InMemoryUserRepository, PasswordHasher, UserService};

pub const TEST_SECRET: &str = "test-secret-key-12345";
pub const TEST_PASSWORD: &str = "password";

pub fn jwt_service() -> JwtService {
    JwtService::new(JwtConfig::new(TEST_SECRET))
}

pub fn state_with_repository<R: UserRepository + 'static>(repository: Arc<R>) -> AppState {
    let user_service = UserService::new(repository, Arc::new(Argon2Hasher::new()));
    AppState::new(Arc::new(user_service), Arc::new(jwt_service()))
}

pub fn test_state() -> (AppState, Arc<InMemoryUserRepository>) {
    let repository = Arc::new(InMemoryUserRepository::new());
    (state_with_repository(repository.clone()), repository)
}

/// Store an account whose password is `TEST_PASSWORD`
pub async fn seed_user(
    repository: &InMemoryUserRepository,
    email: &str,
    roles: impl Into<Roles>,
) -> User {
    let hash = Argon2Hasher::new().hash(TEST_PASSWORD).unwrap();
    let user = User::new(UserId::generate(), "Seeded User", email, hash, None, roles.into());
    repository.create(user).await.unwrap()
}

/// Authorization header value for a user
pub fn auth_header(user: &User) -> String {
    format!("JWT {}", jwt_service().generate(user).unwrap())
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
