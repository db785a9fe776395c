//! Account Service
//!
//! Registration, password authentication issuing signed tokens, and
//! role-gated profile access for customer, staff and management accounts:
//! - Argon2 password hashing
//! - HS256 JWTs carrying the caller's roles
//! - In-memory or PostgreSQL account storage

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::{AppState, UserServiceTrait};
use config::StorageBackend;
use domain::user::{Role, Roles};
use domain::DomainError;
use infrastructure::{
    auth::{JwtConfig, JwtGenerator, JwtService},
    storage::{connect_pool, run_user_migrations, PostgresConfig},
    user::{
        Argon2Hasher, InMemoryUserRepository, PostgresUserRepository, RegisterUserRequest,
        UserService,
    },
};
use rand::Rng;
use tracing::{info, warn};

const DEFAULT_ADMIN_EMAIL: &str = "admin@account-service.local";

/// Create the application state with default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    info!("Storage backend: {:?}", config.storage.backend);

    let user_service = create_user_service(config).await?;
    let jwt_service = create_jwt_service_from_secret(config);

    create_initial_management_user(user_service.as_ref()).await?;

    Ok(AppState::new(user_service, jwt_service))
}

async fn create_user_service(config: &AppConfig) -> anyhow::Result<Arc<dyn UserServiceTrait>> {
    let hasher = Arc::new(Argon2Hasher::new());

    match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory account storage");
            let repository = Arc::new(InMemoryUserRepository::new());
            Ok(Arc::new(UserService::new(repository, hasher)))
        }
        StorageBackend::Postgres => {
            let database_url = config
                .storage
                .database_url
                .clone()
                .or_else(|| std::env::var("DATABASE_URL").ok())
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "storage.database_url or DATABASE_URL is required for the postgres backend"
                    )
                })?;

            let mut pg_config = PostgresConfig::new(database_url);
            if let Some(max) = config.storage.max_connections {
                pg_config = pg_config.with_max_connections(max);
            }

            info!("Connecting to PostgreSQL...");
            let pool = connect_pool(&pg_config).await?;
            run_user_migrations(&pool).await?;

            let repository = Arc::new(PostgresUserRepository::new(pool));
            Ok(Arc::new(UserService::new(repository, hasher)))
        }
    }
}

fn create_jwt_service_from_secret(config: &AppConfig) -> Arc<dyn JwtGenerator> {
    let jwt_secret = config
        .auth
        .jwt_secret
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| std::env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()))
        .unwrap_or_else(|| {
            warn!(
                "No auth.jwt_secret or JWT_SECRET configured. Generating random secret. \
                Issued tokens will NOT survive a restart."
            );
            generate_random_string(48)
        });

    Arc::new(JwtService::new(JwtConfig::new(jwt_secret)))
}

fn generate_random_string(len: usize) -> String {
    use rand::distributions::Alphanumeric;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Create a management account if none exists
///
/// The email comes from `ADMIN_EMAIL` and the password from
/// `ADMIN_DEFAULT_PASSWORD`; a generated password is logged once.
async fn create_initial_management_user(user_service: &dyn UserServiceTrait) -> anyhow::Result<()> {
    if !user_service.list_by_role(Role::Management).await?.is_empty() {
        return Ok(());
    }

    let email = std::env::var("ADMIN_EMAIL")
        .ok()
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string());

    let (password, is_default) = match std::env::var("ADMIN_DEFAULT_PASSWORD") {
        Ok(p) if !p.is_empty() => (p, true),
        _ => (generate_random_string(16), false),
    };

    let request = RegisterUserRequest {
        name: "Administrator".to_string(),
        email: email.clone(),
        password: password.clone(),
        address: None,
    };

    match user_service
        .create_with_roles(request, Roles::from([Role::Staff, Role::Management]))
        .await
    {
        Ok(_) => {}
        Err(DomainError::Conflict { .. }) => {
            warn!(
                email = %email,
                "Cannot create initial management account: email already registered"
            );
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    info!("===========================================");
    info!("Initial management account created!");
    info!("Email: {}", email);

    if is_default {
        info!("Password: (set via ADMIN_DEFAULT_PASSWORD)");
    } else {
        info!("Password: {}", password);
    }

    info!("===========================================");

    Ok(())
}
