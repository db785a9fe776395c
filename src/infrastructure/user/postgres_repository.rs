//! PostgreSQL user repository implementation

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::user::{Role, Roles, User, UserId, UserRepository};
use crate::domain::DomainError;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, address, roles, version, created_at, updated_at";

/// PostgreSQL implementation of UserRepository
///
/// Email uniqueness is backed by a unique index, and updates only apply when
/// the stored version still matches.
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: &UserId) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check user: {}", e)))
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get user: {}", e)))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get user by email: {}", e)))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, address, roles,
                               version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.name())
        .bind(user.email())
        .bind(user.password_hash())
        .bind(user.address())
        .bind(roles_to_strings(user.roles()))
        .bind(user.version())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "create"))?;

        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $3, email = $4, password_hash = $5, address = $6, roles = $7,
                updated_at = $8, version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.version())
        .bind(user.name())
        .bind(user.email())
        .bind(user.password_hash())
        .bind(user.address())
        .bind(roles_to_strings(user.roles()))
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "update"))?;

        if result.rows_affected() == 0 {
            if self.exists(user.id()).await? {
                return Err(DomainError::conflict("User was modified concurrently"));
            }
            return Err(DomainError::not_found(format!("User '{}' not found", user.id())));
        }

        let mut updated = user.clone();
        updated.bump_version();
        Ok(updated)
    }

    async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete user: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users WHERE $1 = ANY(roles) ORDER BY created_at",
            USER_COLUMNS
        ))
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list users: {}", e)))?;

        rows.iter().map(row_to_user).collect()
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count users: {}", e)))?;

        Ok(count as usize)
    }
}

fn map_write_error(e: sqlx::Error, action: &str) -> DomainError {
    let is_unique_violation = e
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);

    if is_unique_violation {
        DomainError::conflict("Email already in use.")
    } else {
        DomainError::storage(format!("Failed to {} user: {}", action, e))
    }
}

fn roles_to_strings(roles: &Roles) -> Vec<String> {
    roles.iter().map(|r| r.as_str().to_string()).collect()
}

fn strings_to_roles(tags: Vec<String>) -> Result<Roles, DomainError> {
    tags.iter()
        .map(|tag| {
            tag.parse::<Role>()
                .map_err(|e| DomainError::storage(format!("Invalid role in database: {}", e)))
        })
        .collect()
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> Result<User, DomainError> {
    let column_error =
        |e: sqlx::Error| DomainError::storage(format!("Failed to read user row: {}", e));

    let id: Uuid = row.try_get("id").map_err(column_error)?;
    let roles: Vec<String> = row.try_get("roles").map_err(column_error)?;

    Ok(User::restore(
        UserId::from(id),
        row.try_get("name").map_err(column_error)?,
        row.try_get("email").map_err(column_error)?,
        row.try_get("password_hash").map_err(column_error)?,
        row.try_get("address").map_err(column_error)?,
        strings_to_roles(roles)?,
        row.try_get("version").map_err(column_error)?,
        row.try_get("created_at").map_err(column_error)?,
        row.try_get("updated_at").map_err(column_error)?,
    ))
}
