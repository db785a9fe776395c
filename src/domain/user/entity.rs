//! User entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::{Role, Roles};
use crate::domain::DomainError;

/// Opaque user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from its string form
    pub fn parse(id: &str) -> Result<Self, DomainError> {
        Uuid::parse_str(id)
            .map(Self)
            .map_err(|_| DomainError::invalid_id(format!("'{}' is not a valid user id", id)))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    name: String,
    email: String,
    /// Argon2 password hash - never exposed in serialization
    #[serde(skip_serializing)]
    password_hash: String,
    address: Option<String>,
    roles: Roles,
    /// Incremented by the repository on every successful update
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with the given roles
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        address: Option<String>,
        roles: Roles,
    ) -> Self {
        let now = Utc::now();

        Self {
            id,
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            address,
            roles,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a user from stored fields
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: UserId,
        name: String,
        email: String,
        password_hash: String,
        address: Option<String>,
        roles: Roles,
        version: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            password_hash,
            address,
            roles,
            version,
            created_at,
            updated_at,
        }
    }

    // Getters

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn roles(&self) -> &Roles {
        &self.roles
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Mutators

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
        self.touch();
    }

    pub fn set_address(&mut self, address: Option<String>) {
        self.address = address;
        self.touch();
    }

    /// Flip buy approval; returns true when the account ends up approved
    pub fn toggle_buy(&mut self) -> bool {
        let approved = self.roles.toggle_buy();
        self.touch();
        approved
    }

    /// Replace `canBuy` / `canMessage` with the requested permissions
    pub fn edit_permissions<I>(&mut self, requested: I)
    where
        I: IntoIterator<Item = Role>,
    {
        self.roles.edit_permissions(requested);
        self.touch();
    }

    /// Advance the version after a successful write
    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
