//! Role tags and the role-transition rules
//!
//! Roles travel over the wire and in token claims as the camelCase tags
//! (`isCustomer`, `notApproved`, ...). Internally they are a closed enum kept
//! in an ordered, duplicate-free [`Roles`] set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single role tag on a user record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "isCustomer")]
    Customer,
    #[serde(rename = "notApproved")]
    NotApproved,
    #[serde(rename = "newCustomer")]
    NewCustomer,
    #[serde(rename = "isStaff")]
    Staff,
    #[serde(rename = "isManagement")]
    Management,
    #[serde(rename = "canBuy")]
    CanBuy,
    #[serde(rename = "canMessage")]
    CanMessage,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Customer,
        Role::NotApproved,
        Role::NewCustomer,
        Role::Staff,
        Role::Management,
        Role::CanBuy,
        Role::CanMessage,
    ];

    /// Permissions whose presence is fully replaced by `edit_permissions`
    pub const EDITABLE_PERMISSIONS: [Role; 2] = [Role::CanBuy, Role::CanMessage];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "isCustomer",
            Self::NotApproved => "notApproved",
            Self::NewCustomer => "newCustomer",
            Self::Staff => "isStaff",
            Self::Management => "isManagement",
            Self::CanBuy => "canBuy",
            Self::CanMessage => "canMessage",
        }
    }

    pub fn is_editable_permission(&self) -> bool {
        Self::EDITABLE_PERMISSIONS.contains(self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the known role tags
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown role tag: '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Ordered set of roles
///
/// Membership is what authorization looks at; insertion order is kept so the
/// stored list stays stable across edits. Inserting a role that is already
/// present is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Role>", into = "Vec<Role>")]
pub struct Roles(Vec<Role>);

impl Roles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roles given to a freshly registered account
    pub fn customer_default() -> Self {
        Self(vec![Role::Customer, Role::NotApproved])
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Add a role at the end. Returns false if it was already present.
    pub fn insert(&mut self, role: Role) -> bool {
        if self.contains(role) {
            return false;
        }
        self.0.push(role);
        true
    }

    /// Remove a role. Returns false if it was not present.
    pub fn remove(&mut self, role: Role) -> bool {
        let before = self.0.len();
        self.0.retain(|r| *r != role);
        self.0.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[Role] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flip the buy-approval state.
    ///
    /// `newCustomer` is always dropped. If `notApproved` was present it is
    /// removed (approve), otherwise it is added (revoke). Returns true when
    /// the account ends up approved.
    pub fn toggle_buy(&mut self) -> bool {
        self.remove(Role::NewCustomer);

        if self.remove(Role::NotApproved) {
            true
        } else {
            self.insert(Role::NotApproved);
            false
        }
    }

    /// Replace the editable permissions with the requested ones.
    ///
    /// Only `canBuy` and `canMessage` are considered; every other requested
    /// role is ignored and every other held role is left in place.
    pub fn edit_permissions<I>(&mut self, requested: I)
    where
        I: IntoIterator<Item = Role>,
    {
        let requested: Vec<Role> = requested.into_iter().collect();

        for permission in Role::EDITABLE_PERMISSIONS {
            self.remove(permission);

            if requested.contains(&permission) {
                self.insert(permission);
            }
        }
    }
}

impl From<Vec<Role>> for Roles {
    fn from(roles: Vec<Role>) -> Self {
        roles.into_iter().collect()
    }
}

impl From<Roles> for Vec<Role> {
    fn from(roles: Roles) -> Self {
        roles.0
    }
}

impl FromIterator<Role> for Roles {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        let mut roles = Roles::new();
        for role in iter {
            roles.insert(role);
        }
        roles
    }
}

impl<const N: usize> From<[Role; N]> for Roles {
    fn from(roles: [Role; N]) -> Self {
        roles.into_iter().collect()
    }
}
