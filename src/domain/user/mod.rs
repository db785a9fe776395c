//! User domain
//!
//! This module provides domain types and traits for user accounts,
//! including the role model, access rules, validation, and repository traits.

pub mod access;
mod entity;
mod repository;
mod role;
mod validation;

pub use access::Caller;
pub use entity::{User, UserId};
pub use repository::UserRepository;
pub use role::{Role, Roles, UnknownRole};
pub use validation::{
    validate_address, validate_email, validate_name, validate_password, UserValidationError,
};

#[cfg(test)]
pub use repository::mock::MockUserRepository;
