//! User validation utilities

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Errors that can occur during user validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("Email format is incorrect.")]
    InvalidEmail,

    #[error("Email exceeds maximum length of {0} characters")]
    EmailTooLong(usize),

    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Name exceeds maximum length of {0} characters")]
    NameTooLong(usize),

    #[error("Password cannot be empty")]
    EmptyPassword,

    #[error("Password exceeds maximum length of {0} characters")]
    PasswordTooLong(usize),

    #[error("Address exceeds maximum length of {0} characters")]
    AddressTooLong(usize),
}

const MAX_EMAIL_LENGTH: usize = 254;
const MAX_NAME_LENGTH: usize = 100;
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_ADDRESS_LENGTH: usize = 255;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Validate an email address
///
/// One `@`, no whitespace, and a dot somewhere in the domain part.
pub fn validate_email(email: &str) -> Result<(), UserValidationError> {
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(UserValidationError::EmailTooLong(MAX_EMAIL_LENGTH));
    }

    if !EMAIL_PATTERN.is_match(email) {
        return Err(UserValidationError::InvalidEmail);
    }

    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), UserValidationError> {
    if name.trim().is_empty() {
        return Err(UserValidationError::EmptyName);
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(UserValidationError::NameTooLong(MAX_NAME_LENGTH));
    }

    Ok(())
}

/// Validate a password (non-empty, at most 128 bytes)
pub fn validate_password(password: &str) -> Result<(), UserValidationError> {
    if password.is_empty() {
        return Err(UserValidationError::EmptyPassword);
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(UserValidationError::PasswordTooLong(MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

pub fn validate_address(address: &str) -> Result<(), UserValidationError> {
    if address.chars().count() > MAX_ADDRESS_LENGTH {
        return Err(UserValidationError::AddressTooLong(MAX_ADDRESS_LENGTH));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(validate_email("test@email.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.org").is_ok());
    }

    #[test]
    fn test_invalid_emails() {
        assert_eq!(validate_email(""), Err(UserValidationError::InvalidEmail));
        assert_eq!(validate_email("test"), Err(UserValidationError::InvalidEmail));
        assert_eq!(validate_email("test@email"), Err(UserValidationError::InvalidEmail));
        assert_eq!(validate_email("te st@email.com"), Err(UserValidationError::InvalidEmail));
        assert_eq!(validate_email("a@b@c.com"), Err(UserValidationError::InvalidEmail));
    }

    #[test]
    fn test_email_too_long() {
        let email = format!("{}@email.com", "a".repeat(250));
        assert_eq!(
            validate_email(&email),
            Err(UserValidationError::EmailTooLong(254))
        );
    }

    #[test]
    fn test_name_rules() {
        assert!(validate_name("Jane Doe").is_ok());
        assert_eq!(validate_name("   "), Err(UserValidationError::EmptyName));
        assert_eq!(
            validate_name(&"n".repeat(101)),
            Err(UserValidationError::NameTooLong(100))
        );
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("x").is_ok());
        assert_eq!(validate_password(""), Err(UserValidationError::EmptyPassword));
        assert_eq!(
            validate_password(&"p".repeat(129)),
            Err(UserValidationError::PasswordTooLong(128))
        );
    }

    #[test]
    fn test_address_rules() {
        assert!(validate_address("").is_ok());
        assert!(validate_address("12 Main Street").is_ok());
        assert_eq!(
            validate_address(&"a".repeat(256)),
            Err(UserValidationError::AddressTooLong(255))
        );
    }
}
