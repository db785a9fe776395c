//! JWT token generation and validation

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::user::{Caller, Roles, User, UserId};
use crate::domain::DomainError;

/// Lifetime of an issued token. Tokens are never refreshed.
pub const TOKEN_TTL_SECS: i64 = 1800;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Roles held when the token was issued
    #[serde(rename = "hasRoles")]
    pub roles: Roles,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
}

impl JwtClaims {
    /// Create new claims for a user
    pub fn new(user: &User, ttl_secs: i64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::seconds(ttl_secs);

        Self {
            sub: user.id().to_string(),
            roles: user.roles().clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        }
    }

    /// The caller these claims identify
    pub fn caller(&self) -> Result<Caller, DomainError> {
        let id = UserId::parse(&self.sub)
            .map_err(|_| DomainError::unauthorized("Token subject is not a user id"))?;
        Ok(Caller::new(id, self.roles.clone()))
    }
}

/// Configuration for JWT service
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared HS256 secret
    pub secret: String,
    /// Token lifetime in seconds
    pub ttl_secs: i64,
}

impl JwtConfig {
    /// Create a configuration with the standard token lifetime
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs: TOKEN_TTL_SECS,
        }
    }
}

/// Trait for JWT operations
pub trait JwtGenerator: Send + Sync + Debug {
    /// Generate a JWT token for a user
    fn generate(&self, user: &User) -> Result<String, DomainError>;

    /// Validate a JWT token and return the claims
    fn validate(&self, token: &str) -> Result<JwtClaims, DomainError>;

    /// Get the token lifetime in seconds
    fn expires_in_secs(&self) -> i64;
}

/// HS256 JWT service
#[derive(Clone)]
pub struct JwtService {
    ttl_secs: i64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("ttl_secs", &self.ttl_secs)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Create a new JWT service with the given configuration
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            ttl_secs: config.ttl_secs,
            encoding_key,
            decoding_key,
            validation,
        }
    }
}

impl JwtGenerator for JwtService {
    fn generate(&self, user: &User) -> Result<String, DomainError> {
        let claims = JwtClaims::new(user, self.ttl_secs);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| DomainError::internal(format!("Failed to generate JWT: {}", e)))
    }

    fn validate(&self, token: &str) -> Result<JwtClaims, DomainError> {
        let token_data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| DomainError::unauthorized(format!("Invalid JWT: {}", e)))?;

        Ok(token_data.claims)
    }

    fn expires_in_secs(&self) -> i64 {
        self.ttl_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::Role;

    fn create_test_user() -> User {
        User::new(
            UserId::generate(),
            "Test User",
            "test@email.com",
            "hashed_password",
            None,
            Roles::from([Role::Staff, Role::CanBuy]),
        )
    }

    fn create_service() -> JwtService {
        JwtService::new(JwtConfig::new("test-secret-key-12345"))
    }

    fn encode_claims(claims: &JwtClaims, secret: &[u8]) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn test_generate_and_validate() {
        let service = create_service();
        let user = create_test_user();

        let token = service.generate(&user).unwrap();
        assert!(!token.is_empty());

        let claims = service.validate(&token).unwrap();
        assert_eq!(claims.sub, user.id().to_string());
        assert_eq!(&claims.roles, user.roles());
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn test_claims_wire_format() {
        let user = create_test_user();
        let claims = JwtClaims::new(&user, TOKEN_TTL_SECS);

        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["hasRoles"], serde_json::json!(["isStaff", "canBuy"]));
        assert_eq!(json["sub"], user.id().to_string());
    }

    #[test]
    fn test_claims_caller() {
        let user = create_test_user();
        let caller = JwtClaims::new(&user, TOKEN_TTL_SECS).caller().unwrap();

        assert!(caller.is(user.id()));
        assert!(caller.has_role(Role::Staff));
        assert!(!caller.has_role(Role::Management));
    }

    #[test]
    fn test_claims_caller_bad_subject() {
        let user = create_test_user();
        let mut claims = JwtClaims::new(&user, TOKEN_TTL_SECS);
        claims.sub = "not-a-uuid".to_string();

        assert!(matches!(claims.caller(), Err(DomainError::Unauthorized { .. })));
    }

    #[test]
    fn test_invalid_token() {
        let service = create_service();

        let result = service.validate("invalid-token");
        assert!(matches!(result, Err(DomainError::Unauthorized { .. })));
    }

    #[test]
    fn test_wrong_secret() {
        let service1 = JwtService::new(JwtConfig::new("secret-1"));
        let service2 = JwtService::new(JwtConfig::new("secret-2"));

        let token = service1.generate(&create_test_user()).unwrap();

        assert!(service2.validate(&token).is_err());
    }

    #[test]
    fn test_tampered_token() {
        let service = create_service();
        let user = create_test_user();
        let token = service.generate(&user).unwrap();

        let mut forged = JwtClaims::new(&user, TOKEN_TTL_SECS);
        forged.roles = Roles::from([Role::Management]);
        let forged_token = encode_claims(&forged, b"test-secret-key-12345");
        let forged_payload = forged_token.split('.').nth(1).unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = forged_payload;
        let tampered = parts.join(".");

        assert!(service.validate(&tampered).is_err());
    }

    #[test]
    fn test_expired_token() {
        let service = create_service();
        let user = create_test_user();

        let past_time = Utc::now() - Duration::hours(1);
        let claims = JwtClaims {
            sub: user.id().to_string(),
            roles: user.roles().clone(),
            iat: (past_time - Duration::seconds(TOKEN_TTL_SECS)).timestamp(),
            exp: past_time.timestamp(),
        };
        let token = encode_claims(&claims, b"test-secret-key-12345");

        assert!(matches!(
            service.validate(&token),
            Err(DomainError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_expires_in() {
        assert_eq!(create_service().expires_in_secs(), 1800);
    }
}
