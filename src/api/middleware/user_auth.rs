//! Caller authentication using `Authorization: JWT <token>`

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::user::Caller;
use crate::domain::DomainError;

/// Extractor that requires a valid token
///
/// The caller's identity and roles come from the verified claims alone;
/// routes that act on a stored account load it themselves.
#[derive(Debug, Clone)]
pub struct RequireUser(pub Caller);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_jwt_token(&parts.headers)?;

        let caller = state
            .jwt_service
            .validate(&token)
            .and_then(|claims| claims.caller())?;

        debug!(user_id = %caller.id, "Authenticated caller");

        Ok(RequireUser(caller))
    }
}

/// Extract the token from an `Authorization: JWT <token>` header
///
/// The scheme is matched case-insensitively.
pub fn extract_jwt_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let Some(auth_header) = headers.get(header::AUTHORIZATION) else {
        return Err(DomainError::unauthorized("Missing Authorization header").into());
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| DomainError::unauthorized("Invalid Authorization header encoding"))?;

    let (scheme, token) = auth_str
        .split_once(' ')
        .ok_or_else(|| DomainError::unauthorized("Malformed Authorization header"))?;

    if !scheme.eq_ignore_ascii_case("JWT") {
        return Err(DomainError::unauthorized("Unsupported Authorization scheme").into());
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(DomainError::unauthorized("Empty token").into());
    }

    Ok(token.to_string())
}
