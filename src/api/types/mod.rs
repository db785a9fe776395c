//! HTTP request and response types

pub mod envelope;
pub mod error;
pub mod json;

pub use envelope::{Envelope, UserResponse};
pub use error::ApiError;
pub use json::Json;
