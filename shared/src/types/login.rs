use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Login wire types
// ---------------------------------------------------------------------------

/// Body POSTed to `/api/login`.
///
/// The successful response is deliberately NOT modeled as a struct: the
/// backend's user payload is loose by design (extra fields, optional
/// `twofa_required`), so it is carried as raw `serde_json::Value` and
/// normalized on read via [`crate::types::derive_user`].
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// ---------------------------------------------------------------------------
// Login errors
// ---------------------------------------------------------------------------

/// Error codes for login, as the UI consumes them.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginError {
    InvalidCredentials,
    MissingField(String),
    ServiceUnavailable,
}

impl LoginError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }

    pub fn to_message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Invalid username or password".to_string(),
            Self::MissingField(field) => format!("Missing required field: {}", field),
            Self::ServiceUnavailable => {
                "Sign-in service is unavailable, please try again".to_string()
            }
        }
    }
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.to_code(), self.to_message())
    }
}

impl std::error::Error for LoginError {}
