use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// 2FA wire types
// ---------------------------------------------------------------------------

/// Response of `GET /api/2fa` — the server-owned enrollment view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TwoFaStatus {
    pub enabled: bool,
    /// A secret has been issued but not yet confirmed by a verify call.
    #[serde(default)]
    pub setup_pending: bool,
}

/// Response of `POST /api/2fa/setup` and `GET /api/2fa/qr`.
///
/// While an enrollment is pending, refetching MUST return the same
/// `otpauth_url` — a fresh secret would invalidate the authenticator entry
/// the user already scanned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoFaSetup {
    pub otpauth_url: String,
    pub qr_svg: String,
}

/// Body POSTed to `/api/2fa/verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyCodeData {
    pub code: String,
}

/// Generic `{"status": "..."}` acknowledgement body.
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

// ---------------------------------------------------------------------------
// 2FA errors
// ---------------------------------------------------------------------------

/// Every way a 2FA operation can fail, as the UI consumes it.
///
/// `InvalidCode`, `SetupRequired` and `NoQr` are expected, recoverable
/// conditions — the settings/verify views re-prompt. `Unavailable` covers
/// the whole transport tier (network failure, timeout, non-2xx without a
/// structured body); retry is user-initiated, never automatic.
#[derive(Debug, Clone, PartialEq)]
pub enum TwoFaError {
    InvalidCode,
    SetupRequired,
    NoQr,
    AlreadyEnabled,
    Unavailable,
}

impl TwoFaError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::InvalidCode => "INVALID_CODE",
            Self::SetupRequired => "SETUP_REQUIRED",
            Self::NoQr => "NO_QR",
            Self::AlreadyEnabled => "ALREADY_ENABLED",
            Self::Unavailable => "TWOFA_UNAVAILABLE",
        }
    }

    pub fn to_message(&self) -> String {
        match self {
            Self::InvalidCode => "That code is not valid, please try again".to_string(),
            Self::SetupRequired => "Start two-factor setup before verifying".to_string(),
            Self::NoQr => "No two-factor enrollment is pending".to_string(),
            Self::AlreadyEnabled => "Two-factor authentication is already enabled".to_string(),
            Self::Unavailable => {
                "Two-factor service is unavailable, please try again".to_string()
            }
        }
    }

    /// Map a structured `{"error": code}` body from the remote service.
    /// Unknown codes return `None`; the transport treats those as
    /// [`TwoFaError::Unavailable`].
    pub fn from_wire(code: &str) -> Option<Self> {
        match code {
            "invalid_code" => Some(Self::InvalidCode),
            "setup_required" => Some(Self::SetupRequired),
            "no_qr" => Some(Self::NoQr),
            _ => None,
        }
    }
}

impl fmt::Display for TwoFaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.to_code(), self.to_message())
    }
}

impl std::error::Error for TwoFaError {}
