use serde::{Deserialize, Serialize};

/// Structured error body the remote service attaches to non-2xx responses,
/// e.g. `{"error": "invalid_code"}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    /// Best-effort parse of a response body. `None` means the failure had
    /// no structured shape and must be treated as a transport error.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }
}
