//! The 2FA route checkpoint.
//!
//! One pure decision function instead of per-page gating logic, so the
//! policy has one implementation and one test suite. [`decide`] runs on
//! every reactive dependency change — path, session, storage-driven flag —
//! not just on mount, so an enablement toggled in another tab gates this
//! tab's next navigation.
//!
//! Deliberately narrow: absence of a session does NOT redirect to sign-in
//! here. Page-level guards own that; this gate is only the 2FA checkpoint
//! once a session exists.

use serde_json::Value;

use shared::types::AppUser;

use crate::session::SessionStore;
use crate::storage::{TWOFA_PASSED_KEY, TabStore};

/// Where blocked navigations are sent.
pub const VERIFY_PATH: &str = "/verify-2fa";

/// Auth surfaces that must always render, or redirects would loop.
pub const EXEMPT_PATHS: [&str; 4] = ["/sign-in", "/sign-up", "/forgot-password", VERIFY_PATH];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    RedirectTo(String),
}

/// Decide whether a navigation to `path` may proceed.
///
/// Pure: same inputs, same answer, no IO.
pub fn decide(
    path: &str,
    session: Option<&AppUser>,
    twofa_required: bool,
    twofa_passed: bool,
) -> GateDecision {
    let path = normalize(path);

    if EXEMPT_PATHS.iter().any(|exempt| *exempt == path) {
        return GateDecision::Allow;
    }

    if session.is_some() && twofa_required && !twofa_passed {
        return GateDecision::RedirectTo(VERIFY_PATH.to_string());
    }

    GateDecision::Allow
}

/// Whether 2FA applies to the current session: the login payload said so,
/// or the durable mirror flag is set (fallback for payloads that omit
/// `twofa_required`). No session, no requirement.
pub fn required_for(raw_session: Option<&Value>, persisted_enabled: bool) -> bool {
    match raw_session {
        None => false,
        Some(raw) => {
            raw.get("twofa_required")
                .and_then(Value::as_bool)
                .unwrap_or(false)
                || persisted_enabled
        }
    }
}

/// Convenience for callers holding the live handles: reads the session
/// and both flags fresh (no cached derived values) and runs [`decide`].
pub fn evaluate(path: &str, sessions: &SessionStore, tab: &TabStore) -> GateDecision {
    let raw = sessions.get_raw();
    let required = required_for(raw.as_ref(), sessions.twofa_enabled_flag());
    let user = sessions.get_user();
    decide(path, user.as_ref(), required, tab.flag(TWOFA_PASSED_KEY))
}

/// Trailing slash and query/fragment noise must not bypass the gate.
fn normalize(path: &str) -> &str {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or(path);
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_query_and_trailing_slash() {
        assert_eq!(normalize("/verify-2fa/"), "/verify-2fa");
        assert_eq!(normalize("/sign-in?next=%2Fdashboard"), "/sign-in");
        assert_eq!(normalize("/dashboard#cameras"), "/dashboard");
        assert_eq!(normalize("/"), "/");
    }

    #[test]
    fn required_for_needs_a_session() {
        assert!(!required_for(None, true));
    }

    #[test]
    fn required_for_prefers_payload_then_flag() {
        let says_yes = serde_json::json!({ "twofa_required": true });
        let silent = serde_json::json!({ "username": "ops1" });
        assert!(required_for(Some(&says_yes), false));
        assert!(required_for(Some(&silent), true));
        assert!(!required_for(Some(&silent), false));
    }
}
