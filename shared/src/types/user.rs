use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Derived user profile
// ---------------------------------------------------------------------------

/// Sentinel email used when neither an email field nor an email-shaped
/// username is present in the raw payload.
pub const GUEST_EMAIL: &str = "guest@localhost";

/// Display-ready user profile derived from a raw login/profile payload.
///
/// The raw payload is what gets persisted (the backend's contract is loose
/// by design); this struct is recomputed on every read via [`derive_user`]
/// and must never be stored as the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppUser {
    pub username: String,
    pub email: String,
    pub name: String,
    pub role: String,
    /// 1–2 uppercase characters for the avatar badge; never empty.
    pub initials: String,
    pub avatar: Option<String>,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Derive a display-ready [`AppUser`] from an arbitrary JSON payload.
///
/// Total and pure: any input — wrong type, missing fields, empty strings —
/// yields a usable profile with non-empty `initials`, and never panics.
///
/// Re-applying the derivation to its own (serialized) output is a fixed
/// point: every derived field survives a round trip unchanged.
pub fn derive_user(raw: &Value) -> AppUser {
    let username_field = str_field(raw, "username");
    let email_field = str_field(raw, "email");
    let name_field = str_field(raw, "name");

    let email = email_field
        .map(str::to_string)
        .or_else(|| {
            username_field
                .filter(|u| looks_like_email(u))
                .map(str::to_string)
        })
        .unwrap_or_else(|| GUEST_EMAIL.to_string());

    let username = username_field
        .or(email_field)
        .unwrap_or("guest")
        .to_string();

    let name = name_field.map(str::to_string).unwrap_or_else(|| {
        let base = username_field.unwrap_or(&email);
        name_tokens(local_part(base))
            .map(title_case)
            .collect::<Vec<_>>()
            .join(" ")
    });

    let initials = derive_initials(&name, &email);

    let role = str_field(raw, "role").unwrap_or("User").to_string();
    let avatar = str_field(raw, "avatar").map(str::to_string);

    AppUser {
        username,
        email,
        name,
        role,
        initials,
        avatar,
    }
}

/// First letter of up to the first two tokens of `name`, uppercased; falls
/// back to the email local part, then to `"G"`.
fn derive_initials(name: &str, email: &str) -> String {
    let source = if name.trim().is_empty() {
        local_part(email)
    } else {
        name
    };

    let initials: String = name_tokens(source)
        .filter_map(|tok| tok.chars().next())
        .take(2)
        .filter_map(|c| c.to_uppercase().next())
        .collect();

    if initials.is_empty() {
        "G".to_string()
    } else {
        initials
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Non-empty, trimmed string field lookup; `None` for anything else
/// (missing key, null, numbers, objects).
fn str_field<'a>(raw: &'a Value, key: &str) -> Option<&'a str> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Loose email shape check: one `@`, non-empty local part, dotted domain.
/// Deliberately not RFC-grade — it only decides whether a username can
/// stand in for a missing email field.
fn looks_like_email(s: &str) -> bool {
    let mut parts = s.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !s.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}

/// Everything before the `@`, or the whole string when there is none.
fn local_part(s: &str) -> &str {
    s.split('@').next().unwrap_or(s)
}

/// Split on whitespace and the `.`/`_`/`-` separators login systems use.
fn name_tokens(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| c.is_whitespace() || matches!(c, '.' | '_' | '-'))
        .filter(|tok| !tok.is_empty())
}

/// Uppercase the first character, leave the rest untouched (so acronyms
/// and already-cased names survive re-derivation).
fn title_case(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Unit tests (tightly coupled to the private helpers above)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn email_shape_accepts_plain_addresses() {
        assert!(looks_like_email("jane.doe@example.com"));
        assert!(looks_like_email("x@y.io"));
    }

    #[test]
    fn email_shape_rejects_garbage() {
        assert!(!looks_like_email("jane.doe"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("jane@localhost"));
        assert!(!looks_like_email("a@b@c.com"));
        assert!(!looks_like_email("jane doe@example.com"));
        assert!(!looks_like_email("jane@.com"));
    }

    #[test]
    fn title_case_preserves_interior_casing() {
        assert_eq!(title_case("mcAllister"), "McAllister");
        assert_eq!(title_case("JD"), "JD");
    }

    #[test]
    fn name_from_dotted_local_part() {
        let u = derive_user(&json!({ "username": "jane.doe@example.com" }));
        assert_eq!(u.name, "Jane Doe");
        assert_eq!(u.email, "jane.doe@example.com");
        assert_eq!(u.initials, "JD");
    }

    #[test]
    fn name_from_underscore_username() {
        let u = derive_user(&json!({ "username": "site_manager" }));
        assert_eq!(u.name, "Site Manager");
        assert_eq!(u.email, GUEST_EMAIL);
        assert_eq!(u.initials, "SM");
    }

    #[test]
    fn explicit_fields_win_over_derivation() {
        let u = derive_user(&json!({
            "username": "ops1",
            "email": "ops@example.com",
            "name": "Dana K",
            "role": "Admin",
            "avatar": "https://cdn.example.com/a.png"
        }));
        assert_eq!(u.email, "ops@example.com");
        assert_eq!(u.name, "Dana K");
        assert_eq!(u.role, "Admin");
        assert_eq!(u.initials, "DK");
        assert_eq!(u.avatar.as_deref(), Some("https://cdn.example.com/a.png"));
    }

    #[test]
    fn empty_object_yields_guest_profile() {
        let u = derive_user(&json!({}));
        assert_eq!(u.username, "guest");
        assert_eq!(u.email, GUEST_EMAIL);
        assert_eq!(u.initials, "G");
        assert_eq!(u.role, "User");
    }

    #[test]
    fn non_object_payloads_do_not_panic() {
        for raw in [
            json!(null),
            json!(42),
            json!("just a string"),
            json!([1, 2, 3]),
            json!({ "username": 17, "email": { "nested": true } }),
        ] {
            let u = derive_user(&raw);
            assert!(!u.initials.is_empty(), "initials empty for {raw}");
        }
    }

    #[test]
    fn whitespace_only_fields_are_treated_as_absent() {
        let u = derive_user(&json!({ "username": "   ", "name": "\t" }));
        assert_eq!(u.username, "guest");
        assert_eq!(u.initials, "G");
    }
}
