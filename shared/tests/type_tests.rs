/// Integration-level tests for the `shared` crate.
///
/// Each section tests one module; unit tests that are tightly coupled to
/// private helpers live inside the modules themselves (see `#[cfg(test)]`
/// blocks in `user.rs` and `config.rs`).
// ---------------------------------------------------------------------------
// User derivation
// ---------------------------------------------------------------------------
#[cfg(test)]
mod derive_user_tests {
    use serde_json::{Value, json};
    use shared::types::*;

    #[test]
    fn derivation_is_total_on_malformed_input() {
        let cases = [
            json!(null),
            json!(true),
            json!(0.5),
            json!(""),
            json!([]),
            json!({}),
            json!({ "username": null }),
            json!({ "username": [], "email": 12, "name": {} }),
        ];
        for raw in cases {
            let u = derive_user(&raw);
            assert!(!u.initials.is_empty(), "empty initials for {raw}");
            assert!(!u.role.is_empty());
            assert!(!u.email.is_empty());
        }
    }

    #[test]
    fn derivation_is_idempotent_on_its_own_output() {
        let raws = [
            json!({ "username": "jane.doe@example.com", "twofa_required": true }),
            json!({ "username": "site_manager", "role": "Admin" }),
            json!({ "email": "ops@example.com", "name": "Dana K" }),
            json!({}),
        ];
        for raw in raws {
            let once = derive_user(&raw);
            let reapplied = derive_user(&serde_json::to_value(&once).unwrap());
            assert_eq!(once, reapplied, "not a fixed point for {raw}");
        }
    }

    #[test]
    fn email_falls_back_to_email_shaped_username() {
        let u = derive_user(&json!({ "username": "pat@example.org" }));
        assert_eq!(u.email, "pat@example.org");
    }

    #[test]
    fn email_falls_back_to_guest_sentinel() {
        let u = derive_user(&json!({ "username": "pat" }));
        assert_eq!(u.email, GUEST_EMAIL);
    }

    #[test]
    fn initials_are_at_most_two_characters() {
        let u = derive_user(&json!({ "name": "Anna Maria Luisa de Medici" }));
        assert_eq!(u.initials, "AM");
        assert!(u.initials.chars().count() <= 2);
    }

    #[test]
    fn opaque_fields_do_not_leak_into_the_profile() {
        let raw = json!({
            "username": "ops1",
            "twofa_required": true,
            "tenant": "building-7"
        });
        let u = derive_user(&raw);
        let as_value: Value = serde_json::to_value(&u).unwrap();
        assert!(as_value.get("twofa_required").is_none());
        assert!(as_value.get("tenant").is_none());
    }
}

// ---------------------------------------------------------------------------
// 2FA types
// ---------------------------------------------------------------------------

#[cfg(test)]
mod twofa_tests {
    use shared::types::*;

    #[test]
    fn all_error_variants_have_non_empty_codes_and_messages() {
        let variants = [
            TwoFaError::InvalidCode,
            TwoFaError::SetupRequired,
            TwoFaError::NoQr,
            TwoFaError::AlreadyEnabled,
            TwoFaError::Unavailable,
        ];
        for e in &variants {
            assert!(!e.to_code().is_empty());
            assert!(!e.to_message().is_empty());
        }
    }

    #[test]
    fn all_error_codes_unique() {
        let codes = [
            TwoFaError::InvalidCode.to_code(),
            TwoFaError::SetupRequired.to_code(),
            TwoFaError::NoQr.to_code(),
            TwoFaError::AlreadyEnabled.to_code(),
            TwoFaError::Unavailable.to_code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "duplicate 2FA error codes");
    }

    #[test]
    fn wire_codes_map_to_domain_errors() {
        assert_eq!(
            TwoFaError::from_wire("invalid_code"),
            Some(TwoFaError::InvalidCode)
        );
        assert_eq!(
            TwoFaError::from_wire("setup_required"),
            Some(TwoFaError::SetupRequired)
        );
        assert_eq!(TwoFaError::from_wire("no_qr"), Some(TwoFaError::NoQr));
    }

    #[test]
    fn unknown_wire_codes_map_to_none() {
        assert_eq!(TwoFaError::from_wire("quota_exceeded"), None);
        assert_eq!(TwoFaError::from_wire(""), None);
    }

    #[test]
    fn status_setup_pending_defaults_false() {
        let s: TwoFaStatus = serde_json::from_str(r#"{"enabled": true}"#).unwrap();
        assert!(s.enabled);
        assert!(!s.setup_pending);
    }

    #[test]
    fn setup_payload_round_trips() {
        let json = r#"{"otpauth_url":"otpauth://totp/x?secret=ABC","qr_svg":"<svg/>"}"#;
        let s: TwoFaSetup = serde_json::from_str(json).unwrap();
        assert!(s.otpauth_url.starts_with("otpauth://"));
        assert_eq!(s.qr_svg, "<svg/>");
    }

    #[test]
    fn error_display_shows_code() {
        let out = format!("{}", TwoFaError::InvalidCode);
        assert!(out.contains("INVALID_CODE"));
    }
}

// ---------------------------------------------------------------------------
// Login types
// ---------------------------------------------------------------------------

#[cfg(test)]
mod login_tests {
    use shared::types::*;

    #[test]
    fn login_request_serializes_both_fields() {
        let r = LoginRequest {
            username: "ops1".into(),
            password: "hunter2".into(),
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["username"], "ops1");
        assert_eq!(json["password"], "hunter2");
    }

    #[test]
    fn all_login_error_codes_are_unique() {
        let codes = [
            LoginError::InvalidCredentials.to_code(),
            LoginError::MissingField("x".into()).to_code(),
            LoginError::ServiceUnavailable.to_code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len());
    }

    #[test]
    fn missing_field_message_includes_field_name() {
        let e = LoginError::MissingField("password".into());
        assert!(e.to_message().contains("password"));
    }
}

// ---------------------------------------------------------------------------
// JSON error type
// ---------------------------------------------------------------------------

#[cfg(test)]
mod json_error_tests {
    use shared::types::*;

    #[test]
    fn structured_body_parses() {
        let b = ErrorBody::parse(br#"{"error":"invalid_code"}"#).unwrap();
        assert_eq!(b.error, "invalid_code");
    }

    #[test]
    fn unstructured_body_yields_none() {
        assert!(ErrorBody::parse(b"Internal Server Error").is_none());
        assert!(ErrorBody::parse(b"").is_none());
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

#[cfg(test)]
mod config_tests {
    use shared::types::*;

    #[test]
    fn api_url_joins_without_double_slash() {
        let api = ApiConfig {
            base_url: "http://127.0.0.1:1337/".into(),
            request_timeout_secs: 5,
        };
        assert_eq!(api.url("/api/2fa"), "http://127.0.0.1:1337/api/2fa");
    }

    #[test]
    fn request_timeout_defaults_to_five_seconds() {
        let toml = r#"
            [api]
            base_url = "http://localhost:1337"

            [storage]
            state_file = "state.json"
        "#;
        let c: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(c.api.request_timeout_secs, 5);
    }
}
