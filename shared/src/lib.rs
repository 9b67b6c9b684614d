//! Common library for the dashboard session core.
//!
//! Holds everything both the client core and its tests agree on: the wire
//! types spoken to the remote auth/2FA service, the identity normalization
//! applied to loose login payloads, and the TOML configuration layer.

pub mod config;
pub mod types;
