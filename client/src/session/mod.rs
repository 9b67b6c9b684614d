//! Durable holder of the current identity record.
//!
//! The raw backend payload is the source of truth and is what gets
//! persisted; [`shared::types::derive_user`] runs on every read, so
//! observers always see freshly-derived display fields and never a stale
//! cached profile.

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{info, warn};

use shared::types::{AppUser, derive_user};

use crate::storage::{DurableStore, StorageError, StorageEvent, TWOFA_ENABLED_KEY, USER_KEY};

/// Process-wide session holder. Clones share the underlying durable
/// medium, modeling tabs on the same origin.
#[derive(Clone)]
pub struct SessionStore {
    durable: DurableStore,
}

impl SessionStore {
    pub fn new(durable: DurableStore) -> Self {
        Self { durable }
    }

    /// The signed-in user, display-ready, or `None` when signed out.
    ///
    /// Absent or malformed stored data is treated as "no session" — this
    /// never fails and never panics.
    pub fn get_user(&self) -> Option<AppUser> {
        self.get_raw().map(|raw| derive_user(&raw))
    }

    /// The raw persisted payload, for callers that need the loose backend
    /// fields (e.g. the gate's `twofa_required` hint). Must not leak past
    /// this layer into display code.
    pub fn get_raw(&self) -> Option<Value> {
        let stored = self.durable.get(USER_KEY)?;
        match serde_json::from_str::<Value>(&stored) {
            Ok(raw) if raw.is_object() => Some(raw),
            Ok(_) => {
                warn!("Stored session payload is not an object, treating as signed out");
                None
            }
            Err(e) => {
                warn!("Stored session payload is malformed, treating as signed out: {}", e);
                None
            }
        }
    }

    /// Persist the RAW payload from a login response or profile edit and
    /// announce the change. Derivation happens on read, not here.
    pub fn set_user(&self, raw: &Value) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(raw)?;
        self.durable.set(USER_KEY, serialized)?;
        info!("Session updated");
        Ok(())
    }

    /// Sign out: remove the persisted payload and announce the change.
    pub fn clear_user(&self) -> Result<(), StorageError> {
        self.durable.remove(USER_KEY)?;
        info!("Session cleared");
        Ok(())
    }

    /// The session-change channel. Carries every durable storage change
    /// (same tab and cross-tab alike); use [`is_session_event`] to pick
    /// out sign-in/sign-out/profile writes.
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.durable.subscribe()
    }

    /// Last known server-side 2FA enablement, from the durable mirror
    /// flag. Fallback source of truth only — a fresh `fetch_state` answer
    /// always overwrites it.
    pub fn twofa_enabled_flag(&self) -> bool {
        self.durable.flag(TWOFA_ENABLED_KEY)
    }
}

/// Whether a storage event is a session change (sign-in, sign-out or
/// profile write) as opposed to some other durable key.
pub fn is_session_event(event: &StorageEvent) -> bool {
    event.key == USER_KEY
}
