//! Storage media backing the session core.
//!
//! Two media with deliberately different lifetimes:
//!
//! - [`DurableStore`] — file-backed key/value store that survives restarts
//!   (the localStorage analog). Cloned handles model browser tabs on the
//!   same origin: they share the map, the backing file and the change
//!   channel, so a write in one handle is immediately readable from every
//!   other and additionally announced as a [`StorageEvent`].
//! - [`TabStore`] — in-memory store scoped to one instance (the
//!   sessionStorage analog). Holds the 2FA pass flag; never synchronized
//!   across handles, so a new tab always re-prompts.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Keys and sentinels
// ---------------------------------------------------------------------------

/// Durable key holding the serialized raw login/profile payload.
pub const USER_KEY: &str = "user";
/// Durable flag mirroring the last known server-side 2FA enablement.
pub const TWOFA_ENABLED_KEY: &str = "twofa_enabled";
/// Tab-scoped flag set after a successful verify in the current session.
pub const TWOFA_PASSED_KEY: &str = "twofa_passed";
/// Sentinel value marking a boolean flag as set.
pub const FLAG_SET: &str = "1";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Change events
// ---------------------------------------------------------------------------

/// Announcement of a durable write or removal.
///
/// One channel carries both the same-tab notification and the cross-tab
/// storage event, so there is a single source of truth for "did the stored
/// state change". Delivery is last-write-wins with no ordering guarantee
/// beyond the key's final value.
#[derive(Debug, Clone)]
pub struct StorageEvent {
    pub key: String,
    /// `None` on removal.
    pub new_value: Option<String>,
}

// ---------------------------------------------------------------------------
// Durable store
// ---------------------------------------------------------------------------

struct DurableInner {
    path: PathBuf,
    map: Mutex<HashMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
}

/// File-backed, process-shared key/value store.
#[derive(Clone)]
pub struct DurableStore {
    inner: Arc<DurableInner>,
}

impl DurableStore {
    /// Open the store at `path`, loading any existing contents.
    ///
    /// A corrupt backing file degrades to an empty store with a warning —
    /// malformed local state must never be fatal to the UI. A missing file
    /// is the normal first-run case.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let map = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<HashMap<String, String>>(&contents) {
                Ok(map) => map,
                Err(e) => {
                    warn!("Corrupt state file {}, starting empty: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        let (events, _) = broadcast::channel(64);

        Ok(Self {
            inner: Arc::new(DurableInner {
                path,
                map: Mutex::new(map),
                events,
            }),
        })
    }

    /// Read a value. Never fails; absent keys are `None`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner
            .map
            .lock()
            .expect("storage mutex poisoned")
            .get(key)
            .cloned()
    }

    /// Write a value and announce the change.
    ///
    /// The map update and the file write happen under one lock, and the
    /// file is replaced via temp-file + rename, so readers never observe a
    /// partial write.
    pub fn set(&self, key: &str, value: impl Into<String>) -> Result<(), StorageError> {
        let value = value.into();
        {
            let mut map = self.inner.map.lock().expect("storage mutex poisoned");
            if map.get(key) == Some(&value) {
                return Ok(());
            }
            map.insert(key.to_string(), value.clone());
            self.persist(&map)?;
        }
        debug!("Storage key written: {}", key);
        self.announce(key, Some(value));
        Ok(())
    }

    /// Remove a key and announce the change. Removing an absent key is a
    /// no-op and fires no event.
    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        {
            let mut map = self.inner.map.lock().expect("storage mutex poisoned");
            if map.remove(key).is_none() {
                return Ok(());
            }
            self.persist(&map)?;
        }
        debug!("Storage key removed: {}", key);
        self.announce(key, None);
        Ok(())
    }

    /// Read a boolean flag (the `"1"` sentinel convention).
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).as_deref() == Some(FLAG_SET)
    }

    /// Write or clear a boolean flag.
    pub fn set_flag(&self, key: &str, on: bool) -> Result<(), StorageError> {
        if on {
            self.set(key, FLAG_SET)
        } else {
            self.remove(key)
        }
    }

    /// Subscribe to change announcements. Receivers that fall behind see
    /// `Lagged` and should re-read the keys they care about.
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.inner.events.subscribe()
    }

    fn persist(&self, map: &HashMap<String, String>) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(map)?;
        let tmp = self.inner.path.with_extension("tmp");
        fs::write(&tmp, serialized)?;
        fs::rename(&tmp, &self.inner.path)?;
        Ok(())
    }

    fn announce(&self, key: &str, new_value: Option<String>) {
        // Send only fails when nobody is listening, which is fine.
        let _ = self.inner.events.send(StorageEvent {
            key: key.to_string(),
            new_value,
        });
    }
}

// ---------------------------------------------------------------------------
// Tab-scoped store
// ---------------------------------------------------------------------------

/// In-memory store with the lifetime of one tab.
///
/// Not `Clone` on purpose: sharing it would defeat the point of tab-scoped
/// state (a 2FA pass in one tab must not carry over to another).
#[derive(Debug, Default)]
pub struct TabStore {
    map: Mutex<HashMap<String, String>>,
}

impl TabStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.map
            .lock()
            .expect("tab store mutex poisoned")
            .get(key)
            .cloned()
    }

    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.map
            .lock()
            .expect("tab store mutex poisoned")
            .insert(key.to_string(), value.into());
    }

    pub fn remove(&self, key: &str) {
        self.map
            .lock()
            .expect("tab store mutex poisoned")
            .remove(key);
    }

    pub fn flag(&self, key: &str) -> bool {
        self.get(key).as_deref() == Some(FLAG_SET)
    }

    pub fn set_flag(&self, key: &str, on: bool) {
        if on {
            self.set(key, FLAG_SET);
        } else {
            self.remove(key);
        }
    }
}
