//! Two-factor enrollment state machine.
//!
//! The server owns the enrollment; this controller caches a view of it and
//! enforces operation legality locally. There is no optimistic transition:
//! local state only moves after the remote call succeeded, so a transport
//! failure leaves the cached view exactly where it was.
//!
//! Concurrent `verify_code` calls from the same control are the caller's
//! problem — disable the submit action while a request is in flight. A
//! second call racing the first is outside this contract.

use tracing::{info, warn};

use shared::types::{TwoFaError, TwoFaSetup, TwoFaStatus};

use crate::api::TwoFaApi;
use crate::storage::{DurableStore, TWOFA_ENABLED_KEY};

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Client view of the server-owned enrollment lifecycle. Cyclic by design:
/// a user may re-enroll after disabling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentState {
    Off,
    /// Secret issued and QR displayed, not yet confirmed.
    Pending,
    On,
}

impl From<TwoFaStatus> for EnrollmentState {
    fn from(status: TwoFaStatus) -> Self {
        if status.enabled {
            Self::On
        } else if status.setup_pending {
            Self::Pending
        } else {
            Self::Off
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Owns the enrollment view and the in-flight request lifecycle.
///
/// The initial state is whatever `fetch_state` reports — the controller
/// queries before acting and never assumes `Off`. It knows nothing about
/// route gating: the tab-scoped pass flag after a successful verify is set
/// by the caller.
pub struct TwoFactorController<A: TwoFaApi> {
    api: A,
    durable: DurableStore,
    state: Option<EnrollmentState>,
    qr: Option<TwoFaSetup>,
}

impl<A: TwoFaApi> TwoFactorController<A> {
    pub fn new(api: A, durable: DurableStore) -> Self {
        Self {
            api,
            durable,
            state: None,
            qr: None,
        }
    }

    /// The cached view; `None` until the first successful `fetch_state`.
    pub fn state(&self) -> Option<EnrollmentState> {
        self.state
    }

    /// Query the server for the authoritative enrollment state.
    ///
    /// Also refreshes the durable enablement mirror — a fresh server
    /// answer always wins over the stale flag. When the answer is
    /// `Pending`, the caller should follow up with [`Self::fetch_qr`] to
    /// show the still-valid QR for the in-progress enrollment.
    pub async fn fetch_state(&mut self) -> Result<TwoFaStatus, TwoFaError> {
        let status = self.api.fetch_state().await?;
        let state = EnrollmentState::from(status);
        self.state = Some(state);
        if state != EnrollmentState::Pending {
            self.qr = None;
        }
        self.mirror_enabled(status.enabled);
        Ok(status)
    }

    /// Begin enrollment from `Off`, or resume a pending one.
    ///
    /// From `Pending` this is idempotent: it reuses the existing pending
    /// secret (cached QR, or the QR-refetch endpoint) and never mints a
    /// new one, since that would invalidate the code the user's
    /// authenticator is already producing.
    pub async fn request_setup(&mut self) -> Result<TwoFaSetup, TwoFaError> {
        match self.ensure_state().await? {
            EnrollmentState::On => Err(TwoFaError::AlreadyEnabled),
            EnrollmentState::Pending => self.pending_qr().await,
            EnrollmentState::Off => {
                let setup = self.api.request_setup().await?;
                self.state = Some(EnrollmentState::Pending);
                self.qr = Some(setup.clone());
                info!("2FA enrollment started");
                Ok(setup)
            }
        }
    }

    /// Re-render the pending secret's QR. Fails with `NoQr` when no
    /// enrollment is in progress.
    pub async fn fetch_qr(&mut self) -> Result<TwoFaSetup, TwoFaError> {
        match self.ensure_state().await? {
            EnrollmentState::Pending => self.pending_qr().await,
            _ => Err(TwoFaError::NoQr),
        }
    }

    /// Confirm the pending enrollment with a 6-digit code.
    ///
    /// On success the view moves to `On`, the cached QR is dropped and the
    /// durable mirror is set. `InvalidCode` leaves the enrollment pending
    /// for a re-prompt; calling this without a pending enrollment yields
    /// `SetupRequired`.
    pub async fn verify_code(&mut self, code: &str) -> Result<(), TwoFaError> {
        if !is_valid_code(code) {
            return Err(TwoFaError::InvalidCode);
        }

        match self.ensure_state().await? {
            EnrollmentState::Pending => {
                self.api.verify(code).await?;
                self.state = Some(EnrollmentState::On);
                self.qr = None;
                self.mirror_enabled(true);
                info!("2FA enrollment confirmed");
                Ok(())
            }
            EnrollmentState::Off | EnrollmentState::On => Err(TwoFaError::SetupRequired),
        }
    }

    /// Turn 2FA off, abandoning any pending enrollment.
    pub async fn disable(&mut self) -> Result<(), TwoFaError> {
        self.api.disable().await?;
        self.state = Some(EnrollmentState::Off);
        self.qr = None;
        self.mirror_enabled(false);
        info!("2FA disabled");
        Ok(())
    }

    /// Cached state, querying the server first if this controller has
    /// never seen an answer.
    async fn ensure_state(&mut self) -> Result<EnrollmentState, TwoFaError> {
        if let Some(state) = self.state {
            return Ok(state);
        }
        self.fetch_state().await?;
        // fetch_state always sets the view on success.
        self.state.ok_or(TwoFaError::Unavailable)
    }

    /// QR for the pending secret: cached copy if we started this
    /// enrollment, otherwise the refetch endpoint (same secret either way).
    async fn pending_qr(&mut self) -> Result<TwoFaSetup, TwoFaError> {
        if let Some(setup) = &self.qr {
            return Ok(setup.clone());
        }
        let setup = self.api.fetch_qr().await?;
        self.qr = Some(setup.clone());
        Ok(setup)
    }

    /// Keep the durable flag in step with the last known server state.
    /// A write failure here degrades the offline fallback, nothing more,
    /// so it is logged rather than failing the 2FA operation.
    fn mirror_enabled(&self, enabled: bool) {
        if let Err(e) = self.durable.set_flag(TWOFA_ENABLED_KEY, enabled) {
            warn!("Failed to mirror 2FA enablement flag: {}", e);
        }
    }
}

/// Exactly six ASCII digits.
fn is_valid_code(code: &str) -> bool {
    code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit())
}
