//! Client-side session and two-factor gate core.
//!
//! Everything with real state and failure semantics in the dashboard lives
//! here: the durable/tab-scoped storage media, the [`session::SessionStore`]
//! that normalizes raw backend payloads into display-ready profiles, the
//! [`twofa::TwoFactorController`] enrollment state machine, and the pure
//! [`gate`] decision evaluated on every navigation. The presentational
//! surface (cards, charts, tables) consumes these and is deliberately not
//! part of this workspace.

pub mod api;
pub mod gate;
pub mod session;
pub mod storage;
pub mod twofa;
