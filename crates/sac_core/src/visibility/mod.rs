//! Visibility gating for chart content.
//!
//! # Responsibility
//! - Track logged-out / view-once / authenticated mode.
//! - Own the session-storage contract and the timer primitives the
//!   view-once expiry relies on.
//!
//! # Invariants
//! - View-once expiry is driven by a scheduled timer, never by reading the
//!   clock while rendering.

pub mod gate;
pub mod session;
pub mod timer;
