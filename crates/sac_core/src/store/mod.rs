//! Persistence collaborators.
//!
//! # Responsibility
//! - Define the people collection and board-profile contracts.
//! - Provide in-memory and SQLite implementations.
//!
//! # Invariants
//! - Stores are opaque document collections; business rules (axis ranges,
//!   score derivation) live in the model and service layers.

pub mod person_store;
pub mod profile_store;
pub mod sqlite_person_store;
