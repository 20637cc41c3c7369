//! Domain model for chart entries and board members.
//!
//! # Responsibility
//! - Define the plotted `Person` and its validation rules.
//! - Own the social score formula and its display bands.
//!
//! # Invariants
//! - Model types never hold out-of-range axis values.
//! - Derived values (`social_score`) are recomputed on every axis write.

pub mod image;
pub mod person;
pub mod profile;
pub mod score;
