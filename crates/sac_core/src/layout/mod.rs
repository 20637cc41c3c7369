//! Chart layout: score-to-pixel mapping and overlap resolution.
//!
//! # Responsibility
//! - Map each person's axis scores to a pixel position in the plot area.
//! - Displace overlapping avatars along an expanding spiral.
//!
//! # Invariants
//! - Placement is greedy and order-dependent: people are placed in sequence
//!   order and never moved once placed.
//! - Identical input and viewport always give bit-identical output.
//! - The social score never affects position.

mod placement;
mod viewport;

pub use placement::{base_position, spiral_offset, LayoutEngine, Placement};
pub use viewport::{LayoutError, LayoutParams, PlotArea, Viewport};
