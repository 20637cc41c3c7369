//! Chart rendering onto a 2D drawing surface.
//!
//! # Responsibility
//! - Paint background, grid, crosshair axes, axis labels and tick labels.
//! - Paint one marker per person at the position chosen by the layout
//!   engine, showing avatars only when the gate allows it.
//!
//! # Invariants
//! - Layout runs exactly once per `render` call.
//! - The renderer never adjusts positions itself.
//! - Handles and numeric scores are never painted on the chart.

mod chart;
mod svg;

pub use chart::{score_color, ChartRenderer, Palette};
pub use svg::SvgSurface;

use crate::model::image::ImageRef;
use glam::DVec2;

/// Horizontal text anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Font and placement options for one text draw.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_size: f64,
    pub bold: bool,
    pub color: String,
    pub align: TextAlign,
    /// Rotation around the anchor in degrees (counter-clockwise negative).
    pub rotation_deg: f64,
}

/// Minimal 2D canvas-equivalent drawing API.
pub trait Surface {
    fn clear(&mut self, width: f64, height: f64);
    fn fill_rect(&mut self, origin: DVec2, size: DVec2, color: &str);
    fn line(&mut self, from: DVec2, to: DVec2, color: &str, width: f64);
    fn fill_circle(&mut self, center: DVec2, radius: f64, color: &str);
    fn stroke_circle(&mut self, center: DVec2, radius: f64, color: &str, width: f64);
    /// Draws `image` scaled into the circle's bounding box, clipped to it.
    fn draw_image_circle(&mut self, image: &ImageRef, center: DVec2, radius: f64);
    fn text(&mut self, text: &str, anchor: DVec2, style: &TextStyle);
}
