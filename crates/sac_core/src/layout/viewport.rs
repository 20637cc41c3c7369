//! Viewport and plot-area geometry.

use crate::config::ChartConfig;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Canvas dimensions plus the narrow/wide flag derived from the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub narrow: bool,
}

impl Viewport {
    pub fn new(width: f64, height: f64, narrow: bool) -> Self {
        Self {
            width,
            height,
            narrow,
        }
    }

    /// Sizes the canvas for a browser window of `window_width` pixels.
    ///
    /// The canvas spans the window minus the container margin and has the
    /// configured fixed height.
    pub fn for_window(config: &ChartConfig, window_width: f64) -> Self {
        let narrow = config.is_narrow(window_width);
        let margin = config.profile(narrow).canvas_margin;
        Self {
            width: (window_width - margin).max(0.0),
            height: config.canvas_height,
            narrow,
        }
    }
}

/// Drawable rectangle inside the canvas padding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub padding: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotArea {
    pub fn center_x(&self) -> f64 {
        self.padding + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.padding + self.height / 2.0
    }

    pub fn right(&self) -> f64 {
        self.padding + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.padding + self.height
    }
}

/// Layout errors.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// Viewport is too small to leave any drawable area.
    EmptyPlotArea { width: f64, height: f64 },
    /// `min_distance` is smaller than the avatar diameter.
    SeparationBelowAvatarSize { min_distance: f64, avatar_size: f64 },
}

impl Display for LayoutError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPlotArea { width, height } => {
                write!(f, "plot area is empty ({width}x{height})")
            }
            Self::SeparationBelowAvatarSize {
                min_distance,
                avatar_size,
            } => write!(
                f,
                "min distance {min_distance} is below avatar size {avatar_size}"
            ),
        }
    }
}

impl Error for LayoutError {}

/// Everything the layout engine needs for one redraw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub area: PlotArea,
    pub min_distance: f64,
    pub avatar_size: f64,
    pub max_attempts: u32,
}

impl LayoutParams {
    /// Derives layout parameters for a viewport from chart config.
    ///
    /// # Errors
    /// - `EmptyPlotArea` when padding consumes the whole canvas.
    /// - `SeparationBelowAvatarSize` when the profile is inconsistent.
    pub fn for_viewport(config: &ChartConfig, viewport: &Viewport) -> Result<Self, LayoutError> {
        let profile = config.profile(viewport.narrow);
        let area = PlotArea {
            padding: profile.padding,
            width: viewport.width - profile.padding * 2.0,
            height: viewport.height - profile.padding * 2.0,
        };
        let params = Self {
            area,
            min_distance: profile.min_distance,
            avatar_size: profile.avatar_size,
            max_attempts: config.max_attempts.max(1),
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.area.width <= 0.0 || self.area.height <= 0.0 {
            return Err(LayoutError::EmptyPlotArea {
                width: self.area.width,
                height: self.area.height,
            });
        }
        if self.min_distance < self.avatar_size {
            return Err(LayoutError::SeparationBelowAvatarSize {
                min_distance: self.min_distance,
                avatar_size: self.avatar_size,
            });
        }
        Ok(())
    }
}
