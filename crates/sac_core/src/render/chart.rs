//! Chart painter.

use super::{Surface, TextAlign, TextStyle};
use crate::config::ChartConfig;
use crate::layout::{LayoutEngine, LayoutError, LayoutParams, Placement, PlotArea, Viewport};
use crate::model::person::Person;
use crate::model::score::ScoreBand;
use crate::visibility::gate::VisibilityGate;
use glam::dvec2;
use log::{debug, trace};

const GRID_DIVISIONS: u32 = 10;
const GRID_LINE_WIDTH: f64 = 1.0;
const AXIS_LINE_WIDTH: f64 = 3.0;
const MARKER_BORDER_WIDTH: f64 = 2.0;

/// Chart colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub primary: &'static str,
    pub secondary: &'static str,
    pub tertiary: &'static str,
    pub accent: &'static str,
    pub background: &'static str,
    pub muted: &'static str,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: "#FF1493",
            secondary: "#FF69B4",
            tertiary: "#9B59B6",
            accent: "#E91E63",
            background: "#FCE4EC",
            muted: "#666666",
        }
    }
}

/// Border color of a marker, by score band.
pub fn score_color(palette: &Palette, band: ScoreBand) -> &'static str {
    match band {
        ScoreBand::High => palette.primary,
        ScoreBand::Upper => palette.secondary,
        ScoreBand::Lower => palette.tertiary,
        ScoreBand::Low => palette.muted,
    }
}

/// Offsets of the label rows relative to the canvas edges.
struct LabelMetrics {
    axis_label_from_bottom: f64,
    axis_label_from_left: f64,
    number_from_bottom: f64,
    number_gap: f64,
}

impl LabelMetrics {
    fn for_viewport(narrow: bool) -> Self {
        if narrow {
            Self {
                axis_label_from_bottom: 15.0,
                axis_label_from_left: 12.0,
                number_from_bottom: 5.0,
                number_gap: 5.0,
            }
        } else {
            Self {
                axis_label_from_bottom: 25.0,
                axis_label_from_left: 20.0,
                number_from_bottom: 10.0,
                number_gap: 8.0,
            }
        }
    }
}

/// Paints the whole chart for one viewport.
pub struct ChartRenderer {
    config: ChartConfig,
    palette: Palette,
}

impl ChartRenderer {
    pub fn new(config: ChartConfig) -> Self {
        Self {
            config,
            palette: Palette::default(),
        }
    }

    /// Redraws everything and returns the placements used.
    ///
    /// # Errors
    /// - `LayoutError` when the viewport leaves no drawable area; nothing is
    ///   painted in that case.
    pub fn render(
        &self,
        surface: &mut dyn Surface,
        people: &[Person],
        viewport: &Viewport,
        gate: &VisibilityGate,
    ) -> Result<Vec<Placement>, LayoutError> {
        let params = LayoutParams::for_viewport(&self.config, viewport)?;
        let placements = LayoutEngine::new(params).place(people);

        surface.clear(viewport.width, viewport.height);
        self.draw_frame(surface, &params.area);
        self.draw_labels(surface, &params.area, viewport);

        let visible = gate.is_content_visible();
        let radius = params.avatar_size / 2.0;
        for (person, placement) in people.iter().zip(&placements) {
            let band = person.score_band();
            let border = score_color(&self.palette, band);
            trace!(
                "event=render_marker module=render band={} avatar={}",
                band.as_str(),
                visible && person.avatar.is_some()
            );
            match (&person.avatar, visible) {
                (Some(image), true) => {
                    surface.draw_image_circle(image, placement.position, radius);
                }
                _ => surface.fill_circle(placement.position, radius, self.palette.accent),
            }
            surface.stroke_circle(placement.position, radius, border, MARKER_BORDER_WIDTH);
        }

        debug!(
            "event=render module=render status=ok people={} visible={} width={} height={}",
            people.len(),
            visible,
            viewport.width,
            viewport.height
        );
        Ok(placements)
    }

    fn draw_frame(&self, surface: &mut dyn Surface, area: &PlotArea) {
        surface.fill_rect(
            dvec2(area.padding, area.padding),
            dvec2(area.width, area.height),
            self.palette.background,
        );

        let step = f64::from(GRID_DIVISIONS);
        for i in 0..=GRID_DIVISIONS {
            let x = area.padding + area.width / step * f64::from(i);
            surface.line(
                dvec2(x, area.padding),
                dvec2(x, area.bottom()),
                self.palette.accent,
                GRID_LINE_WIDTH,
            );
            let y = area.padding + area.height / step * f64::from(i);
            surface.line(
                dvec2(area.padding, y),
                dvec2(area.right(), y),
                self.palette.accent,
                GRID_LINE_WIDTH,
            );
        }

        surface.line(
            dvec2(area.padding, area.center_y()),
            dvec2(area.right(), area.center_y()),
            self.palette.primary,
            AXIS_LINE_WIDTH,
        );
        surface.line(
            dvec2(area.center_x(), area.padding),
            dvec2(area.center_x(), area.bottom()),
            self.palette.primary,
            AXIS_LINE_WIDTH,
        );
    }

    fn draw_labels(&self, surface: &mut dyn Surface, area: &PlotArea, viewport: &Viewport) {
        let profile = self.config.profile(viewport.narrow);
        let metrics = LabelMetrics::for_viewport(viewport.narrow);
        let labels = &self.config.labels;
        let height = viewport.height;

        let axis_style = TextStyle {
            font_size: profile.label_font_size,
            bold: true,
            color: self.palette.tertiary.to_string(),
            align: TextAlign::Center,
            rotation_deg: 0.0,
        };
        let label_y = height - metrics.axis_label_from_bottom;
        surface.text(
            &labels.food_low,
            dvec2(area.padding + area.width * 0.15, label_y),
            &axis_style,
        );
        surface.text(
            &labels.food_high,
            dvec2(area.padding + area.width * 0.85, label_y),
            &axis_style,
        );

        let vertical_style = TextStyle {
            rotation_deg: -90.0,
            ..axis_style
        };
        surface.text(
            &labels.character_high,
            dvec2(
                metrics.axis_label_from_left,
                area.padding + area.height * 0.15,
            ),
            &vertical_style,
        );
        surface.text(
            &labels.character_low,
            dvec2(
                metrics.axis_label_from_left,
                area.padding + area.height * 0.85,
            ),
            &vertical_style,
        );

        let number_style = TextStyle {
            font_size: profile.number_font_size,
            bold: false,
            color: self.palette.tertiary.to_string(),
            align: TextAlign::Center,
            rotation_deg: 0.0,
        };
        let number_y = height - metrics.number_from_bottom;
        for (text, x) in [
            ("0", area.padding),
            ("50", area.center_x()),
            ("100", area.right()),
        ] {
            surface.text(text, dvec2(x, number_y), &number_style);
        }

        let y_number_style = TextStyle {
            align: TextAlign::Right,
            ..number_style
        };
        let number_x = area.padding - metrics.number_gap;
        for (text, y) in [
            ("100", area.padding),
            ("50", area.center_y()),
            ("0", area.bottom()),
        ] {
            surface.text(text, dvec2(number_x, y + 5.0), &y_number_style);
        }
    }
}
