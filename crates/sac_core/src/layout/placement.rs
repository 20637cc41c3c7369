//! Greedy spiral placement.

use super::viewport::{LayoutParams, PlotArea};
use crate::model::person::Person;
use glam::{dvec2, DVec2};
use log::{debug, trace};
use std::f64::consts::PI;

/// Final placement of one person.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Undisplaced position mapped from the axis scores.
    pub base: DVec2,
    /// Position the avatar is drawn at.
    pub position: DVec2,
    /// `position - base`; zero when no displacement was needed.
    pub offset: DVec2,
    /// Spiral attempt that produced `position`, `None` for the base position.
    pub attempt: Option<u32>,
}

impl Placement {
    pub fn is_displaced(&self) -> bool {
        self.attempt.is_some()
    }
}

/// Maps axis scores to a pixel position; the character axis is inverted so
/// higher values sit higher on screen.
pub fn base_position(area: &PlotArea, food_score: u8, character: u8) -> DVec2 {
    dvec2(
        area.padding + (f64::from(food_score) / 100.0) * area.width,
        area.padding + ((100.0 - f64::from(character)) / 100.0) * area.height,
    )
}

/// Offset for spiral attempt `attempt` out of `max_attempts`.
///
/// Two full turns over the attempt range while the radius grows from
/// `min_distance` towards `2 * min_distance`.
pub fn spiral_offset(attempt: u32, max_attempts: u32, min_distance: f64) -> DVec2 {
    let progress = f64::from(attempt) / f64::from(max_attempts);
    let angle = progress * PI * 4.0;
    let radius = min_distance * (1.0 + progress);
    dvec2(angle.cos() * radius, angle.sin() * radius)
}

/// Places people on the chart one by one, in sequence order.
#[derive(Debug, Clone, Copy)]
pub struct LayoutEngine {
    params: LayoutParams,
}

impl LayoutEngine {
    pub fn new(params: LayoutParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    /// Computes one placement per person, in the same order.
    pub fn place(&self, people: &[Person]) -> Vec<Placement> {
        self.place_scores(
            people
                .iter()
                .map(|person| (person.food_score(), person.character())),
        )
    }

    /// Same as [`LayoutEngine::place`] over raw `(food_score, character)` pairs.
    pub fn place_scores(&self, scores: impl IntoIterator<Item = (u8, u8)>) -> Vec<Placement> {
        let mut finalized: Vec<DVec2> = Vec::new();
        let mut placements = Vec::new();

        for (index, (food_score, character)) in scores.into_iter().enumerate() {
            let base = base_position(&self.params.area, food_score, character);
            let placement = self.resolve(base, &finalized);
            trace!(
                "event=layout_place module=layout index={} base=({:.2},{:.2}) position=({:.2},{:.2}) attempt={:?}",
                index,
                base.x,
                base.y,
                placement.position.x,
                placement.position.y,
                placement.attempt
            );
            finalized.push(placement.position);
            placements.push(placement);
        }

        debug!(
            "event=layout module=layout status=ok count={} displaced={}",
            placements.len(),
            placements.iter().filter(|p| p.is_displaced()).count()
        );
        placements
    }

    fn resolve(&self, base: DVec2, finalized: &[DVec2]) -> Placement {
        if self.is_clear(base, finalized) {
            return Placement {
                base,
                position: base,
                offset: DVec2::ZERO,
                attempt: None,
            };
        }

        let max_attempts = self.params.max_attempts;
        let mut last = None;
        for attempt in 0..max_attempts {
            let offset = spiral_offset(attempt, max_attempts, self.params.min_distance);
            let candidate = Placement {
                base,
                position: base + offset,
                offset,
                attempt: Some(attempt),
            };
            if self.is_clear(candidate.position, finalized) {
                return candidate;
            }
            last = Some(candidate);
        }

        // Best effort: keep the outermost spiral point even if it overlaps.
        last.unwrap_or(Placement {
            base,
            position: base,
            offset: DVec2::ZERO,
            attempt: None,
        })
    }

    fn is_clear(&self, candidate: DVec2, finalized: &[DVec2]) -> bool {
        finalized
            .iter()
            .all(|placed| candidate.distance(*placed) >= self.params.min_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::{base_position, spiral_offset};
    use crate::layout::PlotArea;
    use glam::dvec2;

    #[test]
    fn base_position_inverts_character_axis() {
        let area = PlotArea {
            padding: 50.0,
            width: 1000.0,
            height: 600.0,
        };
        assert_eq!(base_position(&area, 0, 100), dvec2(50.0, 50.0));
        assert_eq!(base_position(&area, 100, 0), dvec2(1050.0, 650.0));
        assert_eq!(base_position(&area, 50, 50), dvec2(550.0, 350.0));
    }

    #[test]
    fn first_spiral_attempt_points_right_at_min_distance() {
        let offset = spiral_offset(0, 30, 30.0);
        assert_eq!(offset, dvec2(30.0, 0.0));
    }

    #[test]
    fn spiral_radius_grows_with_attempts() {
        let radii: Vec<f64> = (0..30).map(|a| spiral_offset(a, 30, 30.0).length()).collect();
        assert!(radii.windows(2).all(|pair| pair[1] > pair[0]));
        assert!(radii[29] < 60.0);
    }
}
