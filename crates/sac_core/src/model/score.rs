//! Social score derivation and color banding.
//!
//! # Responsibility
//! - Derive the composite social score from the two axis scores.
//! - Bucket a social score into one of four display bands.
//!
//! # Invariants
//! - `compute_social_score` is total over `[0,100]²` and stays in `[0,100]`.
//! - Band thresholds are exclusive lower bounds at 25/50/75.

/// Inclusive lower bound for both axis scores.
pub const AXIS_MIN: i64 = 0;
/// Inclusive upper bound for both axis scores.
pub const AXIS_MAX: i64 = 100;

const CHARACTER_WEIGHT: f64 = 0.7;
const FOOD_WEIGHT: f64 = 0.3;

/// Computes the social score weighted 70% character / 30% food.
///
/// Callers validate both inputs first; values above 100 are a contract
/// violation and are not checked here.
pub fn compute_social_score(food_score: u8, character: u8) -> u8 {
    let weighted = f64::from(character) * CHARACTER_WEIGHT + f64::from(food_score) * FOOD_WEIGHT;
    // Inputs are non-negative, so `round` (half away from zero) is round-half-up.
    weighted.round() as u8
}

/// Display band for a social score, ordered from most to least intense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScoreBand {
    /// Score above 75.
    High,
    /// Score in `(50, 75]`.
    Upper,
    /// Score in `(25, 50]`.
    Lower,
    /// Score at or below 25.
    Low,
}

impl ScoreBand {
    pub fn for_score(social_score: u8) -> Self {
        match social_score {
            76..=u8::MAX => Self::High,
            51..=75 => Self::Upper,
            26..=50 => Self::Lower,
            _ => Self::Low,
        }
    }

    /// Stable lowercase id for log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Upper => "upper",
            Self::Lower => "lower",
            Self::Low => "low",
        }
    }
}
