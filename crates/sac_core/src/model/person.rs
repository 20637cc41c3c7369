//! Person domain model.
//!
//! # Responsibility
//! - Define the plotted entity and its input validation rules.
//! - Keep `social_score` derived from the two axes at every write.
//!
//! # Invariants
//! - `handle` is non-empty and always starts with `@`.
//! - `food_score` and `character` are in `[0,100]`; out-of-range input is
//!   rejected, never clamped.
//! - `social_score` cannot be set directly.
//! - `id` is `None` until the store assigned one.

use crate::model::image::ImageRef;
use crate::model::score::{compute_social_score, ScoreBand, AXIS_MAX, AXIS_MIN};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Store-assigned identifier of a persisted person.
pub type PersonId = Uuid;

/// One of the two chart axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal axis.
    Food,
    /// Vertical axis.
    Character,
}

impl Axis {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food_score",
            Self::Character => "character",
        }
    }
}

/// Input validation failures for person create/edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonValidationError {
    /// Handle is blank (or only `@`).
    EmptyHandle,
    /// Axis value outside `[0,100]`.
    AxisOutOfRange { axis: Axis, value: i64 },
    /// Axis input is not an integer.
    UnparsableAxis { axis: Axis, input: String },
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyHandle => write!(f, "handle must not be empty"),
            Self::AxisOutOfRange { axis, value } => write!(
                f,
                "{} must be between {AXIS_MIN} and {AXIS_MAX}, got {value}",
                axis.as_str()
            ),
            Self::UnparsableAxis { axis, input } => {
                write!(f, "{} must be an integer, got `{input}`", axis.as_str())
            }
        }
    }
}

impl Error for PersonValidationError {}

/// Normalizes a raw handle: trims whitespace and prefixes `@` when missing.
pub fn normalize_handle(raw: &str) -> Result<String, PersonValidationError> {
    let trimmed = raw.trim();
    if trimmed.trim_start_matches('@').trim().is_empty() {
        return Err(PersonValidationError::EmptyHandle);
    }
    if trimmed.starts_with('@') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("@{trimmed}"))
    }
}

/// Checks an axis value against `[0,100]`.
pub fn validate_axis(axis: Axis, value: i64) -> Result<u8, PersonValidationError> {
    if !(AXIS_MIN..=AXIS_MAX).contains(&value) {
        return Err(PersonValidationError::AxisOutOfRange { axis, value });
    }
    // In range, so the narrowing cannot fail.
    u8::try_from(value).map_err(|_| PersonValidationError::AxisOutOfRange { axis, value })
}

/// Parses free-form axis input (form field or CLI argument).
pub fn parse_axis(axis: Axis, input: &str) -> Result<u8, PersonValidationError> {
    let value = input
        .trim()
        .parse::<i64>()
        .map_err(|_| PersonValidationError::UnparsableAxis {
            axis,
            input: input.to_string(),
        })?;
    validate_axis(axis, value)
}

/// A person plotted on the chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    /// `None` until the first successful persist.
    pub id: Option<PersonId>,
    handle: String,
    food_score: u8,
    character: u8,
    social_score: u8,
    /// Avatar shown when content is visible.
    pub avatar: Option<ImageRef>,
}

impl Person {
    /// Creates a transient (not yet persisted) person from raw input.
    ///
    /// # Errors
    /// - `EmptyHandle` when the handle is blank.
    /// - `AxisOutOfRange` when an axis is outside `[0,100]`.
    pub fn new(
        handle: &str,
        food_score: i64,
        character: i64,
    ) -> Result<Self, PersonValidationError> {
        let handle = normalize_handle(handle)?;
        let food_score = validate_axis(Axis::Food, food_score)?;
        let character = validate_axis(Axis::Character, character)?;

        Ok(Self {
            id: None,
            handle,
            food_score,
            character,
            social_score: compute_social_score(food_score, character),
            avatar: None,
        })
    }

    /// Returns a copy carrying the store-assigned id.
    pub fn with_id(mut self, id: PersonId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    pub fn food_score(&self) -> u8 {
        self.food_score
    }

    pub fn character(&self) -> u8 {
        self.character
    }

    pub fn social_score(&self) -> u8 {
        self.social_score
    }

    pub fn score_band(&self) -> ScoreBand {
        ScoreBand::for_score(self.social_score)
    }

    /// Replaces the handle after normalization.
    pub fn set_handle(&mut self, handle: &str) -> Result<(), PersonValidationError> {
        self.handle = normalize_handle(handle)?;
        Ok(())
    }

    /// Replaces both axes and recomputes the social score.
    ///
    /// Both values are validated before anything is written, so a failed
    /// call leaves the person untouched.
    pub fn set_axes(
        &mut self,
        food_score: i64,
        character: i64,
    ) -> Result<(), PersonValidationError> {
        let food_score = validate_axis(Axis::Food, food_score)?;
        let character = validate_axis(Axis::Character, character)?;
        self.food_score = food_score;
        self.character = character;
        self.social_score = compute_social_score(food_score, character);
        Ok(())
    }
}
