//! Application configuration.
//!
//! # Responsibility
//! - Hold every tunable of the chart, the visibility gate, logging and storage.
//! - Load overrides from a JSON file; every field has a default.
//!
//! # Invariants
//! - A validated config always has `min_distance >= avatar_size` for both
//!   viewport profiles, a non-empty drawable area and `max_attempts > 0`.

use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub chart: ChartConfig,
    pub gate: GateConfig,
    pub logging: LoggingConfig,
    pub store: StoreConfig,
}

/// Sizes that change between narrow and wide viewports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportProfile {
    /// Space between canvas edge and plotting area.
    pub padding: f64,
    /// Minimum center distance between two placed avatars.
    pub min_distance: f64,
    /// Avatar diameter.
    pub avatar_size: f64,
    /// Horizontal space the surrounding container takes from the window.
    pub canvas_margin: f64,
    pub label_font_size: f64,
    pub number_font_size: f64,
}

impl ViewportProfile {
    fn narrow() -> Self {
        Self {
            padding: 35.0,
            min_distance: 25.0,
            avatar_size: 20.0,
            canvas_margin: 10.0,
            label_font_size: 9.0,
            number_font_size: 8.0,
        }
    }

    fn wide() -> Self {
        Self {
            padding: 50.0,
            min_distance: 30.0,
            avatar_size: 25.0,
            canvas_margin: 40.0,
            label_font_size: 11.0,
            number_font_size: 10.0,
        }
    }
}

/// Profile as written in a config file; absent fields keep the value of
/// the profile it overrides.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProfileOverride {
    padding: Option<f64>,
    min_distance: Option<f64>,
    avatar_size: Option<f64>,
    canvas_margin: Option<f64>,
    label_font_size: Option<f64>,
    number_font_size: Option<f64>,
}

impl ProfileOverride {
    fn apply_to(self, base: ViewportProfile) -> ViewportProfile {
        ViewportProfile {
            padding: self.padding.unwrap_or(base.padding),
            min_distance: self.min_distance.unwrap_or(base.min_distance),
            avatar_size: self.avatar_size.unwrap_or(base.avatar_size),
            canvas_margin: self.canvas_margin.unwrap_or(base.canvas_margin),
            label_font_size: self.label_font_size.unwrap_or(base.label_font_size),
            number_font_size: self.number_font_size.unwrap_or(base.number_font_size),
        }
    }
}

fn narrow_profile<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ViewportProfile, D::Error> {
    Ok(ProfileOverride::deserialize(deserializer)?.apply_to(ViewportProfile::narrow()))
}

fn wide_profile<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ViewportProfile, D::Error> {
    Ok(ProfileOverride::deserialize(deserializer)?.apply_to(ViewportProfile::wide()))
}

/// Axis end-label texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisLabels {
    pub food_low: String,
    pub food_high: String,
    pub character_high: String,
    pub character_low: String,
}

impl Default for AxisLabels {
    fn default() -> Self {
        Self {
            food_low: "Dietary Restrictions".to_string(),
            food_high: "Epicurean".to_string(),
            character_high: "Pristine".to_string(),
            character_low: "Rotten".to_string(),
        }
    }
}

/// Chart geometry configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub canvas_height: f64,
    /// Windows at or below this width use the narrow profile.
    pub narrow_breakpoint: f64,
    #[serde(deserialize_with = "narrow_profile")]
    pub narrow: ViewportProfile,
    #[serde(deserialize_with = "wide_profile")]
    pub wide: ViewportProfile,
    /// Spiral attempts before accepting an overlapping placement.
    pub max_attempts: u32,
    pub labels: AxisLabels,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            canvas_height: 700.0,
            narrow_breakpoint: 768.0,
            narrow: ViewportProfile::narrow(),
            wide: ViewportProfile::wide(),
            max_attempts: 30,
            labels: AxisLabels::default(),
        }
    }
}

impl ChartConfig {
    /// Profile for a viewport flagged narrow or wide.
    pub fn profile(&self, narrow: bool) -> &ViewportProfile {
        if narrow {
            &self.narrow
        } else {
            &self.wide
        }
    }

    pub fn is_narrow(&self, window_width: f64) -> bool {
        window_width <= self.narrow_breakpoint
    }
}

/// Visibility gate configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Shared view-once password. A UX deterrent, not a secret.
    pub view_once_password: String,
    pub view_once_seconds: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            view_once_password: "peek".to_string(),
            view_once_seconds: 15,
        }
    }
}

impl GateConfig {
    pub fn view_once_duration(&self) -> Duration {
        Duration::from_secs(self.view_once_seconds)
    }
}

/// Logging configuration; `dir = None` disables file logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            dir: None,
        }
    }
}

/// Storage configuration; `db_path = None` uses in-memory stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    pub db_path: Option<String>,
}

/// Configuration load/validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl AppConfig {
    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&text)
    }

    /// Parses and validates a JSON config document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let chart = &self.chart;
        if chart.max_attempts == 0 {
            return Err(ConfigError::Invalid("chart.max_attempts must be > 0".into()));
        }
        for (name, profile) in [("narrow", &chart.narrow), ("wide", &chart.wide)] {
            if profile.avatar_size <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "chart.{name}.avatar_size must be > 0"
                )));
            }
            if profile.min_distance < profile.avatar_size {
                return Err(ConfigError::Invalid(format!(
                    "chart.{name}.min_distance ({}) must be >= avatar_size ({})",
                    profile.min_distance, profile.avatar_size
                )));
            }
            if chart.canvas_height <= profile.padding * 2.0 {
                return Err(ConfigError::Invalid(format!(
                    "chart.canvas_height must exceed twice chart.{name}.padding"
                )));
            }
        }
        if self.gate.view_once_seconds == 0 {
            return Err(ConfigError::Invalid("gate.view_once_seconds must be > 0".into()));
        }
        Ok(())
    }
}
