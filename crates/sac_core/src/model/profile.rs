//! Board-member profile model.
//!
//! Profiles are the administrators allowed to log in and edit the chart.
//! The stored password is a plain shared secret and acts as a UX
//! deterrent only; it is not an access-control mechanism.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Persistent board-member profile record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardProfile {
    pub id: String,
    pub name: String,
    pub role: String,
    pub emoji: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Profile validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileValidationError {
    EmptyId,
    EmptyName,
}

impl Display for ProfileValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "profile id must not be empty"),
            Self::EmptyName => write!(f, "profile name must not be empty"),
        }
    }
}

impl Error for ProfileValidationError {}

impl BoardProfile {
    pub fn validate(&self) -> Result<(), ProfileValidationError> {
        if self.id.trim().is_empty() {
            return Err(ProfileValidationError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(ProfileValidationError::EmptyName);
        }
        Ok(())
    }

    /// Case-insensitive name match used by the login flow.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}
