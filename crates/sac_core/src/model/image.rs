//! Opaque avatar image references.

use serde::{Deserialize, Serialize};

/// Reference to an avatar image owned by a person.
///
/// Stored as a single string: embedded images are `data:` URLs, anything
/// else is treated as a remote placeholder URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ImageRef {
    /// Embedded `data:<mime>;base64,...` image.
    DataUrl(String),
    /// Remote placeholder image URL.
    Remote(String),
}

impl ImageRef {
    /// Classifies a stored reference string.
    pub fn from_stored(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.starts_with("data:") {
            Self::DataUrl(value)
        } else {
            Self::Remote(value)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::DataUrl(value) | Self::Remote(value) => value,
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, Self::DataUrl(_))
    }
}

impl From<String> for ImageRef {
    fn from(value: String) -> Self {
        Self::from_stored(value)
    }
}

impl From<ImageRef> for String {
    fn from(value: ImageRef) -> Self {
        match value {
            ImageRef::DataUrl(value) | ImageRef::Remote(value) => value,
        }
    }
}
