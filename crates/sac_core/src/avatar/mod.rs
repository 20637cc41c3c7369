//! Avatar image loading.
//!
//! # Responsibility
//! - Turn an uploaded image file into an embedded `data:` URL.
//! - Produce a remote placeholder reference for a handle.
//! - Degrade gracefully: a failed upload falls back to the placeholder, a
//!   failed placeholder leaves the person without avatar.
//!
//! # Invariants
//! - Image failures are never fatal to add/edit/load and are always logged.

use crate::model::image::ImageRef;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const PLACEHOLDER_BASE_URL: &str = "https://ui-avatars.com/api/";
const PLACEHOLDER_BACKGROUND: &str = "E91E63";
const PLACEHOLDER_SIZE: u32 = 200;
const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Non-fatal image failures.
#[derive(Debug)]
pub enum ImageLoadError {
    Unreadable { path: PathBuf, source: std::io::Error },
    UnsupportedFormat(PathBuf),
    TooLarge { path: PathBuf, bytes: u64 },
    PlaceholderUnavailable(String),
}

impl Display for ImageLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreadable { path, source } => {
                write!(f, "failed to read image `{}`: {source}", path.display())
            }
            Self::UnsupportedFormat(path) => {
                write!(f, "unsupported image format: `{}`", path.display())
            }
            Self::TooLarge { path, bytes } => write!(
                f,
                "image `{}` is {bytes} bytes, limit is {MAX_UPLOAD_BYTES}",
                path.display()
            ),
            Self::PlaceholderUnavailable(handle) => {
                write!(f, "placeholder avatar unavailable for {handle}")
            }
        }
    }
}

impl Error for ImageLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unreadable { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Loads avatar images for people.
pub trait AvatarSource {
    /// Reads an uploaded file into an embedded image.
    fn load_file(&self, path: &Path) -> Result<ImageRef, ImageLoadError>;
    /// Placeholder image for a handle.
    fn placeholder(&self, handle: &str) -> Result<ImageRef, ImageLoadError>;
}

/// File-system uploads plus generated placeholder URLs.
#[derive(Debug, Clone)]
pub struct FileAvatarSource {
    placeholders_enabled: bool,
}

impl Default for FileAvatarSource {
    fn default() -> Self {
        Self {
            placeholders_enabled: true,
        }
    }
}

impl FileAvatarSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offline mode: placeholder requests fail.
    pub fn without_placeholders() -> Self {
        Self {
            placeholders_enabled: false,
        }
    }
}

impl AvatarSource for FileAvatarSource {
    fn load_file(&self, path: &Path) -> Result<ImageRef, ImageLoadError> {
        let mime = mime_for_path(path)
            .ok_or_else(|| ImageLoadError::UnsupportedFormat(path.to_path_buf()))?;
        let unreadable = |source| ImageLoadError::Unreadable {
            path: path.to_path_buf(),
            source,
        };

        let bytes = std::fs::metadata(path).map_err(unreadable)?.len();
        if bytes > MAX_UPLOAD_BYTES {
            return Err(ImageLoadError::TooLarge {
                path: path.to_path_buf(),
                bytes,
            });
        }
        let data = std::fs::read(path).map_err(unreadable)?;
        Ok(ImageRef::DataUrl(format!(
            "data:{mime};base64,{}",
            BASE64_STANDARD.encode(data)
        )))
    }

    fn placeholder(&self, handle: &str) -> Result<ImageRef, ImageLoadError> {
        if !self.placeholders_enabled {
            return Err(ImageLoadError::PlaceholderUnavailable(handle.to_string()));
        }
        Ok(ImageRef::Remote(placeholder_url(handle)))
    }
}

/// Generated-initials avatar URL for a handle (the `@` is dropped).
pub fn placeholder_url(handle: &str) -> String {
    let username = handle.replacen('@', "", 1);
    format!(
        "{PLACEHOLDER_BASE_URL}?name={}&size={PLACEHOLDER_SIZE}&background={PLACEHOLDER_BACKGROUND}&color=fff&bold=true",
        encode_uri_component(&username)
    )
}

/// Uploaded file first, then placeholder, then nothing.
pub fn resolve_avatar(
    source: &dyn AvatarSource,
    upload: Option<&Path>,
    handle: &str,
) -> Option<ImageRef> {
    if let Some(path) = upload {
        match source.load_file(path) {
            Ok(image) => return Some(image),
            Err(err) => warn!(
                "event=avatar_load module=avatar status=error fallback=placeholder error={err}"
            ),
        }
    }

    match source.placeholder(handle) {
        Ok(image) => Some(image),
        Err(err) => {
            warn!("event=avatar_placeholder module=avatar status=error fallback=none error={err}");
            None
        }
    }
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Percent-encodes everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
fn encode_uri_component(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => encoded.push(char::from(byte)),
            other => encoded.push_str(&format!("%{other:02X}")),
        }
    }
    encoded
}
