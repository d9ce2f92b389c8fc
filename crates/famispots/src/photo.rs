//! Photo upload handling.
//!
//! This module sniffs uploaded bytes to verify they are a supported image
//! type and derives the sanitized file names photos are stored under. Both
//! backends share this logic so a photo keeps the same generated name
//! whether it lands on disk or in a remote bucket.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use image::ImageFormat;
use regex::Regex;

use crate::error::{Error, Result};

/// Image formats accepted for photo uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotoFormat {
    /// PNG image.
    Png,
    /// JPEG image.
    Jpeg,
    /// WebP image.
    WebP,
}

impl PhotoFormat {
    /// Sniff the format from the raw upload bytes.
    ///
    /// Only the magic bytes are inspected; the image is not decoded.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedFormat` if the bytes are a recognized but
    /// unsupported image type, or not an image at all.
    pub fn sniff(bytes: &[u8]) -> Result<Self> {
        match image::guess_format(bytes) {
            Ok(ImageFormat::Png) => Ok(Self::Png),
            Ok(ImageFormat::Jpeg) => Ok(Self::Jpeg),
            Ok(ImageFormat::WebP) => Ok(Self::WebP),
            Ok(other) => Err(Error::unsupported_format(format!("{other:?}").to_lowercase())),
            Err(_) => Err(Error::unsupported_format("unknown")),
        }
    }

    /// The file extension used when storing a photo of this format.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// The MIME type sent to the remote storage bucket.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }
}

/// Reduce arbitrary text to a safe lowercase file name stem.
///
/// Strips everything except word characters, whitespace, and hyphens, then
/// collapses separators into single hyphens. Empty input yields `"place"`.
#[must_use]
pub fn slugify(text: &str) -> String {
    static STRIP: OnceLock<Regex> = OnceLock::new();
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();

    let strip = STRIP.get_or_init(|| Regex::new(r"[^\w\s-]").expect("valid pattern"));
    let separators = SEPARATORS.get_or_init(|| Regex::new(r"[\s_-]+").expect("valid pattern"));

    let text = text.trim().to_lowercase();
    let text = strip.replace_all(&text, "");
    let text = separators.replace_all(&text, "-");
    let text = text.trim_matches('-');

    if text.is_empty() {
        "place".to_string()
    } else {
        text.to_string()
    }
}

/// Derive the stored file name for an uploaded photo.
///
/// The name combines the slugged suggestion with the upload timestamp, so
/// repeated uploads for the same place do not collide.
#[must_use]
pub fn file_name(suggested: &str, format: PhotoFormat, at: DateTime<Utc>) -> String {
    format!(
        "{}-{}.{}",
        slugify(suggested),
        at.timestamp(),
        format.extension()
    )
}
