//! Error types for famispots.
//!
//! This module defines all error types used throughout the famispots crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for famispots operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Validation Errors ===
    /// A required submission field is missing or empty.
    #[error("invalid submission: {field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the validation failure.
        message: String,
    },

    /// An uploaded photo is not a recognized image type.
    #[error("unsupported photo format: {detected}")]
    UnsupportedFormat {
        /// What the upload looked like (format name or "unknown").
        detected: String,
    },

    // === Local Storage Errors ===
    /// Failed to open or create the places file.
    #[error("failed to open places file at {path}: {source}")]
    CsvOpen {
        /// Path to the places file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to read rows from the places file.
    #[error("failed to read places file at {path}: {source}")]
    CsvRead {
        /// Path to the places file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: csv::Error,
    },

    /// Failed to append a row to the places file.
    #[error("failed to write places file at {path}: {source}")]
    CsvWrite {
        /// Path to the places file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: csv::Error,
    },

    /// Failed to write an uploaded photo to disk.
    #[error("failed to write photo at {path}: {source}")]
    PhotoWrite {
        /// Path the photo was being written to.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Remote Storage Errors ===
    /// The remote backend was unreachable or the request failed in transit.
    #[error("remote backend error: {message}")]
    Remote {
        /// Description of what went wrong.
        message: String,
    },

    /// The remote backend answered with a non-success status.
    #[error("remote backend returned {status}: {body}")]
    RemoteStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for famispots operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Remote {
            message: err.to_string(),
        }
    }
}

impl Error {
    /// Create a new validation error for the given field.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a new unsupported-format error.
    #[must_use]
    pub fn unsupported_format(detected: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            detected: detected.into(),
        }
    }

    /// Create a new remote backend error.
    #[must_use]
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// Check if this error was caused by an invalid submission.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error was caused by an unrecognized photo format.
    #[must_use]
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, Self::UnsupportedFormat { .. })
    }

    /// Check if this error indicates the storage medium failed.
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::CsvOpen { .. }
                | Self::CsvRead { .. }
                | Self::CsvWrite { .. }
                | Self::PhotoWrite { .. }
                | Self::DirectoryCreate { .. }
                | Self::Remote { .. }
                | Self::RemoteStatus { .. }
                | Self::Io(_)
        )
    }
}
