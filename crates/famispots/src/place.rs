//! Core domain types for famispots.
//!
//! This module defines the fundamental data structures for representing
//! submitted family-friendly places.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The kind of place a submission describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// An outdoor playground.
    #[default]
    Playground,
    /// A family-friendly café or restaurant.
    Cafe,
    /// An indoor activity (museum, pool, climbing hall, ...).
    IndoorActivity,
    /// An outdoor activity (hike, lake, park, ...).
    OutdoorActivity,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Playground => write!(f, "playground"),
            Self::Cafe => write!(f, "cafe"),
            Self::IndoorActivity => write!(f, "indoor_activity"),
            Self::OutdoorActivity => write!(f, "outdoor_activity"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "playground" => Ok(Self::Playground),
            "cafe" => Ok(Self::Cafe),
            "indoor_activity" => Ok(Self::IndoorActivity),
            "outdoor_activity" => Ok(Self::OutdoorActivity),
            other => Err(Error::validation(
                "category",
                format!("unknown category '{other}'"),
            )),
        }
    }
}

/// A stored place record.
///
/// Represents a single submitted location with the timestamp assigned by
/// the listing store. Rows are immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    /// Display name of the place. Never empty in a stored row.
    pub name: String,

    /// Free-text description. Empty string when the submitter left it blank.
    #[serde(default)]
    pub description: String,

    /// Which kind of place this is.
    pub category: Category,

    /// Free-text location (city/region) or a coordinate pair.
    #[serde(default)]
    pub location: String,

    /// Relative path or public URL of the uploaded photo, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_reference: Option<String>,

    /// When this place was appended to the store.
    pub created_at: DateTime<Utc>,
}

/// A place submission, before the store assigns `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlace {
    /// Display name of the place. Required.
    pub name: String,

    /// Free-text description.
    #[serde(default)]
    pub description: String,

    /// Which kind of place this is.
    #[serde(default)]
    pub category: Category,

    /// Free-text location (city/region) or a coordinate pair.
    #[serde(default)]
    pub location: String,

    /// Reference returned by an earlier photo upload, if any.
    #[serde(default)]
    pub photo_reference: Option<String>,
}

impl NewPlace {
    /// Create a submission with only the required name set.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            category: Category::default(),
            location: String::new(),
            photo_reference: None,
        }
    }

    /// Validate the submission.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if `name` is empty or whitespace-only.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("name", "name must not be empty"));
        }
        Ok(())
    }

    /// Turn the submission into a stored place with the given timestamp.
    #[must_use]
    pub fn into_place(self, created_at: DateTime<Utc>) -> Place {
        Place {
            name: self.name,
            description: self.description,
            category: self.category,
            location: self.location,
            photo_reference: self.photo_reference,
            created_at,
        }
    }
}
