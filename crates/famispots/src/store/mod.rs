//! Listing store for famispots.
//!
//! This module defines the storage contract for place records and the two
//! interchangeable backends that satisfy it: an append-only CSV file on
//! local disk, and a Supabase-style hosted table with a photo bucket.
//! The HTTP layer only ever sees the trait, so the active backend is purely
//! a configuration choice.

pub mod local;
pub mod remote;

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::{BackendKind, Config};
use crate::error::Result;
use crate::place::{NewPlace, Place};

pub use local::CsvStore;
pub use remote::RemoteStore;

/// Durable, append-only collection of place records.
///
/// Rows are immutable once written; there is no update or delete operation.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// The name of this backend (for logging and health output).
    fn backend_name(&self) -> &'static str;

    /// Return every stored place in insertion order.
    ///
    /// Idempotent and side-effect free; an empty store yields an empty vec.
    ///
    /// # Errors
    ///
    /// Returns a storage-class error if the underlying medium is unreadable.
    async fn list_all(&self) -> Result<Vec<Place>>;

    /// Validate and append a submission, assigning its `created_at`.
    ///
    /// Returns the stored place. On validation failure nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the submission has an empty name, or a
    /// storage-class error if the underlying medium is unwritable.
    async fn append(&self, place: NewPlace) -> Result<Place>;

    /// Persist an uploaded photo and return its reference.
    ///
    /// The reference is a path relative to the data directory (local backend)
    /// or a public URL (remote backend).
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedFormat` if the bytes are not a supported
    /// image type (nothing is written), or a storage-class error on write
    /// failure.
    async fn save_photo(&self, bytes: &[u8], suggested_name: &str) -> Result<String>;

    /// Count stored places. Default goes through `list_all`.
    ///
    /// # Errors
    ///
    /// Returns a storage-class error if the underlying medium is unreadable.
    async fn count(&self) -> Result<usize> {
        Ok(self.list_all().await?.len())
    }
}

/// Open the backend selected by the configuration.
///
/// # Errors
///
/// Returns an error if the local places file cannot be opened or the remote
/// client cannot be constructed.
pub fn open_store(config: &Config) -> Result<Box<dyn ListingStore>> {
    let store: Box<dyn ListingStore> = match config.backend {
        BackendKind::Local => Box::new(CsvStore::open(
            config.places_path(),
            config.images_dir(),
        )?),
        BackendKind::Remote => Box::new(RemoteStore::new(&config.remote)?),
    };
    info!("Opened {} listing store", store.backend_name());
    Ok(store)
}

/// Issues append timestamps that never move backwards.
///
/// Wall clocks can step backwards (NTP adjustments); stored rows must keep
/// `created_at` non-decreasing in insertion order, so the floor clamps each
/// issued timestamp to the newest one seen so far.
#[derive(Debug, Default)]
pub(crate) struct TimestampFloor {
    newest: Mutex<Option<DateTime<Utc>>>,
}

impl TimestampFloor {
    /// Create a floor seeded with the newest existing row timestamp.
    pub(crate) fn seeded(newest: Option<DateTime<Utc>>) -> Self {
        Self {
            newest: Mutex::new(newest),
        }
    }

    /// Raise the floor to at least `ts`.
    ///
    /// Used when the newest existing row is only discovered after
    /// construction, as with the remote backend.
    pub(crate) fn observe(&self, ts: DateTime<Utc>) {
        let mut newest = self
            .newest
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if newest.map_or(true, |n| ts > n) {
            *newest = Some(ts);
        }
    }

    /// Issue the next append timestamp.
    pub(crate) fn next(&self) -> DateTime<Utc> {
        let mut newest = self.newest.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let now = Utc::now();
        let issued = match *newest {
            Some(floor) if now < floor => floor,
            _ => now,
        };
        *newest = Some(issued);
        issued
    }
}
