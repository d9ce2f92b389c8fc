//! Local flat-file backend for the listing store.
//!
//! Places live in a single CSV file with a fixed header; uploaded photos
//! land in an images directory next to it. The file is append-only: each
//! accepted submission adds exactly one row and existing rows are never
//! rewritten. Appends are serialized through a write lock so concurrent
//! submissions cannot interleave rows.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::photo::{self, PhotoFormat};
use crate::place::{Category, NewPlace, Place};
use crate::store::{ListingStore, TimestampFloor};

/// Column order of the places file.
pub const CSV_HEADERS: [&str; 6] = [
    "name",
    "description",
    "category",
    "location",
    "photo_reference",
    "created_at",
];

/// One line of the places file.
///
/// Every field is text so the on-disk representation stays explicit; the
/// conversions to and from [`Place`] live here and nowhere else.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    name: String,
    description: String,
    category: String,
    location: String,
    photo_reference: String,
    created_at: String,
}

impl CsvRow {
    fn from_place(place: &Place) -> Self {
        Self {
            name: place.name.clone(),
            description: place.description.clone(),
            category: place.category.to_string(),
            location: place.location.clone(),
            photo_reference: place.photo_reference.clone().unwrap_or_default(),
            created_at: place.created_at.to_rfc3339(),
        }
    }

    /// Convert a stored row back into a place.
    ///
    /// Rows written by other tools may carry values this version does not
    /// know; those are tolerated with a warning rather than failing the
    /// whole listing.
    fn into_place(self) -> Place {
        let category = self.category.parse::<Category>().unwrap_or_else(|_| {
            warn!(
                "Unknown category '{}' in row '{}', defaulting",
                self.category, self.name
            );
            Category::default()
        });

        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_or_else(
                |_| {
                    warn!(
                        "Unparseable created_at '{}' in row '{}'",
                        self.created_at, self.name
                    );
                    Utc::now()
                },
                |dt| dt.with_timezone(&Utc),
            );

        Place {
            name: self.name,
            description: self.description,
            category,
            location: self.location,
            photo_reference: if self.photo_reference.is_empty() {
                None
            } else {
                Some(self.photo_reference)
            },
            created_at,
        }
    }
}

/// Listing store backed by an append-only CSV file.
#[derive(Debug)]
pub struct CsvStore {
    /// Path to the places file.
    path: PathBuf,
    /// Directory uploaded photos are written to.
    images_dir: PathBuf,
    /// Serializes appends; the original sheet had unsynchronized writers.
    write_lock: Mutex<()>,
    /// Keeps issued `created_at` values non-decreasing.
    floor: TimestampFloor,
}

impl CsvStore {
    /// Open or create a places file at the given path.
    ///
    /// Creates the parent directories, the images directory, and a
    /// header-only file if they don't exist. Existing rows are scanned once
    /// to seed the timestamp floor.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or an existing
    /// file cannot be read.
    pub fn open(path: impl AsRef<Path>, images_dir: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let images_dir = images_dir.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        if !images_dir.exists() {
            std::fs::create_dir_all(&images_dir).map_err(|source| Error::DirectoryCreate {
                path: images_dir.clone(),
                source,
            })?;
        }

        // A zero-byte file needs the header just like a missing one,
        // otherwise the first appended row would be consumed as the header.
        let needs_header = if path.exists() {
            let metadata = std::fs::metadata(&path).map_err(|source| Error::CsvOpen {
                path: path.clone(),
                source,
            })?;
            metadata.len() == 0
        } else {
            true
        };

        if needs_header {
            debug!("Creating places file at {}", path.display());
            let file = File::create(&path).map_err(|source| Error::CsvOpen {
                path: path.clone(),
                source,
            })?;
            let mut writer = csv::Writer::from_writer(file);
            writer
                .write_record(CSV_HEADERS)
                .and_then(|()| writer.flush().map_err(csv::Error::from))
                .map_err(|source| Error::CsvWrite {
                    path: path.clone(),
                    source,
                })?;
        } else {
            debug!("Opening places file at {}", path.display());
        }

        let newest = Self::read_rows(&path)?
            .iter()
            .map(|place| place.created_at)
            .max();

        info!("Places file opened at {}", path.display());
        Ok(Self {
            path,
            images_dir,
            write_lock: Mutex::new(()),
            floor: TimestampFloor::seeded(newest),
        })
    }

    /// Get the path to the places file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve a photo reference produced by this store to a full path.
    #[must_use]
    pub fn resolve_photo(&self, reference: &str) -> PathBuf {
        self.images_dir
            .parent()
            .unwrap_or(&self.images_dir)
            .join(reference)
    }

    /// Read every row of the places file in storage order.
    fn read_rows(path: &Path) -> Result<Vec<Place>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|source| Error::CsvRead {
                path: path.to_path_buf(),
                source,
            })?;

        let mut places = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            let row = row.map_err(|source| Error::CsvRead {
                path: path.to_path_buf(),
                source,
            })?;
            places.push(row.into_place());
        }
        Ok(places)
    }

    /// The directory-relative reference stored for a photo file name.
    fn photo_reference(&self, file_name: &str) -> String {
        let dir = self
            .images_dir
            .file_name()
            .map_or_else(|| "images".to_string(), |s| s.to_string_lossy().into_owned());
        format!("{dir}/{file_name}")
    }
}

#[async_trait]
impl ListingStore for CsvStore {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    async fn list_all(&self) -> Result<Vec<Place>> {
        Self::read_rows(&self.path)
    }

    async fn append(&self, place: NewPlace) -> Result<Place> {
        place.validate()?;

        // Nothing below the validation gate writes more than one row, and
        // the lock keeps concurrent appends from interleaving records.
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let place = place.into_place(self.floor.next());
        let row = CsvRow::from_place(&place);

        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|source| Error::CsvOpen {
                path: self.path.clone(),
                source,
            })?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer
            .serialize(&row)
            .and_then(|()| writer.flush().map_err(csv::Error::from))
            .map_err(|source| Error::CsvWrite {
                path: self.path.clone(),
                source,
            })?;

        debug!("Appended place '{}'", place.name);
        Ok(place)
    }

    async fn save_photo(&self, bytes: &[u8], suggested_name: &str) -> Result<String> {
        // Sniff before touching the filesystem so rejected uploads leave
        // nothing behind.
        let format = PhotoFormat::sniff(bytes)?;
        let file_name = photo::file_name(suggested_name, format, Utc::now());
        let path = self.images_dir.join(&file_name);

        std::fs::write(&path, bytes).map_err(|source| Error::PhotoWrite {
            path: path.clone(),
            source,
        })?;

        debug!("Saved photo at {}", path.display());
        Ok(self.photo_reference(&file_name))
    }
}
