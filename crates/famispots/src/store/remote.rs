//! Remote hosted backend for the listing store.
//!
//! Talks to a Supabase-style service: place rows live in a REST-exposed
//! table mirroring the CSV columns, uploaded photos go to a storage bucket
//! and are referenced by their public URL. Failures are surfaced to the
//! caller as-is; requests are not retried.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::photo::{self, PhotoFormat};
use crate::place::{Category, NewPlace, Place};
use crate::store::{ListingStore, TimestampFloor};

/// One row of the hosted places table.
#[derive(Debug, Serialize, Deserialize)]
struct RemoteRow {
    name: String,
    #[serde(default)]
    description: String,
    category: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    photo_reference: Option<String>,
    created_at: String,
}

impl RemoteRow {
    fn from_place(place: &Place) -> Self {
        Self {
            name: place.name.clone(),
            description: place.description.clone(),
            category: place.category.to_string(),
            location: place.location.clone(),
            photo_reference: place.photo_reference.clone(),
            created_at: place.created_at.to_rfc3339(),
        }
    }

    /// Convert a fetched row into a place, tolerating values written by
    /// other clients.
    fn into_place(self) -> Place {
        let category = self.category.parse::<Category>().unwrap_or_else(|_| {
            warn!(
                "Unknown category '{}' in remote row '{}', defaulting",
                self.category, self.name
            );
            Category::default()
        });

        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

        Place {
            name: self.name,
            description: self.description,
            category,
            location: self.location,
            photo_reference: self.photo_reference.filter(|r| !r.is_empty()),
            created_at,
        }
    }
}

/// Listing store backed by a hosted table and storage bucket.
#[derive(Debug)]
pub struct RemoteStore {
    client: Client,
    /// Base URL without a trailing slash.
    base_url: String,
    api_key: String,
    table: String,
    bucket: String,
    floor: TimestampFloor,
    /// Whether the floor has been raised to the newest existing row yet.
    floor_seeded: AtomicBool,
}

impl RemoteStore {
    /// Build a client for the configured remote service.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|err| Error::remote(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            table: config.table.clone(),
            bucket: config.bucket.clone(),
            floor: TimestampFloor::default(),
            floor_seeded: AtomicBool::new(false),
        })
    }

    /// REST endpoint of the places table.
    fn rows_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    /// Upload endpoint for a photo object.
    fn object_url(&self, file_name: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, file_name
        )
    }

    /// Public URL a stored photo is served from.
    fn public_url(&self, file_name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, file_name
        )
    }

    /// Attach the service credentials to a request.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// Raise the timestamp floor to the newest row already in the table.
    ///
    /// The table is shared with other writers, so the newest row is only
    /// known at runtime. Fetching it once before the first insert keeps
    /// `created_at` non-decreasing across restarts; later inserts are
    /// ordered by the floor itself.
    async fn seed_floor(&self) -> Result<()> {
        if self.floor_seeded.load(Ordering::Acquire) {
            return Ok(());
        }

        let response = self
            .authorize(self.client.get(self.rows_url()))
            .query(&[
                ("select", "created_at"),
                ("order", "created_at.desc"),
                ("limit", "1"),
            ])
            .send()
            .await?;
        let response = Self::check(response).await?;

        let rows: Vec<serde_json::Value> = response.json().await?;
        if let Some(newest) = rows
            .first()
            .and_then(|row| row.get("created_at"))
            .and_then(serde_json::Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        {
            self.floor.observe(newest.with_timezone(&Utc));
        }

        self.floor_seeded.store(true, Ordering::Release);
        Ok(())
    }

    /// Turn a non-success response into a `RemoteStatus` error.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_else(|_| String::new());
        Err(Error::RemoteStatus {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ListingStore for RemoteStore {
    fn backend_name(&self) -> &'static str {
        "remote"
    }

    async fn list_all(&self) -> Result<Vec<Place>> {
        let response = self
            .authorize(self.client.get(self.rows_url()))
            .query(&[("select", "*"), ("order", "created_at.asc")])
            .send()
            .await?;
        let response = Self::check(response).await?;

        let rows: Vec<RemoteRow> = response.json().await?;
        Ok(rows.into_iter().map(RemoteRow::into_place).collect())
    }

    async fn append(&self, place: NewPlace) -> Result<Place> {
        place.validate()?;
        self.seed_floor().await?;

        let place = place.into_place(self.floor.next());
        let row = RemoteRow::from_place(&place);

        let response = self
            .authorize(self.client.post(self.rows_url()))
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await?;
        Self::check(response).await?;

        debug!("Inserted place '{}' into remote table", place.name);
        Ok(place)
    }

    async fn save_photo(&self, bytes: &[u8], suggested_name: &str) -> Result<String> {
        let format = PhotoFormat::sniff(bytes)?;
        let file_name = photo::file_name(suggested_name, format, Utc::now());

        let response = self
            .authorize(self.client.post(self.object_url(&file_name)))
            .header("Content-Type", format.content_type())
            .header("x-upsert", "true")
            .body(bytes.to_vec())
            .send()
            .await?;
        Self::check(response).await?;

        debug!("Uploaded photo '{}' to bucket '{}'", file_name, self.bucket);
        Ok(self.public_url(&file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RemoteConfig {
        RemoteConfig {
            url: "https://example.supabase.co/".to_string(),
            api_key: "anon-key".to_string(),
            table: "places".to_string(),
            bucket: "place-photos".to_string(),
        }
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let store = RemoteStore::new(&test_config()).unwrap();
        assert_eq!(store.base_url, "https://example.supabase.co");
    }

    #[test]
    fn test_rows_url() {
        let store = RemoteStore::new(&test_config()).unwrap();
        assert_eq!(
            store.rows_url(),
            "https://example.supabase.co/rest/v1/places"
        );
    }

    #[test]
    fn test_object_and_public_urls() {
        let store = RemoteStore::new(&test_config()).unwrap();
        assert_eq!(
            store.object_url("parc-1700000000.png"),
            "https://example.supabase.co/storage/v1/object/place-photos/parc-1700000000.png"
        );
        assert_eq!(
            store.public_url("parc-1700000000.png"),
            "https://example.supabase.co/storage/v1/object/public/place-photos/parc-1700000000.png"
        );
    }

    #[test]
    fn test_backend_name() {
        let store = RemoteStore::new(&test_config()).unwrap();
        assert_eq!(store.backend_name(), "remote");
    }

    #[tokio::test]
    async fn test_append_validates_before_network() {
        // An empty name must fail locally; the URL is unreachable, so any
        // network attempt would surface as a storage error instead.
        let store = RemoteStore::new(&RemoteConfig {
            url: "http://127.0.0.1:1".to_string(),
            ..test_config()
        })
        .unwrap();

        let err = store.append(NewPlace::named("  ")).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_append_seeds_floor_before_insert() {
        // The first append fetches the newest existing row to raise the
        // timestamp floor; against an unreachable service that fetch is
        // the failure the caller sees.
        let store = RemoteStore::new(&RemoteConfig {
            url: "http://127.0.0.1:1".to_string(),
            ..test_config()
        })
        .unwrap();

        let err = store.append(NewPlace::named("Parc")).await.unwrap_err();
        assert!(err.is_storage());
        assert!(!store.floor_seeded.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn test_save_photo_sniffs_before_network() {
        let store = RemoteStore::new(&RemoteConfig {
            url: "http://127.0.0.1:1".to_string(),
            ..test_config()
        })
        .unwrap();

        let err = store.save_photo(b"not an image", "x").await.unwrap_err();
        assert!(err.is_unsupported_format());
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_storage_error() {
        let store = RemoteStore::new(&RemoteConfig {
            url: "http://127.0.0.1:1".to_string(),
            ..test_config()
        })
        .unwrap();

        let err = store.list_all().await.unwrap_err();
        assert!(err.is_storage());
    }

    #[test]
    fn test_remote_row_mapping_round_trip() {
        let place = NewPlace::named("Aquatis")
            .into_place(DateTime::from_timestamp(1_700_000_000, 0).unwrap());
        let row = RemoteRow::from_place(&place);
        assert_eq!(row.category, "playground");
        assert!(row.photo_reference.is_none());

        assert_eq!(row.into_place(), place);
    }

    #[test]
    fn test_remote_row_deserialize_with_nulls() {
        let json = r#"{
            "name": "Parc",
            "category": "playground",
            "photo_reference": null,
            "created_at": "2024-05-01T10:00:00+00:00"
        }"#;
        let row: RemoteRow = serde_json::from_str(json).unwrap();
        let place = row.into_place();
        assert!(place.photo_reference.is_none());
        assert!(place.description.is_empty());
    }

    #[test]
    fn test_remote_row_unknown_category_defaults() {
        let json = r#"{
            "name": "Ferme",
            "category": "petting_zoo",
            "created_at": "2024-05-01T10:00:00+00:00"
        }"#;
        let row: RemoteRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.into_place().category, Category::default());
    }
}
