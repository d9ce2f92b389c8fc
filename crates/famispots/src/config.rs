//! Configuration management for famispots.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "famispots";

/// Default places file name inside the data directory.
const PLACES_FILE_NAME: &str = "places.csv";

/// Default photo directory name inside the data directory.
const IMAGES_DIR_NAME: &str = "images";

/// Which listing store backend is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Append-only CSV file plus a local photo directory.
    #[default]
    Local,
    /// Supabase-style hosted table and storage bucket.
    Remote,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FAMISPOTS_`, nesting separated
///    by a double underscore: `FAMISPOTS_REMOTE__API_KEY` sets
///    `remote.api_key`)
/// 2. TOML config file at `~/.config/famispots/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which backend to open at startup.
    pub backend: BackendKind,
    /// Local storage configuration.
    pub storage: StorageConfig,
    /// Remote backend configuration.
    pub remote: RemoteConfig,
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Photo upload configuration.
    pub upload: UploadConfig,
}

/// Local storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the places file and uploaded photos.
    /// Defaults to `~/.local/share/famispots`.
    pub data_dir: Option<PathBuf>,
    /// Places file name, relative to `data_dir` unless absolute.
    pub places_file: Option<PathBuf>,
}

/// Remote backend configuration (Supabase-style REST service).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the hosted service.
    pub url: String,
    /// API key (anon key for public deployments, service role locally).
    pub api_key: String,
    /// Table holding place rows.
    pub table: String,
    /// Storage bucket holding uploaded photos.
    pub bucket: String,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind: IpAddr,
    /// Port to listen on.
    pub port: u16,
}

/// Photo upload configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum accepted photo size in bytes.
    pub max_bytes: usize,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            table: "places".to_string(),
            bucket: "place-photos".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024, // 10 MiB
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `FAMISPOTS_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        // Nesting splits on a double underscore so leaf keys can keep
        // single underscores (remote.api_key, upload.max_bytes).
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("FAMISPOTS_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid, or if the
    /// remote backend is selected without its connection descriptor.
    pub fn validate(&self) -> Result<()> {
        if self.backend == BackendKind::Remote {
            let mut missing = Vec::new();
            if self.remote.url.is_empty() {
                missing.push("remote.url");
            }
            if self.remote.api_key.is_empty() {
                missing.push("remote.api_key");
            }
            if self.remote.bucket.is_empty() {
                missing.push("remote.bucket");
            }
            if self.remote.table.is_empty() {
                missing.push("remote.table");
            }
            if !missing.is_empty() {
                return Err(Error::ConfigValidation {
                    message: format!(
                        "remote backend selected but missing: {}",
                        missing.join(", ")
                    ),
                });
            }
        }

        if self.server.port == 0 {
            return Err(Error::ConfigValidation {
                message: "server.port must be greater than 0".to_string(),
            });
        }

        if self.upload.max_bytes == 0 {
            return Err(Error::ConfigValidation {
                message: "upload.max_bytes must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the data directory, resolving defaults if not set.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// Get the places file path, resolving defaults if not set.
    ///
    /// A relative `places_file` is anchored at the data directory.
    #[must_use]
    pub fn places_path(&self) -> PathBuf {
        match &self.storage.places_file {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.data_dir().join(path),
            None => self.data_dir().join(PLACES_FILE_NAME),
        }
    }

    /// Get the directory uploaded photos are written to.
    #[must_use]
    pub fn images_dir(&self) -> PathBuf {
        self.data_dir().join(IMAGES_DIR_NAME)
    }
}
