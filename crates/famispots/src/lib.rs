//! `famispots` - A community catalog of family-friendly places in Switzerland
//!
//! This library provides the core functionality for collecting and browsing
//! submitted places: an append-only listing store with interchangeable local
//! CSV and remote hosted backends, plus a thin HTTP layer over it.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod photo;
pub mod place;
pub mod store;

pub use config::{BackendKind, Config};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use place::{Category, NewPlace, Place};
pub use store::{open_store, CsvStore, ListingStore, RemoteStore};
