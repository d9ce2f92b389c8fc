//! Tracing setup for the famispots server.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// `directive` is the default filter, usually scoped to this crate
/// (for example `famispots=info`). A `RUST_LOG` environment variable
/// takes precedence when set. Repeated calls leave the first subscriber
/// in place.
pub fn init_logging(directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
