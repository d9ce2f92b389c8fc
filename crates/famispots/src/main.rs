//! `famispots` - HTTP server binary
//!
//! Loads configuration, opens the configured listing store backend, and
//! serves the browsing/submission API.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use actix_web::{web, App, HttpServer};
use clap::Parser;
use tracing::info;

use famispots::http::{configure, AppState};
use famispots::{init_logging, open_store, Config};

/// famispots - community catalog of family-friendly places
///
/// Serves the place gallery and submission API over HTTP. There is no
/// other command surface; everything else happens through requests.
#[derive(Debug, Parser)]
#[command(name = "famispots")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Default log filter directive derived from the flags.
    fn log_directive(&self) -> String {
        let level = if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        };
        format!("famispots={level}")
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_directive());

    // Load configuration and open the selected backend
    let config = Config::load_from(cli.config.clone())?;
    let store = open_store(&config)?;

    let state = web::Data::new(AppState { store });
    let max_upload_bytes = config.upload.max_bytes;
    let bind = (config.server.bind, config.server.port);

    info!("Serving famispots on {}:{}", bind.0, bind.1);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(configure(max_upload_bytes))
    })
    .bind(bind)?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_log_directive_from_flags() {
        let cli = Cli::try_parse_from(["famispots"]).unwrap();
        assert_eq!(cli.log_directive(), "famispots=info");

        let cli = Cli::try_parse_from(["famispots", "-v"]).unwrap();
        assert_eq!(cli.log_directive(), "famispots=debug");

        let cli = Cli::try_parse_from(["famispots", "-vv"]).unwrap();
        assert_eq!(cli.log_directive(), "famispots=trace");

        let cli = Cli::try_parse_from(["famispots", "--quiet"]).unwrap();
        assert_eq!(cli.log_directive(), "famispots=error");
    }

    #[test]
    fn test_parse_with_config() {
        let cli = Cli::try_parse_from(["famispots", "-c", "/custom/config.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }
}
