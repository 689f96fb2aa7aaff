//! # deploysort
//!
//! Command-line front end for the deploysort stage ordering engine.
//!
//! ## Usage
//!
//! ```bash
//! # Print the execution order of the stages in deploysort.toml
//! deploysort sort --detailed
//!
//! # Inspect the label index and derived edges (works on cyclic manifests)
//! deploysort -m stages.json graph
//!
//! # Fail with a non-zero exit code if the manifest cannot be sorted
//! deploysort check
//! ```
//!
//! Logging goes to stderr. `RUST_LOG` sets the filter and
//! `DEPLOYSORT_LOG_FORMAT=json` switches to JSON lines.

use clap::Parser;
use deploysort::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Parse CLI arguments first: --verbose picks the default filter.
    let cli = cli::Cli::parse();

    let log_format =
        std::env::var("DEPLOYSORT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "deploysort=debug,deploysort_core=debug"
    } else {
        "deploysort=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    // Display startup banner
    if !cli.quiet && !cli.json_mode {
        eprintln!("deploysort v{}", env!("CARGO_PKG_VERSION"));
    }

    // Execute command
    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
