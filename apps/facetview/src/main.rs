//! # facetview
//!
//! Command-line front end for the facetview aggregation engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │           apps/facetview (THE BINARY)       │
//! │                                             │
//! │   row files ──▶ CLI (clap) ──▶ JSON stdout  │
//! │                     │                       │
//! │                     ▼                       │
//! │            ┌─────────────────┐              │
//! │            │ facetview-core  │              │
//! │            │   (THE LOGIC)   │              │
//! │            └─────────────────┘              │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! facetview facets -f facets.json
//! facetview entities -f services.json
//! facetview catalog --facets facets.json --properties services.json
//! facetview select --facets facets.json -s http://purl.org/dc/terms/format=csv
//! ```

use clap::Parser;
use facetview::cli::{self, Cli};
use facetview::{AppConfig, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = AppConfig::resolve(cli.config.as_deref());
    let log_format = config
        .as_ref()
        .map(|c| c.log_format)
        .unwrap_or_default();
    init_tracing(log_format, cli.verbose);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Error: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = cli::execute(cli, &config).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Install the tracing subscriber. Logs go to stderr; stdout carries results.
fn init_tracing(format: LogFormat, verbose: bool) {
    let default_filter = if verbose {
        "facetview=debug,facetview_core=debug"
    } else {
        "facetview=info,facetview_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
