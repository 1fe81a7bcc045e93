//! # facetview CLI Module
//!
//! This module implements the CLI interface for facetview.
//!
//! ## Available Commands
//!
//! - `facets` - Derive filter groups from facet rows
//! - `entities` - Normalize per-entity property rows
//! - `catalog` - Build both views from a facet file and a property file
//! - `select` - Replay selections through the controller

mod commands;

use crate::config::AppConfig;
use clap::{Parser, Subcommand};
use facetview_core::FacetError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// facetview - faceted-result aggregation
///
/// Turns exported graph-query rows into filter facets and a uniform
/// entity table.
#[derive(Parser, Debug)]
#[command(name = "facetview")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print JSON on a single line
    #[arg(long, global = true)]
    pub compact: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Derive filter groups from facet rows
    Facets {
        /// JSON file with facet rows (array or results document)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Normalize per-entity property rows
    Entities {
        /// JSON file with property rows (array or results document)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Build filter groups and entities together
    Catalog {
        /// JSON file with facet rows
        #[arg(long)]
        facets: PathBuf,

        /// JSON file with property rows
        #[arg(long)]
        properties: PathBuf,
    },

    /// Apply selections and print the resulting filter state
    Select {
        /// JSON file with facet rows
        #[arg(long)]
        facets: PathBuf,

        /// Selection as PROPERTY_URI=VALUE (repeatable)
        #[arg(short, long = "select", value_name = "PROPERTY_URI=VALUE")]
        selections: Vec<String>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli, config: &AppConfig) -> Result<(), FacetError> {
    let output = match cli.command {
        Commands::Facets { file } => cmd_facets(&file)?,
        Commands::Entities { file } => cmd_entities(&file, &config.aggregation)?,
        Commands::Catalog { facets, properties } => {
            cmd_catalog(&facets, &properties, &config.aggregation)?
        }
        Commands::Select { facets, selections } => {
            cmd_select(&facets, &selections, &config.aggregation).await?
        }
    };

    let rendered = if cli.compact {
        serde_json::to_string(&output)
    } else {
        serde_json::to_string_pretty(&output)
    }
    .map_err(|e| FacetError::Serialization(e.to_string()))?;

    println!("{}", rendered);
    Ok(())
}
