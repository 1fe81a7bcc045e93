//! # Application Configuration
//!
//! Optional TOML file plus environment overrides.
//!
//! ## Sources (later wins)
//!
//! 1. Built-in defaults
//! 2. TOML file: `--config <path>`, else `FACETVIEW_CONFIG`
//! 3. `FACETVIEW_LOG_FORMAT` (`text` or `json`)
//!
//! ```toml
//! log_format = "json"
//!
//! [aggregation]
//! title_labels = ["Label", "Title", "Name"]
//! missing_value_label = "n/a"
//! ```

use facetview_core::{AggregationConfig, FacetError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Parse an environment value; unknown values fall back to text.
    #[must_use]
    pub fn from_env_value(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_format: LogFormat,
    pub aggregation: AggregationConfig,
}

impl AppConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, FacetError> {
        let config: Self =
            toml::from_str(text).map_err(|e| FacetError::Config(e.to_string()))?;
        config.aggregation.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load_file(path: &Path) -> Result<Self, FacetError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            FacetError::Io(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Resolve the configuration from the CLI path, the environment and
    /// the defaults.
    pub fn resolve(cli_path: Option<&Path>) -> Result<Self, FacetError> {
        let path = cli_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("FACETVIEW_CONFIG").map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::load_file(&path)?,
            None => Self::default(),
        };

        if let Ok(format) = std::env::var("FACETVIEW_LOG_FORMAT") {
            config.log_format = LogFormat::from_env_value(&format);
        }

        Ok(config)
    }
}
