//! # CLI Command Implementations
//!
//! Each command reads row files, runs the aggregation and returns the JSON
//! document to print.

use facetview_core::{
    AggregationConfig, Catalog, FacetError, RowInput, SelectionController, UntypedRow,
    derive_facets_from, normalize_properties_from, parse_bindings,
};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE INPUT
// =============================================================================

/// Maximum size of a row file (100 MB).
const MAX_INPUT_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Resolve an input path, rejecting anything that is not a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, FacetError> {
    let canonical = path.canonicalize().map_err(|e| {
        FacetError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(FacetError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Read a row file into untyped rows.
pub fn read_rows(path: &Path) -> Result<Vec<UntypedRow>, FacetError> {
    let path = validate_file_path(path)?;

    let metadata = std::fs::metadata(&path)
        .map_err(|e| FacetError::Io(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > MAX_INPUT_FILE_SIZE {
        return Err(FacetError::Io(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_INPUT_FILE_SIZE
        )));
    }

    let text = std::fs::read_to_string(&path)
        .map_err(|e| FacetError::Io(format!("Cannot read '{}': {}", path.display(), e)))?;
    let rows = parse_bindings(&text)?;

    tracing::debug!(path = %path.display(), rows = rows.len(), "read row file");
    Ok(rows)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, FacetError> {
    serde_json::to_value(value).map_err(|e| FacetError::Serialization(e.to_string()))
}

/// Split a `PROPERTY_URI=VALUE` argument at the first `=`.
///
/// Property URIs rarely contain `=`; values (often URIs with query strings)
/// may.
pub fn parse_selection_arg(arg: &str) -> Result<(&str, &str), FacetError> {
    match arg.split_once('=') {
        Some((property, value)) if !property.is_empty() && !value.is_empty() => {
            Ok((property, value))
        }
        _ => Err(FacetError::Config(format!(
            "Invalid selection '{}': expected PROPERTY_URI=VALUE",
            arg
        ))),
    }
}

// =============================================================================
// FACETS COMMAND
// =============================================================================

/// Derive filter groups from a facet row file.
pub fn cmd_facets(file: &Path) -> Result<Value, FacetError> {
    let rows = read_rows(file)?;
    let groups = derive_facets_from(RowInput::Untyped(rows))?;
    to_json(&groups)
}

// =============================================================================
// ENTITIES COMMAND
// =============================================================================

/// Normalize a property row file.
pub fn cmd_entities(file: &Path, config: &AggregationConfig) -> Result<Value, FacetError> {
    let rows = read_rows(file)?;
    let table = normalize_properties_from(RowInput::Untyped(rows), config)?;
    to_json(&table)
}

// =============================================================================
// CATALOG COMMAND
// =============================================================================

/// Build the full catalog from a facet file and a property file.
pub fn cmd_catalog(
    facets: &Path,
    properties: &Path,
    config: &AggregationConfig,
) -> Result<Value, FacetError> {
    let catalog = Catalog::load(
        RowInput::Untyped(read_rows(facets)?),
        RowInput::Untyped(read_rows(properties)?),
        config,
    )?;
    to_json(&catalog)
}

// =============================================================================
// SELECT COMMAND
// =============================================================================

/// Replay selections through a controller and report the filter state.
///
/// No re-query callback is registered: the output shows the selection that
/// would be handed to one.
pub async fn cmd_select(
    facets: &Path,
    selections: &[String],
    config: &AggregationConfig,
) -> Result<Value, FacetError> {
    let rows = read_rows(facets)?;
    let controller = SelectionController::from_rows(RowInput::Untyped(rows), None, config)?;

    for arg in selections {
        let (property, value) = parse_selection_arg(arg)?;
        controller.toggle(property, value, true).await?;
    }

    Ok(json!({
        "selection": to_json(&controller.external_selection())?,
        "filterGroups": to_json(&controller.filter_groups_view())?,
    }))
}

// =============================================================================
// TESTS
// =============================================================================
