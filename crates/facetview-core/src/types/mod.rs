//! # Core Type Definitions
//!
//! This module contains the view-model types produced by the aggregation
//! engine and the error type shared by every fallible operation:
//! - Facet output (`FilterItem`, `FilterGroup`)
//! - Entity table output (`PropertyValue`, `PropertyColumn`, `NormalizedEntity`)
//! - Error types (`FacetError`, `BoxError`)
//!
//! ## Serialization
//!
//! Output types serialize with camelCase field names, which is the shape the
//! UI layer reads.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// FACET OUTPUT
// =============================================================================

/// One selectable value of a facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterItem {
    /// The raw value (usually a URI) used for selection and re-queries.
    pub value: String,
    /// Display string, `"{valueLabel} ({count})"`.
    pub label: String,
    /// Whether the value is currently selected.
    #[serde(default)]
    pub checked: bool,
    /// Occurrence count reported by the query layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl FilterItem {
    /// Create an unchecked item with a count-bearing label.
    #[must_use]
    pub fn new(value: impl Into<String>, value_label: &str, count: u64) -> Self {
        Self {
            value: value.into(),
            label: format!("{} ({})", value_label, count),
            checked: false,
            count: Some(count),
        }
    }

    /// Create an unchecked item whose label shows the count as reported
    /// upstream (`"007"` stays `"007"`).
    #[must_use]
    pub fn with_count_text(
        value: impl Into<String>,
        value_label: &str,
        count_text: &str,
        count: u64,
    ) -> Self {
        Self {
            value: value.into(),
            label: format!("{} ({})", value_label, count_text),
            checked: false,
            count: Some(count),
        }
    }

    /// Count used for ordering; items without a count sort last.
    #[must_use]
    pub fn sort_count(&self) -> u64 {
        self.count.unwrap_or(0)
    }
}

/// One property's facet: a titled list of selectable values.
///
/// `id`, `title` and `name` all carry the property label. Different UI slots
/// read different fields, so all three are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterGroup {
    pub id: String,
    pub title: String,
    pub name: String,
    pub items: Vec<FilterItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_uri: Option<String>,
}

impl FilterGroup {
    /// Create a group for a property, with all label slots set to `label`.
    #[must_use]
    pub fn new(property_uri: impl Into<String>, label: &str, items: Vec<FilterItem>) -> Self {
        Self {
            id: label.to_string(),
            title: label.to_string(),
            name: label.to_string(),
            items,
            property_uri: Some(property_uri.into()),
        }
    }

    /// Look up an item by its raw value.
    #[must_use]
    pub fn item(&self, value: &str) -> Option<&FilterItem> {
        self.items.iter().find(|item| item.value == value)
    }
}

// =============================================================================
// ENTITY TABLE OUTPUT
// =============================================================================

/// A single value of a property, with its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyValue {
    pub value: String,
    pub value_label: String,
}

impl PropertyValue {
    #[must_use]
    pub fn new(value: impl Into<String>, value_label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            value_label: value_label.into(),
        }
    }

    /// The stand-in for a property an entity has no rows for.
    #[must_use]
    pub fn placeholder(missing_label: &str) -> Self {
        Self::new("", missing_label)
    }

    /// Whether this is a placeholder (empty raw value).
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.value.is_empty()
    }
}

/// All values of one property for one entity.
///
/// `values` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyColumn {
    pub property_uri: String,
    pub property_label: String,
    pub values: Vec<PropertyValue>,
}

impl PropertyColumn {
    /// A column holding exactly one placeholder value.
    #[must_use]
    pub fn placeholder(property_uri: &str, property_label: &str, missing_label: &str) -> Self {
        Self {
            property_uri: property_uri.to_string(),
            property_label: property_label.to_string(),
            values: vec![PropertyValue::placeholder(missing_label)],
        }
    }

    /// Whether this column was synthesized for a missing property.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self.values.as_slice(), [only] if only.is_placeholder())
    }
}

/// An entity with a uniform, schema-ordered set of property columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEntity {
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub columns: Vec<PropertyColumn>,
}

impl NormalizedEntity {
    /// Create an entity with no columns yet.
    #[must_use]
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            title: None,
            description: None,
            columns: Vec::new(),
        }
    }

    /// Look up a column by property URI.
    #[must_use]
    pub fn column(&self, property_uri: &str) -> Option<&PropertyColumn> {
        self.columns
            .iter()
            .find(|column| column.property_uri == property_uri)
    }

    /// The property URI sequence of this entity's columns.
    #[must_use]
    pub fn schema(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(|column| column.property_uri.as_str())
            .collect()
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Boxed error returned by re-query callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in the aggregation engine.
///
/// - Aggregation calls fail as a whole on the first malformed row
/// - Callback failures are carried through unchanged as the source
#[derive(Debug, Error)]
pub enum FacetError {
    /// A row is missing a required field.
    #[error("Row {row}: missing required field '{field}'")]
    MissingField { row: usize, field: &'static str },

    /// A row has a required field of the wrong shape.
    #[error("Row {row}: field '{field}' is not a string or binding term")]
    InvalidField { row: usize, field: &'static str },

    /// A facet row's count is not a non-negative base-10 integer.
    #[error("Row {row}: count '{value}' is not a non-negative base-10 integer")]
    InvalidCount { row: usize, value: String },

    /// The input matches neither the typed nor the untyped row shape.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The re-query callback failed.
    #[error("Re-query failed: {0}")]
    Requery(#[source] BoxError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

impl FacetError {
    /// Whether the error was raised by a malformed input row.
    #[must_use]
    pub fn is_malformed_row(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. } | Self::InvalidField { .. } | Self::InvalidCount { .. }
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
