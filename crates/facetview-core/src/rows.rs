//! # Row Module
//!
//! Input row shapes consumed from the query layer.
//!
//! - Typed rows (`RawFacetRow`, `RawPropertyRow`) are used as-is
//! - Untyped rows (JSON objects) have their required fields extracted by
//!   name; extra fields are ignored
//! - The loader decides which shape a batch has by picking a `RowInput`
//!   variant; nothing here sniffs field presence
//!
//! Field names follow the query bindings (`service`, `prop`, `propLabel`,
//! `val`, `valLabel`, `count`). The camelCase model names (`entityId`,
//! `propertyUri`, ...) are accepted as aliases.

use crate::FacetError;
use crate::primitives::{
    FIELD_COUNT, FIELD_ENTITY, FIELD_PROPERTY, FIELD_PROPERTY_LABEL, FIELD_VALUE,
    FIELD_VALUE_LABEL,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An untyped row: arbitrary string-keyed fields.
pub type UntypedRow = serde_json::Map<String, Value>;

// =============================================================================
// TYPED ROWS
// =============================================================================

/// One candidate filter value with its pre-aggregated frequency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFacetRow {
    #[serde(rename = "prop", alias = "propertyUri")]
    pub property_uri: String,
    #[serde(rename = "propLabel", alias = "propertyLabel")]
    pub property_label: String,
    #[serde(rename = "val", alias = "value")]
    pub value: String,
    #[serde(rename = "valLabel", alias = "valueLabel")]
    pub value_label: String,
    /// Raw count as reported upstream; parsed during derivation.
    pub count: String,
}

impl RawFacetRow {
    #[must_use]
    pub fn new(
        property_uri: impl Into<String>,
        property_label: impl Into<String>,
        value: impl Into<String>,
        value_label: impl Into<String>,
        count: impl Into<String>,
    ) -> Self {
        Self {
            property_uri: property_uri.into(),
            property_label: property_label.into(),
            value: value.into(),
            value_label: value_label.into(),
            count: count.into(),
        }
    }
}

/// One fact about one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPropertyRow {
    #[serde(rename = "service", alias = "entityId")]
    pub entity_id: String,
    #[serde(rename = "prop", alias = "propertyUri")]
    pub property_uri: String,
    #[serde(rename = "propLabel", alias = "propertyLabel")]
    pub property_label: String,
    #[serde(rename = "val", alias = "value")]
    pub value: String,
    #[serde(rename = "valLabel", alias = "valueLabel")]
    pub value_label: String,
}

impl RawPropertyRow {
    #[must_use]
    pub fn new(
        entity_id: impl Into<String>,
        property_uri: impl Into<String>,
        property_label: impl Into<String>,
        value: impl Into<String>,
        value_label: impl Into<String>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            property_uri: property_uri.into(),
            property_label: property_label.into(),
            value: value.into(),
            value_label: value_label.into(),
        }
    }
}

// =============================================================================
// UNTYPED EXTRACTION
// =============================================================================

/// Conversion from an untyped row into a typed row.
pub trait FromUntypedRow: Sized {
    /// Extract the required fields of `row`; `index` is reported in errors.
    fn from_untyped(row: &UntypedRow, index: usize) -> Result<Self, FacetError>;
}

/// The string carried by a field value.
///
/// Plain strings and SPARQL JSON result terms (`{"type": .., "value": ..}`)
/// are accepted.
fn term_str(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s),
        Value::Object(term) => term.get("value").and_then(Value::as_str),
        _ => None,
    }
}

fn field(
    row: &UntypedRow,
    index: usize,
    name: &'static str,
    alias: &str,
) -> Result<String, FacetError> {
    let value = row
        .get(name)
        .or_else(|| row.get(alias))
        .ok_or(FacetError::MissingField { row: index, field: name })?;

    term_str(value)
        .map(str::to_string)
        .ok_or(FacetError::InvalidField { row: index, field: name })
}

impl FromUntypedRow for RawFacetRow {
    fn from_untyped(row: &UntypedRow, index: usize) -> Result<Self, FacetError> {
        Ok(Self {
            property_uri: field(row, index, FIELD_PROPERTY, "propertyUri")?,
            property_label: field(row, index, FIELD_PROPERTY_LABEL, "propertyLabel")?,
            value: field(row, index, FIELD_VALUE, "value")?,
            value_label: field(row, index, FIELD_VALUE_LABEL, "valueLabel")?,
            count: field(row, index, FIELD_COUNT, FIELD_COUNT)?,
        })
    }
}

impl FromUntypedRow for RawPropertyRow {
    fn from_untyped(row: &UntypedRow, index: usize) -> Result<Self, FacetError> {
        Ok(Self {
            entity_id: field(row, index, FIELD_ENTITY, "entityId")?,
            property_uri: field(row, index, FIELD_PROPERTY, "propertyUri")?,
            property_label: field(row, index, FIELD_PROPERTY_LABEL, "propertyLabel")?,
            value: field(row, index, FIELD_VALUE, "value")?,
            value_label: field(row, index, FIELD_VALUE_LABEL, "valueLabel")?,
        })
    }
}

// =============================================================================
// ROW INPUT
// =============================================================================

/// A batch of rows in one of the two accepted shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum RowInput<T> {
    /// Rows already in typed form.
    Typed(Vec<T>),
    /// Rows whose fields still have to be extracted by name.
    Untyped(Vec<UntypedRow>),
}

impl<T> Default for RowInput<T> {
    fn default() -> Self {
        Self::Typed(Vec::new())
    }
}

impl<T> From<Vec<T>> for RowInput<T> {
    fn from(rows: Vec<T>) -> Self {
        Self::Typed(rows)
    }
}

impl<T: FromUntypedRow> RowInput<T> {
    /// Resolve the batch into typed rows.
    ///
    /// Fails on the first untyped row missing a field or carrying a field of
    /// the wrong shape.
    pub fn into_typed(self) -> Result<Vec<T>, FacetError> {
        match self {
            Self::Typed(rows) => Ok(rows),
            Self::Untyped(rows) => rows
                .iter()
                .enumerate()
                .map(|(index, row)| T::from_untyped(row, index))
                .collect(),
        }
    }

    /// Number of rows in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Typed(rows) => rows.len(),
            Self::Untyped(rows) => rows.len(),
        }
    }

    /// Check if the batch has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// BINDING DOCUMENTS
// =============================================================================

/// Parse a JSON document into untyped rows.
///
/// Accepts a bare array of row objects or a SPARQL JSON results document
/// (`{"results": {"bindings": [...]}}`). Anything else is a shape mismatch.
pub fn parse_bindings(json: &str) -> Result<Vec<UntypedRow>, FacetError> {
    let document: Value =
        serde_json::from_str(json).map_err(|e| FacetError::Serialization(e.to_string()))?;
    bindings_from_value(document)
}

/// Extract untyped rows from an already parsed JSON document.
pub fn bindings_from_value(document: Value) -> Result<Vec<UntypedRow>, FacetError> {
    let rows = match document {
        Value::Array(rows) => rows,
        Value::Object(mut object) => match object.remove("results") {
            Some(Value::Object(mut results)) => match results.remove("bindings") {
                Some(Value::Array(rows)) => rows,
                _ => {
                    return Err(FacetError::ShapeMismatch(
                        "results document has no bindings array".to_string(),
                    ));
                }
            },
            _ => {
                return Err(FacetError::ShapeMismatch(
                    "expected an array of rows or a results document".to_string(),
                ));
            }
        },
        other => {
            return Err(FacetError::ShapeMismatch(format!(
                "expected an array of rows, found {}",
                json_kind(&other)
            )));
        }
    };

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| match row {
            Value::Object(fields) => Ok(fields),
            other => Err(FacetError::ShapeMismatch(format!(
                "row {} is {}, not an object",
                index,
                json_kind(&other)
            ))),
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// =============================================================================
// TESTS
// =============================================================================
