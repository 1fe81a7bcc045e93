//! # Property Normalizer
//!
//! Groups property rows by entity and gives every entity the same ordered
//! set of columns.
//!
//! ## Invariants
//!
//! - Every entity of a batch has the same column count and the same
//!   property URI sequence (the canonical schema)
//! - A property an entity has no rows for becomes a single placeholder
//!   value, never an empty column
//! - An entity exists only if at least one row names it

use crate::collation::compare_labels;
use crate::config::AggregationConfig;
use crate::rows::{RawPropertyRow, RowInput};
use crate::{FacetError, NormalizedEntity, PropertyColumn, PropertyValue};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// SCHEMA
// =============================================================================

/// One column of the canonical schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaColumn {
    pub property_uri: String,
    pub property_label: String,
}

/// Compute the canonical schema of a batch.
///
/// Distinct property URIs with their first-seen label, sorted by label.
/// Equal labels keep first-seen order.
pub fn canonical_schema(rows: &[RawPropertyRow]) -> Vec<SchemaColumn> {
    let mut seen = BTreeSet::new();
    let mut schema: Vec<SchemaColumn> = rows
        .iter()
        .filter(|row| seen.insert(row.property_uri.as_str()))
        .map(|row| SchemaColumn {
            property_uri: row.property_uri.clone(),
            property_label: row.property_label.clone(),
        })
        .collect();

    schema.sort_by(|a, b| compare_labels(&a.property_label, &b.property_label));
    schema
}

// =============================================================================
// ENTITY TABLE
// =============================================================================

/// Normalized entities keyed by id, iterating in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityTable {
    schema: Vec<SchemaColumn>,
    entities: Vec<NormalizedEntity>,
    #[serde(skip)]
    index: BTreeMap<String, usize>,
}

impl EntityTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entity by id.
    #[must_use]
    pub fn get(&self, entity_id: &str) -> Option<&NormalizedEntity> {
        self.index
            .get(entity_id)
            .and_then(|&slot| self.entities.get(slot))
    }

    /// Check if an entity is present.
    #[must_use]
    pub fn contains(&self, entity_id: &str) -> bool {
        self.index.contains_key(entity_id)
    }

    /// Iterate entities in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &NormalizedEntity> {
        self.entities.iter()
    }

    /// The canonical schema shared by every entity.
    #[must_use]
    pub fn schema(&self) -> &[SchemaColumn] {
        &self.schema
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Consume the table, keeping the entities in first-seen order.
    #[must_use]
    pub fn into_entities(self) -> Vec<NormalizedEntity> {
        self.entities
    }
}

impl<'a> IntoIterator for &'a EntityTable {
    type Item = &'a NormalizedEntity;
    type IntoIter = std::slice::Iter<'a, NormalizedEntity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

// =============================================================================
// NORMALIZATION
// =============================================================================

/// An entity under construction: its own columns keyed by property URI.
struct PendingEntity<'a> {
    entity_id: &'a str,
    title: Option<&'a str>,
    description: Option<&'a str>,
    columns: BTreeMap<&'a str, (&'a str, Vec<PropertyValue>)>,
}

/// Normalize property rows with the default configuration.
pub fn normalize_properties(rows: &[RawPropertyRow]) -> EntityTable {
    normalize_properties_with(rows, &AggregationConfig::default())
}

/// Normalize property rows.
pub fn normalize_properties_with(
    rows: &[RawPropertyRow],
    config: &AggregationConfig,
) -> EntityTable {
    let schema = canonical_schema(rows);

    let mut pending: Vec<PendingEntity<'_>> = Vec::new();
    let mut by_entity: BTreeMap<&str, usize> = BTreeMap::new();

    for row in rows {
        let slot = *by_entity.entry(row.entity_id.as_str()).or_insert_with(|| {
            pending.push(PendingEntity {
                entity_id: &row.entity_id,
                title: None,
                description: None,
                columns: BTreeMap::new(),
            });
            pending.len() - 1
        });
        let entity = &mut pending[slot];

        // First match wins for both title and description
        if config.is_title_label(&row.property_label) {
            if entity.title.is_none() {
                entity.title = Some(row.value_label.as_str());
            }
        } else if config.is_description_label(&row.property_label) && entity.description.is_none()
        {
            entity.description = Some(row.value_label.as_str());
        }

        entity
            .columns
            .entry(row.property_uri.as_str())
            .or_insert_with(|| (row.property_label.as_str(), Vec::new()))
            .1
            .push(PropertyValue::new(&row.value, &row.value_label));
    }

    let mut index = BTreeMap::new();
    let entities: Vec<NormalizedEntity> = pending
        .into_iter()
        .enumerate()
        .map(|(slot, entity)| {
            index.insert(entity.entity_id.to_string(), slot);
            reconcile(entity, &schema, &config.missing_value_label)
        })
        .collect();

    tracing::debug!(
        rows = rows.len(),
        entities = entities.len(),
        columns = schema.len(),
        "normalized entity properties"
    );

    EntityTable {
        schema,
        entities,
        index,
    }
}

/// Rebuild an entity's columns in schema order, filling gaps.
fn reconcile(
    mut entity: PendingEntity<'_>,
    schema: &[SchemaColumn],
    missing_label: &str,
) -> NormalizedEntity {
    let columns = schema
        .iter()
        .map(
            |column| match entity.columns.remove(column.property_uri.as_str()) {
                Some((label, values)) => PropertyColumn {
                    property_uri: column.property_uri.clone(),
                    property_label: label.to_string(),
                    values,
                },
                None => PropertyColumn::placeholder(
                    &column.property_uri,
                    &column.property_label,
                    missing_label,
                ),
            },
        )
        .collect();

    NormalizedEntity {
        entity_id: entity.entity_id.to_string(),
        title: entity.title.map(str::to_string),
        description: entity.description.map(str::to_string),
        columns,
    }
}

/// Resolve a row batch and normalize it.
pub fn normalize_properties_from(
    input: RowInput<RawPropertyRow>,
    config: &AggregationConfig,
) -> Result<EntityTable, FacetError> {
    let rows = input.into_typed()?;
    Ok(normalize_properties_with(&rows, config))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn row(entity: &str, prop: &str, label: &str, val: &str) -> RawPropertyRow {
        RawPropertyRow::new(entity, prop, label, val, val)
    }

    #[test]
    fn empty_rows_produce_empty_table() {
        let table = normalize_properties(&[]);
        assert!(table.is_empty());
        assert!(table.schema().is_empty());
    }

    #[test]
    fn schema_sorted_by_label() {
        let rows = vec![
            row("e1", "p-theme", "Theme", "Transport"),
            row("e1", "p-access", "access rights", "public"),
            row("e2", "p-label", "Label", "Other"),
        ];

        let schema: Vec<_> = canonical_schema(&rows)
            .into_iter()
            .map(|c| c.property_label)
            .collect();
        assert_eq!(schema, vec!["access rights", "Label", "Theme"]);
    }

    #[test]
    fn first_label_wins_per_property() {
        let rows = vec![
            row("e1", "p1", "Zeta", "a"),
            row("e2", "p1", "Alpha", "b"),
        ];

        let schema = canonical_schema(&rows);
        assert_eq!(schema.len(), 1);
        assert_eq!(schema[0].property_label, "Zeta");
    }

    #[test]
    fn missing_property_gets_single_placeholder() {
        let rows = vec![
            row("e1", "p1", "Format", "csv"),
            row("e1", "p2", "Theme", "health"),
            row("e2", "p2", "Theme", "transport"),
        ];

        let table = normalize_properties(&rows);
        let e2 = table.get("e2").expect("e2");
        let format = e2.column("p1").expect("format column");
        assert_eq!(format.values, vec![PropertyValue::new("", "—")]);
        assert_eq!(format.property_label, "Format");
    }

    #[test]
    fn multi_valued_property_keeps_all_values_in_order() {
        let rows = vec![
            row("e1", "p1", "Theme", "a"),
            row("e1", "p2", "Format", "x"),
            row("e1", "p1", "Theme", "b"),
        ];

        let table = normalize_properties(&rows);
        let theme = table.get("e1").and_then(|e| e.column("p1")).expect("theme");
        let values: Vec<_> = theme.values.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(values, vec!["a", "b"]);
    }

    #[test]
    fn title_and_description_first_match_wins() {
        let rows = vec![
            RawPropertyRow::new("e1", "p-title", "Title", "t1", "First"),
            RawPropertyRow::new("e1", "p-label", "Label", "t2", "Second"),
            RawPropertyRow::new("e1", "p-desc", "Description", "d1", "Desc one"),
            RawPropertyRow::new("e1", "p-desc", "Description", "d2", "Desc two"),
        ];

        let table = normalize_properties(&rows);
        let e1 = table.get("e1").expect("e1");
        assert_eq!(e1.title.as_deref(), Some("First"));
        assert_eq!(e1.description.as_deref(), Some("Desc one"));
        // Reserved-label properties stay visible as columns
        assert_eq!(e1.columns.len(), 3);
    }

    #[test]
    fn entities_iterate_in_first_seen_order() {
        let rows = vec![
            row("b", "p1", "Theme", "x"),
            row("a", "p1", "Theme", "y"),
            row("b", "p1", "Theme", "z"),
        ];

        let table = normalize_properties(&rows);
        let ids: Vec<_> = table.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert!(table.contains("a"));
        assert!(!table.contains("c"));
    }

    #[test]
    fn custom_missing_label() {
        let config = AggregationConfig {
            missing_value_label: "n/a".to_string(),
            ..AggregationConfig::default()
        };
        let rows = vec![row("e1", "p1", "Theme", "x"), row("e2", "p2", "Format", "y")];

        let table = normalize_properties_with(&rows, &config);
        let column = table.get("e1").and_then(|e| e.column("p2")).expect("column");
        assert_eq!(column.values[0].value_label, "n/a");
        assert!(column.is_placeholder());
    }
}
