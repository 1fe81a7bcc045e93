//! # Catalog Module
//!
//! The initial view state built from one facet batch and one property batch:
//! filter groups for the filter panel and the normalized entity table.
//!
//! A catalog is rebuilt wholesale for every (re-)query; its collections are
//! never patched in place.

use crate::config::AggregationConfig;
use crate::controller::{Requery, SelectionController};
use crate::facets::derive_facets_from;
use crate::normalize::{EntityTable, normalize_properties_from};
use crate::rows::{RawFacetRow, RawPropertyRow, RowInput};
use crate::{FacetError, FilterGroup};
use serde::Serialize;
use std::sync::Arc;

/// Filter groups and entities derived from the same query round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub filter_groups: Vec<FilterGroup>,
    pub entities: EntityTable,
}

impl Catalog {
    /// Aggregate both row batches.
    ///
    /// Fails if either batch has a malformed row; no partial catalog is
    /// returned.
    pub fn load(
        facets: RowInput<RawFacetRow>,
        properties: RowInput<RawPropertyRow>,
        config: &AggregationConfig,
    ) -> Result<Self, FacetError> {
        let filter_groups = derive_facets_from(facets)?;
        let entities = normalize_properties_from(properties, config)?;

        tracing::info!(
            groups = filter_groups.len(),
            entities = entities.len(),
            "catalog loaded"
        );

        Ok(Self {
            filter_groups,
            entities,
        })
    }

    /// Hand the filter groups to a new controller, keeping the entities.
    pub fn into_controller(
        self,
        requery: Option<Arc<dyn Requery>>,
        config: &AggregationConfig,
    ) -> Result<(SelectionController, EntityTable), FacetError> {
        let controller = SelectionController::with_config(self.filter_groups, requery, config)?;
        Ok((controller, self.entities))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facet_rows() -> Vec<RawFacetRow> {
        vec![
            RawFacetRow::new("p-format", "Format", "csv", "CSV", "5"),
            RawFacetRow::new("p-format", "Format", "json", "JSON", "9"),
        ]
    }

    fn property_rows() -> Vec<RawPropertyRow> {
        vec![
            RawPropertyRow::new("e1", "p-label", "Label", "s1", "My Service"),
            RawPropertyRow::new("e1", "p-format", "Format", "csv", "CSV"),
            RawPropertyRow::new("e2", "p-format", "Format", "json", "JSON"),
        ]
    }

    #[test]
    fn load_builds_both_views() {
        let catalog = Catalog::load(
            facet_rows().into(),
            property_rows().into(),
            &AggregationConfig::default(),
        )
        .expect("load");

        assert_eq!(catalog.filter_groups.len(), 1);
        assert_eq!(catalog.entities.len(), 2);
        assert_eq!(
            catalog.entities.get("e1").and_then(|e| e.title.as_deref()),
            Some("My Service")
        );
    }

    #[test]
    fn malformed_facet_batch_fails_whole_load() {
        let mut facets = facet_rows();
        facets.push(RawFacetRow::new("p-format", "Format", "xml", "XML", "lots"));

        let result = Catalog::load(
            facets.into(),
            property_rows().into(),
            &AggregationConfig::default(),
        );
        assert!(matches!(result, Err(FacetError::InvalidCount { row: 2, .. })));
    }

    #[test]
    fn empty_batches_are_not_errors() {
        let catalog = Catalog::load(
            RowInput::default(),
            RowInput::default(),
            &AggregationConfig::default(),
        )
        .expect("load");
        assert_eq!(catalog, Catalog::default());
    }

    #[test]
    fn into_controller_hands_over_groups() {
        let catalog = Catalog::load(
            facet_rows().into(),
            property_rows().into(),
            &AggregationConfig::default(),
        )
        .expect("load");

        let (controller, entities) = catalog
            .into_controller(None, &AggregationConfig::default())
            .expect("controller");
        assert_eq!(controller.filter_groups().len(), 1);
        assert_eq!(entities.len(), 2);
    }
}
