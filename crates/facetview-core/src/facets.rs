//! # Facet Deriver
//!
//! Turns pre-aggregated facet rows into ordered filter groups.
//!
//! - One group per property, in first-encounter order
//! - One item per distinct value; the first row for a value wins and later
//!   duplicates are dropped without re-summing counts
//! - Items ordered by count descending, ties kept in encounter order

use crate::rows::{RawFacetRow, RowInput};
use crate::{FacetError, FilterGroup, FilterItem};
use std::collections::{BTreeMap, BTreeSet};

/// A group under construction.
struct PendingGroup<'a> {
    property_uri: &'a str,
    label: &'a str,
    items: Vec<FilterItem>,
    seen: BTreeSet<&'a str>,
}

/// Parse a facet count as a non-negative base-10 integer.
///
/// Surrounding whitespace is tolerated. Negative counts and anything else
/// non-numeric are a malformed row.
pub fn parse_count(raw: &str, row: usize) -> Result<u64, FacetError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| FacetError::InvalidCount {
            row,
            value: raw.to_string(),
        })
}

/// Derive filter groups from facet rows.
///
/// Every row's count is checked, including rows later dropped as
/// duplicates, so one bad count fails the whole call.
pub fn derive_facets(rows: &[RawFacetRow]) -> Result<Vec<FilterGroup>, FacetError> {
    let mut pending: Vec<PendingGroup<'_>> = Vec::new();
    let mut by_property: BTreeMap<&str, usize> = BTreeMap::new();

    for (index, row) in rows.iter().enumerate() {
        let count = parse_count(&row.count, index)?;

        let slot = *by_property
            .entry(row.property_uri.as_str())
            .or_insert_with(|| {
                pending.push(PendingGroup {
                    property_uri: &row.property_uri,
                    label: &row.property_label,
                    items: Vec::new(),
                    seen: BTreeSet::new(),
                });
                pending.len() - 1
            });

        let group = &mut pending[slot];
        if group.seen.insert(row.value.as_str()) {
            group.items.push(FilterItem::with_count_text(
                &row.value,
                &row.value_label,
                row.count.trim(),
                count,
            ));
        }
    }

    let groups: Vec<FilterGroup> = pending
        .into_iter()
        .map(|mut group| {
            // sort_by is stable: equal counts keep encounter order
            group
                .items
                .sort_by(|a, b| b.sort_count().cmp(&a.sort_count()));
            FilterGroup::new(group.property_uri, group.label, group.items)
        })
        .collect();

    tracing::debug!(
        rows = rows.len(),
        groups = groups.len(),
        "derived filter groups"
    );

    Ok(groups)
}

/// Resolve a row batch and derive its filter groups.
pub fn derive_facets_from(input: RowInput<RawFacetRow>) -> Result<Vec<FilterGroup>, FacetError> {
    let rows = input.into_typed()?;
    derive_facets(&rows)
}

// =============================================================================
// TESTS
// =============================================================================
