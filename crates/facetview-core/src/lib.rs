//! # facetview-core
//!
//! The faceted-result aggregation engine for facetview - THE LOGIC.
//!
//! Query endpoints return flat subject/property/value rows. This crate turns
//! them into two view models:
//! - filter facets, one group per property with counted values
//! - an entity table in which every entity exposes the same ordered columns
//!
//! and keeps the filter selection that drives re-queries.
//!
//! ## Components
//!
//! - `facets` → Facet Deriver (pure)
//! - `normalize` → Property Normalizer (pure)
//! - `controller` → Selection Controller (stateful, async re-query)
//!
//! ## Constraints
//!
//! - Deterministic: output depends only on input order
//! - No query execution, no transport: rows arrive already fetched
//! - Aggregation fails as a whole on a malformed row; empty input is valid

// =============================================================================
// MODULES
// =============================================================================

pub mod catalog;
pub mod collation;
pub mod config;
pub mod controller;
pub mod facets;
pub mod normalize;
pub mod primitives;
pub mod rows;
pub mod selection;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    BoxError, FacetError, FilterGroup, FilterItem, NormalizedEntity, PropertyColumn,
    PropertyValue,
};

// =============================================================================
// RE-EXPORTS: Aggregation
// =============================================================================

pub use catalog::Catalog;
pub use collation::compare_labels;
pub use config::AggregationConfig;
pub use facets::{derive_facets, derive_facets_from, parse_count};
pub use normalize::{
    EntityTable, SchemaColumn, canonical_schema, normalize_properties, normalize_properties_from,
    normalize_properties_with,
};
pub use rows::{
    FromUntypedRow, RawFacetRow, RawPropertyRow, RowInput, UntypedRow, bindings_from_value,
    parse_bindings,
};

// =============================================================================
// RE-EXPORTS: Selection
// =============================================================================

pub use controller::{ControllerEvent, RefreshHandle, Requery, RequeryFuture, SelectionController};
pub use selection::{ExternalSelection, SelectionState};
