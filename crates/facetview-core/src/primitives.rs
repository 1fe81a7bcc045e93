//! # Aggregation Primitives
//!
//! Default constants for the aggregation engine. `AggregationConfig`
//! starts from these values; callers may override them.

/// Property labels whose value becomes an entity's title.
pub const TITLE_LABELS: [&str; 2] = ["Label", "Title"];

/// Property labels whose value becomes an entity's description.
pub const DESCRIPTION_LABELS: [&str; 1] = ["Description"];

/// Display label of the placeholder value for a missing property (em dash).
pub const MISSING_VALUE_LABEL: &str = "\u{2014}";

/// Buffer size of the controller's change-event channel.
///
/// Slow subscribers that fall further behind than this observe a lag and
/// skip to the newest events.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Largest accepted event channel size. The channel allocates every slot up
/// front.
pub const MAX_EVENT_CAPACITY: usize = 1 << 16;

// =============================================================================
// ROW FIELD NAMES
// =============================================================================

/// Binding name of the entity column in property rows.
pub const FIELD_ENTITY: &str = "service";
/// Binding name of the property URI column.
pub const FIELD_PROPERTY: &str = "prop";
/// Binding name of the property label column.
pub const FIELD_PROPERTY_LABEL: &str = "propLabel";
/// Binding name of the value column.
pub const FIELD_VALUE: &str = "val";
/// Binding name of the value label column.
pub const FIELD_VALUE_LABEL: &str = "valLabel";
/// Binding name of the count column in facet rows.
pub const FIELD_COUNT: &str = "count";
