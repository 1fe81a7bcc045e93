//! # Aggregation Configuration
//!
//! Tunables for the normalizer and the selection controller. Every field has
//! a default, so a partial document (or none at all) is valid.

use crate::FacetError;
use crate::primitives::{
    DEFAULT_EVENT_CAPACITY, DESCRIPTION_LABELS, MAX_EVENT_CAPACITY, MISSING_VALUE_LABEL,
    TITLE_LABELS,
};
use serde::{Deserialize, Serialize};

/// Configuration shared by the aggregation functions and the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Property labels promoted to an entity's title.
    pub title_labels: Vec<String>,
    /// Property labels promoted to an entity's description.
    pub description_labels: Vec<String>,
    /// Display label of placeholder values.
    pub missing_value_label: String,
    /// Buffer size of the controller's event channel.
    pub event_capacity: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            title_labels: TITLE_LABELS.iter().map(|s| s.to_string()).collect(),
            description_labels: DESCRIPTION_LABELS.iter().map(|s| s.to_string()).collect(),
            missing_value_label: MISSING_VALUE_LABEL.to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl AggregationConfig {
    /// Check the configuration for values the engine cannot work with.
    pub fn validate(&self) -> Result<(), FacetError> {
        if self.event_capacity == 0 {
            return Err(FacetError::Config(
                "event_capacity must be greater than zero".to_string(),
            ));
        }
        if self.event_capacity > MAX_EVENT_CAPACITY {
            return Err(FacetError::Config(format!(
                "event_capacity {} exceeds maximum {}",
                self.event_capacity, MAX_EVENT_CAPACITY
            )));
        }
        Ok(())
    }

    /// Whether a property label marks the entity title.
    #[must_use]
    pub fn is_title_label(&self, label: &str) -> bool {
        self.title_labels.iter().any(|l| l == label)
    }

    /// Whether a property label marks the entity description.
    #[must_use]
    pub fn is_description_label(&self, label: &str) -> bool {
        self.description_labels.iter().any(|l| l == label)
    }
}
