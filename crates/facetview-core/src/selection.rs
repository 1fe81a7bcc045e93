//! # Selection State
//!
//! The multi-valued filter selection: property URI to the values picked for
//! it. Values keep the order they were selected in.
//!
//! Deselecting the last value of a property leaves an empty entry behind.
//! Empty entries are logically absent: `externalize` drops them and
//! `is_empty` ignores them.

use serde::Serialize;
use std::collections::BTreeMap;

/// Selection reduced to non-empty entries, as handed to a re-query callback.
pub type ExternalSelection = BTreeMap<String, Vec<String>>;

/// Property URI to selected values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SelectionState {
    entries: BTreeMap<String, Vec<String>>,
}

impl SelectionState {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select or deselect a value. Returns whether the selection changed.
    pub fn set(&mut self, property_uri: &str, value: &str, checked: bool) -> bool {
        if checked {
            self.insert(property_uri, value)
        } else {
            self.remove(property_uri, value)
        }
    }

    /// Select a value, creating the property entry if needed.
    pub fn insert(&mut self, property_uri: &str, value: &str) -> bool {
        let values = self.entries.entry(property_uri.to_string()).or_default();
        if values.iter().any(|v| v == value) {
            return false;
        }
        values.push(value.to_string());
        true
    }

    /// Deselect a value. The property entry stays, possibly empty.
    pub fn remove(&mut self, property_uri: &str, value: &str) -> bool {
        let values = self.entries.entry(property_uri.to_string()).or_default();
        let before = values.len();
        values.retain(|v| v != value);
        values.len() != before
    }

    /// Check if a value is selected.
    #[must_use]
    pub fn is_selected(&self, property_uri: &str, value: &str) -> bool {
        self.values(property_uri).iter().any(|v| v == value)
    }

    /// Selected values of a property, in selection order.
    #[must_use]
    pub fn values(&self, property_uri: &str) -> &[String] {
        self.entries
            .get(property_uri)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether a property has an entry, even an empty one.
    #[must_use]
    pub fn has_entry(&self, property_uri: &str) -> bool {
        self.entries.contains_key(property_uri)
    }

    /// Check if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }

    /// Drop every selected value.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate non-empty entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(property, values)| (property.as_str(), values.as_slice()))
    }

    /// Reduce to the non-empty entries.
    #[must_use]
    pub fn externalize(&self) -> ExternalSelection {
        self.iter()
            .map(|(property, values)| (property.to_string(), values.to_vec()))
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_remove_leaves_empty_entry() {
        let mut selection = SelectionState::new();
        assert!(selection.set("p1", "csv", true));
        assert!(selection.set("p1", "csv", false));

        assert!(selection.has_entry("p1"));
        assert!(selection.values("p1").is_empty());
        assert!(selection.is_empty());
        assert!(selection.externalize().is_empty());
    }

    #[test]
    fn duplicate_insert_is_noop() {
        let mut selection = SelectionState::new();
        assert!(selection.insert("p1", "csv"));
        assert!(!selection.insert("p1", "csv"));
        assert_eq!(selection.values("p1"), ["csv".to_string()]);
    }

    #[test]
    fn remove_unknown_value_creates_entry_without_change() {
        let mut selection = SelectionState::new();
        assert!(!selection.remove("p1", "csv"));
        assert!(selection.has_entry("p1"));
    }

    #[test]
    fn values_keep_selection_order() {
        let mut selection = SelectionState::new();
        selection.insert("p1", "json");
        selection.insert("p1", "csv");
        selection.insert("p1", "xml");
        selection.remove("p1", "csv");

        let external = selection.externalize();
        assert_eq!(
            external.get("p1"),
            Some(&vec!["json".to_string(), "xml".to_string()])
        );
    }

    #[test]
    fn externalize_omits_empty_entries() {
        let mut selection = SelectionState::new();
        selection.insert("p1", "csv");
        selection.insert("p2", "health");
        selection.remove("p2", "health");

        let external = selection.externalize();
        assert_eq!(external.len(), 1);
        assert!(external.contains_key("p1"));
        assert!(!external.contains_key("p2"));
    }

    #[test]
    fn serializes_as_plain_map() {
        let mut selection = SelectionState::new();
        selection.insert("p1", "csv");
        let json = serde_json::to_string(&selection).expect("serialize");
        assert_eq!(json, r#"{"p1":["csv"]}"#);
    }
}
