//! # Selection Controller
//!
//! Holds the current filter groups, the selection and the loading flag, and
//! drives re-queries when the selection changes.
//!
//! ## State Machine
//!
//! ```text
//!   Idle ──toggle (callback registered)──▶ Updating ──callback settles──▶ Idle
//! ```
//!
//! `is_loading` is true exactly while the controller is `Updating`. It is
//! cleared when the callback settles, whether it succeeded or failed, and
//! also when the `toggle` future is dropped mid-flight.
//!
//! ## Concurrency
//!
//! `toggle` takes `&self` and may be called again while an earlier call is
//! still awaiting its callback. Calls are not serialized: whichever callback
//! settles last decides `is_loading` and the final filter groups. Callers
//! needing strict ordering must serialize `toggle` themselves.
//!
//! ## Notifications
//!
//! Changes are published on a broadcast channel (`subscribe`). Publishing
//! with no subscribers is not an error.

use crate::config::AggregationConfig;
use crate::facets::{derive_facets, derive_facets_from};
use crate::rows::{RawFacetRow, RowInput};
use crate::selection::{ExternalSelection, SelectionState};
use crate::{BoxError, FacetError, FilterGroup};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::broadcast;

// =============================================================================
// RE-QUERY CALLBACK
// =============================================================================

/// Future returned by a re-query callback.
pub type RequeryFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>>;

/// A re-query callback.
///
/// Receives the externalized selection and a handle for publishing
/// refreshed filter groups. The controller only waits for the future to
/// settle; what the callback refreshes is up to the callback.
pub trait Requery: Send + Sync {
    fn requery(&self, selection: ExternalSelection, refresh: RefreshHandle) -> RequeryFuture;
}

impl<F, Fut> Requery for F
where
    F: Fn(ExternalSelection, RefreshHandle) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    fn requery(&self, selection: ExternalSelection, refresh: RefreshHandle) -> RequeryFuture {
        Box::pin((self)(selection, refresh))
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// A change published by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// A value of this property was selected or deselected.
    SelectionChanged { property_uri: String },
    /// The loading flag changed to the given value.
    LoadingChanged(bool),
    /// The filter groups were replaced wholesale.
    FilterGroupsReplaced,
}

// =============================================================================
// SHARED STATE
// =============================================================================

struct Shared {
    filter_groups: RwLock<Vec<FilterGroup>>,
    selection: Mutex<SelectionState>,
    loading: AtomicBool,
    events: broadcast::Sender<ControllerEvent>,
}

impl Shared {
    fn new(filter_groups: Vec<FilterGroup>, event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity);
        Self {
            filter_groups: RwLock::new(filter_groups),
            selection: Mutex::new(SelectionState::new()),
            loading: AtomicBool::new(false),
            events,
        }
    }

    // Lock holders never panic, so a poisoned lock still guards valid data.
    fn selection(&self) -> MutexGuard<'_, SelectionState> {
        self.selection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn filter_groups(&self) -> Vec<FilterGroup> {
        self.filter_groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace_filter_groups(&self, groups: Vec<FilterGroup>) {
        *self
            .filter_groups
            .write()
            .unwrap_or_else(PoisonError::into_inner) = groups;
        self.emit(ControllerEvent::FilterGroupsReplaced);
    }

    fn set_loading(&self, loading: bool) {
        self.loading.store(loading, Ordering::SeqCst);
        self.emit(ControllerEvent::LoadingChanged(loading));
    }

    fn emit(&self, event: ControllerEvent) {
        // Err only means nobody is subscribed
        let _ = self.events.send(event);
    }
}

/// Keeps the controller in `Updating` for as long as it lives.
struct LoadingGuard<'a> {
    shared: &'a Shared,
}

impl<'a> LoadingGuard<'a> {
    fn enter(shared: &'a Shared) -> Self {
        shared.set_loading(true);
        Self { shared }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.shared.set_loading(false);
    }
}

// =============================================================================
// REFRESH HANDLE
// =============================================================================

/// Handle through which a re-query callback publishes refreshed data.
#[derive(Clone)]
pub struct RefreshHandle {
    shared: Arc<Shared>,
}

impl RefreshHandle {
    /// Replace the filter groups wholesale.
    pub fn replace_filter_groups(&self, groups: Vec<FilterGroup>) {
        self.shared.replace_filter_groups(groups);
    }

    /// Re-derive the filter groups from fresh facet rows.
    ///
    /// On error the current groups are left untouched.
    pub fn replace_from_rows(&self, rows: &[RawFacetRow]) -> Result<(), FacetError> {
        let groups = derive_facets(rows)?;
        self.shared.replace_filter_groups(groups);
        Ok(())
    }
}

impl fmt::Debug for RefreshHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshHandle").finish_non_exhaustive()
    }
}

// =============================================================================
// CONTROLLER
// =============================================================================

/// The selection controller.
///
/// Cloning is cheap and yields a handle to the same state, so one controller
/// can be passed to every component that needs it.
#[derive(Clone)]
pub struct SelectionController {
    shared: Arc<Shared>,
    requery: Option<Arc<dyn Requery>>,
}

impl SelectionController {
    /// Create a controller without a re-query callback.
    #[must_use]
    pub fn new(filter_groups: Vec<FilterGroup>) -> Self {
        let capacity = AggregationConfig::default().event_capacity;
        Self {
            shared: Arc::new(Shared::new(filter_groups, capacity)),
            requery: None,
        }
    }

    /// Create a controller that calls `requery` after every toggle.
    #[must_use]
    pub fn with_requery<F, Fut>(filter_groups: Vec<FilterGroup>, requery: F) -> Self
    where
        F: Fn(ExternalSelection, RefreshHandle) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let mut controller = Self::new(filter_groups);
        controller.requery = Some(Arc::new(requery));
        controller
    }

    /// Create a controller with an explicit configuration.
    pub fn with_config(
        filter_groups: Vec<FilterGroup>,
        requery: Option<Arc<dyn Requery>>,
        config: &AggregationConfig,
    ) -> Result<Self, FacetError> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared::new(filter_groups, config.event_capacity)),
            requery,
        })
    }

    /// Create a controller straight from a facet row batch.
    pub fn from_rows(
        facets: RowInput<RawFacetRow>,
        requery: Option<Arc<dyn Requery>>,
        config: &AggregationConfig,
    ) -> Result<Self, FacetError> {
        let groups = derive_facets_from(facets)?;
        Self::with_config(groups, requery, config)
    }

    /// Select or deselect one facet value and, if a callback is registered,
    /// re-query with the new selection.
    ///
    /// The callback's error is returned as `FacetError::Requery` after the
    /// loading flag has been cleared.
    pub async fn toggle(
        &self,
        property_uri: &str,
        value: &str,
        checked: bool,
    ) -> Result<(), FacetError> {
        let changed = {
            let mut selection = self.shared.selection();
            selection.set(property_uri, value, checked)
        };
        if changed {
            self.shared.emit(ControllerEvent::SelectionChanged {
                property_uri: property_uri.to_string(),
            });
        }

        let Some(requery) = &self.requery else {
            return Ok(());
        };

        let loading = LoadingGuard::enter(&self.shared);
        let selection = self.shared.selection().externalize();
        tracing::debug!(
            property_uri,
            value,
            checked,
            properties = selection.len(),
            "re-querying with updated selection"
        );

        let result = requery.requery(selection, self.refresh_handle()).await;
        drop(loading);

        result.map_err(|e| {
            tracing::warn!(property_uri, value, "re-query failed: {}", e);
            FacetError::Requery(e)
        })
    }

    /// Snapshot of the current filter groups.
    #[must_use]
    pub fn filter_groups(&self) -> Vec<FilterGroup> {
        self.shared.filter_groups()
    }

    /// Filter groups with each item's `checked` set from the selection.
    #[must_use]
    pub fn filter_groups_view(&self) -> Vec<FilterGroup> {
        let selection = self.selection();
        let mut groups = self.shared.filter_groups();
        for group in &mut groups {
            let Some(property_uri) = group.property_uri.as_deref() else {
                continue;
            };
            for item in &mut group.items {
                item.checked = selection.is_selected(property_uri, &item.value);
            }
        }
        groups
    }

    /// Replace the filter groups wholesale.
    pub fn replace_filter_groups(&self, groups: Vec<FilterGroup>) {
        self.shared.replace_filter_groups(groups);
    }

    /// Snapshot of the selection.
    #[must_use]
    pub fn selection(&self) -> SelectionState {
        self.shared.selection().clone()
    }

    /// Read the live selection without copying it.
    pub fn with_selection<R>(&self, f: impl FnOnce(&SelectionState) -> R) -> R {
        f(&self.shared.selection())
    }

    /// The selection reduced to non-empty entries.
    #[must_use]
    pub fn external_selection(&self) -> ExternalSelection {
        self.shared.selection().externalize()
    }

    /// Whether a re-query is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.shared.loading.load(Ordering::SeqCst)
    }

    /// Whether a re-query callback is registered.
    #[must_use]
    pub fn has_requery(&self) -> bool {
        self.requery.is_some()
    }

    /// Subscribe to change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.shared.events.subscribe()
    }

    /// A handle for publishing refreshed data into this controller.
    #[must_use]
    pub fn refresh_handle(&self) -> RefreshHandle {
        RefreshHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl fmt::Debug for SelectionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionController")
            .field("filter_groups", &self.shared.filter_groups().len())
            .field("selection", &self.selection())
            .field("is_loading", &self.is_loading())
            .field("has_requery", &self.has_requery())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FilterItem;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    fn groups() -> Vec<FilterGroup> {
        vec![FilterGroup::new(
            "p1",
            "Format",
            vec![
                FilterItem::new("json", "JSON", 9),
                FilterItem::new("csv", "CSV", 5),
            ],
        )]
    }

    #[tokio::test]
    async fn toggle_without_callback_only_mutates() {
        let controller = SelectionController::new(groups());
        let mut events = controller.subscribe();

        controller.toggle("p1", "csv", true).await.expect("toggle");
        assert!(controller.with_selection(|s| s.is_selected("p1", "csv")));
        assert!(!controller.is_loading());

        assert_eq!(
            events.try_recv().expect("event"),
            ControllerEvent::SelectionChanged {
                property_uri: "p1".to_string()
            }
        );
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn callback_sees_loading_and_external_selection() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_callback = Arc::clone(&seen);
        let probe: Arc<Mutex<Option<SelectionController>>> = Arc::new(Mutex::new(None));
        let probe_in_callback = Arc::clone(&probe);

        let controller = SelectionController::with_requery(
            groups(),
            move |selection: ExternalSelection, _refresh: RefreshHandle| {
                let loading = probe_in_callback
                    .lock()
                    .ok()
                    .and_then(|p| p.as_ref().map(SelectionController::is_loading));
                if let Ok(mut seen) = seen_in_callback.lock() {
                    seen.push((selection, loading));
                }
                async { Ok::<(), BoxError>(()) }
            },
        );
        if let Ok(mut p) = probe.lock() {
            *p = Some(controller.clone());
        }

        controller.toggle("p1", "csv", true).await.expect("check");
        controller.toggle("p1", "csv", false).await.expect("uncheck");

        let seen = seen.lock().expect("seen");
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0.get("p1"), Some(&vec!["csv".to_string()]));
        assert_eq!(seen[0].1, Some(true));
        assert!(seen[1].0.is_empty());
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn failing_callback_clears_loading_and_propagates() {
        let controller = SelectionController::with_requery(
            groups(),
            |_selection: ExternalSelection, _refresh: RefreshHandle| async {
                Err::<(), BoxError>("endpoint unavailable".into())
            },
        );
        let mut events = controller.subscribe();

        let err = controller
            .toggle("p1", "json", true)
            .await
            .expect_err("callback error");
        assert!(matches!(err, FacetError::Requery(_)));
        assert!(err.to_string().contains("endpoint unavailable"));
        assert!(!controller.is_loading());

        let mut received = Vec::new();
        while let Ok(event) = events.try_recv() {
            received.push(event);
        }
        assert_eq!(
            received,
            vec![
                ControllerEvent::SelectionChanged {
                    property_uri: "p1".to_string()
                },
                ControllerEvent::LoadingChanged(true),
                ControllerEvent::LoadingChanged(false),
            ]
        );
    }

    #[tokio::test]
    async fn callback_replaces_filter_groups() {
        let controller = SelectionController::with_requery(
            groups(),
            |_selection: ExternalSelection, refresh: RefreshHandle| async move {
                refresh.replace_from_rows(&[RawFacetRow::new("p1", "Format", "xml", "XML", "1")])?;
                Ok::<(), BoxError>(())
            },
        );

        controller.toggle("p1", "json", true).await.expect("toggle");
        let groups = controller.filter_groups();
        assert_eq!(groups[0].items.len(), 1);
        assert_eq!(groups[0].items[0].value, "xml");
    }

    #[tokio::test]
    async fn overlapping_toggles_last_settle_clears_loading() {
        let gate = Arc::new(Notify::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let gate_in_callback = Arc::clone(&gate);

        let controller = SelectionController::with_requery(
            groups(),
            move |_selection: ExternalSelection, _refresh: RefreshHandle| {
                let gate = Arc::clone(&gate_in_callback);
                let first = calls.fetch_add(1, Ordering::SeqCst) == 0;
                async move {
                    if first {
                        gate.notified().await;
                    }
                    Ok::<(), BoxError>(())
                }
            },
        );

        let slow = controller.toggle("p1", "json", true);
        let fast = async {
            controller.toggle("p1", "csv", true).await.expect("fast");
            // The fast call settled first and already cleared the flag
            let loading_after_fast = controller.is_loading();
            gate.notify_one();
            loading_after_fast
        };

        let (slow_result, loading_after_fast) = tokio::join!(slow, fast);
        assert!(slow_result.is_ok());
        assert!(!loading_after_fast);
        assert!(!controller.is_loading());
        assert_eq!(controller.selection().values("p1").len(), 2);
    }

    #[tokio::test]
    async fn view_projects_checked_from_selection() {
        let controller = SelectionController::new(groups());
        controller.toggle("p1", "csv", true).await.expect("toggle");

        let view = controller.filter_groups_view();
        assert!(view[0].item("csv").is_some_and(|i| i.checked));
        assert!(view[0].item("json").is_some_and(|i| !i.checked));
        // Stored groups are not mutated
        assert!(controller.filter_groups()[0].items.iter().all(|i| !i.checked));
    }

    #[test]
    fn zero_event_capacity_rejected() {
        let config = AggregationConfig {
            event_capacity: 0,
            ..AggregationConfig::default()
        };
        assert!(SelectionController::with_config(groups(), None, &config).is_err());
    }

    #[test]
    fn oversized_event_capacity_rejected_without_panic() {
        let config = AggregationConfig {
            event_capacity: usize::MAX,
            ..AggregationConfig::default()
        };
        let result = SelectionController::with_config(groups(), None, &config);
        assert!(matches!(result, Err(FacetError::Config(_))));
    }

    #[tokio::test]
    async fn dropped_toggle_clears_loading() {
        let controller = SelectionController::with_requery(
            groups(),
            |_selection: ExternalSelection, _refresh: RefreshHandle| {
                std::future::pending::<Result<(), BoxError>>()
            },
        );
        let mut events = controller.subscribe();

        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            controller.toggle("p1", "csv", true),
        )
        .await
        .is_err();
        assert!(timed_out);
        assert!(!controller.is_loading());

        let mut received = Vec::new();
        while let Ok(event) = events.try_recv() {
            received.push(event);
        }
        assert_eq!(
            received,
            vec![
                ControllerEvent::SelectionChanged {
                    property_uri: "p1".to_string()
                },
                ControllerEvent::LoadingChanged(true),
                ControllerEvent::LoadingChanged(false),
            ]
        );
        // The selection change is kept even though the re-query never settled
        assert!(controller.selection().is_selected("p1", "csv"));
    }

    #[test]
    fn from_untyped_rows() {
        let row = serde_json::json!({
            "prop": "p1", "propLabel": "Format", "val": "csv", "valLabel": "CSV", "count": "5"
        });
        let rows = match row {
            serde_json::Value::Object(fields) => vec![fields],
            _ => Vec::new(),
        };

        let controller = SelectionController::from_rows(
            RowInput::Untyped(rows),
            None,
            &AggregationConfig::default(),
        )
        .expect("controller");
        assert_eq!(controller.filter_groups()[0].title, "Format");
        assert!(!controller.has_requery());
    }
}
