//! Apps session
//!
//! Owns the user-editable pipeline inputs (search term, filter options, sort
//! options) for the lifetime of one screen, drives the combine-latest runner,
//! and exposes:
//! - a continuously updated `DisplayList`
//! - a one-shot `SessionEvent` queue for dialogs and permission details
//! - a one-shot `NavigationIntent` queue fed by item clicks
//!
//! Option values are only ever replaced whole. Teardown stops the runner and
//! silences every callback bound into already-published items.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info};
use serde_json::json;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::apps::{AppSnapshot, PackageId};
use crate::errors::PipelineError;
use crate::filter::FilterOptions;
use crate::permissions::Permission;
use crate::pipeline::{spawn_combine_latest, DisplayList, PipelineInputs, PipelineSettings};
use crate::presentation::{NavigateHandler, PermissionHandler, PresentationMapper, SummaryStrings};
use crate::sort::SortOptions;

/// One-shot UI events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    ShowFilterDialog(FilterOptions),
    ShowSortDialog(SortOptions),
    ShowPermission(Permission),
}

/// One-shot navigation requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationIntent {
    NavigateToApp(PackageId),
}

/// Everything needed to start a session
#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    pub pipeline: PipelineSettings,
    pub strings: SummaryStrings,
    pub initial_search: Option<String>,
    pub initial_filter: FilterOptions,
    pub initial_sort: SortOptions,
}

/// Receiving ends of the session's one-shot queues
pub struct SessionChannels {
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    pub navigation: mpsc::UnboundedReceiver<NavigationIntent>,
}

pub struct AppsSession {
    id: Uuid,
    search_term: watch::Sender<Option<String>>,
    filter_options: watch::Sender<FilterOptions>,
    sort_options: watch::Sender<SortOptions>,
    items: watch::Receiver<DisplayList>,
    events: mpsc::UnboundedSender<SessionEvent>,
    active: Arc<AtomicBool>,
    shutdown: watch::Sender<bool>,
    runner: Option<JoinHandle<Result<(), PipelineError>>>,
}

impl AppsSession {
    /// Start a session over `apps`. Must be called inside a tokio runtime.
    pub fn start(apps: watch::Receiver<AppSnapshot>, settings: SessionSettings) -> (Self, SessionChannels) {
        let id = Uuid::new_v4();
        let active = Arc::new(AtomicBool::new(true));

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (navigation_tx, navigation_rx) = mpsc::unbounded_channel();

        let navigate: NavigateHandler = {
            let active = Arc::clone(&active);
            Arc::new(move |package: &PackageId| {
                if active.load(Ordering::Acquire) {
                    let _ = navigation_tx.send(NavigationIntent::NavigateToApp(package.clone()));
                }
            })
        };
        let show_permission: PermissionHandler = {
            let active = Arc::clone(&active);
            let events_tx = events_tx.clone();
            Arc::new(move |permission: &Permission| {
                if active.load(Ordering::Acquire) {
                    let _ = events_tx.send(SessionEvent::ShowPermission(permission.clone()));
                }
            })
        };
        let mapper = PresentationMapper::new(settings.strings.clone(), navigate, show_permission);

        let (search_tx, search_rx) = watch::channel(settings.initial_search.clone());
        let (filter_tx, filter_rx) = watch::channel(settings.initial_filter.clone());
        let (sort_tx, sort_rx) = watch::channel(settings.initial_sort);
        let (items_tx, items_rx) = watch::channel(DisplayList::empty());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let inputs = PipelineInputs {
            apps,
            search_term: search_rx,
            filter_options: filter_rx,
            sort_options: sort_rx,
        };
        let runner = spawn_combine_latest(inputs, mapper, settings.pipeline, items_tx, shutdown_rx);

        info!(
            "Session {} started (filters: {}, sort: {})",
            id, settings.initial_filter, settings.initial_sort
        );

        let session = Self {
            id,
            search_term: search_tx,
            filter_options: filter_tx,
            sort_options: sort_tx,
            items: items_rx,
            events: events_tx,
            active,
            shutdown: shutdown_tx,
            runner: Some(runner),
        };
        let channels = SessionChannels {
            events: events_rx,
            navigation: navigation_rx,
        };
        (session, channels)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn set_search_term(&self, term: Option<String>) {
        debug!("set_search_term(term={:?})", term);
        self.search_term.send_replace(term);
    }

    pub fn search_term(&self) -> Option<String> {
        self.search_term.borrow().clone()
    }

    /// Replace the filter options with `action(current)`
    pub fn update_filter_options(&self, action: impl FnOnce(&FilterOptions) -> FilterOptions) {
        let old = self.filter_options.borrow().clone();
        let new = action(&old);
        debug!("update_filter_options({}) -> {}", old, new);
        self.log_transition("filter_options_changed", old.to_string(), new.to_string());
        self.filter_options.send_replace(new);
    }

    pub fn filter_options(&self) -> FilterOptions {
        self.filter_options.borrow().clone()
    }

    /// Replace the sort options with `action(current)`
    pub fn update_sort_options(&self, action: impl FnOnce(&SortOptions) -> SortOptions) {
        let old = *self.sort_options.borrow();
        let new = action(&old);
        debug!("update_sort_options({}) -> {}", old, new);
        self.log_transition("sort_options_changed", old.to_string(), new.to_string());
        self.sort_options.send_replace(new);
    }

    pub fn sort_options(&self) -> SortOptions {
        *self.sort_options.borrow()
    }

    pub fn request_filter_dialog(&self) {
        debug!("request_filter_dialog");
        self.emit(SessionEvent::ShowFilterDialog(self.filter_options()));
    }

    pub fn request_sort_dialog(&self) {
        debug!("request_sort_dialog");
        self.emit(SessionEvent::ShowSortDialog(self.sort_options()));
    }

    /// Subscribe to the continuously updated item list
    pub fn items(&self) -> watch::Receiver<DisplayList> {
        self.items.clone()
    }

    pub fn current_items(&self) -> DisplayList {
        self.items.borrow().clone()
    }

    /// Stop the session. In-flight work is abandoned; callbacks on items
    /// already handed out become no-ops.
    ///
    /// Returns the runner's error if it had already failed.
    pub async fn shutdown(mut self) -> Result<(), PipelineError> {
        self.deactivate();
        let Some(runner) = self.runner.take() else {
            return Ok(());
        };

        // The runner checks the shutdown signal before anything else
        let result = match runner.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(PipelineError::Worker(e.to_string())),
        };
        info!("Session {} stopped", self.id);
        result
    }

    fn emit(&self, event: SessionEvent) {
        if self.active.load(Ordering::Acquire) {
            let _ = self.events.send(event);
        }
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
        self.shutdown.send_replace(true);
    }

    fn log_transition(&self, event: &str, old: String, new: String) {
        let payload = json!({
            "event": event,
            "session": self.id.to_string(),
            "old": old,
            "new": new,
        });
        debug!("Session options changed | {}", payload);
    }
}

impl Drop for AppsSession {
    fn drop(&mut self) {
        self.deactivate();
        if let Some(runner) = self.runner.take() {
            runner.abort();
        }
    }
}
