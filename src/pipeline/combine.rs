//! Combine-latest runner
//!
//! Holds the current value of every pipeline input in a `watch` channel and
//! reruns the full pipeline whenever any of them changes. `watch` keeps only
//! the newest value, so bursts of upstream snapshots collapse into one
//! recomputation.
//!
//! Large snapshots are recomputed on the blocking pool. Every recomputation
//! gets a generation number and a result is only published if it is newer
//! than the last published one; superseded results are dropped.

use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};

use super::{aggregate, PipelineSettings, PipelineState};
use crate::apps::AppSnapshot;
use crate::errors::PipelineError;
use crate::filter::FilterOptions;
use crate::presentation::{DisplayItem, PresentationMapper};
use crate::sort::SortOptions;

/// Receivers for the four pipeline inputs
pub struct PipelineInputs {
    pub apps: watch::Receiver<AppSnapshot>,
    pub search_term: watch::Receiver<Option<String>>,
    pub filter_options: watch::Receiver<FilterOptions>,
    pub sort_options: watch::Receiver<SortOptions>,
}

impl PipelineInputs {
    /// Snapshot all four current values, marking them seen
    fn current(&mut self) -> PipelineState {
        PipelineState {
            apps: self.apps.borrow_and_update().clone(),
            search_term: self.search_term.borrow_and_update().clone(),
            filter_options: self.filter_options.borrow_and_update().clone(),
            sort_options: *self.sort_options.borrow_and_update(),
        }
    }
}

/// One published pipeline output
#[derive(Debug, Clone)]
pub struct DisplayList {
    /// 0 before the first recomputation, then strictly increasing
    pub generation: u64,
    pub items: Arc<[DisplayItem]>,
}

impl DisplayList {
    pub fn empty() -> Self {
        Self {
            generation: 0,
            items: Arc::from(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

type Recomputation = (u64, Result<Vec<DisplayItem>, PipelineError>);

/// Start the runner on the current tokio runtime.
///
/// The task ends when `shutdown` changes or its sender is dropped, when any
/// option sender is dropped, or with an error when a recomputation fails.
/// Closing the application source is not an error: the last snapshot is kept
/// and option changes keep being applied to it.
pub fn spawn_combine_latest(
    inputs: PipelineInputs,
    mapper: PresentationMapper,
    settings: PipelineSettings,
    output: watch::Sender<DisplayList>,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<Result<(), PipelineError>> {
    tokio::spawn(run(inputs, mapper, settings, output, shutdown))
}

async fn run(
    mut inputs: PipelineInputs,
    mapper: PresentationMapper,
    settings: PipelineSettings,
    output: watch::Sender<DisplayList>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), PipelineError> {
    let mut generation: u64 = 0;
    let mut published: u64 = 0;
    let mut source_open = true;
    let mut dirty = true;
    let mut in_flight: JoinSet<Recomputation> = JoinSet::new();

    loop {
        if dirty {
            dirty = false;
            generation += 1;
            let state = inputs.current();

            if state.apps.len() >= settings.parallel_threshold {
                debug!("Recomputation {} offloaded ({} apps)", generation, state.apps.len());
                let mapper = mapper.clone();
                let started = generation;
                in_flight.spawn_blocking(move || (started, aggregate(&state, &mapper, &settings)));
            } else {
                let result = aggregate(&state, &mapper, &settings);
                publish(&output, &mut published, generation, result)?;
            }
        }

        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                let (started, result) = joined.map_err(|e| PipelineError::Worker(e.to_string()))?;
                if started < generation {
                    debug!("Discarding superseded recomputation {} (latest {})", started, generation);
                } else {
                    publish(&output, &mut published, started, result)?;
                }
            }
            changed = inputs.apps.changed(), if source_open => {
                if changed.is_err() {
                    warn!("Application source closed; holding last snapshot");
                    source_open = false;
                } else {
                    dirty = true;
                }
            }
            changed = inputs.search_term.changed() => {
                if changed.is_err() { break; }
                dirty = true;
            }
            changed = inputs.filter_options.changed() => {
                if changed.is_err() { break; }
                dirty = true;
            }
            changed = inputs.sort_options.changed() => {
                if changed.is_err() { break; }
                dirty = true;
            }
        }
    }

    // In-flight work is abandoned, not awaited
    in_flight.abort_all();
    info!("Pipeline stopped after {} recomputations", generation);
    Ok(())
}

fn publish(
    output: &watch::Sender<DisplayList>,
    published: &mut u64,
    generation: u64,
    result: Result<Vec<DisplayItem>, PipelineError>,
) -> Result<(), PipelineError> {
    let items = result.map_err(|e| {
        error!("Recomputation {} failed: {}", generation, e);
        e
    })?;

    if generation <= *published {
        debug!(
            "Discarding superseded recomputation {} (latest published {})",
            generation, published
        );
        return Ok(());
    }

    *published = generation;
    output.send_replace(DisplayList {
        generation,
        items: items.into(),
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::{snapshot_of, ApplicationRecord, NormalApp};
    use crate::filter::FilterKey;
    use crate::permissions::{catalog, PermissionState};
    use crate::presentation::SummaryStrings;
    use std::time::Duration;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    struct Harness {
        apps: watch::Sender<AppSnapshot>,
        search: watch::Sender<Option<String>>,
        filter: watch::Sender<FilterOptions>,
        sort: watch::Sender<SortOptions>,
        shutdown: watch::Sender<bool>,
        output: watch::Receiver<DisplayList>,
        handle: JoinHandle<Result<(), PipelineError>>,
    }

    fn record(id: &str, label: &str, requested: Vec<PermissionState>) -> ApplicationRecord {
        NormalApp::new(id, Some(label.to_string()), requested, vec![]).into()
    }

    fn sample() -> AppSnapshot {
        snapshot_of(vec![
            record("com.example.browser", "Browser", vec![PermissionState::granted(catalog::INTERNET)]),
            record("com.example.notes", "Notes", vec![]),
        ])
    }

    fn start(apps: AppSnapshot, parallel_threshold: usize) -> Harness {
        let (apps_tx, apps_rx) = watch::channel(apps);
        let (search_tx, search_rx) = watch::channel(None);
        let (filter_tx, filter_rx) = watch::channel(FilterOptions::default());
        let (sort_tx, sort_rx) = watch::channel(SortOptions::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (output_tx, output_rx) = watch::channel(DisplayList::empty());

        let inputs = PipelineInputs {
            apps: apps_rx,
            search_term: search_rx,
            filter_options: filter_rx,
            sort_options: sort_rx,
        };
        let settings = PipelineSettings {
            parallel_threshold,
            ..PipelineSettings::default()
        };
        let handle = spawn_combine_latest(
            inputs,
            PresentationMapper::detached(SummaryStrings::default()),
            settings,
            output_tx,
            shutdown_rx,
        );

        Harness {
            apps: apps_tx,
            search: search_tx,
            filter: filter_tx,
            sort: sort_tx,
            shutdown: shutdown_tx,
            output: output_rx,
            handle,
        }
    }

    fn ids(list: &DisplayList) -> Vec<String> {
        list.items.iter().map(|item| item.package_id.to_string()).collect()
    }

    async fn wait_for(
        rx: &mut watch::Receiver<DisplayList>,
        predicate: impl FnMut(&DisplayList) -> bool,
    ) -> DisplayList {
        timeout(WAIT, rx.wait_for(predicate))
            .await
            .expect("timed out waiting for pipeline output")
            .expect("pipeline output closed")
            .clone()
    }

    #[tokio::test]
    async fn test_initial_emission_uses_initial_values() {
        let mut h = start(sample(), usize::MAX);
        let list = wait_for(&mut h.output, |l| l.generation >= 1).await;
        assert_eq!(ids(&list), vec!["com.example.browser", "com.example.notes"]);
        let _ = h.shutdown.send(true);
    }

    #[tokio::test]
    async fn test_each_input_triggers_recomputation() {
        let mut h = start(sample(), usize::MAX);
        wait_for(&mut h.output, |l| l.generation >= 1).await;

        h.search.send_replace(Some("Notes".to_string()));
        let list = wait_for(&mut h.output, |l| l.len() == 1).await;
        assert_eq!(ids(&list), vec!["com.example.notes"]);

        h.search.send_replace(None);
        h.filter.send_replace(FilterOptions::new().enabled(FilterKey::RequiresInternet));
        let list = wait_for(&mut h.output, |l| {
            l.len() == 1 && l.items[0].package_id.as_str() == "com.example.browser"
        })
        .await;
        assert_eq!(ids(&list), vec!["com.example.browser"]);

        h.filter.send_replace(FilterOptions::new());
        h.sort.send_replace(SortOptions::new(crate::sort::SortMode::PermissionCount));
        let list = wait_for(&mut h.output, |l| l.len() == 2).await;
        assert_eq!(ids(&list), vec!["com.example.browser", "com.example.notes"]);

        h.apps.send_replace(snapshot_of(vec![record("com.example.new", "New", vec![])]));
        let list = wait_for(&mut h.output, |l| {
            l.len() == 1 && l.items[0].package_id.as_str() == "com.example.new"
        })
        .await;
        assert_eq!(list.items[0].label.as_deref(), Some("New"));

        let _ = h.shutdown.send(true);
    }

    #[tokio::test]
    async fn test_generations_strictly_increase() {
        let mut h = start(sample(), usize::MAX);
        let first = wait_for(&mut h.output, |l| l.generation >= 1).await;
        h.search.send_replace(Some("com".to_string()));
        let second = wait_for(&mut h.output, |l| l.generation > first.generation).await;
        assert!(second.generation > first.generation);
        let _ = h.shutdown.send(true);
    }

    #[tokio::test]
    async fn test_closed_source_keeps_last_snapshot() {
        let mut h = start(sample(), usize::MAX);
        wait_for(&mut h.output, |l| l.generation >= 1).await;

        drop(h.apps);
        h.search.send_replace(Some("Browser".to_string()));
        let list = wait_for(&mut h.output, |l| l.len() == 1).await;
        assert_eq!(ids(&list), vec!["com.example.browser"]);
        assert!(!h.handle.is_finished());

        let _ = h.shutdown.send(true);
    }

    #[tokio::test]
    async fn test_shutdown_ends_runner_and_closes_output() {
        let mut h = start(sample(), usize::MAX);
        wait_for(&mut h.output, |l| l.generation >= 1).await;

        h.shutdown.send_replace(true);
        let result = timeout(WAIT, h.handle).await.expect("runner did not stop").unwrap();
        assert!(result.is_ok());
        assert!(h.output.changed().await.is_err());
    }

    #[tokio::test]
    async fn test_unsupported_kind_fails_runner() {
        let apps = snapshot_of(vec![ApplicationRecord::Unsupported {
            id: "com.example.work".into(),
            kind: "work_profile".to_string(),
        }]);
        let h = start(apps, usize::MAX);
        let result = timeout(WAIT, h.handle).await.expect("runner did not stop").unwrap();
        assert!(matches!(result, Err(PipelineError::UnsupportedAppKind { .. })));
    }

    #[tokio::test]
    async fn test_offloaded_recomputation_publishes() {
        let mut h = start(sample(), 1);
        let list = wait_for(&mut h.output, |l| l.generation >= 1).await;
        assert_eq!(list.len(), 2);

        h.search.send_replace(Some("browser".to_string()));
        let list = wait_for(&mut h.output, |l| l.len() == 1).await;
        assert_eq!(ids(&list), vec!["com.example.browser"]);
        let _ = h.shutdown.send(true);
    }

    #[test]
    fn test_publish_discards_superseded_generation() {
        let (tx, rx) = watch::channel(DisplayList::empty());
        let mut published = 0;

        publish(&tx, &mut published, 2, Ok(Vec::new())).unwrap();
        publish(&tx, &mut published, 1, Ok(Vec::new())).unwrap();

        assert_eq!(published, 2);
        assert_eq!(rx.borrow().generation, 2);
    }
}
