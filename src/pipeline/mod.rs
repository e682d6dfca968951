//! Aggregation pipeline
//!
//! Pure transform from the four inputs (application snapshot, search term,
//! filter options, sort options) to an ordered list of display items:
//! 1. keep records matching every active filter key
//! 2. keep records whose package id or label contains the search term
//! 3. sort survivors with the single active comparator
//! 4. map survivors to display items
//!
//! Nothing here mutates its inputs, so recomputing from the same inputs always
//! yields the same output.

use std::sync::Arc;

use rayon::prelude::*;

use crate::apps::{AppSnapshot, ApplicationRecord};
use crate::constants::PARALLEL_THRESHOLD_DEFAULT;
use crate::errors::PipelineError;
use crate::filter::FilterOptions;
use crate::presentation::{DisplayItem, PresentationMapper};
use crate::sort::SortOptions;

pub mod combine;

pub use combine::{spawn_combine_latest, DisplayList, PipelineInputs};

/// Current value of every pipeline input
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub apps: AppSnapshot,
    pub search_term: Option<String>,
    pub filter_options: FilterOptions,
    pub sort_options: SortOptions,
}

/// Tuning for a recomputation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Snapshots of at least this many records are filtered and sorted on the
    /// rayon pool
    pub parallel_threshold: usize,
    pub case_sensitive_search: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            parallel_threshold: PARALLEL_THRESHOLD_DEFAULT,
            case_sensitive_search: false,
        }
    }
}

/// Search stage predicate: substring containment on the package id, then on
/// the label for kinds that have one. `None` matches everything.
pub fn matches_search(app: &ApplicationRecord, term: Option<&str>, case_sensitive: bool) -> bool {
    let Some(term) = term else {
        return true;
    };
    let contains = |haystack: &str| {
        if case_sensitive {
            haystack.contains(term)
        } else {
            haystack.to_lowercase().contains(&term.to_lowercase())
        }
    };

    if contains(app.id().as_str()) {
        return true;
    }
    match app {
        ApplicationRecord::Normal(normal) => normal.label().is_some_and(contains),
        ApplicationRecord::Unsupported { .. } => false,
    }
}

/// Stage 1: keep records passing every active filter key
pub fn apply_filters(
    apps: &[Arc<ApplicationRecord>],
    options: &FilterOptions,
    settings: &PipelineSettings,
) -> Vec<Arc<ApplicationRecord>> {
    if options.is_pass_through() {
        return apps.to_vec();
    }
    if apps.len() >= settings.parallel_threshold {
        apps.par_iter().filter(|app| options.matches(app)).cloned().collect()
    } else {
        apps.iter().filter(|app| options.matches(app)).cloned().collect()
    }
}

/// Stage 2: keep records matching the search term
pub fn apply_search(
    apps: Vec<Arc<ApplicationRecord>>,
    term: Option<&str>,
    settings: &PipelineSettings,
) -> Vec<Arc<ApplicationRecord>> {
    if term.is_none() {
        return apps;
    }
    let case_sensitive = settings.case_sensitive_search;
    if apps.len() >= settings.parallel_threshold {
        apps.into_par_iter()
            .filter(|app| matches_search(app, term, case_sensitive))
            .collect()
    } else {
        apps.into_iter()
            .filter(|app| matches_search(app, term, case_sensitive))
            .collect()
    }
}

/// Stage 3: order survivors with the active comparator. Both paths are stable
/// and the comparator is total, so they agree.
pub fn apply_sort(
    mut apps: Vec<Arc<ApplicationRecord>>,
    options: &SortOptions,
    settings: &PipelineSettings,
) -> Vec<Arc<ApplicationRecord>> {
    let comparator = options.comparator();
    if apps.len() >= settings.parallel_threshold {
        apps.par_sort_by(|a, b| comparator(a, b));
    } else {
        apps.sort_by(|a, b| comparator(a, b));
    }
    apps
}

/// Stages 1 to 3
pub fn select(state: &PipelineState, settings: &PipelineSettings) -> Vec<Arc<ApplicationRecord>> {
    let filtered = apply_filters(&state.apps, &state.filter_options, settings);
    let searched = apply_search(filtered, state.search_term.as_deref(), settings);
    apply_sort(searched, &state.sort_options, settings)
}

/// Full recomputation: select, then map every survivor
pub fn aggregate(
    state: &PipelineState,
    mapper: &PresentationMapper,
    settings: &PipelineSettings,
) -> Result<Vec<DisplayItem>, PipelineError> {
    let survivors = select(state, settings);
    mapper.map_all(&survivors)
}
