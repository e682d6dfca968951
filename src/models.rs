//! Data models module
//!
//! Serializable output envelope and CLI run configuration:
//! - ListingEntry: one display item as printed
//! - ListingSummary: counts and the options that produced the listing
//! - ListingOutput: complete JSON document
//! - ListingConfig: parsed command line

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::apps::InternetAccess;
use crate::filter::FilterOptions;
use crate::pipeline::DisplayList;
use crate::presentation::{DisplayItem, TagKind, TagTint};
use crate::sort::SortMode;

/// A visible permission tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEntry {
    pub kind: TagKind,
    pub permission: String,
    pub tint: TagTint,
}

/// One application row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    pub package_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub summary: String,
    pub granted_count: usize,
    pub requested_count: usize,
    pub declared_count: usize,
    pub internet_access: InternetAccess,
    /// Hidden tags are omitted
    pub tags: Vec<TagEntry>,
}

impl From<&DisplayItem> for ListingEntry {
    fn from(item: &DisplayItem) -> Self {
        let tags = item
            .tags
            .iter()
            .filter_map(|tag| {
                tag.tint().map(|tint| TagEntry {
                    kind: tag.kind,
                    permission: tag.permission.id().to_string(),
                    tint,
                })
            })
            .collect();

        Self {
            package_id: item.package_id.to_string(),
            label: item.label.clone(),
            summary: item.summary.clone(),
            granted_count: item.granted_count,
            requested_count: item.requested_count,
            declared_count: item.declared_count,
            internet_access: item.internet_access,
            tags,
        }
    }
}

/// What was listed and how
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSummary {
    /// Applications in the snapshot
    pub total: usize,
    /// Applications surviving filter and search
    pub shown: usize,
    /// Active filter keys
    pub filters: Vec<String>,
    pub sort: SortMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Complete output structure for JSON serialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingOutput {
    pub results: Vec<ListingEntry>,
    pub summary: ListingSummary,
}

impl ListingOutput {
    pub fn new(
        list: &DisplayList,
        total: usize,
        filters: &FilterOptions,
        sort: SortMode,
        search: Option<String>,
    ) -> Self {
        let results: Vec<ListingEntry> = list.items.iter().map(ListingEntry::from).collect();
        Self {
            summary: ListingSummary {
                total,
                shown: results.len(),
                filters: filters.keys().map(|key| key.to_string()).collect(),
                sort,
                search,
            },
            results,
        }
    }
}

/// Configuration for one CLI run
#[derive(Debug, Clone)]
pub struct ListingConfig {
    /// JSON snapshot to read
    pub snapshot_path: PathBuf,
    pub search: Option<String>,
    /// Filters from the command line; empty means use configured defaults
    pub filters: FilterOptions,
    /// Sort from the command line; `None` means use the configured default
    pub sort: Option<SortMode>,
    pub json_output: bool,
    /// Keep running and re-render on snapshot changes
    pub watch: bool,
    pub config_path: Option<PathBuf>,
    pub quiet_mode: bool,
    pub verbose: bool,
}
