//! Application snapshot source
//!
//! Snapshots arrive as a JSON array of application entries:
//!
//! ```json
//! [
//!   {
//!     "kind": "normal",
//!     "id": "com.example.browser",
//!     "label": "Browser",
//!     "requested": [{ "id": "android.permission.INTERNET", "is_granted": true }],
//!     "declared": []
//!   }
//! ]
//! ```
//!
//! `kind` defaults to `"normal"`. Any other kind is kept as an unsupported
//! record so the pipeline can report it.

pub mod polling;

use std::collections::HashSet;
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::apps::{snapshot_of, AppSnapshot, ApplicationRecord, NormalApp, PackageId};
use crate::errors::SourceError;
use crate::permissions::PermissionState;

pub use polling::{spawn_snapshot_poller, stop_snapshot_poller};

const NORMAL_KIND: &str = "normal";

fn default_kind() -> String {
    NORMAL_KIND.to_string()
}

/// One application entry as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    #[serde(default = "default_kind")]
    pub kind: String,
    pub id: PackageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub requested: Vec<PermissionState>,
    #[serde(default)]
    pub declared: Vec<PermissionState>,
}

impl From<SnapshotEntry> for ApplicationRecord {
    fn from(entry: SnapshotEntry) -> Self {
        if entry.kind == NORMAL_KIND {
            NormalApp::new(entry.id, entry.label, entry.requested, entry.declared).into()
        } else {
            ApplicationRecord::Unsupported {
                id: entry.id,
                kind: entry.kind,
            }
        }
    }
}

/// Parse snapshot JSON into records. Repeated package ids keep the first entry.
pub fn parse_snapshot(json: &str) -> Result<Vec<ApplicationRecord>, serde_json::Error> {
    let entries: Vec<SnapshotEntry> = serde_json::from_str(json)?;
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(entries.len());

    for entry in entries {
        if !seen.insert(entry.id.clone()) {
            warn!("Duplicate package id {} in snapshot, keeping first entry", entry.id);
            continue;
        }
        records.push(entry.into());
    }
    Ok(records)
}

/// Read and parse a snapshot file
pub async fn load_snapshot(path: &Path) -> Result<Vec<ApplicationRecord>, SourceError> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let records = parse_snapshot(&json).map_err(|source| SourceError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Loaded {} application(s) from {}", records.len(), path.display());
    Ok(records)
}

/// Owns the application snapshot stream that sessions subscribe to.
/// Each publish replaces the whole snapshot.
pub struct SnapshotPublisher {
    sender: watch::Sender<AppSnapshot>,
}

impl SnapshotPublisher {
    pub fn new(initial: Vec<ApplicationRecord>) -> Self {
        let (sender, _) = watch::channel(snapshot_of(initial));
        Self { sender }
    }

    pub fn publish(&self, records: Vec<ApplicationRecord>) {
        debug!("Publishing snapshot of {} application(s)", records.len());
        self.sender.send_replace(snapshot_of(records));
    }

    pub fn subscribe(&self) -> watch::Receiver<AppSnapshot> {
        self.sender.subscribe()
    }

    pub fn current(&self) -> AppSnapshot {
        self.sender.borrow().clone()
    }
}
