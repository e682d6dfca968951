//! Application records
//!
//! Defines core data structures:
//! - PackageId: stable package identifier
//! - InternetAccess: network capability derived from requested permissions
//! - NormalApp: a regular installed application with resolved permissions
//! - ApplicationRecord: closed sum type over every application kind
//!
//! Records are immutable once built. A changed application arrives as a new
//! record inside a new snapshot.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::permissions::{catalog, PermissionId, PermissionState};

/// One complete application list as reported by the data source
pub type AppSnapshot = Arc<[Arc<ApplicationRecord>]>;

/// Build a snapshot from owned records
pub fn snapshot_of(records: impl IntoIterator<Item = ApplicationRecord>) -> AppSnapshot {
    records.into_iter().map(Arc::new).collect()
}

/// Stable package identifier of an installed application
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(String);

impl PackageId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Network capability of an application.
///
/// Declaration order is the sort order used by the internet-access sort mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InternetAccess {
    Direct,
    Indirect,
    None,
}

impl InternetAccess {
    /// Classify from requested permissions only.
    ///
    /// DIRECT when INTERNET is granted; INDIRECT when a network-adjacent
    /// permission is granted; NONE otherwise. A denied INTERNET grants nothing.
    pub fn classify(requested: &[PermissionState]) -> Self {
        let granted = |id: &str| requested.iter().any(|state| state.is_granted && state.id.as_str() == id);

        if granted(catalog::INTERNET) {
            InternetAccess::Direct
        } else if catalog::NETWORK_ADJACENT.iter().any(|&id| granted(id)) {
            InternetAccess::Indirect
        } else {
            InternetAccess::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InternetAccess::Direct => "DIRECT",
            InternetAccess::Indirect => "INDIRECT",
            InternetAccess::None => "NONE",
        }
    }
}

impl fmt::Display for InternetAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A regular installed application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalApp {
    id: PackageId,
    label: Option<String>,
    requested_permissions: Vec<PermissionState>,
    declared_permissions: Vec<PermissionState>,
    internet_access: InternetAccess,
}

impl NormalApp {
    /// Build a record. Duplicate ids within one collection keep the first entry.
    pub fn new(
        id: impl Into<PackageId>,
        label: Option<String>,
        requested_permissions: Vec<PermissionState>,
        declared_permissions: Vec<PermissionState>,
    ) -> Self {
        let requested_permissions = dedup_by_id(requested_permissions);
        let declared_permissions = dedup_by_id(declared_permissions);
        let internet_access = InternetAccess::classify(&requested_permissions);

        Self {
            id: id.into(),
            label,
            requested_permissions,
            declared_permissions,
            internet_access,
        }
    }

    pub fn id(&self) -> &PackageId {
        &self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn requested_permissions(&self) -> &[PermissionState] {
        &self.requested_permissions
    }

    pub fn declared_permissions(&self) -> &[PermissionState] {
        &self.declared_permissions
    }

    pub fn internet_access(&self) -> InternetAccess {
        self.internet_access
    }

    /// Look up a requested permission. Declared permissions are not consulted.
    pub fn get_permission(&self, id: &PermissionId) -> Option<&PermissionState> {
        self.requested_permissions.iter().find(|state| &state.id == id)
    }
}

fn dedup_by_id(states: Vec<PermissionState>) -> Vec<PermissionState> {
    let mut seen = HashSet::new();
    states
        .into_iter()
        .filter(|state| seen.insert(state.id.clone()))
        .collect()
}

/// Every application kind the inspector can be handed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationRecord {
    Normal(NormalApp),
    /// A kind reported by the source that this build has no model for
    Unsupported { id: PackageId, kind: String },
}

impl ApplicationRecord {
    pub fn id(&self) -> &PackageId {
        match self {
            ApplicationRecord::Normal(app) => app.id(),
            ApplicationRecord::Unsupported { id, .. } => id,
        }
    }

    /// Kind name as reported by the data source
    pub fn kind(&self) -> &str {
        match self {
            ApplicationRecord::Normal(_) => "normal",
            ApplicationRecord::Unsupported { kind, .. } => kind,
        }
    }

    /// Label, for kinds that expose one
    pub fn label(&self) -> Option<&str> {
        match self {
            ApplicationRecord::Normal(app) => app.label(),
            ApplicationRecord::Unsupported { .. } => None,
        }
    }

    pub fn requested_permissions(&self) -> &[PermissionState] {
        match self {
            ApplicationRecord::Normal(app) => app.requested_permissions(),
            ApplicationRecord::Unsupported { .. } => &[],
        }
    }

    pub fn declared_permissions(&self) -> &[PermissionState] {
        match self {
            ApplicationRecord::Normal(app) => app.declared_permissions(),
            ApplicationRecord::Unsupported { .. } => &[],
        }
    }

    pub fn internet_access(&self) -> InternetAccess {
        match self {
            ApplicationRecord::Normal(app) => app.internet_access(),
            ApplicationRecord::Unsupported { .. } => InternetAccess::None,
        }
    }

    pub fn get_permission(&self, id: &PermissionId) -> Option<&PermissionState> {
        match self {
            ApplicationRecord::Normal(app) => app.get_permission(id),
            ApplicationRecord::Unsupported { .. } => None,
        }
    }

    pub fn granted_count(&self) -> usize {
        self.requested_permissions()
            .iter()
            .filter(|state| state.is_granted)
            .count()
    }
}

impl From<NormalApp> for ApplicationRecord {
    fn from(app: NormalApp) -> Self {
        ApplicationRecord::Normal(app)
    }
}

impl fmt::Display for ApplicationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => write!(f, "{}({}, {})", self.kind(), self.id(), label),
            None => write!(f, "{}({})", self.kind(), self.id()),
        }
    }
}
