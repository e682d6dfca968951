//! Permission model
//!
//! Defines:
//! - PermissionId: stable string identity of a platform permission
//! - Permission: a permission as seen by the UI (id plus best-effort label)
//! - PermissionState: grant state of a permission held by one application
//! - catalog: identifiers the inspector renders tags for
//!
//! Whether a state is "requested" or "declared" is carried by the collection it
//! lives in on the application record, never by the state itself.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Well-known permission identifiers
pub mod catalog {
    pub const INTERNET: &str = "android.permission.INTERNET";
    pub const ACCESS_NETWORK_STATE: &str = "android.permission.ACCESS_NETWORK_STATE";
    pub const CHANGE_NETWORK_STATE: &str = "android.permission.CHANGE_NETWORK_STATE";
    pub const ACCESS_WIFI_STATE: &str = "android.permission.ACCESS_WIFI_STATE";
    pub const BOOT_COMPLETED: &str = "android.permission.RECEIVE_BOOT_COMPLETED";
    pub const WRITE_EXTERNAL_STORAGE: &str = "android.permission.WRITE_EXTERNAL_STORAGE";
    pub const READ_EXTERNAL_STORAGE: &str = "android.permission.READ_EXTERNAL_STORAGE";
    pub const WAKE_LOCK: &str = "android.permission.WAKE_LOCK";
    pub const VIBRATE: &str = "android.permission.VIBRATE";

    /// Permissions that let an app reach the network through other parties
    /// without holding INTERNET itself
    pub const NETWORK_ADJACENT: &[&str] = &[
        ACCESS_NETWORK_STATE,
        CHANGE_NETWORK_STATE,
        ACCESS_WIFI_STATE,
    ];
}

/// Stable identifier of a permission (the platform permission name)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionId(String);

impl PermissionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PermissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PermissionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PermissionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A permission identity. Equality and hashing go through the id only.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Permission {
    id: PermissionId,
}

impl Permission {
    pub fn new(id: impl Into<PermissionId>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &PermissionId {
        &self.id
    }

    /// Resolve a human-readable label, if the lookup knows one
    pub fn label(&self, labels: &dyn PermissionLabels) -> Option<String> {
        labels
            .label_for(&self.id)
            .filter(|label| !label.is_empty())
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Permission({})", self.id)
    }
}

impl From<&str> for Permission {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Grant state of a single permission on one application
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionState {
    pub id: PermissionId,
    #[serde(default)]
    pub is_granted: bool,
}

impl PermissionState {
    pub fn new(id: impl Into<PermissionId>, is_granted: bool) -> Self {
        Self {
            id: id.into(),
            is_granted,
        }
    }

    pub fn granted(id: impl Into<PermissionId>) -> Self {
        Self::new(id, true)
    }

    pub fn denied(id: impl Into<PermissionId>) -> Self {
        Self::new(id, false)
    }

    pub fn permission(&self) -> Permission {
        Permission::new(self.id.clone())
    }
}

/// External, best-effort label lookup for permissions
pub trait PermissionLabels: Send + Sync {
    fn label_for(&self, id: &PermissionId) -> Option<String>;
}

/// Label lookup backed by an in-memory table
#[derive(Debug, Clone, Default)]
pub struct StaticLabels {
    labels: HashMap<PermissionId, String>,
}

impl StaticLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, id: impl Into<PermissionId>, label: impl Into<String>) -> Self {
        self.labels.insert(id.into(), label.into());
        self
    }
}

impl PermissionLabels for StaticLabels {
    fn label_for(&self, id: &PermissionId) -> Option<String> {
        self.labels.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_permission_id_equality_by_value() {
        let a = PermissionId::from(catalog::INTERNET);
        let b = PermissionId::new(String::from(catalog::INTERNET));
        assert_eq!(a, b);

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_permission_id_ordering_follows_string() {
        let mut ids = vec![
            PermissionId::from("b.permission"),
            PermissionId::from("a.permission"),
            PermissionId::from("c.permission"),
        ];
        ids.sort();
        let ordered: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(ordered, vec!["a.permission", "b.permission", "c.permission"]);
    }

    #[test]
    fn test_permission_id_serializes_as_plain_string() {
        let id = PermissionId::from(catalog::VIBRATE);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", catalog::VIBRATE));
    }

    #[test]
    fn test_label_lookup_returns_known_label() {
        let labels = StaticLabels::new().with_label(catalog::INTERNET, "Full network access");
        let permission = Permission::from(catalog::INTERNET);
        assert_eq!(permission.label(&labels).as_deref(), Some("Full network access"));
    }

    #[test]
    fn test_label_lookup_absent_or_empty() {
        let labels = StaticLabels::new().with_label(catalog::VIBRATE, "");
        assert!(Permission::from(catalog::VIBRATE).label(&labels).is_none());
        assert!(Permission::from(catalog::WAKE_LOCK).label(&labels).is_none());
    }

    #[test]
    fn test_permission_state_constructors() {
        let granted = PermissionState::granted(catalog::WAKE_LOCK);
        let denied = PermissionState::denied(catalog::WAKE_LOCK);
        assert!(granted.is_granted);
        assert!(!denied.is_granted);
        assert_eq!(granted.permission(), denied.permission());
    }
}
