//! Filter predicates
//!
//! Each `FilterKey` is an independent predicate over an application record.
//! `FilterOptions` maps keys to an enabled flag; an application passes when
//! every enabled key matches it. No enabled keys means everything passes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::apps::{ApplicationRecord, InternetAccess};
use crate::errors::OptionParseError;

pub mod pattern;

const REQUESTS_PREFIX: &str = "requests:";

/// A named, independently toggleable filter
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FilterKey {
    /// Internet access is DIRECT or INDIRECT
    RequiresInternet,
    /// Internet access is NONE
    NoInternet,
    /// Declares at least one permission of its own
    DeclaresPermissions,
    /// Every requested permission is granted
    AllGranted,
    /// At least one requested permission is denied
    HasDenied,
    /// Requests a permission matching the exact id or glob pattern
    Requests(String),
}

impl FilterKey {
    /// Evaluate this predicate. Total over every record kind.
    pub fn matches(&self, app: &ApplicationRecord) -> bool {
        match self {
            FilterKey::RequiresInternet => app.internet_access() != InternetAccess::None,
            FilterKey::NoInternet => app.internet_access() == InternetAccess::None,
            FilterKey::DeclaresPermissions => !app.declared_permissions().is_empty(),
            FilterKey::AllGranted => app.requested_permissions().iter().all(|s| s.is_granted),
            FilterKey::HasDenied => app.requested_permissions().iter().any(|s| !s.is_granted),
            FilterKey::Requests(filter) => {
                pattern::any_permission_matches(app.requested_permissions(), filter)
            }
        }
    }

    /// Built-in keys shown in the filter dialog
    pub fn builtin() -> [FilterKey; 5] {
        [
            FilterKey::RequiresInternet,
            FilterKey::NoInternet,
            FilterKey::DeclaresPermissions,
            FilterKey::AllGranted,
            FilterKey::HasDenied,
        ]
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKey::RequiresInternet => f.write_str("internet"),
            FilterKey::NoInternet => f.write_str("no-internet"),
            FilterKey::DeclaresPermissions => f.write_str("declares"),
            FilterKey::AllGranted => f.write_str("all-granted"),
            FilterKey::HasDenied => f.write_str("has-denied"),
            FilterKey::Requests(filter) => write!(f, "{}{}", REQUESTS_PREFIX, filter),
        }
    }
}

impl FromStr for FilterKey {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(filter) = s.strip_prefix(REQUESTS_PREFIX) {
            pattern::validate_permission_filter(filter)?;
            return Ok(FilterKey::Requests(filter.to_string()));
        }

        match s {
            "internet" => Ok(FilterKey::RequiresInternet),
            "no-internet" => Ok(FilterKey::NoInternet),
            "declares" => Ok(FilterKey::DeclaresPermissions),
            "all-granted" => Ok(FilterKey::AllGranted),
            "has-denied" => Ok(FilterKey::HasDenied),
            other => Err(OptionParseError::UnknownFilter(other.to_string())),
        }
    }
}

impl TryFrom<String> for FilterKey {
    type Error = OptionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FilterKey> for String {
    fn from(key: FilterKey) -> Self {
        key.to_string()
    }
}

/// Filter key to enabled-flag mapping. Immutable; every change builds a new value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    filters: BTreeMap<FilterKey, bool>,
}

impl FilterOptions {
    /// No filters active (pass-through)
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy with `key` set to `enabled`
    pub fn with(&self, key: FilterKey, enabled: bool) -> Self {
        let mut filters = self.filters.clone();
        filters.insert(key, enabled);
        Self { filters }
    }

    pub fn enabled(&self, key: FilterKey) -> Self {
        self.with(key, true)
    }

    pub fn disabled(&self, key: FilterKey) -> Self {
        self.with(key, false)
    }

    pub fn toggled(&self, key: FilterKey) -> Self {
        let enabled = self.is_enabled(&key);
        self.with(key, !enabled)
    }

    /// Copy with every key disabled
    pub fn cleared(&self) -> Self {
        Self {
            filters: self.filters.keys().map(|key| (key.clone(), false)).collect(),
        }
    }

    pub fn is_enabled(&self, key: &FilterKey) -> bool {
        self.filters.get(key).copied().unwrap_or(false)
    }

    /// Currently active keys. Disabled keys are skipped.
    pub fn keys(&self) -> impl Iterator<Item = &FilterKey> {
        self.filters
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(key, _)| key)
    }

    pub fn is_pass_through(&self) -> bool {
        self.keys().next().is_none()
    }

    /// AND across active keys; vacuously true when none are active
    pub fn matches(&self, app: &ApplicationRecord) -> bool {
        self.keys().all(|key| key.matches(app))
    }
}

impl FromIterator<FilterKey> for FilterOptions {
    fn from_iter<I: IntoIterator<Item = FilterKey>>(iter: I) -> Self {
        Self {
            filters: iter.into_iter().map(|key| (key, true)).collect(),
        }
    }
}

impl fmt::Display for FilterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active: Vec<String> = self.keys().map(|key| key.to_string()).collect();
        if active.is_empty() {
            f.write_str("(none)")
        } else {
            f.write_str(&active.join(", "))
        }
    }
}
