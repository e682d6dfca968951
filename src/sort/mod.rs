//! Sort comparators
//!
//! Exactly one main sort is active at a time. Every mode is a total order:
//! ties on the primary key fall back to the package id, so equal records never
//! depend on input order.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::apps::ApplicationRecord;
use crate::errors::OptionParseError;

/// Catalog of main sort strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SortMode {
    /// Label ascending, case-insensitive; apps without a label use their package id
    #[default]
    Label,
    /// Package id ascending
    PackageId,
    /// Most requested permissions first
    PermissionCount,
    /// Most granted permissions first
    GrantedCount,
    /// DIRECT, then INDIRECT, then NONE
    InternetAccess,
}

impl SortMode {
    pub const ALL: [SortMode; 5] = [
        SortMode::Label,
        SortMode::PackageId,
        SortMode::PermissionCount,
        SortMode::GrantedCount,
        SortMode::InternetAccess,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Label => "label",
            SortMode::PackageId => "package",
            SortMode::PermissionCount => "permissions",
            SortMode::GrantedCount => "granted",
            SortMode::InternetAccess => "internet",
        }
    }

    /// Total order: primary key, then package id
    pub fn compare(&self, a: &ApplicationRecord, b: &ApplicationRecord) -> Ordering {
        self.compare_primary(a, b).then_with(|| a.id().cmp(b.id()))
    }

    fn compare_primary(&self, a: &ApplicationRecord, b: &ApplicationRecord) -> Ordering {
        match self {
            SortMode::Label => {
                let (ka, kb) = (label_key(a), label_key(b));
                ka.to_lowercase()
                    .cmp(&kb.to_lowercase())
                    .then_with(|| ka.cmp(kb))
            }
            SortMode::PackageId => Ordering::Equal,
            SortMode::PermissionCount => b
                .requested_permissions()
                .len()
                .cmp(&a.requested_permissions().len()),
            SortMode::GrantedCount => b.granted_count().cmp(&a.granted_count()),
            SortMode::InternetAccess => a.internet_access().cmp(&b.internet_access()),
        }
    }
}

fn label_key(app: &ApplicationRecord) -> &str {
    app.label().unwrap_or_else(|| app.id().as_str())
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| OptionParseError::UnknownSort(s.to_string()))
    }
}

impl TryFrom<String> for SortMode {
    type Error = OptionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortMode> for String {
    fn from(mode: SortMode) -> Self {
        mode.as_str().to_string()
    }
}

/// Current sort selection. Immutable; every change builds a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortOptions {
    pub main_sort: SortMode,
}

impl SortOptions {
    pub fn new(main_sort: SortMode) -> Self {
        Self { main_sort }
    }

    pub fn with_main_sort(&self, main_sort: SortMode) -> Self {
        Self { main_sort }
    }

    /// Comparator for the active main sort
    pub fn comparator(&self) -> impl Fn(&ApplicationRecord, &ApplicationRecord) -> Ordering {
        let mode = self.main_sort;
        move |a, b| mode.compare(a, b)
    }
}

impl fmt::Display for SortOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "main_sort={}", self.main_sort)
    }
}
