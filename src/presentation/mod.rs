//! Presentation mapping
//!
//! Turns surviving application records into immutable, UI-agnostic
//! `DisplayItem`s. All derived fields are computed here from data already on
//! the record; nothing is looked up from the platform.

use std::fmt;
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::apps::{ApplicationRecord, InternetAccess, NormalApp, PackageId};
use crate::constants::SUMMARY_SEPARATOR;
use crate::errors::{ConfigError, PipelineError};
use crate::permissions::{catalog, Permission, PermissionId};

/// Receives the package id of a clicked item
pub type NavigateHandler = Arc<dyn Fn(&PackageId) + Send + Sync>;

/// Receives the permission behind a clicked tag
pub type PermissionHandler = Arc<dyn Fn(&Permission) + Send + Sync>;

/// Localizable templates for the permission summary line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryStrings {
    /// Uses `{granted}` and `{total}`
    pub granted: String,
    /// Uses `{count}`; appended only when the app declares permissions
    pub declares: String,
}

impl Default for SummaryStrings {
    fn default() -> Self {
        Self {
            granted: "{granted}/{total} granted".to_string(),
            declares: "declares {count}".to_string(),
        }
    }
}

impl SummaryStrings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for placeholder in ["{granted}", "{total}"] {
            if !self.granted.contains(placeholder) {
                return Err(ConfigError::InvalidTemplate {
                    template: self.granted.clone(),
                    placeholder,
                });
            }
        }
        if !self.declares.contains("{count}") {
            return Err(ConfigError::InvalidTemplate {
                template: self.declares.clone(),
                placeholder: "{count}",
            });
        }
        Ok(())
    }

    /// "granted/total", plus the declared suffix when `declared > 0`
    pub fn render(&self, granted: usize, total: usize, declared: usize) -> String {
        let mut text = self
            .granted
            .replace("{granted}", &granted.to_string())
            .replace("{total}", &total.to_string());

        if declared > 0 {
            text.push_str(SUMMARY_SEPARATOR);
            text.push_str(&self.declares.replace("{count}", &declared.to_string()));
        }
        text
    }
}

/// Which tag slot on the item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    Internet,
    Boot,
    Storage,
    WakeLock,
    Vibrate,
}

impl TagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagKind::Internet => "internet",
            TagKind::Boot => "boot",
            TagKind::Storage => "storage",
            TagKind::WakeLock => "wake_lock",
            TagKind::Vibrate => "vibrate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagTint {
    Granted,
    /// Storage read-only, or indirect internet
    Partial,
    Denied,
}

impl TagTint {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagTint::Granted => "granted",
            TagTint::Partial => "partial",
            TagTint::Denied => "denied",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "tint")]
pub enum TagState {
    Hidden,
    Shown(TagTint),
}

/// One permission tag on a display item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionTag {
    pub kind: TagKind,
    /// Reported when the tag is clicked
    pub permission: Permission,
    pub state: TagState,
}

impl PermissionTag {
    pub fn is_visible(&self) -> bool {
        matches!(self.state, TagState::Shown(_))
    }

    pub fn tint(&self) -> Option<TagTint> {
        match self.state {
            TagState::Shown(tint) => Some(tint),
            TagState::Hidden => None,
        }
    }
}

/// Internet tag: always shown, tinted by classification
fn internet_tag(access: InternetAccess) -> PermissionTag {
    let tint = match access {
        InternetAccess::Direct => TagTint::Granted,
        InternetAccess::Indirect => TagTint::Partial,
        InternetAccess::None => TagTint::Denied,
    };
    PermissionTag {
        kind: TagKind::Internet,
        permission: Permission::from(catalog::INTERNET),
        state: TagState::Shown(tint),
    }
}

/// Storage tag: write grant wins over read grant
fn storage_tag(app: &NormalApp) -> PermissionTag {
    let write = app.get_permission(&PermissionId::from(catalog::WRITE_EXTERNAL_STORAGE));
    let read = app.get_permission(&PermissionId::from(catalog::READ_EXTERNAL_STORAGE));

    let state = match (write, read) {
        (None, None) => TagState::Hidden,
        (Some(w), _) if w.is_granted => TagState::Shown(TagTint::Granted),
        (_, Some(r)) if r.is_granted => TagState::Shown(TagTint::Partial),
        _ => TagState::Shown(TagTint::Denied),
    };
    PermissionTag {
        kind: TagKind::Storage,
        permission: Permission::from(catalog::WRITE_EXTERNAL_STORAGE),
        state,
    }
}

/// Plain tag: granted, denied, or hidden when not requested at all
fn simple_tag(app: &NormalApp, kind: TagKind, id: &str) -> PermissionTag {
    let permission = Permission::from(id);
    let state = match app.get_permission(permission.id()) {
        Some(state) if state.is_granted => TagState::Shown(TagTint::Granted),
        Some(_) => TagState::Shown(TagTint::Denied),
        None => TagState::Hidden,
    };
    PermissionTag {
        kind,
        permission,
        state,
    }
}

/// Tags rendered for a normal app, in display order
pub fn permission_tags(app: &NormalApp) -> Vec<PermissionTag> {
    vec![
        internet_tag(app.internet_access()),
        simple_tag(app, TagKind::Boot, catalog::BOOT_COMPLETED),
        storage_tag(app),
        simple_tag(app, TagKind::WakeLock, catalog::WAKE_LOCK),
        simple_tag(app, TagKind::Vibrate, catalog::VIBRATE),
    ]
}

/// Immutable projection of one application record
#[derive(Clone)]
pub struct DisplayItem {
    pub package_id: PackageId,
    pub label: Option<String>,
    pub granted_count: usize,
    pub requested_count: usize,
    pub declared_count: usize,
    pub summary: String,
    pub internet_access: InternetAccess,
    pub tags: Vec<PermissionTag>,
    app: Arc<ApplicationRecord>,
    on_click: Arc<dyn Fn() + Send + Sync>,
    on_permission: PermissionHandler,
}

impl DisplayItem {
    /// The record this item was built from
    pub fn app(&self) -> &Arc<ApplicationRecord> {
        &self.app
    }

    /// Primary click
    pub fn click(&self) {
        (self.on_click)()
    }

    pub fn click_tag(&self, tag: &PermissionTag) {
        (self.on_permission)(&tag.permission)
    }

    pub fn click_permission(&self, permission: &Permission) {
        (self.on_permission)(permission)
    }

    pub fn tag(&self, kind: TagKind) -> Option<&PermissionTag> {
        self.tags.iter().find(|tag| tag.kind == kind)
    }
}

impl fmt::Debug for DisplayItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayItem")
            .field("package_id", &self.package_id)
            .field("label", &self.label)
            .field("summary", &self.summary)
            .field("internet_access", &self.internet_access)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// Builds display items and binds their callbacks
#[derive(Clone)]
pub struct PresentationMapper {
    strings: SummaryStrings,
    navigate: NavigateHandler,
    show_permission: PermissionHandler,
}

impl PresentationMapper {
    pub fn new(strings: SummaryStrings, navigate: NavigateHandler, show_permission: PermissionHandler) -> Self {
        Self {
            strings,
            navigate,
            show_permission,
        }
    }

    /// Mapper whose callbacks do nothing
    pub fn detached(strings: SummaryStrings) -> Self {
        Self::new(strings, Arc::new(|_: &PackageId| {}), Arc::new(|_: &Permission| {}))
    }

    pub fn strings(&self) -> &SummaryStrings {
        &self.strings
    }

    /// Map one record. Kinds without a mapping are an error, never skipped.
    pub fn map(&self, app: &Arc<ApplicationRecord>) -> Result<DisplayItem, PipelineError> {
        match app.as_ref() {
            ApplicationRecord::Normal(normal) => Ok(self.map_normal(app, normal)),
            ApplicationRecord::Unsupported { id, kind } => Err(PipelineError::UnsupportedAppKind {
                id: id.clone(),
                kind: kind.clone(),
            }),
        }
    }

    pub fn map_all(&self, apps: &[Arc<ApplicationRecord>]) -> Result<Vec<DisplayItem>, PipelineError> {
        apps.iter().map(|app| self.map(app)).collect()
    }

    fn map_normal(&self, app: &Arc<ApplicationRecord>, normal: &NormalApp) -> DisplayItem {
        let granted_count = app.granted_count();
        let requested_count = normal.requested_permissions().len();
        let declared_count = normal.declared_permissions().len();

        let on_click: Arc<dyn Fn() + Send + Sync> = {
            let app = Arc::clone(app);
            let navigate = Arc::clone(&self.navigate);
            Arc::new(move || {
                debug!("Navigating to {}", app);
                navigate(app.id());
            })
        };

        let on_permission: PermissionHandler = {
            let id = normal.id().clone();
            let show_permission = Arc::clone(&self.show_permission);
            Arc::new(move |permission: &Permission| {
                debug!("Permission tag clicked: {} on {}", permission, id);
                show_permission(permission);
            })
        };

        DisplayItem {
            package_id: normal.id().clone(),
            label: normal.label().map(String::from),
            granted_count,
            requested_count,
            declared_count,
            summary: self.strings.render(granted_count, requested_count, declared_count),
            internet_access: normal.internet_access(),
            tags: permission_tags(normal),
            app: Arc::clone(app),
            on_click,
            on_permission,
        }
    }
}
