//! Session-level behaviour through the public library API

use std::time::Duration;

use permlens::apps::{ApplicationRecord, InternetAccess, NormalApp, PackageId};
use permlens::filter::{FilterKey, FilterOptions};
use permlens::permissions::{catalog, Permission, PermissionId, PermissionState};
use permlens::pipeline::DisplayList;
use permlens::presentation::{TagKind, TagTint};
use permlens::session::{AppsSession, NavigationIntent, SessionEvent, SessionSettings};
use permlens::sort::{SortMode, SortOptions};
use permlens::source::SnapshotPublisher;
use tokio::sync::watch;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn app(id: &str, label: Option<&str>, requested: Vec<PermissionState>) -> ApplicationRecord {
    NormalApp::new(id, label.map(String::from), requested, vec![]).into()
}

async fn wait_until(
    rx: &mut watch::Receiver<DisplayList>,
    predicate: impl FnMut(&DisplayList) -> bool,
) -> DisplayList {
    timeout(WAIT, rx.wait_for(predicate))
        .await
        .expect("timed out waiting for listing")
        .expect("pipeline stopped")
        .clone()
}

fn ids(list: &DisplayList) -> Vec<String> {
    list.items.iter().map(|item| item.package_id.to_string()).collect()
}

// ==================== scenarios ====================

#[tokio::test]
async fn test_scenario_summary_counts_granted_and_declared() {
    let record: ApplicationRecord = NormalApp::new(
        "com.example.sync",
        Some("Sync".to_string()),
        vec![
            PermissionState::granted(catalog::INTERNET),
            PermissionState::granted(catalog::WAKE_LOCK),
            PermissionState::denied(catalog::VIBRATE),
        ],
        vec![PermissionState::denied("com.example.sync.permission.PUSH")],
    )
    .into();
    let publisher = SnapshotPublisher::new(vec![record]);
    let (session, _channels) = AppsSession::start(publisher.subscribe(), SessionSettings::default());

    let list = wait_until(&mut session.items(), |l| l.generation >= 1).await;
    assert_eq!(list.items[0].summary, "2/3 granted · declares 1");
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_scenario_search_matches_label_only() {
    let publisher = SnapshotPublisher::new(vec![
        app("com.example.other", Some("Camera App"), vec![]),
        app("com.example.notes", Some("Notes"), vec![]),
    ]);
    let (session, _channels) = AppsSession::start(publisher.subscribe(), SessionSettings::default());
    let mut items = session.items();

    session.set_search_term(Some("cam".to_string()));
    let list = wait_until(&mut items, |l| l.len() == 1).await;
    assert_eq!(ids(&list), vec!["com.example.other"]);
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_scenario_requires_internet_excludes_none() {
    let publisher = SnapshotPublisher::new(vec![
        app("com.example.offline", Some("Offline"), vec![PermissionState::granted(catalog::VIBRATE)]),
        app("com.example.online", Some("Online"), vec![PermissionState::granted(catalog::INTERNET)]),
    ]);
    let (session, _channels) = AppsSession::start(publisher.subscribe(), SessionSettings::default());
    let mut items = session.items();

    session.update_filter_options(|old| old.enabled(FilterKey::RequiresInternet));
    for mode in SortMode::ALL {
        session.update_sort_options(|old| old.with_main_sort(mode));
        for term in [None, Some("Off".to_string()), Some("com.example".to_string())] {
            session.set_search_term(term);
            let list = wait_until(&mut items, |l| l.generation >= 1 && l.len() <= 1).await;
            assert!(!ids(&list).contains(&"com.example.offline".to_string()));
        }
    }
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_scenario_equal_labels_order_by_package_id() {
    for records in [
        vec![app("b.foo", Some("Foo"), vec![]), app("a.foo", Some("Foo"), vec![])],
        vec![app("a.foo", Some("Foo"), vec![]), app("b.foo", Some("Foo"), vec![])],
    ] {
        let publisher = SnapshotPublisher::new(records);
        let settings = SessionSettings {
            initial_sort: SortOptions::new(SortMode::Label),
            ..SessionSettings::default()
        };
        let (session, _channels) = AppsSession::start(publisher.subscribe(), settings);
        let list = wait_until(&mut session.items(), |l| l.generation >= 1).await;
        assert_eq!(ids(&list), vec!["a.foo", "b.foo"]);
        session.shutdown().await.unwrap();
    }
}

#[tokio::test]
async fn test_scenario_storage_write_grant_wins() {
    let publisher = SnapshotPublisher::new(vec![app(
        "com.example.files",
        Some("Files"),
        vec![
            PermissionState::granted(catalog::WRITE_EXTERNAL_STORAGE),
            PermissionState::denied(catalog::READ_EXTERNAL_STORAGE),
        ],
    )]);
    let (session, mut channels) = AppsSession::start(publisher.subscribe(), SessionSettings::default());
    let list = wait_until(&mut session.items(), |l| l.generation >= 1).await;

    let tag = list.items[0].tag(TagKind::Storage).unwrap().clone();
    assert!(tag.is_visible());
    assert_eq!(tag.tint(), Some(TagTint::Granted));

    list.items[0].click_tag(&tag);
    assert_eq!(
        channels.events.recv().await,
        Some(SessionEvent::ShowPermission(Permission::from(catalog::WRITE_EXTERNAL_STORAGE)))
    );
    session.shutdown().await.unwrap();
}

// ==================== properties ====================

#[tokio::test]
async fn test_disabled_filters_are_identity() {
    let records = vec![
        app("com.example.a", Some("A"), vec![PermissionState::denied(catalog::INTERNET)]),
        app("com.example.b", Some("B"), vec![]),
    ];
    let publisher = SnapshotPublisher::new(records);
    let settings = SessionSettings {
        initial_filter: FilterOptions::new()
            .disabled(FilterKey::HasDenied)
            .disabled(FilterKey::RequiresInternet),
        ..SessionSettings::default()
    };
    let (session, _channels) = AppsSession::start(publisher.subscribe(), settings);
    let list = wait_until(&mut session.items(), |l| l.generation >= 1).await;
    assert_eq!(list.len(), 2);
    session.shutdown().await.unwrap();
}

#[test]
fn test_get_permission_round_trip() {
    let record: ApplicationRecord = NormalApp::new(
        "com.example.app",
        None,
        vec![
            PermissionState::granted(catalog::INTERNET),
            PermissionState::denied(catalog::VIBRATE),
        ],
        vec![PermissionState::granted("com.example.app.permission.OWN")],
    )
    .into();

    for state in record.requested_permissions() {
        assert_eq!(record.get_permission(&state.id).map(|s| &s.id), Some(&state.id));
    }
    assert!(record
        .get_permission(&PermissionId::from("com.example.app.permission.OWN"))
        .is_none());
    assert!(record.get_permission(&PermissionId::from("android.permission.CAMERA")).is_none());
}

// ==================== reactive behaviour ====================

#[tokio::test]
async fn test_new_snapshot_replaces_listing() {
    let publisher = SnapshotPublisher::new(vec![app("com.example.a", None, vec![])]);
    let (session, _channels) = AppsSession::start(publisher.subscribe(), SessionSettings::default());
    let mut items = session.items();
    wait_until(&mut items, |l| l.len() == 1).await;

    publisher.publish(vec![
        app("com.example.b", None, vec![PermissionState::granted(catalog::INTERNET)]),
        app("com.example.c", None, vec![]),
    ]);
    let list = wait_until(&mut items, |l| l.len() == 2).await;
    assert_eq!(ids(&list), vec!["com.example.b", "com.example.c"]);
    assert_eq!(list.items[0].internet_access, InternetAccess::Direct);
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_closed_source_keeps_last_listing() {
    let publisher = SnapshotPublisher::new(vec![
        app("com.example.a", Some("A"), vec![]),
        app("com.example.b", Some("B"), vec![]),
    ]);
    let (session, _channels) = AppsSession::start(publisher.subscribe(), SessionSettings::default());
    let mut items = session.items();
    wait_until(&mut items, |l| l.len() == 2).await;

    drop(publisher);
    session.set_search_term(Some("B".to_string()));
    let list = wait_until(&mut items, |l| l.len() == 1).await;
    assert_eq!(ids(&list), vec!["com.example.b"]);
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_navigation_only_from_primary_click() {
    let publisher = SnapshotPublisher::new(vec![app(
        "com.example.a",
        Some("A"),
        vec![PermissionState::granted(catalog::VIBRATE)],
    )]);
    let (session, mut channels) = AppsSession::start(publisher.subscribe(), SessionSettings::default());
    let list = wait_until(&mut session.items(), |l| l.generation >= 1).await;

    list.items[0].click_permission(&Permission::from(catalog::VIBRATE));
    assert!(channels.navigation.try_recv().is_err());

    list.items[0].click();
    assert_eq!(
        channels.navigation.recv().await,
        Some(NavigationIntent::NavigateToApp(PackageId::from("com.example.a")))
    );
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unsupported_kind_surfaces_on_shutdown() {
    let publisher = SnapshotPublisher::new(vec![ApplicationRecord::Unsupported {
        id: "com.example.instant".into(),
        kind: "instant_app".to_string(),
    }]);
    let (session, _channels) = AppsSession::start(publisher.subscribe(), SessionSettings::default());

    let mut items = session.items();
    assert!(timeout(WAIT, items.wait_for(|l| l.generation >= 1)).await.unwrap().is_err());
    assert!(session.shutdown().await.is_err());
}
