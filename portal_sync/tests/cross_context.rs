#![cfg(not(target_arch = "wasm32"))]


use portal_sync::adapters::shared::SharedMemoryStore;
use portal_sync::ports::StorageChange;
use portal_sync::{AppContext, AppEvent, Platform, SyncConfig, SyncError};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use test_utils::{in_local, rows, settle, Row, ScriptedFetch};

fn tab(origin: &SharedMemoryStore, config: SyncConfig) -> AppContext {
    AppContext::with_platform(Platform::new().with_store(Rc::new(origin.context())), config)
}

fn slow_polling() -> SyncConfig {
    SyncConfig::default().with_poll_interval_ms(600_000)
}

#[test]
fn test_broadcast_is_readable_here_but_only_signalled_elsewhere() {
    let origin = SharedMemoryStore::new();
    let writer = tab(&origin, SyncConfig::default());
    let reader = tab(&origin, SyncConfig::default());

    let here = Rc::new(RefCell::new(Vec::<StorageChange>::new()));
    let here_sink = here.clone();
    let _here_sub = writer
        .broadcaster()
        .on_change(move |change| here_sink.borrow_mut().push(change.clone()));
    let there = Rc::new(RefCell::new(Vec::<StorageChange>::new()));
    let there_sink = there.clone();
    let _there_sub = reader
        .broadcaster()
        .on_change(move |change| there_sink.borrow_mut().push(change.clone()));

    assert!(writer.broadcaster().broadcast("portal:theme", "dark"));
    assert!(writer.broadcaster().broadcast("portal:draft", &json!({"step": 2})));

    assert_eq!(writer.broadcaster().read("portal:theme").as_deref(), Some("dark"));
    assert_eq!(
        reader.broadcaster().read("portal:draft").as_deref(),
        Some(r#"{"step":2}"#)
    );
    assert!(here.borrow().is_empty());

    let keys: Vec<_> = there.borrow().iter().map(|c| c.key.clone()).collect();
    assert_eq!(keys, vec!["portal:theme", "portal:draft"]);
    assert_eq!(there.borrow()[0].old_value, None);
    assert_eq!(there.borrow()[0].new_value.as_deref(), Some("dark"));
}

#[test]
fn test_broadcast_failure_does_not_block_the_caller() {
    let origin = SharedMemoryStore::with_quota(16);
    let writer = tab(&origin, SyncConfig::default());

    assert!(!writer
        .broadcaster()
        .broadcast("portal:draft", &json!({"essay": "a long answer that does not fit"})));
    assert_eq!(
        writer
            .broadcaster()
            .try_broadcast("portal:draft", &json!({"essay": "still too long"})),
        Err(SyncError::QuotaExceeded)
    );

    origin.set_available(false);
    assert!(!writer.broadcaster().broadcast("k", "v"));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_submission_in_one_tab_refreshes_dashboards_everywhere() {
    in_local(async {
        let origin = SharedMemoryStore::new();
        let applicant_tab = tab(&origin, slow_polling());
        let admin_tab = tab(&origin, slow_polling());

        let applicant_fetch = ScriptedFetch::new(vec![Ok(rows(&[])), Ok(rows(&[1]))]);
        let admin_fetch = ScriptedFetch::new(vec![Ok(rows(&[])), Ok(rows(&[1]))]);
        let applicant_view = applicant_tab.mount::<Row, _, _>("applications", applicant_fetch.fetcher());
        let admin_view = admin_tab.mount::<Row, _, _>("applications", admin_fetch.fetcher());
        settle().await;
        assert!(admin_view.data().is_empty());

        let delivered = applicant_tab.publish(AppEvent::ApplicationSubmitted, json!({"id": "A1"}));
        assert_eq!(delivered, 1);
        settle().await;

        assert_eq!(applicant_fetch.calls(), 2);
        assert_eq!(admin_fetch.calls(), 2);
        assert_eq!(*applicant_view.data(), rows(&[1]));
        assert_eq!(*admin_view.data(), rows(&[1]));
    })
    .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_unrelated_events_do_not_refetch() {
    in_local(async {
        let origin = SharedMemoryStore::new();
        let first = tab(&origin, slow_polling());
        let second = tab(&origin, slow_polling());

        let fetch = ScriptedFetch::new(vec![Ok(rows(&[1]))]);
        let courses = second.mount::<Row, _, _>("courses", fetch.fetcher());
        settle().await;

        first.publish(AppEvent::AnnouncementPublished, json!({}));
        second.publish(AppEvent::ApplicationCreated, json!({}));
        assert_eq!(fetch.calls(), 1);

        first.publish(AppEvent::DataRefresh, json!(null));
        assert_eq!(fetch.calls(), 2);
        drop(courses);
    })
    .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_cached_snapshot_survives_into_a_new_tab() {
    in_local(async {
        let origin = SharedMemoryStore::new();
        let config = SyncConfig {
            cache_snapshots: true,
            ..slow_polling()
        };

        let first = tab(&origin, config.clone());
        let fetch = ScriptedFetch::new(vec![Ok(rows(&[3, 4]))]);
        let view = first.mount::<Row, _, _>("courses", fetch.fetcher());
        settle().await;
        view.unmount();

        let second = tab(&origin, config);
        let offline = ScriptedFetch::<Row>::new(vec![Err(SyncError::fetch("offline"))]);
        let reopened = second.mount::<Row, _, _>("courses", offline.fetcher());
        assert_eq!(*reopened.data(), rows(&[3, 4]));
        settle().await;
        assert_eq!(*reopened.data(), rows(&[3, 4]));
        assert!(reopened.error().is_some());
    })
    .await;
}
