#![cfg(not(target_arch = "wasm32"))]


use async_trait::async_trait;
use futures::executor::block_on;
use futures::future::{select, Either};
use portal_sync::adapters::shared::{MemoryNotificationStore, SharedMemoryStore};
use portal_sync::domain::notifications::{
    Notification, NotificationCenter, NotificationError, NotificationFilter, NotificationStatus,
};
use portal_sync::ports::NotificationStorePort;
use portal_sync::{AppContext, AppEvent, Broadcaster, Platform, SyncConfig, SyncOptions, Synchronizer};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;
use test_utils::{in_local, notification, settle};

const FELLOW: &str = "fellow-42";

fn seeded_store() -> MemoryNotificationStore {
    MemoryNotificationStore::with_notifications(vec![
        notification("n1", FELLOW, NotificationStatus::Unread, 1),
        notification("n2", FELLOW, NotificationStatus::Unread, 2),
        notification("n3", FELLOW, NotificationStatus::Read, 3),
        notification("n4", FELLOW, NotificationStatus::Unread, 4),
        notification("other", "fellow-7", NotificationStatus::Unread, 5),
    ])
}

/// Answers `list` after the next queued delay.
struct DelayedStore {
    inner: MemoryNotificationStore,
    delays: RefCell<VecDeque<u64>>,
}

impl DelayedStore {
    fn new(inner: MemoryNotificationStore, delays: &[u64]) -> Self {
        Self {
            inner,
            delays: RefCell::new(delays.iter().copied().collect()),
        }
    }
}

#[async_trait(?Send)]
impl NotificationStorePort for DelayedStore {
    async fn list(
        &self,
        user_id: &str,
        filter: &NotificationFilter,
    ) -> Result<Vec<Notification>, NotificationError> {
        let delay = self.delays.borrow_mut().pop_front().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.inner.list(user_id, filter).await
    }

    async fn update_status(
        &self,
        id: &str,
        status: NotificationStatus,
    ) -> Result<(), NotificationError> {
        self.inner.update_status(id, status).await
    }

    async fn mark_all_as_read(&self, user_id: &str) -> Result<usize, NotificationError> {
        self.inner.mark_all_as_read(user_id).await
    }

    async fn delete(&self, id: &str) -> Result<(), NotificationError> {
        self.inner.delete(id).await
    }
}

fn center(store: &MemoryNotificationStore) -> NotificationCenter {
    NotificationCenter::new(&Platform::new(), FELLOW, Rc::new(store.clone()))
}

#[test]
fn test_fetch_replaces_list_and_derives_counts() {
    let store = seeded_store();
    let center = center(&store);

    block_on(center.fetch_notifications(NotificationFilter::default())).unwrap();

    let ids: Vec<_> = center.notifications().into_iter().map(|n| n.id).collect();
    assert_eq!(ids, vec!["n4", "n3", "n2", "n1"]);
    assert_eq!(center.unread_count(), 3);
    assert_eq!(center.stats().read, 1);
    assert!(!center.is_loading());
}

#[test]
fn test_mark_all_as_read_zeroes_unread_count() {
    let store = seeded_store();
    let center = center(&store);
    block_on(center.fetch_notifications(NotificationFilter::default())).unwrap();
    assert_eq!(center.unread_count(), 3);

    block_on(center.mark_all_as_read()).unwrap();

    assert_eq!(center.unread_count(), 0);
    assert_eq!(center.stats().read, 4);
    assert!(store.get("other").unwrap().is_unread());
}

#[test]
fn test_mark_as_read_then_refetch() {
    let store = seeded_store();
    let center = center(&store);
    block_on(center.fetch_notifications(NotificationFilter::unread())).unwrap();
    assert_eq!(center.notifications().len(), 3);

    block_on(center.mark_as_read("n2")).unwrap();

    let ids: Vec<_> = center.notifications().into_iter().map(|n| n.id).collect();
    assert_eq!(ids, vec!["n4", "n1"]);
    assert_eq!(store.get("n2").unwrap().status, NotificationStatus::Read);
}

#[test]
fn test_archive_and_delete_leave_the_default_view() {
    let store = seeded_store();
    let center = center(&store);
    block_on(center.fetch_notifications(NotificationFilter::default())).unwrap();

    block_on(center.archive_notification("n3")).unwrap();
    block_on(center.delete_notification("n1")).unwrap();

    let ids: Vec<_> = center.notifications().into_iter().map(|n| n.id).collect();
    assert_eq!(ids, vec!["n4", "n2"]);

    block_on(center.fetch_notifications(NotificationFilter {
        include_archived: true,
        ..Default::default()
    }))
    .unwrap();
    assert_eq!(center.stats().archived, 1);
    assert_eq!(store.get("n1").unwrap().status, NotificationStatus::Deleted);
}

#[test]
fn test_failures_never_leave_loading_stuck() {
    let store = seeded_store();
    let center = center(&store);
    block_on(center.fetch_notifications(NotificationFilter::default())).unwrap();

    store.set_failing(true);
    let err = block_on(center.mark_all_as_read()).unwrap_err();
    assert!(matches!(err, NotificationError::Store(_)));
    assert!(!center.is_loading());
    assert_eq!(center.error(), Some(err));
    assert_eq!(center.notifications().len(), 4);

    assert!(block_on(center.refresh_notifications()).is_err());
    assert!(!center.is_loading());

    store.set_failing(false);
    block_on(center.refresh_notifications()).unwrap();
    assert_eq!(center.error(), None);
}

#[test]
fn test_invalid_transition_is_rejected_before_the_store() {
    let store = seeded_store();
    let center = center(&store);
    block_on(center.archive_notification("n3")).unwrap();
    block_on(center.fetch_notifications(NotificationFilter {
        include_archived: true,
        ..Default::default()
    }))
    .unwrap();
    let calls = store.calls();

    let err = block_on(center.mark_as_read("n3")).unwrap_err();
    assert_eq!(
        err,
        NotificationError::InvalidTransition {
            id: "n3".to_string(),
            from: NotificationStatus::Archived,
            to: NotificationStatus::Read,
        }
    );
    assert_eq!(store.calls(), calls);
    assert!(!center.is_loading());
}

#[test]
fn test_unknown_notification_is_reported_by_the_store() {
    let store = seeded_store();
    let center = center(&store);
    let err = block_on(center.mark_as_read("missing")).unwrap_err();
    assert_eq!(err, NotificationError::not_found("missing"));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_loading_holds_until_the_last_overlapping_action_ends() {
    let store = DelayedStore::new(seeded_store(), &[100, 300]);
    let center = NotificationCenter::new(&Platform::new(), FELLOW, Rc::new(store));

    let quick = center.fetch_notifications(NotificationFilter::default());
    let slow = center.refresh_notifications();
    futures::pin_mut!(quick, slow);

    let slow = match select(quick, slow).await {
        Either::Left((result, slow)) => {
            result.unwrap();
            slow
        }
        Either::Right(_) => panic!("the slower refresh finished first"),
    };
    assert_eq!(center.notifications().len(), 4);
    assert!(center.is_loading());

    slow.await.unwrap();
    assert!(!center.is_loading());
}

#[test]
fn test_observers_see_loading_bracket() {
    let store = seeded_store();
    let center = center(&store);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let subscription = center.subscribe(move |state| sink.borrow_mut().push(state.is_loading));

    block_on(center.refresh_notifications()).unwrap();
    assert_eq!(*seen.borrow(), vec![true, false]);

    subscription.unsubscribe();
    block_on(center.refresh_notifications()).unwrap();
    assert_eq!(seen.borrow().len(), 2);
}

#[test]
fn test_mutations_are_announced_locally_and_to_other_contexts() {
    let origin = SharedMemoryStore::new();
    let context = AppContext::with_platform(
        Platform::new().with_store(Rc::new(origin.context())),
        SyncConfig::default(),
    );
    let other_tab = Broadcaster::new(&Platform::new().with_store(Rc::new(origin.context())));

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    let _bus_sub = context.bus().on(AppEvent::NotificationChanged, move |payload| {
        sink.borrow_mut().push(payload["change"].as_str().unwrap_or_default().to_string());
        Ok(())
    });
    let signals = Rc::new(RefCell::new(Vec::new()));
    let signal_sink = signals.clone();
    let _tab_sub =
        other_tab.on_data_update(move |update| signal_sink.borrow_mut().push(update.resource.clone()));

    let store = seeded_store();
    let center = context.notification_center(FELLOW, Rc::new(store.clone()));
    block_on(center.fetch_notifications(NotificationFilter::default())).unwrap();
    block_on(center.mark_as_read("n1")).unwrap();
    block_on(center.mark_all_as_read()).unwrap();
    block_on(center.mark_all_as_read()).unwrap();

    assert_eq!(*events.borrow(), vec!["read", "read_all"]);
    assert_eq!(*signals.borrow(), vec!["notifications", "notifications"]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_attached_synchronizer_feeds_the_center() {
    in_local(async {
        let store = seeded_store();
        let center = Rc::new(center(&store));
        let source = store.clone();
        let sync: Synchronizer<Notification> = Synchronizer::mount(
            &Platform::new(),
            "notifications",
            move || {
                let source = source.clone();
                async move {
                    source
                        .list(FELLOW, &NotificationFilter::default())
                        .await
                        .map_err(|e| portal_sync::SyncError::fetch(e.to_string()))
                }
            },
            SyncOptions::default().with_poll_interval(Duration::from_millis(1000)),
        );
        let _feed = center.attach(&sync);
        settle().await;
        assert_eq!(center.unread_count(), 3);

        store.set_failing(true);
        sync.refresh();
        settle().await;
        assert!(center.error().is_some());
        assert_eq!(center.unread_count(), 3);

        store.set_failing(false);
        block_on(store.mark_all_as_read(FELLOW)).unwrap();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        settle().await;
        assert_eq!(center.unread_count(), 0);
        assert_eq!(center.error(), None);
    })
    .await;
}
