use super::error::NotificationError;
use super::reducer::{reduce, NotificationAction, NotificationState};
use super::types::{Notification, NotificationFilter, NotificationStats, NotificationStatus};
use crate::domain::broadcast::Broadcaster;
use crate::domain::events::{AppEvent, AppEventBus, Resource};
use crate::domain::subscription::Subscription;
use crate::domain::sync::{SyncState, Synchronizer};
use crate::platform::Platform;
use crate::ports::{LoggerPort, NotificationStorePort};
use serde_json::json;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

type StateObserver = Rc<dyn Fn(&NotificationState)>;

/// Process-wide notification state of the signed-in user.
///
/// Every action calls the record store first and then refetches; local items are
/// never patched in place. Successful mutations are announced on the bus and to
/// other contexts.
pub struct NotificationCenter {
    user_id: String,
    store: Rc<dyn NotificationStorePort>,
    logger: &'static dyn LoggerPort,
    state: RefCell<NotificationState>,
    filter: RefCell<NotificationFilter>,
    observers: Rc<RefCell<Vec<(u64, StateObserver)>>>,
    next_observer: Cell<u64>,
    in_flight: Cell<usize>,
    bus: Option<AppEventBus>,
    broadcaster: Option<Broadcaster>,
}

/// Counts one running action. The last action to end clears `is_loading`,
/// whichever way it ends.
struct LoadingGuard<'a> {
    center: &'a NotificationCenter,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let remaining = self.center.in_flight.get().saturating_sub(1);
        self.center.in_flight.set(remaining);
        if remaining == 0 && self.center.state.borrow().is_loading {
            self.center.dispatch(NotificationAction::Settled);
        }
    }
}

impl NotificationCenter {
    pub fn new(
        platform: &Platform,
        user_id: impl Into<String>,
        store: Rc<dyn NotificationStorePort>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            store,
            logger: platform.logger(),
            state: RefCell::new(NotificationState::default()),
            filter: RefCell::new(NotificationFilter::default()),
            observers: Rc::new(RefCell::new(Vec::new())),
            next_observer: Cell::new(0),
            in_flight: Cell::new(0),
            bus: None,
            broadcaster: None,
        }
    }

    /// Emit `notification.changed` on `bus` after each successful mutation.
    pub fn with_bus(mut self, bus: AppEventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Signal other contexts after each successful mutation.
    pub fn with_broadcaster(mut self, broadcaster: Broadcaster) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn state(&self) -> NotificationState {
        self.state.borrow().clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state.borrow().notifications.clone()
    }

    pub fn unread_count(&self) -> usize {
        self.state.borrow().unread_count
    }

    pub fn stats(&self) -> NotificationStats {
        self.state.borrow().stats.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn error(&self) -> Option<NotificationError> {
        self.state.borrow().error.clone()
    }

    pub fn clear_error(&self) {
        self.dispatch(NotificationAction::ClearError);
    }

    /// Back to the empty state, e.g. on sign-out.
    pub fn reset(&self) {
        self.filter.replace(NotificationFilter::default());
        self.dispatch(NotificationAction::Reset);
    }

    /// Registers `observer`, called after every state change.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&NotificationState) + 'static,
    {
        let id = self.next_observer.get();
        self.next_observer.set(id + 1);
        self.observers.borrow_mut().push((id, Rc::new(observer)));

        let observers = Rc::downgrade(&self.observers);
        Subscription::new(move || {
            if let Some(observers) = observers.upgrade() {
                observers.borrow_mut().retain(|(oid, _)| *oid != id);
            }
        })
    }

    pub async fn fetch_notifications(
        &self,
        filter: NotificationFilter,
    ) -> Result<(), NotificationError> {
        self.filter.replace(filter);
        let _guard = self.begin_loading();
        self.reload().await
    }

    /// Refetches with the filter of the last `fetch_notifications`.
    pub async fn refresh_notifications(&self) -> Result<(), NotificationError> {
        let _guard = self.begin_loading();
        self.reload().await
    }

    pub async fn mark_as_read(&self, id: &str) -> Result<(), NotificationError> {
        self.transition(id, NotificationStatus::Read).await
    }

    pub async fn archive_notification(&self, id: &str) -> Result<(), NotificationError> {
        self.transition(id, NotificationStatus::Archived).await
    }

    pub async fn delete_notification(&self, id: &str) -> Result<(), NotificationError> {
        self.transition(id, NotificationStatus::Deleted).await
    }

    pub async fn mark_all_as_read(&self) -> Result<(), NotificationError> {
        let _guard = self.begin_loading();
        match self.store.mark_all_as_read(&self.user_id).await {
            Ok(changed) => {
                self.logger.log(&format!(
                    "Marked {} notification(s) as read for {}",
                    changed, self.user_id
                ));
                if changed > 0 {
                    self.announce(None, "read_all");
                }
                self.reload().await
            }
            Err(err) => Err(self.fail("mark all notifications as read", err)),
        }
    }

    /// Replaces the list with an externally fetched snapshot, narrowed by the
    /// current filter.
    pub fn apply_snapshot(&self, snapshot: &[Notification]) {
        let selected = self.filter.borrow().apply(snapshot);
        self.dispatch(NotificationAction::Loaded(selected));
    }

    /// Feeds this center from `sync`: every applied snapshot replaces the list,
    /// every fetch failure is surfaced as the current error.
    pub fn attach(self: &Rc<Self>, sync: &Synchronizer<Notification>) -> Subscription {
        let weak = Rc::downgrade(self);
        let feed = move |state: &SyncState<Notification>| {
            let Some(center) = weak.upgrade() else {
                return;
            };
            if state.loading {
                return;
            }
            match &state.error {
                Some(err) => center.dispatch(NotificationAction::Failed(NotificationError::store(
                    err.to_string(),
                ))),
                None => center.apply_snapshot(&state.data),
            }
        };

        let current = sync.state();
        if current.last_updated.is_some() {
            feed(&current);
        }
        sync.subscribe(feed)
    }

    async fn transition(&self, id: &str, status: NotificationStatus) -> Result<(), NotificationError> {
        let _guard = self.begin_loading();
        if let Err(err) = self.check_transition(id, status) {
            return Err(self.fail("update notification", err));
        }

        let result = match status {
            NotificationStatus::Deleted => self.store.delete(id).await,
            _ => self.store.update_status(id, status).await,
        };
        match result {
            Ok(()) => {
                self.announce(Some(id), status.as_str());
                self.reload().await
            }
            Err(err) => Err(self.fail("update notification", err)),
        }
    }

    /// Rejects transitions the local copy already shows to be impossible. Items
    /// not in the local list are left for the store to judge.
    fn check_transition(&self, id: &str, to: NotificationStatus) -> Result<(), NotificationError> {
        let state = self.state.borrow();
        match state.notifications.iter().find(|n| n.id == id) {
            Some(current) if !current.status.can_transition_to(to) => {
                Err(NotificationError::InvalidTransition {
                    id: id.to_string(),
                    from: current.status,
                    to,
                })
            }
            _ => Ok(()),
        }
    }

    async fn reload(&self) -> Result<(), NotificationError> {
        let filter = self.filter.borrow().clone();
        match self.store.list(&self.user_id, &filter).await {
            Ok(notifications) => {
                self.dispatch_within_action(NotificationAction::Loaded(notifications));
                Ok(())
            }
            Err(err) => Err(self.fail("fetch notifications", err)),
        }
    }

    fn begin_loading(&self) -> LoadingGuard<'_> {
        self.in_flight.set(self.in_flight.get() + 1);
        self.dispatch(NotificationAction::Loading);
        LoadingGuard { center: self }
    }

    fn fail(&self, action: &str, err: NotificationError) -> NotificationError {
        self.logger.error(&format!("Failed to {}: {}", action, err));
        self.dispatch_within_action(NotificationAction::Failed(err.clone()));
        err
    }

    fn announce(&self, id: Option<&str>, change: &str) {
        if let Some(bus) = &self.bus {
            let payload = json!({
                "userId": self.user_id,
                "id": id,
                "change": change,
            });
            bus.emit(&AppEvent::NotificationChanged, &payload);
        }
        if let Some(broadcaster) = &self.broadcaster {
            broadcaster.notify_data_update(Resource::Notifications.as_str());
        }
    }

    fn dispatch(&self, action: NotificationAction) {
        self.apply(action, 0);
    }

    /// For results of a running action, which still holds its own guard.
    fn dispatch_within_action(&self, action: NotificationAction) {
        self.apply(action, 1);
    }

    fn apply(&self, action: NotificationAction, own: usize) {
        let mut next = reduce(&self.state.borrow(), action);
        if self.in_flight.get() > own {
            next.is_loading = true;
        }
        self.state.replace(next.clone());

        let observers: Vec<StateObserver> = self
            .observers
            .borrow()
            .iter()
            .map(|(_, observer)| Rc::clone(observer))
            .collect();
        for observer in observers {
            observer(&next);
        }
    }
}
