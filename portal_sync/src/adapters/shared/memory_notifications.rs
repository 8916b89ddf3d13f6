use crate::adapters::clock;
use crate::domain::notifications::error::NotificationError;
use crate::domain::notifications::types::{Notification, NotificationFilter, NotificationStatus};
use crate::ports::NotificationStorePort;
use async_trait::async_trait;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct StoreState {
    records: Vec<Notification>,
    failing: bool,
    calls: usize,
}

/// In-memory record store for notifications. Enforces the status lifecycle the
/// way the remote store does, so callers see the same rejections.
#[derive(Clone, Default)]
pub struct MemoryNotificationStore {
    state: Rc<RefCell<StoreState>>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notifications(notifications: impl IntoIterator<Item = Notification>) -> Self {
        let store = Self::new();
        for notification in notifications {
            store.insert(notification);
        }
        store
    }

    /// Adds a record, replacing any existing one with the same id.
    pub fn insert(&self, notification: Notification) {
        let mut state = self.state.borrow_mut();
        state.records.retain(|n| n.id != notification.id);
        state.records.push(notification);
    }

    pub fn get(&self, id: &str) -> Option<Notification> {
        self.state.borrow().records.iter().find(|n| n.id == id).cloned()
    }

    /// While failing, every operation returns a store error.
    pub fn set_failing(&self, failing: bool) {
        self.state.borrow_mut().failing = failing;
    }

    /// Number of store operations attempted so far.
    pub fn calls(&self) -> usize {
        self.state.borrow().calls
    }

    fn begin(&self, operation: &str) -> Result<(), NotificationError> {
        let mut state = self.state.borrow_mut();
        state.calls += 1;
        if state.failing {
            return Err(NotificationError::store(format!("{operation} unavailable")));
        }
        Ok(())
    }
}

fn apply_status(notification: &mut Notification, status: NotificationStatus, now: i64) {
    notification.status = status;
    if status != NotificationStatus::Unread && !notification.is_read {
        notification.is_read = true;
        notification.read_at.get_or_insert(now);
    }
}

#[async_trait(?Send)]
impl NotificationStorePort for MemoryNotificationStore {
    async fn list(
        &self,
        user_id: &str,
        filter: &NotificationFilter,
    ) -> Result<Vec<Notification>, NotificationError> {
        self.begin("list")?;
        let state = self.state.borrow();
        Ok(filter.apply(state.records.iter().filter(|n| n.user_id == user_id)))
    }

    async fn update_status(
        &self,
        id: &str,
        status: NotificationStatus,
    ) -> Result<(), NotificationError> {
        self.begin("update")?;
        let now = clock().now() as i64;
        let mut state = self.state.borrow_mut();
        let notification = state
            .records
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| NotificationError::not_found(id))?;

        if !notification.status.can_transition_to(status) {
            return Err(NotificationError::InvalidTransition {
                id: id.to_string(),
                from: notification.status,
                to: status,
            });
        }
        apply_status(notification, status, now);
        Ok(())
    }

    async fn mark_all_as_read(&self, user_id: &str) -> Result<usize, NotificationError> {
        self.begin("mark all")?;
        let now = clock().now() as i64;
        let mut state = self.state.borrow_mut();
        let mut changed = 0;
        for notification in state
            .records
            .iter_mut()
            .filter(|n| n.user_id == user_id && n.is_unread())
        {
            apply_status(notification, NotificationStatus::Read, now);
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete(&self, id: &str) -> Result<(), NotificationError> {
        self.update_status(id, NotificationStatus::Deleted).await
    }
}
