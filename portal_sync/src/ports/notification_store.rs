use crate::domain::notifications::error::NotificationError;
use crate::domain::notifications::types::{Notification, NotificationFilter, NotificationStatus};
use async_trait::async_trait;

/// Port for the external record store holding notifications.
#[async_trait(?Send)]
pub trait NotificationStorePort {
    async fn list(
        &self,
        user_id: &str,
        filter: &NotificationFilter,
    ) -> Result<Vec<Notification>, NotificationError>;

    async fn update_status(&self, id: &str, status: NotificationStatus)
        -> Result<(), NotificationError>;

    /// Marks every unread notification of the user as read, returning how many changed.
    async fn mark_all_as_read(&self, user_id: &str) -> Result<usize, NotificationError>;

    async fn delete(&self, id: &str) -> Result<(), NotificationError>;
}
