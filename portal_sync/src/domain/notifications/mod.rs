pub mod center;
pub mod error;
pub mod reducer;
pub mod types;

pub use center::NotificationCenter;
pub use error::NotificationError;
pub use reducer::{reduce, NotificationAction, NotificationState};
pub use types::{
    Notification, NotificationFilter, NotificationPriority, NotificationStats,
    NotificationStatus, NotificationType,
};
