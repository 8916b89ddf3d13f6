use super::types::NotificationStatus;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    Store(String),
    NotFound(String),
    InvalidTransition {
        id: String,
        from: NotificationStatus,
        to: NotificationStatus,
    },
}

impl fmt::Display for NotificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationError::Store(msg) => write!(f, "Notification store error: {msg}"),
            NotificationError::NotFound(id) => write!(f, "Notification not found: {id}"),
            NotificationError::InvalidTransition { id, from, to } => write!(
                f,
                "Notification {id} cannot move from {} to {}",
                from.as_str(),
                to.as_str()
            ),
        }
    }
}

impl std::error::Error for NotificationError {}

impl NotificationError {
    pub fn store(message: impl Into<String>) -> Self {
        NotificationError::Store(message.into())
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        NotificationError::NotFound(id.into())
    }
}
