use super::error::NotificationError;
use super::types::{Notification, NotificationStats, NotificationStatus};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationState {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    pub stats: NotificationStats,
    pub is_loading: bool,
    pub error: Option<NotificationError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationAction {
    Loading,
    /// A fresh snapshot; replaces the list wholesale.
    Loaded(Vec<Notification>),
    Failed(NotificationError),
    /// Ends a load without touching the list or the error.
    Settled,
    ClearError,
    Reset,
}

pub fn reduce(state: &NotificationState, action: NotificationAction) -> NotificationState {
    match action {
        NotificationAction::Loading => NotificationState {
            is_loading: true,
            ..state.clone()
        },
        NotificationAction::Loaded(snapshot) => {
            let notifications: Vec<Notification> = snapshot
                .into_iter()
                .filter(|n| n.status != NotificationStatus::Deleted)
                .collect();
            let stats = NotificationStats::from_notifications(&notifications);
            NotificationState {
                unread_count: stats.unread,
                stats,
                notifications,
                is_loading: false,
                error: None,
            }
        }
        NotificationAction::Failed(error) => NotificationState {
            is_loading: false,
            error: Some(error),
            ..state.clone()
        },
        NotificationAction::Settled => NotificationState {
            is_loading: false,
            ..state.clone()
        },
        NotificationAction::ClearError => NotificationState {
            error: None,
            ..state.clone()
        },
        NotificationAction::Reset => NotificationState::default(),
    }
}
