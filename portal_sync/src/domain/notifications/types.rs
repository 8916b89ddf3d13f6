use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    ApplicationStatus,
    Announcement,
    CourseUpdate,
    Reminder,
    Message,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
    Urgent,
}

/// Lifecycle: `unread -> read -> archived`, `unread -> archived`, anything -> `deleted`.
/// Nothing leaves `deleted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Unread,
    Read,
    Archived,
    Deleted,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Unread => "unread",
            NotificationStatus::Read => "read",
            NotificationStatus::Archived => "archived",
            NotificationStatus::Deleted => "deleted",
        }
    }

    /// Re-applying the current status is accepted as a no-op.
    pub fn can_transition_to(self, next: NotificationStatus) -> bool {
        use NotificationStatus::*;
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Unread, Read) | (Unread, Archived) | (Read, Archived) | (Unread | Read | Archived, Deleted)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub status: NotificationStatus,
    pub is_read: bool,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Notification {
    pub fn is_unread(&self) -> bool {
        self.status == NotificationStatus::Unread
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationFilter {
    pub status: Option<NotificationStatus>,
    #[serde(rename = "type")]
    pub notification_type: Option<NotificationType>,
    pub priority: Option<NotificationPriority>,
    pub unread_only: bool,
    pub include_archived: bool,
    pub limit: Option<usize>,
}

impl NotificationFilter {
    pub fn unread() -> Self {
        Self {
            unread_only: true,
            ..Self::default()
        }
    }

    /// Deleted notifications never match. Archived ones only match when asked for.
    pub fn matches(&self, notification: &Notification) -> bool {
        if notification.status == NotificationStatus::Deleted {
            return false;
        }
        match self.status {
            Some(status) if notification.status != status => return false,
            None if notification.status == NotificationStatus::Archived && !self.include_archived => {
                return false
            }
            _ => {}
        }
        if self.unread_only && !notification.is_unread() {
            return false;
        }
        if self
            .notification_type
            .is_some_and(|kind| kind != notification.notification_type)
        {
            return false;
        }
        if self.priority.is_some_and(|p| p != notification.priority) {
            return false;
        }
        true
    }

    /// Applies the filter, newest first, truncated to `limit`.
    pub fn apply<'a>(&self, notifications: impl IntoIterator<Item = &'a Notification>) -> Vec<Notification> {
        let mut selected: Vec<Notification> = notifications
            .into_iter()
            .filter(|n| self.matches(n))
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStats {
    pub total: usize,
    pub unread: usize,
    pub read: usize,
    pub archived: usize,
    pub urgent_unread: usize,
    pub by_type: BTreeMap<NotificationType, usize>,
    pub by_priority: BTreeMap<NotificationPriority, usize>,
}

impl NotificationStats {
    pub fn from_notifications(notifications: &[Notification]) -> Self {
        let mut stats = NotificationStats::default();
        for notification in notifications {
            match notification.status {
                NotificationStatus::Unread => stats.unread += 1,
                NotificationStatus::Read => stats.read += 1,
                NotificationStatus::Archived => stats.archived += 1,
                NotificationStatus::Deleted => continue,
            }
            stats.total += 1;
            if notification.is_unread() && notification.priority == NotificationPriority::Urgent {
                stats.urgent_unread += 1;
            }
            *stats.by_type.entry(notification.notification_type).or_default() += 1;
            *stats.by_priority.entry(notification.priority).or_default() += 1;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str, status: NotificationStatus, created_at: i64) -> Notification {
        Notification {
            id: id.to_string(),
            user_id: "fellow-1".to_string(),
            notification_type: NotificationType::ApplicationStatus,
            title: format!("Title {id}"),
            message: "Your application moved to review".to_string(),
            priority: NotificationPriority::Normal,
            status,
            is_read: status != NotificationStatus::Unread,
            created_at,
            read_at: None,
            action_url: None,
            metadata: None,
        }
    }

    #[test]
    fn test_state_machine() {
        use NotificationStatus::*;
        assert!(Unread.can_transition_to(Read));
        assert!(Unread.can_transition_to(Archived));
        assert!(Read.can_transition_to(Archived));
        assert!(Archived.can_transition_to(Deleted));
        assert!(Read.can_transition_to(Read));

        assert!(!Read.can_transition_to(Unread));
        assert!(!Archived.can_transition_to(Read));
        assert!(!Deleted.can_transition_to(Unread));
        assert!(!Deleted.can_transition_to(Archived));
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(sample("n1", NotificationStatus::Unread, 10)).unwrap();
        assert_eq!(json["type"], "application_status");
        assert_eq!(json["userId"], "fellow-1");
        assert_eq!(json["status"], "unread");
        assert_eq!(json["isRead"], false);
        assert!(json.get("readAt").is_none());
    }

    #[test]
    fn test_filter_hides_deleted_and_archived_by_default() {
        let items = vec![
            sample("a", NotificationStatus::Unread, 1),
            sample("b", NotificationStatus::Archived, 2),
            sample("c", NotificationStatus::Deleted, 3),
        ];

        let ids = |filter: NotificationFilter| -> Vec<String> {
            filter.apply(&items).into_iter().map(|n| n.id).collect()
        };

        assert_eq!(ids(NotificationFilter::default()), vec!["a"]);
        assert_eq!(
            ids(NotificationFilter {
                include_archived: true,
                ..Default::default()
            }),
            vec!["b", "a"]
        );
        assert_eq!(
            ids(NotificationFilter {
                status: Some(NotificationStatus::Deleted),
                ..Default::default()
            }),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_filter_limit_keeps_newest() {
        let items: Vec<_> = (0..5)
            .map(|i| sample(&format!("n{i}"), NotificationStatus::Unread, i))
            .collect();
        let filter = NotificationFilter {
            limit: Some(2),
            ..NotificationFilter::unread()
        };
        let ids: Vec<_> = filter.apply(&items).into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["n4", "n3"]);
    }

    #[test]
    fn test_stats() {
        let mut urgent = sample("u", NotificationStatus::Unread, 1);
        urgent.priority = NotificationPriority::Urgent;
        let items = vec![
            urgent,
            sample("r", NotificationStatus::Read, 2),
            sample("x", NotificationStatus::Deleted, 3),
        ];

        let stats = NotificationStats::from_notifications(&items);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.unread, 1);
        assert_eq!(stats.read, 1);
        assert_eq!(stats.urgent_unread, 1);
        assert_eq!(stats.by_type.get(&NotificationType::ApplicationStatus), Some(&2));
        assert_eq!(stats.by_priority.get(&NotificationPriority::Normal), Some(&1));
    }
}
