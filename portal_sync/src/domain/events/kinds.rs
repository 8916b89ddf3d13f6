use super::bus::EventBus;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resources whose snapshots are kept in sync across views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Notifications,
    Announcements,
    Applications,
    Courses,
    Users,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Notifications,
        Resource::Announcements,
        Resource::Applications,
        Resource::Courses,
        Resource::Users,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Notifications => "notifications",
            Resource::Announcements => "announcements",
            Resource::Applications => "applications",
            Resource::Courses => "courses",
            Resource::Users => "users",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of application events carried by the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppEvent {
    #[serde(rename = "application.created")]
    ApplicationCreated,
    #[serde(rename = "application.updated")]
    ApplicationUpdated,
    #[serde(rename = "application.submitted")]
    ApplicationSubmitted,
    #[serde(rename = "announcement.published")]
    AnnouncementPublished,
    #[serde(rename = "announcement.updated")]
    AnnouncementUpdated,
    #[serde(rename = "course.updated")]
    CourseUpdated,
    #[serde(rename = "notification.created")]
    NotificationCreated,
    #[serde(rename = "notification.changed")]
    NotificationChanged,
    #[serde(rename = "user.updated")]
    UserUpdated,
    #[serde(rename = "data.refresh")]
    DataRefresh,
}

impl AppEvent {
    pub const ALL: [AppEvent; 10] = [
        AppEvent::ApplicationCreated,
        AppEvent::ApplicationUpdated,
        AppEvent::ApplicationSubmitted,
        AppEvent::AnnouncementPublished,
        AppEvent::AnnouncementUpdated,
        AppEvent::CourseUpdated,
        AppEvent::NotificationCreated,
        AppEvent::NotificationChanged,
        AppEvent::UserUpdated,
        AppEvent::DataRefresh,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppEvent::ApplicationCreated => "application.created",
            AppEvent::ApplicationUpdated => "application.updated",
            AppEvent::ApplicationSubmitted => "application.submitted",
            AppEvent::AnnouncementPublished => "announcement.published",
            AppEvent::AnnouncementUpdated => "announcement.updated",
            AppEvent::CourseUpdated => "course.updated",
            AppEvent::NotificationCreated => "notification.created",
            AppEvent::NotificationChanged => "notification.changed",
            AppEvent::UserUpdated => "user.updated",
            AppEvent::DataRefresh => "data.refresh",
        }
    }

    /// The resource whose snapshot this event invalidates. `DataRefresh` is a
    /// wildcard and maps to none.
    pub fn resource(&self) -> Option<Resource> {
        match self {
            AppEvent::ApplicationCreated
            | AppEvent::ApplicationUpdated
            | AppEvent::ApplicationSubmitted => Some(Resource::Applications),
            AppEvent::AnnouncementPublished | AppEvent::AnnouncementUpdated => {
                Some(Resource::Announcements)
            }
            AppEvent::CourseUpdated => Some(Resource::Courses),
            AppEvent::NotificationCreated | AppEvent::NotificationChanged => {
                Some(Resource::Notifications)
            }
            AppEvent::UserUpdated => Some(Resource::Users),
            AppEvent::DataRefresh => None,
        }
    }

    /// Events that should make a view of `resource` refetch.
    pub fn invalidating(resource: &str) -> Vec<AppEvent> {
        Self::ALL
            .iter()
            .copied()
            .filter(|event| match event.resource() {
                Some(owner) => owner.as_str() == resource,
                None => true,
            })
            .collect()
    }
}

impl fmt::Display for AppEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEvent(pub String);

impl fmt::Display for UnknownEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown event: {}", self.0)
    }
}

impl std::error::Error for UnknownEvent {}

impl FromStr for AppEvent {
    type Err = UnknownEvent;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        AppEvent::ALL
            .iter()
            .copied()
            .find(|event| event.as_str() == name)
            .ok_or_else(|| UnknownEvent(name.to_string()))
    }
}

pub type AppEventBus = EventBus<AppEvent, serde_json::Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_round_trip_through_from_str() {
        for event in AppEvent::ALL {
            assert_eq!(event.as_str().parse::<AppEvent>(), Ok(event));
        }
    }

    #[test]
    fn test_serde_uses_dotted_names() {
        let json = serde_json::to_string(&AppEvent::ApplicationCreated).unwrap();
        assert_eq!(json, "\"application.created\"");
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let err = "app.exploded".parse::<AppEvent>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown event: app.exploded");
    }

    #[test]
    fn test_invalidating_includes_wildcard() {
        let events = AppEvent::invalidating("notifications");
        assert!(events.contains(&AppEvent::NotificationChanged));
        assert!(events.contains(&AppEvent::NotificationCreated));
        assert!(events.contains(&AppEvent::DataRefresh));
        assert!(!events.contains(&AppEvent::CourseUpdated));
    }
}
