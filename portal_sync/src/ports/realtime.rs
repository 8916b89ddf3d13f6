use crate::domain::subscription::Subscription;
use crate::domain::sync::error::SyncError;
use std::rc::Rc;

pub type ChangeCallback = Rc<dyn Fn()>;
/// Called at most once when an open channel goes away without being released.
pub type LostCallback = Rc<dyn Fn(SyncError)>;

/// Port for a push channel announcing that rows of a resource changed.
///
/// The payload of a change is deliberately opaque: consumers refetch the whole
/// snapshot on every notification.
pub trait RealtimePort {
    /// Whether a realtime backend is configured at all.
    fn is_configured(&self) -> bool;

    /// Opens a channel for `resource`. An `Err` means it could not be opened at
    /// all; a channel that fails later reports through `on_lost` instead.
    fn subscribe(
        &self,
        resource: &str,
        on_change: ChangeCallback,
        on_lost: LostCallback,
    ) -> Result<Subscription, SyncError>;
}
