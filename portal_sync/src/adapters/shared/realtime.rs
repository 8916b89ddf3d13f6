use crate::domain::subscription::Subscription;
use crate::domain::sync::error::SyncError;
use crate::ports::{ChangeCallback, LostCallback, RealtimePort};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Realtime backend used when none is configured; consumers fall back to polling.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledRealtime;

impl RealtimePort for DisabledRealtime {
    fn is_configured(&self) -> bool {
        false
    }

    fn subscribe(
        &self,
        resource: &str,
        _on_change: ChangeCallback,
        _on_lost: LostCallback,
    ) -> Result<Subscription, SyncError> {
        Err(SyncError::realtime(format!(
            "No realtime backend configured for '{resource}'"
        )))
    }
}

struct Channel {
    id: u64,
    on_change: ChangeCallback,
    on_lost: LostCallback,
}

struct HubState {
    channels: HashMap<String, Vec<Channel>>,
    next_id: u64,
    available: bool,
}

/// In-process realtime hub: `publish` plays the role of a row-level change
/// arriving from the backend.
#[derive(Clone)]
pub struct MemoryRealtime {
    state: Rc<RefCell<HubState>>,
}

impl Default for MemoryRealtime {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRealtime {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(HubState {
                channels: HashMap::new(),
                next_id: 0,
                available: true,
            })),
        }
    }

    /// While unavailable, new subscriptions fail to open.
    pub fn set_available(&self, available: bool) {
        self.state.borrow_mut().available = available;
    }

    /// Notifies every subscriber of `resource`, returning how many were notified.
    pub fn publish(&self, resource: &str) -> usize {
        let callbacks: Vec<ChangeCallback> = self
            .state
            .borrow()
            .channels
            .get(resource)
            .map(|channels| channels.iter().map(|c| Rc::clone(&c.on_change)).collect())
            .unwrap_or_default();

        for callback in &callbacks {
            callback();
        }
        callbacks.len()
    }

    /// Severs every open channel of `resource` the way a dropped connection
    /// would, returning how many were cut.
    pub fn disconnect(&self, resource: &str) -> usize {
        let lost = self
            .state
            .borrow_mut()
            .channels
            .remove(resource)
            .unwrap_or_default();

        for channel in &lost {
            (channel.on_lost)(SyncError::realtime(format!(
                "Channel for '{resource}' was closed by the backend"
            )));
        }
        lost.len()
    }

    pub fn subscriber_count(&self, resource: &str) -> usize {
        self.state
            .borrow()
            .channels
            .get(resource)
            .map_or(0, |channels| channels.len())
    }
}

impl RealtimePort for MemoryRealtime {
    fn is_configured(&self) -> bool {
        true
    }

    fn subscribe(
        &self,
        resource: &str,
        on_change: ChangeCallback,
        on_lost: LostCallback,
    ) -> Result<Subscription, SyncError> {
        let id = {
            let mut state = self.state.borrow_mut();
            if !state.available {
                return Err(SyncError::realtime(format!(
                    "Channel for '{resource}' could not be opened"
                )));
            }
            let id = state.next_id;
            state.next_id += 1;
            state
                .channels
                .entry(resource.to_string())
                .or_default()
                .push(Channel {
                    id,
                    on_change,
                    on_lost,
                });
            id
        };

        let weak: Weak<RefCell<HubState>> = Rc::downgrade(&self.state);
        let resource = resource.to_string();
        Ok(Subscription::new(move || {
            if let Some(state) = weak.upgrade() {
                if let Some(channels) = state.borrow_mut().channels.get_mut(&resource) {
                    channels.retain(|c| c.id != id);
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn ignore_loss() -> LostCallback {
        Rc::new(|_: SyncError| {})
    }

    #[test]
    fn test_disabled_realtime_is_not_configured() {
        let realtime = DisabledRealtime;
        assert!(!realtime.is_configured());
        assert!(realtime
            .subscribe("courses", Rc::new(|| {}), ignore_loss())
            .is_err());
    }

    #[test]
    fn test_publish_reaches_only_matching_channel() {
        let hub = MemoryRealtime::new();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let _s = hub
            .subscribe(
                "courses",
                Rc::new(move || counter.set(counter.get() + 1)),
                ignore_loss(),
            )
            .unwrap();

        assert_eq!(hub.publish("courses"), 1);
        assert_eq!(hub.publish("applications"), 0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_unsubscribe_closes_channel() {
        let hub = MemoryRealtime::new();
        let sub = hub
            .subscribe("courses", Rc::new(|| {}), ignore_loss())
            .unwrap();
        assert_eq!(hub.subscriber_count("courses"), 1);

        sub.unsubscribe();
        assert_eq!(hub.subscriber_count("courses"), 0);
        assert_eq!(hub.publish("courses"), 0);
        assert_eq!(hub.disconnect("courses"), 0);
    }

    #[test]
    fn test_unavailable_hub_refuses_subscriptions() {
        let hub = MemoryRealtime::new();
        hub.set_available(false);
        assert!(matches!(
            hub.subscribe("courses", Rc::new(|| {}), ignore_loss()),
            Err(SyncError::Realtime(_))
        ));
    }

    #[test]
    fn test_disconnect_reports_loss_once_and_drops_channel() {
        let hub = MemoryRealtime::new();
        let lost = Rc::new(RefCell::new(Vec::new()));
        let sink = lost.clone();
        let sub = hub
            .subscribe(
                "courses",
                Rc::new(|| {}),
                Rc::new(move |err: SyncError| sink.borrow_mut().push(err)),
            )
            .unwrap();

        assert_eq!(hub.disconnect("courses"), 1);
        assert_eq!(hub.disconnect("courses"), 0);
        assert_eq!(hub.publish("courses"), 0);
        assert_eq!(lost.borrow().len(), 1);
        assert!(matches!(lost.borrow()[0], SyncError::Realtime(_)));
        sub.unsubscribe();
    }
}
