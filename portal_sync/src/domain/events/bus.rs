use super::error::ListenerError;
use crate::domain::subscription::Subscription;
use crate::ports::LoggerPort;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::rc::{Rc, Weak};

/// Anything usable as an event identity on the bus.
pub trait EventKey: Eq + Hash + Clone + fmt::Display + 'static {}

impl<T> EventKey for T where T: Eq + Hash + Clone + fmt::Display + 'static {}

type Listener<P> = Rc<dyn Fn(&P) -> Result<(), ListenerError>>;

struct Registration<P> {
    id: u64,
    listener: Listener<P>,
}

struct BusInner<K, P> {
    listeners: HashMap<K, Vec<Registration<P>>>,
    next_id: u64,
}

impl<K: EventKey, P> BusInner<K, P> {
    fn remove(&mut self, kind: &K, id: u64) {
        if let Some(registrations) = self.listeners.get_mut(kind) {
            registrations.retain(|registration| registration.id != id);
            if registrations.is_empty() {
                self.listeners.remove(kind);
            }
        }
    }

    fn contains(&self, kind: &K, id: u64) -> bool {
        self.listeners
            .get(kind)
            .is_some_and(|registrations| registrations.iter().any(|r| r.id == id))
    }
}

/// In-process, synchronous publish/subscribe dispatcher.
///
/// Cloning the bus yields another handle to the same listener table. Nothing is
/// queued or persisted: an emission only reaches listeners registered at the time
/// of the call, in registration order, before `emit` returns.
pub struct EventBus<K, P> {
    inner: Rc<RefCell<BusInner<K, P>>>,
    logger: &'static dyn LoggerPort,
}

impl<K, P> Clone for EventBus<K, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            logger: self.logger,
        }
    }
}

impl<K: EventKey, P: 'static> EventBus<K, P> {
    pub fn new(logger: &'static dyn LoggerPort) -> Self {
        Self {
            inner: Rc::new(RefCell::new(BusInner {
                listeners: HashMap::new(),
                next_id: 0,
            })),
            logger,
        }
    }

    /// Registers `listener` under `kind`. The returned handle removes exactly this
    /// registration.
    pub fn on<F>(&self, kind: K, listener: F) -> Subscription
    where
        F: Fn(&P) -> Result<(), ListenerError> + 'static,
    {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner
                .listeners
                .entry(kind.clone())
                .or_default()
                .push(Registration {
                    id,
                    listener: Rc::new(listener),
                });
            id
        };

        let weak: Weak<RefCell<BusInner<K, P>>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().remove(&kind, id);
            }
        })
    }

    /// Calls every listener currently registered for `kind`, returning how many ran.
    ///
    /// Listener failures are logged and do not stop the remaining listeners.
    /// Listeners may register or unregister while the emission is in progress; new
    /// registrations are not called for this emission, removed ones are skipped.
    pub fn emit(&self, kind: &K, payload: &P) -> usize {
        let snapshot: Vec<(u64, Listener<P>)> = match self.inner.borrow().listeners.get(kind) {
            Some(registrations) => registrations
                .iter()
                .map(|r| (r.id, Rc::clone(&r.listener)))
                .collect(),
            None => return 0,
        };

        let mut delivered = 0;
        for (id, listener) in snapshot {
            if !self.inner.borrow().contains(kind, id) {
                continue;
            }
            delivered += 1;
            if let Err(err) = listener(payload) {
                self.logger
                    .error(&format!("Error in event listener for '{}': {}", kind, err));
            }
        }
        delivered
    }

    /// Removes every listener registered under `kind`.
    pub fn off(&self, kind: &K) -> usize {
        self.inner
            .borrow_mut()
            .listeners
            .remove(kind)
            .map_or(0, |registrations| registrations.len())
    }

    /// Removes all listeners for all events.
    pub fn clear(&self) {
        self.inner.borrow_mut().listeners.clear();
    }

    pub fn listener_count(&self, kind: &K) -> usize {
        self.inner
            .borrow()
            .listeners
            .get(kind)
            .map_or(0, |registrations| registrations.len())
    }
}
