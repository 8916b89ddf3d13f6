use crate::domain::subscription::Subscription;
use crate::domain::sync::error::SyncError;
use crate::ports::{ChangeListener, KeyValueStorePort, StorageChange};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

struct ListenerEntry {
    id: u64,
    context: u64,
    listener: ChangeListener,
}

#[derive(Default)]
struct OriginState {
    values: HashMap<String, String>,
    listeners: Vec<ListenerEntry>,
    next_context: u64,
    next_listener: u64,
    quota_bytes: Option<usize>,
    available: bool,
}

impl OriginState {
    fn used_bytes_with(&self, key: &str, value: &str) -> usize {
        let others: usize = self
            .values
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum();
        others + key.len() + value.len()
    }
}

/// In-memory stand-in for a same-origin store shared by several contexts
/// (the native equivalent of `localStorage` shared by browser tabs).
///
/// Each call to [`SharedMemoryStore::context`] yields a view with its own identity;
/// writes through one view are signalled to listeners of every *other* view, and
/// only when the stored value actually changed.
#[derive(Clone)]
pub struct SharedMemoryStore {
    origin: Rc<RefCell<OriginState>>,
}

impl Default for SharedMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedMemoryStore {
    pub fn new() -> Self {
        Self {
            origin: Rc::new(RefCell::new(OriginState {
                available: true,
                ..OriginState::default()
            })),
        }
    }

    /// A store rejecting writes that would take it past `bytes` (keys + values).
    pub fn with_quota(bytes: usize) -> Self {
        let store = Self::new();
        store.origin.borrow_mut().quota_bytes = Some(bytes);
        store
    }

    /// Simulates storage being disabled (private mode, policy, ...).
    pub fn set_available(&self, available: bool) {
        self.origin.borrow_mut().available = available;
    }

    pub fn context(&self) -> MemoryStoreContext {
        let id = {
            let mut origin = self.origin.borrow_mut();
            let id = origin.next_context;
            origin.next_context += 1;
            id
        };
        MemoryStoreContext {
            id,
            origin: Rc::clone(&self.origin),
        }
    }
}

/// One execution context's view of a [`SharedMemoryStore`].
pub struct MemoryStoreContext {
    id: u64,
    origin: Rc<RefCell<OriginState>>,
}

impl MemoryStoreContext {
    pub fn id(&self) -> u64 {
        self.id
    }

    fn write(&self, key: &str, value: Option<&str>) -> Result<(), SyncError> {
        let (change, listeners) = {
            let mut origin = self.origin.borrow_mut();
            if !origin.available {
                return Err(SyncError::StorageUnavailable);
            }
            if let (Some(quota), Some(value)) = (origin.quota_bytes, value) {
                if origin.used_bytes_with(key, value) > quota {
                    return Err(SyncError::QuotaExceeded);
                }
            }

            let old_value = match value {
                Some(value) => origin.values.insert(key.to_string(), value.to_string()),
                None => origin.values.remove(key),
            };
            if old_value.as_deref() == value {
                return Ok(());
            }

            let listeners: Vec<ChangeListener> = origin
                .listeners
                .iter()
                .filter(|entry| entry.context != self.id)
                .map(|entry| Rc::clone(&entry.listener))
                .collect();
            let change = StorageChange {
                key: key.to_string(),
                new_value: value.map(str::to_string),
                old_value,
            };
            (change, listeners)
        };

        for listener in listeners {
            listener(&change);
        }
        Ok(())
    }
}

impl KeyValueStorePort for MemoryStoreContext {
    fn get(&self, key: &str) -> Result<Option<String>, SyncError> {
        let origin = self.origin.borrow();
        if !origin.available {
            return Err(SyncError::StorageUnavailable);
        }
        Ok(origin.values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SyncError> {
        self.write(key, Some(value))
    }

    fn remove(&self, key: &str) -> Result<(), SyncError> {
        self.write(key, None)
    }

    fn subscribe(&self, listener: ChangeListener) -> Result<Subscription, SyncError> {
        let id = {
            let mut origin = self.origin.borrow_mut();
            let id = origin.next_listener;
            origin.next_listener += 1;
            origin.listeners.push(ListenerEntry {
                id,
                context: self.id,
                listener,
            });
            id
        };

        let weak: Weak<RefCell<OriginState>> = Rc::downgrade(&self.origin);
        Ok(Subscription::new(move || {
            if let Some(origin) = weak.upgrade() {
                origin.borrow_mut().listeners.retain(|entry| entry.id != id);
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counting_listener(counter: &Rc<Cell<usize>>) -> ChangeListener {
        let counter = counter.clone();
        Rc::new(move |_: &StorageChange| counter.set(counter.get() + 1))
    }

    #[test]
    fn test_values_are_shared_between_contexts() {
        let origin = SharedMemoryStore::new();
        let a = origin.context();
        let b = origin.context();

        a.set("k", "v").unwrap();
        assert_eq!(b.get("k").unwrap().as_deref(), Some("v"));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_only_other_contexts_are_signalled() {
        let origin = SharedMemoryStore::new();
        let a = origin.context();
        let b = origin.context();
        let c = origin.context();

        let (seen_a, seen_b, seen_c) = (
            Rc::new(Cell::new(0)),
            Rc::new(Cell::new(0)),
            Rc::new(Cell::new(0)),
        );
        let _sa = a.subscribe(counting_listener(&seen_a)).unwrap();
        let _sb = b.subscribe(counting_listener(&seen_b)).unwrap();
        let _sc = c.subscribe(counting_listener(&seen_c)).unwrap();

        a.set("k", "v").unwrap();

        assert_eq!((seen_a.get(), seen_b.get(), seen_c.get()), (0, 1, 1));
    }

    #[test]
    fn test_unchanged_value_is_not_signalled() {
        let origin = SharedMemoryStore::new();
        let a = origin.context();
        let b = origin.context();
        let seen = Rc::new(Cell::new(0));
        let _s = b.subscribe(counting_listener(&seen)).unwrap();

        a.set("k", "v").unwrap();
        a.set("k", "v").unwrap();
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn test_remove_reports_old_value() {
        let origin = SharedMemoryStore::new();
        let a = origin.context();
        let b = origin.context();
        let last = Rc::new(RefCell::new(None));
        let sink = last.clone();
        let _s = b
            .subscribe(Rc::new(move |change: &StorageChange| {
                *sink.borrow_mut() = Some(change.clone())
            }))
            .unwrap();

        a.set("k", "v").unwrap();
        a.remove("k").unwrap();

        let change = last.borrow().clone().unwrap();
        assert_eq!(change.new_value, None);
        assert_eq!(change.old_value.as_deref(), Some("v"));
    }

    #[test]
    fn test_unsubscribe_stops_signals() {
        let origin = SharedMemoryStore::new();
        let a = origin.context();
        let b = origin.context();
        let seen = Rc::new(Cell::new(0));
        let sub = b.subscribe(counting_listener(&seen)).unwrap();

        sub.unsubscribe();
        a.set("k", "v").unwrap();
        assert_eq!(seen.get(), 0);
    }

    #[test]
    fn test_quota_and_availability() {
        let origin = SharedMemoryStore::with_quota(10);
        let a = origin.context();

        a.set("k", "12345").unwrap();
        assert_eq!(a.set("k2", "123456789"), Err(SyncError::QuotaExceeded));
        assert_eq!(a.get("k2").unwrap(), None);

        origin.set_available(false);
        assert_eq!(a.get("k"), Err(SyncError::StorageUnavailable));
        assert_eq!(a.set("k", "x"), Err(SyncError::StorageUnavailable));
    }
}
