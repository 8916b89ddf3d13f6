use crate::domain::subscription::Subscription;
use crate::domain::sync::error::SyncError;
use crate::platform::Platform;
use crate::ports::{ClockPort, KeyValueStorePort, LoggerPort, StorageChange};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;

pub const DATA_UPDATE_KEY: &str = "portal:data-update";

/// Payload written under the data-update key to tell other contexts that a
/// resource changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataUpdate {
    pub resource: String,
    pub timestamp: f64,
    #[serde(default)]
    pub sequence: u64,
}

/// Cross-context signalling through the shared key/value store.
///
/// A write is only ever observed by *other* contexts. A context that wants its own
/// views to reflect a change must update them directly (or emit on the bus).
#[derive(Clone)]
pub struct Broadcaster {
    store: Rc<dyn KeyValueStorePort>,
    logger: &'static dyn LoggerPort,
    clock: &'static dyn ClockPort,
    update_key: String,
    sequence: Rc<Cell<u64>>,
}

impl Broadcaster {
    pub fn new(platform: &Platform) -> Self {
        Self {
            store: platform.store(),
            logger: platform.logger(),
            clock: platform.clock(),
            update_key: DATA_UPDATE_KEY.to_string(),
            sequence: Rc::new(Cell::new(0)),
        }
    }

    pub fn with_update_key(mut self, key: impl Into<String>) -> Self {
        self.update_key = key.into();
        self
    }

    pub fn update_key(&self) -> &str {
        &self.update_key
    }

    /// Writes `value` under `key`. JSON strings are stored verbatim, anything else
    /// as JSON text.
    ///
    /// Never fails: a store error is logged as a warning and `false` is returned so
    /// the caller's own action can still complete.
    pub fn broadcast<V: Serialize + ?Sized>(&self, key: &str, value: &V) -> bool {
        match self.try_broadcast(key, value) {
            Ok(()) => true,
            Err(err) => {
                self.logger
                    .warn(&format!("Broadcast of '{}' skipped: {}", key, err));
                false
            }
        }
    }

    pub fn try_broadcast<V: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &V,
    ) -> Result<(), SyncError> {
        let serialized = match serde_json::to_value(value)? {
            serde_json::Value::String(raw) => raw,
            other => other.to_string(),
        };
        self.store.set(key, &serialized)
    }

    /// Reads the current value under `key` in this context.
    pub fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(err) => {
                self.logger
                    .warn(&format!("Reading '{}' from shared storage failed: {}", key, err));
                None
            }
        }
    }

    /// Registers `callback` for changes made by other contexts, whatever the key.
    pub fn on_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StorageChange) + 'static,
    {
        match self.store.subscribe(Rc::new(callback)) {
            Ok(subscription) => subscription,
            Err(err) => {
                self.logger
                    .warn(&format!("Cannot listen for storage changes: {}", err));
                Subscription::noop()
            }
        }
    }

    /// Tells other contexts that `resource` changed.
    pub fn notify_data_update(&self, resource: &str) -> bool {
        let sequence = self.sequence.get().wrapping_add(1);
        self.sequence.set(sequence);

        let update = DataUpdate {
            resource: resource.to_string(),
            timestamp: self.clock.now(),
            sequence,
        };
        self.broadcast(&self.update_key, &update)
    }

    /// Registers `callback` for data-update signals coming from other contexts.
    pub fn on_data_update<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&DataUpdate) + 'static,
    {
        let key = self.update_key.clone();
        let logger = self.logger;
        self.on_change(move |change| {
            if change.key != key {
                return;
            }
            let Some(raw) = change.new_value.as_deref() else {
                return;
            };
            match serde_json::from_str::<DataUpdate>(raw) {
                Ok(update) => callback(&update),
                Err(err) => logger.warn(&format!("Ignoring malformed data update: {err}")),
            }
        })
    }
}
