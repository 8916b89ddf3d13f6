use crate::domain::subscription::Subscription;
use crate::domain::sync::error::SyncError;
use crate::global::{local_storage, window};
use crate::ports::{ChangeListener, KeyValueStorePort, StorageChange};
use wasm_bindgen::prelude::*;
use web_sys::{DomException, Storage, StorageEvent};

/// `localStorage`-backed shared store.
///
/// Change signals come from the window `storage` event, which browsers only fire
/// in documents other than the writer.
pub struct LocalStorageStore {
    storage: Storage,
}

impl LocalStorageStore {
    pub fn new() -> Result<Self, SyncError> {
        Ok(Self {
            storage: local_storage()?,
        })
    }
}

fn map_write_error(err: JsValue) -> SyncError {
    match err.dyn_ref::<DomException>() {
        Some(exception) if exception.name() == "QuotaExceededError" => SyncError::QuotaExceeded,
        Some(exception) => SyncError::storage(exception.message()),
        None => SyncError::from(err),
    }
}

impl KeyValueStorePort for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, SyncError> {
        self.storage.get_item(key).map_err(SyncError::from)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SyncError> {
        self.storage.set_item(key, value).map_err(map_write_error)
    }

    fn remove(&self, key: &str) -> Result<(), SyncError> {
        self.storage.remove_item(key).map_err(map_write_error)
    }

    fn subscribe(&self, listener: ChangeListener) -> Result<Subscription, SyncError> {
        let window = window()?;
        let callback = Closure::wrap(Box::new(move |event: StorageEvent| {
            // A `null` key means the whole store was cleared; nothing to route.
            let Some(key) = event.key() else {
                return;
            };
            listener(&StorageChange {
                key,
                new_value: event.new_value(),
                old_value: event.old_value(),
            });
        }) as Box<dyn FnMut(StorageEvent)>);

        window
            .add_event_listener_with_callback("storage", callback.as_ref().unchecked_ref())
            .map_err(SyncError::from)?;

        Ok(Subscription::new(move || {
            let _ = window
                .remove_event_listener_with_callback("storage", callback.as_ref().unchecked_ref());
            drop(callback);
        }))
    }
}
