use super::converters::{js_error_message, js_to_json, json_to_js, storage_change_to_js, to_js_error};
use super::watch::ResourceWatch;
use crate::config::SyncConfig;
use crate::context::AppContext;
use crate::domain::events::{AppEvent, ListenerError};
use crate::domain::subscription::Subscription;
use js_sys::Function;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

/// Unsubscribe handle returned to JavaScript.
#[wasm_bindgen]
pub struct SubscriptionHandle {
    inner: Subscription,
}

#[wasm_bindgen]
impl SubscriptionHandle {
    pub fn unsubscribe(&self) {
        self.inner.unsubscribe();
    }

    #[wasm_bindgen(js_name = isActive)]
    pub fn is_active(&self) -> bool {
        self.inner.is_active()
    }
}

impl From<Subscription> for SubscriptionHandle {
    fn from(inner: Subscription) -> Self {
        Self { inner }
    }
}

fn parse_event(name: &str) -> Result<AppEvent, JsValue> {
    name.parse::<AppEvent>().map_err(to_js_error)
}

/// One per page: the bus, broadcaster and synchronizers of this tab.
#[wasm_bindgen]
pub struct PortalSync {
    context: Rc<AppContext>,
}

#[wasm_bindgen]
impl PortalSync {
    /// `config` is optional; missing fields take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<PortalSync, JsValue> {
        let config: SyncConfig = if config.is_undefined() || config.is_null() {
            SyncConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(to_js_error)?
        };
        Ok(Self {
            context: Rc::new(AppContext::new(config)),
        })
    }

    pub fn on(&self, event: &str, callback: Function) -> Result<SubscriptionHandle, JsValue> {
        let kind = parse_event(event)?;
        let subscription = self.context.bus().on(kind, move |payload| {
            let value = json_to_js(payload).map_err(|e| ListenerError::new(e.to_string()))?;
            callback
                .call1(&JsValue::NULL, &value)
                .map(|_| ())
                .map_err(|e| ListenerError::new(js_error_message(&e)))
        });
        Ok(subscription.into())
    }

    /// Delivers `payload` to this tab's listeners only. Returns how many ran.
    pub fn emit(&self, event: &str, payload: JsValue) -> Result<u32, JsValue> {
        let kind = parse_event(event)?;
        let payload = js_to_json(&payload)?;
        Ok(self.context.bus().emit(&kind, &payload) as u32)
    }

    /// Like `emit`, additionally signalling the affected resource to other tabs.
    pub fn publish(&self, event: &str, payload: JsValue) -> Result<u32, JsValue> {
        let kind = parse_event(event)?;
        let payload = js_to_json(&payload)?;
        Ok(self.context.publish(kind, payload) as u32)
    }

    pub fn off(&self, event: &str) -> Result<u32, JsValue> {
        let kind = parse_event(event)?;
        Ok(self.context.bus().off(&kind) as u32)
    }

    pub fn clear(&self) {
        self.context.bus().clear();
    }

    /// Never throws for storage failures; they are logged and reported as `false`.
    pub fn broadcast(&self, key: &str, value: JsValue) -> Result<bool, JsValue> {
        let value = js_to_json(&value)?;
        Ok(self.context.broadcaster().broadcast(key, &value))
    }

    #[wasm_bindgen(js_name = onStorageChange)]
    pub fn on_storage_change(&self, callback: Function) -> SubscriptionHandle {
        self.context
            .broadcaster()
            .on_change(move |change| {
                if let Err(e) = callback.call1(&JsValue::NULL, &storage_change_to_js(change)) {
                    crate::adapters::logger().error(&format!(
                        "Error in storage listener: {}",
                        js_error_message(&e)
                    ));
                }
            })
            .into()
    }

    #[wasm_bindgen(js_name = notifyDataUpdate)]
    pub fn notify_data_update(&self, resource: &str) -> bool {
        self.context.broadcaster().notify_data_update(resource)
    }

    /// Mounts a synchronizer. `fetch` returns (a promise of) the full collection;
    /// `onUpdate`, if given, receives `{data, loading, error, lastUpdated}` after
    /// every state change.
    pub fn watch(
        &self,
        resource: &str,
        fetch: Function,
        on_update: Option<Function>,
    ) -> ResourceWatch {
        ResourceWatch::mount(&self.context, resource, fetch, on_update)
    }
}
