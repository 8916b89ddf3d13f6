use super::converters::{js_error_message, js_to_json, to_js_value};
use crate::context::AppContext;
use crate::domain::subscription::Subscription;
use crate::domain::sync::{SyncError, SyncState, SyncStrategy, Synchronizer};
use js_sys::{Function, Promise};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StateView<'a> {
    data: &'a [Value],
    loading: bool,
    error: Option<String>,
    last_updated: Option<f64>,
}

impl<'a> From<&'a SyncState<Value>> for StateView<'a> {
    fn from(state: &'a SyncState<Value>) -> Self {
        Self {
            data: &state.data,
            loading: state.loading,
            error: state.error.as_ref().map(|e| e.to_string()),
            last_updated: state.last_updated,
        }
    }
}

async fn call_fetch(fetch: Function) -> Result<Vec<Value>, SyncError> {
    let returned = fetch
        .call0(&JsValue::NULL)
        .map_err(|e| SyncError::fetch(js_error_message(&e)))?;
    let resolved = JsFuture::from(Promise::resolve(&returned))
        .await
        .map_err(|e| SyncError::fetch(js_error_message(&e)))?;
    match js_to_json(&resolved)? {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => Err(SyncError::fetch(format!(
            "expected an array snapshot, got {}",
            other
        ))),
    }
}

/// A mounted resource synchronizer exposed to JavaScript.
#[wasm_bindgen]
pub struct ResourceWatch {
    sync: Synchronizer<Value>,
    observer: Option<Subscription>,
}

impl ResourceWatch {
    pub(crate) fn mount(
        context: &AppContext,
        resource: &str,
        fetch: Function,
        on_update: Option<Function>,
    ) -> Self {
        let sync = context.mount(resource, move || call_fetch(fetch.clone()));
        let observer = on_update.map(|callback| {
            sync.subscribe(move |state| {
                let delivered = to_js_value(&StateView::from(state))
                    .and_then(|view| callback.call1(&JsValue::NULL, &view));
                if let Err(e) = delivered {
                    crate::adapters::logger()
                        .error(&format!("Error in watch callback: {}", js_error_message(&e)));
                }
            })
        });
        Self { sync, observer }
    }
}

#[wasm_bindgen]
impl ResourceWatch {
    pub fn refresh(&self) {
        self.sync.refresh();
    }

    pub fn unmount(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.unsubscribe();
        }
        self.sync.unmount();
    }

    pub fn data(&self) -> Result<JsValue, JsValue> {
        to_js_value(&*self.sync.data())
    }

    pub fn loading(&self) -> bool {
        self.sync.loading()
    }

    pub fn error(&self) -> Option<String> {
        self.sync.error().map(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = lastUpdated)]
    pub fn last_updated(&self) -> Option<f64> {
        self.sync.state().last_updated
    }

    pub fn resource(&self) -> String {
        self.sync.resource().to_string()
    }

    pub fn strategy(&self) -> String {
        match self.sync.strategy() {
            SyncStrategy::Realtime => "realtime".to_string(),
            SyncStrategy::Polling => "polling".to_string(),
        }
    }
}
