use crate::domain::sync::error::SyncError;
use wasm_bindgen::prelude::*;
use web_sys::{DedicatedWorkerGlobalScope, Storage, Window};

pub fn get_global_scope() -> Result<JsValue, SyncError> {
    // Try worker scope first
    if let Ok(scope) = js_sys::global().dyn_into::<DedicatedWorkerGlobalScope>() {
        return Ok(JsValue::from(scope));
    }

    let window = web_sys::window().ok_or_else(|| {
        SyncError::storage("Neither DedicatedWorkerGlobalScope nor Window found")
    })?;
    Ok(JsValue::from(window))
}

pub fn window() -> Result<Window, SyncError> {
    get_global_scope()?
        .dyn_into::<Window>()
        .map_err(|_| SyncError::StorageUnavailable)
}

/// `localStorage` of the current window. Workers have none.
pub fn local_storage() -> Result<Storage, SyncError> {
    window()?
        .local_storage()
        .map_err(SyncError::from)?
        .ok_or(SyncError::StorageUnavailable)
}
