use crate::domain::notifications::NotificationError;
use crate::domain::sync::error::SyncError;
use wasm_bindgen::JsValue;

/// Conversion from JsValue to SyncError for WASM infrastructure
impl From<JsValue> for SyncError {
    fn from(err: JsValue) -> Self {
        SyncError::storage(
            err.as_string()
                .unwrap_or_else(|| format!("{:?}", err)),
        )
    }
}

/// Conversion from SyncError to JsValue for WASM boundary
impl From<SyncError> for JsValue {
    fn from(error: SyncError) -> Self {
        JsValue::from_str(&error.to_string())
    }
}

impl From<NotificationError> for JsValue {
    fn from(error: NotificationError) -> Self {
        JsValue::from_str(&error.to_string())
    }
}
