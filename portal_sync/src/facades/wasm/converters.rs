use crate::domain::sync::SyncError;
use crate::ports::StorageChange;
use js_sys::{Object, Reflect, JSON};
use wasm_bindgen::prelude::*;

pub fn to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// Best-effort text of a thrown JS value (`Error.message`, a string, or its debug form).
pub fn js_error_message(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|message| message.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}

/// Goes through JSON text so objects stay plain objects on both sides.
pub fn js_to_json(value: &JsValue) -> Result<serde_json::Value, SyncError> {
    if value.is_undefined() {
        return Ok(serde_json::Value::Null);
    }
    let text = JSON::stringify(value)
        .map_err(|e| SyncError::serialization(js_error_message(&e)))?
        .as_string()
        .unwrap_or_else(|| "null".to_string());
    serde_json::from_str(&text).map_err(SyncError::from)
}

pub fn json_to_js(value: &serde_json::Value) -> Result<JsValue, SyncError> {
    let text = serde_json::to_string(value)?;
    JSON::parse(&text).map_err(|e| SyncError::serialization(js_error_message(&e)))
}

pub fn to_js_value<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let json = serde_json::to_value(value).map_err(to_js_error)?;
    json_to_js(&json).map_err(JsValue::from)
}

pub fn storage_change_to_js(change: &StorageChange) -> JsValue {
    let event = Object::new();
    let nullable = |value: &Option<String>| match value {
        Some(text) => JsValue::from_str(text),
        None => JsValue::NULL,
    };
    let _ = Reflect::set(&event, &"key".into(), &JsValue::from_str(&change.key));
    let _ = Reflect::set(&event, &"newValue".into(), &nullable(&change.new_value));
    let _ = Reflect::set(&event, &"oldValue".into(), &nullable(&change.old_value));
    event.into()
}
