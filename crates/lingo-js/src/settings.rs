//! Settings helpers for the options page and background script.

use lingo_core::{Settings, format_text as format_with};
use serde::Serialize;
use wasm_bindgen::prelude::*;

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

fn from_js(value: JsValue) -> Result<serde_json::Value, JsError> {
    if value.is_undefined() {
        return Ok(serde_json::Value::Null);
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| JsError::new(&format!("Invalid settings: {}", e)))
}

/// Run the formatting pipeline over `text` with a settings object.
#[wasm_bindgen(js_name = formatText)]
pub fn format_text(text: &str, settings: JsValue) -> Result<String, JsError> {
    let settings = Settings::from_json(from_js(settings)?)
        .map_err(|e| JsError::new(&format!("Invalid settings: {}", e)))?;
    Ok(format_with(text, &settings))
}

/// Settings written on first install.
#[wasm_bindgen(js_name = installDefaults)]
pub fn install_defaults() -> Result<JsValue, JsError> {
    to_js(&Settings::install_defaults())
}

/// Default entries for every key missing from `stored`.
///
/// The background script writes the result on install so existing values are
/// never overwritten.
#[wasm_bindgen(js_name = missingDefaults)]
pub fn missing_defaults(stored: JsValue) -> Result<JsValue, JsError> {
    let stored = match from_js(stored)? {
        serde_json::Value::Object(map) => map,
        serde_json::Value::Null => serde_json::Map::new(),
        _ => return Err(JsError::new("Invalid settings: expected an object")),
    };
    to_js(&lingo_core::missing_defaults(&stored))
}
