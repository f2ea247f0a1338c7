//! `chrome.runtime` messages addressed to the content script.

use js_sys::{Function, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

pub const AUTH_REVOKED: &str = "AUTH_REVOKED";

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "runtime", "onMessage"], js_name = addListener)]
    fn on_message_add(listener: &Function) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "runtime", "onMessage"], js_name = removeListener)]
    fn on_message_remove(listener: &Function) -> Result<(), JsValue>;
}

/// The `type` field of a runtime message.
pub fn message_type(message: &JsValue) -> Option<String> {
    if !message.is_object() {
        return None;
    }
    Reflect::get(message, &JsValue::from_str("type"))
        .ok()?
        .as_string()
}

/// Runs a callback when the background script revokes authentication.
pub struct RevocationListener {
    listener: Closure<dyn FnMut(JsValue)>,
}

impl RevocationListener {
    pub fn new(on_revoked: impl Fn() + 'static) -> Result<Self, JsValue> {
        let listener = Closure::<dyn FnMut(JsValue)>::new(move |message: JsValue| {
            if message_type(&message).as_deref() == Some(AUTH_REVOKED) {
                tracing::info!(target: "lingo::auth", "authentication revoked, detaching");
                on_revoked();
            }
        });
        on_message_add(listener.as_ref().unchecked_ref())?;
        Ok(Self { listener })
    }
}

impl Drop for RevocationListener {
    fn drop(&mut self) {
        let _ = on_message_remove(self.listener.as_ref().unchecked_ref());
    }
}
