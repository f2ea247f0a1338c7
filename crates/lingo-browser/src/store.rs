//! `chrome.storage.sync` as a [`SettingsStore`].

use std::rc::Rc;

use async_trait::async_trait;
use js_sys::{Function, Promise};
use lingo_core::{Settings, SettingsStore};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

const SYNC_AREA: &str = "sync";

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "sync"], js_name = get)]
    fn sync_get(keys: &JsValue, callback: &Function) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "onChanged"], js_name = addListener)]
    fn on_changed_add(listener: &Function) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "onChanged"], js_name = removeListener)]
    fn on_changed_remove(listener: &Function) -> Result<(), JsValue>;
}

/// Every stored key, as one JS object.
async fn get_all() -> Result<JsValue, JsValue> {
    let mut call_error = None;
    let promise = Promise::new(&mut |resolve, _reject| {
        if let Err(e) = sync_get(&JsValue::NULL, &resolve) {
            call_error = Some(e);
        }
    });
    if let Some(e) = call_error {
        return Err(e);
    }
    JsFuture::from(promise).await
}

/// Settings kept in `chrome.storage.sync`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeStore;

/// Removes the `onChanged` listener when dropped.
pub struct ChromeSubscription {
    listener: Option<Closure<dyn FnMut(JsValue, JsValue)>>,
}

impl Drop for ChromeSubscription {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            if let Err(e) = on_changed_remove(listener.as_ref().unchecked_ref()) {
                tracing::debug!(target: "lingo::settings", error = ?e, "could not remove storage listener");
            }
        }
    }
}

#[async_trait(?Send)]
impl SettingsStore for ChromeStore {
    type Subscription = ChromeSubscription;

    async fn load(&self) -> Settings {
        let raw = match get_all().await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(target: "lingo::settings", error = ?e, "storage read failed, using empty settings");
                return Settings::default();
            }
        };
        match serde_wasm_bindgen::from_value::<serde_json::Value>(raw) {
            Ok(value) => Settings::from_json_or_default(value),
            Err(e) => {
                tracing::warn!(target: "lingo::settings", error = %e, "stored settings are not JSON, using empty settings");
                Settings::default()
            }
        }
    }

    fn subscribe(&self, on_change: Rc<dyn Fn()>) -> ChromeSubscription {
        let listener = Closure::<dyn FnMut(JsValue, JsValue)>::new(move |_changes: JsValue, area: JsValue| {
            if area.as_string().as_deref() == Some(SYNC_AREA) {
                on_change();
            }
        });
        match on_changed_add(listener.as_ref().unchecked_ref()) {
            Ok(()) => ChromeSubscription {
                listener: Some(listener),
            },
            Err(e) => {
                tracing::warn!(target: "lingo::settings", error = ?e, "storage change notifications unavailable");
                ChromeSubscription { listener: None }
            }
        }
    }
}
