//! JsEnhancer - the running enhancer handle for JavaScript.

use lingo_browser::listeners::start_if_authenticated;
use lingo_browser::{ChromeStore, EngineConfig, Enhancer};
use wasm_bindgen::prelude::*;

use crate::auth::{JsAuth, ResolvedAuth};

/// A started enhancer. Dropping the JS handle does not stop it; call `stop`.
#[wasm_bindgen(js_name = Enhancer)]
pub struct JsEnhancer {
    inner: Enhancer<ChromeStore>,
}

#[wasm_bindgen(js_class = Enhancer)]
impl JsEnhancer {
    /// Detach every listener and remove the overlay.
    pub fn stop(&self) {
        self.inner.stop();
    }

    #[wasm_bindgen(getter, js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.inner.is_running()
    }
}

/// Check `auth`, then attach to the page.
///
/// Resolves to `undefined` when the user is not signed in.
#[wasm_bindgen]
pub async fn start(auth: JsAuth) -> Result<Option<JsEnhancer>, JsError> {
    let auth = ResolvedAuth::resolve(&auth).await;
    let enhancer = start_if_authenticated(&auth, ChromeStore, EngineConfig::default())
        .await
        .map_err(|e| JsError::new(&format!("Failed to start: {e:?}")))?;
    Ok(enhancer.map(|inner| JsEnhancer { inner }))
}
