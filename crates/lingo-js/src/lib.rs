//! WASM content-script entry point for the lingo text enhancer.
//!
//! The extension's loader imports this module, then calls `start(auth)`
//! with its auth helper. Settings helpers are exported for the options page
//! and the background script.

mod auth;
mod enhancer;
mod settings;

pub use auth::JsAuth;
pub use enhancer::*;
pub use settings::*;

use wasm_bindgen::prelude::*;

/// Install the panic hook and the console tracing subscriber.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();

    use tracing::Level;
    use tracing::subscriber::set_global_default;
    use tracing_subscriber::Registry;
    use tracing_subscriber::layer::SubscriberExt;

    let console_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level)
            .build(),
    );

    let _ = set_global_default(Registry::default().with(wasm_layer));
}
