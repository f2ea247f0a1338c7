//! Async clipboard writes.

use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

/// Write plain text with `navigator.clipboard.writeText`.
///
/// Fails when the page has no clipboard permission or the document is not
/// focused; callers treat that as best-effort.
pub async fn write_text(text: &str) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let clipboard = window.navigator().clipboard();
    JsFuture::from(clipboard.write_text(text)).await?;
    Ok(())
}
