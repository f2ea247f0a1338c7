//! Synthetic events for host editors that only accept their own input path.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    ClipboardEvent, ClipboardEventInit, DataTransfer, EventTarget, HtmlDocument, InputEvent,
    InputEventInit, KeyboardEvent, KeyboardEventInit,
};

/// Fire a bubbling `input` event, as if the user typed `data`.
pub fn dispatch_input(target: &EventTarget, input_type: &str, data: Option<&str>) -> Result<bool, JsValue> {
    let init = InputEventInit::new();
    init.set_bubbles(true);
    init.set_input_type(input_type);
    init.set_data(data);
    let event = InputEvent::new_with_event_init_dict("input", &init)?;
    target.dispatch_event(&event)
}

/// Fire a cancelable `paste` event carrying `text` as `text/plain`.
///
/// Returns `false` when a handler called `preventDefault`, which for editors
/// that intercept paste means they consumed it.
pub fn dispatch_paste(target: &EventTarget, text: &str) -> Result<bool, JsValue> {
    let data = DataTransfer::new()?;
    data.set_data("text/plain", text)?;

    let init = ClipboardEventInit::new();
    init.set_bubbles(true);
    init.set_cancelable(true);
    init.set_clipboard_data(Some(&data));
    let event = ClipboardEvent::new_with_event_init_dict("paste", &init)?;
    target.dispatch_event(&event)
}

/// Fire a `keydown`/`keyup` pair for `key`.
pub fn dispatch_key(target: &EventTarget, key: &str, code: &str) -> Result<(), JsValue> {
    for kind in ["keydown", "keyup"] {
        let init = KeyboardEventInit::new();
        init.set_bubbles(true);
        init.set_cancelable(true);
        init.set_key(key);
        init.set_code(code);
        let event = KeyboardEvent::new_with_keyboard_event_init_dict(kind, &init)?;
        target.dispatch_event(&event)?;
    }
    Ok(())
}

/// `document.execCommand`, returning whether the browser accepted it.
pub fn exec_command(command: &str, value: Option<&str>) -> bool {
    let Ok(document) = gloo_utils::document().dyn_into::<HtmlDocument>() else {
        return false;
    };
    let result = match value {
        Some(value) => document.exec_command_with_show_ui_and_value(command, false, value),
        None => document.exec_command(command),
    };
    result.unwrap_or(false)
}

/// Key and code for a single typed character.
pub fn key_code_for(c: char) -> (String, String) {
    let code = match c {
        'a'..='z' | 'A'..='Z' => format!("Key{}", c.to_ascii_uppercase()),
        '0'..='9' => format!("Digit{c}"),
        ' ' => "Space".to_string(),
        _ => String::new(),
    };
    (c.to_string(), code)
}
