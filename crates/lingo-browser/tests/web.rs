//! WASM browser tests for lingo-browser.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

use gloo_events::{EventListener, EventListenerOptions};
use gloo_timers::future::TimeoutFuture;
use js_sys::{Object, Reflect};
use lingo_browser::listeners::start_if_authenticated;
use lingo_browser::overlay::HOST_ID;
use lingo_browser::strategies::Keystrokes;
use lingo_browser::{
    Cascade, DomSurface, EngineConfig, Enhancer, MemoryStore, MutationRequest, Overlay, Range,
    Settings, StaticAuth, SurfaceKind, TextSurface, apply_request, cascade,
};
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::{ClipboardEvent, HtmlElement, HtmlInputElement, HtmlTextAreaElement};

fn mount(html: &str) -> HtmlElement {
    let document = gloo_utils::document();
    let container: HtmlElement = document
        .create_element("div")
        .unwrap()
        .dyn_into()
        .unwrap();
    container.set_inner_html(html);
    gloo_utils::body().append_child(&container).unwrap();
    container
}

fn first_child<T: JsCast>(container: &HtmlElement, selector: &str) -> T {
    container
        .query_selector(selector)
        .unwrap()
        .unwrap()
        .dyn_into()
        .unwrap()
}

fn store() -> MemoryStore {
    MemoryStore::new(serde_json::to_value(Settings::install_defaults()).unwrap())
}

fn signed_in() -> StaticAuth {
    StaticAuth {
        email: Some("user@example.com".into()),
    }
}

// === Binding ===

#[wasm_bindgen_test]
fn test_bind_rules() {
    let container = mount(
        r#"<input type="text" id="t">
           <input type="password" id="p">
           <textarea id="a"></textarea>
           <div id="ce" contenteditable="true"><p>Hi <b id="inner">there</b></p></div>
           <div id="plain">static</div>"#,
    );

    let text: HtmlElement = first_child(&container, "#t");
    assert_eq!(
        DomSurface::bind(&text).map(|s| s.kind()),
        Some(SurfaceKind::PlainInput)
    );
    let password: HtmlElement = first_child(&container, "#p");
    assert!(DomSurface::bind(&password).is_none());
    let area: HtmlElement = first_child(&container, "#a");
    assert_eq!(
        DomSurface::bind(&area).map(|s| s.kind()),
        Some(SurfaceKind::PlainInput)
    );

    let inner: HtmlElement = first_child(&container, "#inner");
    let ce: HtmlElement = first_child(&container, "#ce");
    let bound = DomSurface::bind(&inner).unwrap();
    assert_eq!(bound.kind(), SurfaceKind::ContentEditable);
    assert_eq!(bound.element(), &ce);

    let text_node = inner.first_child().unwrap();
    assert_eq!(DomSurface::bind(&text_node).unwrap().element(), &ce);

    let plain: HtmlElement = first_child(&container, "#plain");
    assert!(DomSurface::bind(&plain).is_none());
    container.remove();
}

// === Native inputs ===

#[wasm_bindgen_test]
fn test_native_caret_round_trip() {
    let container = mount(r#"<input type="text">"#);
    let input: HtmlInputElement = first_child(&container, "input");
    input.set_value("a😀b cd");
    let surface = DomSurface::bind(&input).unwrap();

    for offset in [0, 1, 2, 3, 6] {
        surface.set_caret_offset(offset).unwrap();
        assert_eq!(surface.caret_offset().unwrap(), Some(offset));
    }
    container.remove();
}

#[wasm_bindgen_test]
fn test_native_replace_range() {
    let container = mount("<textarea></textarea>");
    let area: HtmlTextAreaElement = first_child(&container, "textarea");
    area.set_value("héllo wörld");
    let surface = DomSurface::bind(&area).unwrap();

    surface.replace_range(Range::new(6, 11), "there").unwrap();
    assert_eq!(area.value(), "héllo there");
    assert_eq!(surface.caret_offset().unwrap(), Some(11));
    container.remove();
}

#[wasm_bindgen_test]
async fn test_replacement_through_cascade() {
    let container = mount(r#"<input type="text">"#);
    let input: HtmlInputElement = first_child(&container, "input");
    input.set_value("teh ");
    let surface = DomSurface::bind(&input).unwrap();
    let strategies = cascade(&EngineConfig::default());

    let used = apply_request(&surface, &MutationRequest::new("teh ", "the ", 4), &strategies)
        .await
        .unwrap();
    assert_eq!(used, "native_range");
    assert_eq!(input.value(), "the ");
    assert_eq!(surface.caret_offset().unwrap(), Some(4));
    container.remove();
}

#[wasm_bindgen_test]
async fn test_removed_word_leaves_trigger() {
    let container = mount(r#"<input type="text">"#);
    let input: HtmlInputElement = first_child(&container, "input");
    input.set_value("it was literally,");
    let surface = DomSurface::bind(&input).unwrap();
    let strategies = cascade(&EngineConfig::default());

    apply_request(&surface, &MutationRequest::new("literally,", ",", 17), &strategies)
        .await
        .unwrap();
    assert_eq!(input.value(), "it was ,");
    container.remove();
}

// === contentEditable ===

#[wasm_bindgen_test]
fn test_content_editable_text_and_caret() {
    let container = mount(r#"<div contenteditable="true"><b>Hel</b>lo <i>wörld</i></div>"#);
    let root: HtmlElement = first_child(&container, "[contenteditable]");
    let surface = DomSurface::bind(&root).unwrap();

    assert_eq!(surface.text().unwrap(), "Hello wörld");
    for offset in [0, 2, 4, 8, 11] {
        surface.set_caret_offset(offset).unwrap();
        assert_eq!(surface.caret_offset().unwrap(), Some(offset));
    }
    container.remove();
}

#[wasm_bindgen_test]
fn test_content_editable_replace_across_nodes() {
    let container = mount(r#"<div contenteditable="true"><b>Hel</b>lo world</div>"#);
    let root: HtmlElement = first_child(&container, "[contenteditable]");
    let surface = DomSurface::bind(&root).unwrap();

    surface.replace_range(Range::new(1, 5), "owdy").unwrap();
    assert_eq!(surface.text().unwrap(), "Howdy world");
    assert_eq!(surface.caret_offset().unwrap(), Some(5));
    container.remove();
}

#[wasm_bindgen_test]
fn test_detached_surface() {
    let container = mount(r#"<input type="text">"#);
    let input: HtmlInputElement = first_child(&container, "input");
    let surface = DomSurface::bind(&input).unwrap();
    assert!(surface.is_attached());
    container.remove();
    assert!(!surface.is_attached());
    assert!(surface.text().is_err());
}

// === Cascade tiers on contentEditable ===

/// A host editor that takes paste over and inserts the text itself.
fn intercept_paste(root: &HtmlElement) -> EventListener {
    EventListener::new_with_options(
        root,
        "paste",
        EventListenerOptions::enable_prevent_default(),
        |event| {
            event.prevent_default();
            let text = event
                .dyn_ref::<ClipboardEvent>()
                .and_then(|e| e.clipboard_data())
                .and_then(|data| data.get_data("text/plain").ok())
                .unwrap();
            let range = gloo_utils::window()
                .get_selection()
                .unwrap()
                .unwrap()
                .get_range_at(0)
                .unwrap();
            range.delete_contents().unwrap();
            range
                .insert_node(&gloo_utils::document().create_text_node(&text))
                .unwrap();
        },
    )
}

#[wasm_bindgen_test]
async fn test_paste_tier_with_host_handler() {
    let container = mount(r#"<div contenteditable="true">I'll brb </div>"#);
    let root: HtmlElement = first_child(&container, "[contenteditable]");
    let _paste = intercept_paste(&root);
    let surface = DomSurface::bind(&root).unwrap();
    let strategies = cascade(&EngineConfig::default());

    let used = apply_request(&surface, &MutationRequest::new("brb ", "be right back ", 9), &strategies)
        .await
        .unwrap();
    assert_eq!(used, "paste");
    assert_eq!(surface.text().unwrap(), "I'll be right back ");
    assert_eq!(surface.caret_offset().unwrap(), Some(19));
    container.remove();
}

#[wasm_bindgen_test]
async fn test_refused_paste_falls_back_to_keystrokes() {
    // No paste handler, so the synthetic paste changes nothing. The span
    // holds one grapheme made of two chars.
    let container = mount(r#"<div contenteditable="true">ok 👍🏽!</div>"#);
    let root: HtmlElement = first_child(&container, "[contenteditable]");
    root.focus().unwrap();
    let surface = DomSurface::bind(&root).unwrap();
    let strategies = cascade(&EngineConfig::default());

    let used = apply_request(&surface, &MutationRequest::new("👍🏽", "nice", 5), &strategies)
        .await
        .unwrap();
    assert_eq!(used, "keystrokes");
    assert_eq!(surface.text().unwrap(), "ok nice!");
    container.remove();
}

#[wasm_bindgen_test]
async fn test_keystrokes_tier_alone() {
    let container = mount(r#"<div contenteditable="true"><b>ok</b> teh</div>"#);
    let root: HtmlElement = first_child(&container, "[contenteditable]");
    root.focus().unwrap();
    let surface = DomSurface::bind(&root).unwrap();
    let strategies: Cascade<DomSurface> = vec![Box::new(Keystrokes::new(&EngineConfig::default()))];

    let used = apply_request(&surface, &MutationRequest::new("teh", "the", 6), &strategies)
        .await
        .unwrap();
    assert_eq!(used, "keystrokes");
    assert_eq!(surface.text().unwrap(), "ok the");
    container.remove();
}

#[wasm_bindgen_test]
async fn test_framework_props_tier() {
    let container = mount(r#"<div contenteditable="true">teh </div>"#);
    let root: HtmlElement = first_child(&container, "[contenteditable]");

    // `onChange([{ type: "paragraph", children: [{ text }] }])` re-renders.
    let target = root.clone();
    let on_change = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
        let paragraph = Reflect::get_u32(&value, 0).unwrap();
        let children = Reflect::get(&paragraph, &"children".into()).unwrap();
        let leaf = Reflect::get_u32(&children, 0).unwrap();
        let text = Reflect::get(&leaf, &"text".into()).unwrap().as_string();
        target.set_text_content(text.as_deref());
    });
    let props = Object::new();
    Reflect::set(&props, &"onChange".into(), on_change.as_ref()).unwrap();
    let fiber = Object::new();
    Reflect::set(&fiber, &"memoizedProps".into(), &props).unwrap();
    Reflect::set(&root, &"__reactFiber$test".into(), &fiber).unwrap();

    let surface = DomSurface::bind(&root).unwrap();
    let config = EngineConfig {
        probe_framework_handles: true,
        ..EngineConfig::default()
    };
    let used = apply_request(&surface, &MutationRequest::new("teh ", "the ", 4), &cascade(&config))
        .await
        .unwrap();
    assert_eq!(used, "framework_props");
    assert_eq!(surface.text().unwrap(), "the ");
    drop(on_change);
    container.remove();
}

// === Overlay ===

#[wasm_bindgen_test]
fn test_overlay_mounts_and_removes() {
    let overlay = Overlay::mount(std::rc::Rc::new(|_| {})).unwrap();
    assert!(gloo_utils::document().get_element_by_id(HOST_ID).is_some());
    assert!(!overlay.is_dropdown_visible());
    assert!(!overlay.is_picker_visible());

    overlay.set_picker_visible(true);
    assert!(overlay.is_picker_visible());
    overlay
        .render_picker(&["Okay.".to_string(), "<b>not html</b>".to_string()])
        .unwrap();

    let shadow = overlay.host().shadow_root().unwrap();
    let chips = shadow.query_selector_all(".picker-item").unwrap();
    assert_eq!(chips.length(), 2);
    assert_eq!(
        chips.get(1).unwrap().text_content().as_deref(),
        Some("<b>not html</b>")
    );
    overlay.set_picker_visible(false);
    assert!(!overlay.is_picker_visible());
    overlay.hide_dropdown();
    assert!(!overlay.is_dropdown_visible());

    drop(overlay);
    assert!(gloo_utils::document().get_element_by_id(HOST_ID).is_none());
}

// === Enhancer ===

#[wasm_bindgen_test]
async fn test_unauthenticated_does_not_start() {
    let enhancer = start_if_authenticated(&StaticAuth::default(), store(), EngineConfig::default())
        .await
        .unwrap();
    assert!(enhancer.is_none());
    assert!(gloo_utils::document().get_element_by_id(HOST_ID).is_none());
}

#[wasm_bindgen_test]
async fn test_typing_replacement_end_to_end() {
    let enhancer: Enhancer<MemoryStore> =
        start_if_authenticated(&signed_in(), store(), EngineConfig::default())
            .await
            .unwrap()
            .unwrap();
    let container = mount(r#"<input type="text">"#);
    let input: HtmlInputElement = first_child(&container, "input");
    input.focus().unwrap();
    input.set_value("teh ");
    input.set_selection_range(4, 4).unwrap();
    lingo_browser::dispatch::dispatch_input(&input, "insertText", Some(" ")).unwrap();

    TimeoutFuture::new(20).await;
    assert_eq!(input.value(), "the ");

    enhancer.stop();
    assert!(!enhancer.is_running());
    assert!(gloo_utils::document().get_element_by_id(HOST_ID).is_none());
    container.remove();
}

#[wasm_bindgen_test]
async fn test_replacement_result_is_not_replaced_again() {
    let mut settings = Settings::install_defaults();
    settings.replacements.insert("u".into(), "you".into());
    settings.replacements.insert("you".into(), "ye".into());
    let store = MemoryStore::new(serde_json::to_value(settings).unwrap());
    let enhancer = Enhancer::start(store, EngineConfig::default()).await.unwrap();

    let container = mount(r#"<input type="text">"#);
    let input: HtmlInputElement = first_child(&container, "input");
    input.focus().unwrap();
    input.set_value("u ");
    input.set_selection_range(2, 2).unwrap();
    lingo_browser::dispatch::dispatch_input(&input, "insertText", Some(" ")).unwrap();

    TimeoutFuture::new(20).await;
    assert_eq!(input.value(), "you ");
    enhancer.stop();
    container.remove();
}

#[wasm_bindgen_test]
async fn test_settings_change_rerenders_picker() {
    let store = store();
    let enhancer = Enhancer::start(store.clone(), EngineConfig::default())
        .await
        .unwrap();

    let mut settings = Settings::install_defaults();
    settings.word_picker_items = vec!["Only one".into()];
    store.set(serde_json::to_value(settings).unwrap());
    TimeoutFuture::new(10).await;

    let host: HtmlElement = gloo_utils::document()
        .get_element_by_id(HOST_ID)
        .unwrap()
        .dyn_into()
        .unwrap();
    let chips = host
        .shadow_root()
        .unwrap()
        .query_selector_all(".picker-item")
        .unwrap();
    assert_eq!(chips.length(), 1);
    enhancer.stop();
}
