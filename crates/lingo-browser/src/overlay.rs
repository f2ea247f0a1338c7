//! Shadow-root overlay: the suggestion dropdown and the word picker tray.
//!
//! Everything lives under one `#text-enhancer-host` element appended to the
//! body, so page styles cannot reach in. The host itself ignores pointer
//! events; the dropdown and the tray opt back in.

use std::cell::Cell;
use std::rc::Rc;

use gloo_events::{EventListener, EventListenerOptions};
use lingo_core::{CaretRect, EngineConfig, SuggestionSession, SurfaceKind};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, Event, HtmlElement, MouseEvent, ShadowRootInit, ShadowRootMode};

pub const HOST_ID: &str = "text-enhancer-host";

const STYLE: &str = r#"
.dropdown {
  position: absolute;
  background: #2d2d2d;
  color: #fff;
  border: 1px solid #444;
  border-radius: 4px;
  box-shadow: 0 4px 6px rgba(0,0,0,0.3);
  font-family: sans-serif;
  font-size: 14px;
  min-width: 150px;
  max-height: 200px;
  overflow-y: auto;
  pointer-events: auto;
}
.dropdown-item {
  padding: 8px 12px;
  cursor: pointer;
  border-bottom: 1px solid #3d3d3d;
}
.dropdown-item:hover, .dropdown-item.active { background: #3e8e41; }
.dropdown-item .shortcut {
  font-weight: bold;
  color: #aaffaa;
  margin-right: 8px;
}
.word-picker {
  position: fixed;
  bottom: 20px;
  right: 20px;
  min-width: 300px;
  max-width: 90vw;
  background: #fff;
  color: #333;
  border: 2px solid #3e8e41;
  border-radius: 8px;
  box-shadow: 0 4px 12px rgba(0,0,0,0.25);
  display: flex;
  flex-direction: column;
  pointer-events: auto;
  font-family: sans-serif;
  resize: both;
  overflow: hidden;
}
.picker-header {
  padding: 10px 12px;
  background: linear-gradient(135deg, #3e8e41 0%, #2c662e 100%);
  color: white;
  border-radius: 6px 6px 0 0;
  cursor: move;
  font-weight: bold;
  display: flex;
  justify-content: space-between;
  align-items: center;
  user-select: none;
}
.picker-close {
  font-size: 24px;
  cursor: pointer;
  line-height: 1;
  padding: 0 5px;
  border-radius: 3px;
}
.picker-close:hover { background: rgba(255,255,255,0.2); }
.picker-content {
  display: flex;
  flex-wrap: wrap;
  gap: 8px;
  padding: 12px;
  overflow-y: auto;
  max-height: 300px;
  align-items: flex-start;
}
.picker-item {
  padding: 8px 16px;
  cursor: pointer;
  background: #f0f9ff;
  border: 1px solid #3e8e41;
  border-radius: 20px;
  white-space: nowrap;
  font-size: 13px;
  user-select: none;
}
.picker-item:hover { background: #3e8e41; color: white; }
.hidden { display: none !important; }
"#;

/// User interaction with the overlay, reported to the listener layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayEvent {
    SuggestionClicked(usize),
    PickerItemClicked(usize),
    PickerClosed,
}

struct Drag {
    /// Pointer position minus the offset when the drag began.
    origin: Cell<Option<(f64, f64)>>,
    offset: Cell<(f64, f64)>,
}

pub struct Overlay {
    host: HtmlElement,
    dropdown: HtmlElement,
    picker: HtmlElement,
    picker_list: HtmlElement,
    _listeners: Vec<EventListener>,
}

fn create(tag: &str, class: &str) -> Result<HtmlElement, JsValue> {
    let el: HtmlElement = gloo_utils::document().create_element(tag)?.dyn_into()?;
    el.set_class_name(class);
    Ok(el)
}

/// Index stored on the nearest `selector` ancestor of the event target.
fn indexed_target(event: &Event, selector: &str) -> Option<usize> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    target
        .closest(selector)
        .ok()??
        .get_attribute("data-index")?
        .parse()
        .ok()
}

fn translate(el: &HtmlElement, (x, y): (f64, f64)) {
    if let Err(e) = el
        .style()
        .set_property("transform", &format!("translate3d({x}px, {y}px, 0)"))
    {
        tracing::debug!(target: "lingo::overlay", error = ?e, "could not move picker");
    }
}

/// Add or remove the `hidden` class.
fn set_hidden(el: &HtmlElement, hidden: bool) {
    if let Err(e) = el.class_list().toggle_with_force("hidden", hidden) {
        tracing::debug!(target: "lingo::overlay", error = ?e, "could not toggle visibility");
    }
}

impl Overlay {
    /// Build the shadow host and attach it to the body.
    pub fn mount(on_event: Rc<dyn Fn(OverlayEvent)>) -> Result<Self, JsValue> {
        let document = gloo_utils::document();
        if let Some(stale) = document.get_element_by_id(HOST_ID) {
            stale.remove();
        }

        let host = create("div", "")?;
        host.set_id(HOST_ID);
        let host_style = host.style();
        host_style.set_property("position", "absolute")?;
        host_style.set_property("top", "0")?;
        host_style.set_property("left", "0")?;
        host_style.set_property("z-index", "2147483647")?;
        host_style.set_property("pointer-events", "none")?;

        let shadow = host.attach_shadow(&ShadowRootInit::new(ShadowRootMode::Open))?;
        let style = document.create_element("style")?;
        style.set_text_content(Some(STYLE));

        let dropdown = create("div", "dropdown hidden")?;

        let picker = create("div", "word-picker hidden")?;
        let header = create("div", "picker-header")?;
        let title = create("span", "picker-title")?;
        title.set_text_content(Some("Quick Insert"));
        let close = create("span", "picker-close")?;
        close.set_text_content(Some("\u{00d7}"));
        header.append_child(&title)?;
        header.append_child(&close)?;
        let picker_list = create("div", "picker-content")?;
        picker.append_child(&header)?;
        picker.append_child(&picker_list)?;

        shadow.append_child(&style)?;
        shadow.append_child(&dropdown)?;
        shadow.append_child(&picker)?;
        gloo_utils::body().append_child(&host)?;

        let drag = Rc::new(Drag {
            origin: Cell::new(None),
            offset: Cell::new((0.0, 0.0)),
        });
        let mut listeners = Vec::new();

        // mousedown keeps focus in the page editor.
        let cb = on_event.clone();
        listeners.push(EventListener::new_with_options(
            &dropdown,
            "mousedown",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                if let Some(index) = indexed_target(event, ".dropdown-item") {
                    event.prevent_default();
                    cb(OverlayEvent::SuggestionClicked(index));
                }
            },
        ));

        listeners.push(EventListener::new_with_options(
            &picker_list,
            "mousedown",
            EventListenerOptions::enable_prevent_default(),
            |event| event.prevent_default(),
        ));
        let cb = on_event.clone();
        listeners.push(EventListener::new(&picker_list, "click", move |event| {
            if let Some(index) = indexed_target(event, ".picker-item") {
                cb(OverlayEvent::PickerItemClicked(index));
            }
        }));

        let cb = on_event;
        listeners.push(EventListener::new(&close, "click", move |_| {
            cb(OverlayEvent::PickerClosed);
        }));

        let d = drag.clone();
        listeners.push(EventListener::new(&header, "mousedown", move |event| {
            let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let (ox, oy) = d.offset.get();
            d.origin.set(Some((
                mouse.client_x() as f64 - ox,
                mouse.client_y() as f64 - oy,
            )));
        }));

        let d = drag.clone();
        let tray = picker.clone();
        listeners.push(EventListener::new_with_options(
            &document,
            "mousemove",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                let (Some((ix, iy)), Some(mouse)) = (d.origin.get(), event.dyn_ref::<MouseEvent>())
                else {
                    return;
                };
                event.prevent_default();
                let offset = (mouse.client_x() as f64 - ix, mouse.client_y() as f64 - iy);
                d.offset.set(offset);
                translate(&tray, offset);
            },
        ));

        let d = drag;
        listeners.push(EventListener::new(&document, "mouseup", move |_| {
            d.origin.set(None);
        }));

        tracing::debug!(target: "lingo::overlay", "overlay mounted");
        Ok(Self {
            host,
            dropdown,
            picker,
            picker_list,
            _listeners: listeners,
        })
    }

    /// Render the session below the caret and show the dropdown.
    pub fn show_dropdown(
        &self,
        session: &SuggestionSession,
        rect: CaretRect,
        kind: SurfaceKind,
        config: &EngineConfig,
    ) -> Result<(), JsValue> {
        self.dropdown.set_text_content(None);
        for (index, suggestion) in session.candidates.iter().enumerate() {
            let class = if index == session.selected {
                "dropdown-item active"
            } else {
                "dropdown-item"
            };
            let item = create("div", class)?;
            item.set_attribute("data-index", &index.to_string())?;
            let trigger = create("span", "shortcut")?;
            trigger.set_text_content(Some(&suggestion.trigger));
            item.append_child(&trigger)?;
            item.append_child(&gloo_utils::document().create_text_node(&suggestion.expansion))?;
            self.dropdown.append_child(&item)?;
        }

        let window = gloo_utils::window();
        let inset = match kind {
            SurfaceKind::PlainInput => config.native_input_inset_x,
            SurfaceKind::ContentEditable => 0.0,
        };
        let left = rect.left + window.scroll_x().unwrap_or(0.0) + inset;
        let top = rect.bottom + window.scroll_y().unwrap_or(0.0) + config.overlay_offset_y;

        let style = self.dropdown.style();
        style.set_property("left", &format!("{left}px"))?;
        style.set_property("top", &format!("{top}px"))?;
        self.dropdown.class_list().remove_1("hidden")
    }

    pub fn hide_dropdown(&self) {
        set_hidden(&self.dropdown, true);
    }

    pub fn is_dropdown_visible(&self) -> bool {
        !self.dropdown.class_list().contains("hidden")
    }

    pub fn set_picker_visible(&self, visible: bool) {
        set_hidden(&self.picker, !visible);
    }

    pub fn is_picker_visible(&self) -> bool {
        !self.picker.class_list().contains("hidden")
    }

    /// Replace the tray's chips with `items`.
    pub fn render_picker(&self, items: &[String]) -> Result<(), JsValue> {
        self.picker_list.set_text_content(None);
        for (index, text) in items.iter().enumerate() {
            let chip = create("div", "picker-item")?;
            chip.set_attribute("data-index", &index.to_string())?;
            chip.set_text_content(Some(text));
            self.picker_list.append_child(&chip)?;
        }
        Ok(())
    }

    pub fn host(&self) -> &HtmlElement {
        &self.host
    }
}

impl Drop for Overlay {
    fn drop(&mut self) {
        self.host.remove();
        tracing::debug!(target: "lingo::overlay", "overlay removed");
    }
}
