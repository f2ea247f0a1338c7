//! Browser mutation tiers.
//!
//! Ordered from least to most invasive. [`cascade`] assembles them for the
//! engine config; the driver in `lingo_core::mutation` picks the first tier
//! that supports the surface and edit scope and actually changes the text.

use async_trait::async_trait;
use gloo_timers::future::TimeoutFuture;
use js_sys::{Array, Function, Object, Reflect};
use lingo_core::{
    Cascade, EditScope, EngineConfig, MutationError, PlannedEdit, Range,
    SurfaceKind, TextSurface,
};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::Element;

use crate::clipboard;
use crate::dispatch::{dispatch_input, dispatch_key, dispatch_paste, exec_command, key_code_for};
use crate::surface::DomSurface;

const FIBER_PREFIXES: &[&str] = &["__reactFiber$", "__reactInternalInstance$"];

fn js_err(what: &'static str) -> impl Fn(JsValue) -> MutationError {
    move |e| MutationError::rejected(what, format!("{e:?}"))
}

fn millis(d: std::time::Duration) -> u32 {
    d.as_millis().min(u32::MAX as u128) as u32
}

/// `setRangeText` (or a value splice) plus a synthetic `input` event, for
/// native inputs and textareas.
pub struct NativeRange;

#[async_trait(?Send)]
impl lingo_core::MutationStrategy<DomSurface> for NativeRange {
    fn name(&self) -> &'static str {
        "native_range"
    }

    fn supports(&self, kind: SurfaceKind, _scope: EditScope) -> bool {
        kind == SurfaceKind::PlainInput
    }

    async fn apply(&self, surface: &DomSurface, edit: &PlannedEdit) -> Result<(), MutationError> {
        surface.replace_range(edit.range, &edit.replacement)?;
        dispatch_input(surface.element(), "insertText", Some(&edit.replacement))
            .map_err(js_err("native_range"))?;
        Ok(())
    }
}

/// Calls a React-controlled editor's `onChange` prop with the new value.
///
/// Only sees the expandos when the script shares the page's JS world.
pub struct FrameworkProps {
    ancestor_depth: usize,
    fiber_depth: usize,
}

impl FrameworkProps {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            ancestor_depth: config.framework_ancestor_depth,
            fiber_depth: config.framework_fiber_depth,
        }
    }

    fn fiber_of(element: &Element) -> Option<JsValue> {
        let keys = Object::keys(element.unchecked_ref::<Object>());
        keys.iter()
            .filter_map(|k| k.as_string())
            .find(|k| FIBER_PREFIXES.iter().any(|p| k.starts_with(p)))
            .and_then(|k| Reflect::get(element, &JsValue::from_str(&k)).ok())
            .filter(|v| v.is_object())
    }

    fn find_on_change(&self, root: &Element) -> Option<(JsValue, Function)> {
        let mut element = Some(root.clone());
        for _ in 0..=self.ancestor_depth {
            let Some(current) = element else { break };
            if let Some(mut fiber) = Self::fiber_of(&current) {
                for _ in 0..self.fiber_depth {
                    let props = Reflect::get(&fiber, &"memoizedProps".into())
                        .ok()
                        .filter(|p| p.is_object());
                    if let Some(props) = props {
                        if let Ok(f) = Reflect::get(&props, &"onChange".into())
                            .and_then(|f| f.dyn_into::<Function>())
                        {
                            return Some((props, f));
                        }
                    }
                    match Reflect::get(&fiber, &"return".into()) {
                        Ok(next) if next.is_object() => fiber = next,
                        _ => break,
                    }
                }
            }
            element = current.parent_element();
        }
        None
    }
}

/// `[{ type: "paragraph", children: [{ text }] }]`
fn paragraph_value(text: &str) -> Result<JsValue, JsValue> {
    let leaf = Object::new();
    Reflect::set(&leaf, &"text".into(), &text.into())?;
    let paragraph = Object::new();
    Reflect::set(&paragraph, &"type".into(), &"paragraph".into())?;
    Reflect::set(&paragraph, &"children".into(), &Array::of1(&leaf))?;
    Ok(Array::of1(&paragraph).into())
}

#[async_trait(?Send)]
impl lingo_core::MutationStrategy<DomSurface> for FrameworkProps {
    fn name(&self) -> &'static str {
        "framework_props"
    }

    fn supports(&self, kind: SurfaceKind, _scope: EditScope) -> bool {
        kind == SurfaceKind::ContentEditable
    }

    async fn apply(&self, surface: &DomSurface, edit: &PlannedEdit) -> Result<(), MutationError> {
        let Some((props, on_change)) = self.find_on_change(surface.element()) else {
            return Err(MutationError::rejected("framework_props", "no onChange handler found"));
        };
        let value = paragraph_value(&edit.expected).map_err(js_err("framework_props"))?;
        on_change
            .call1(&props, &value)
            .map_err(js_err("framework_props"))?;
        Ok(())
    }
}

/// Select the target and feed the replacement through a synthetic paste,
/// which most rich-text editors route through their own model.
pub struct Paste {
    settle: u32,
    grace: u32,
}

impl Paste {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            settle: millis(config.paste_settle),
            grace: millis(config.paste_grace),
        }
    }
}

#[async_trait(?Send)]
impl lingo_core::MutationStrategy<DomSurface> for Paste {
    fn name(&self) -> &'static str {
        "paste"
    }

    fn supports(&self, kind: SurfaceKind, _scope: EditScope) -> bool {
        kind == SurfaceKind::ContentEditable
    }

    async fn apply(&self, surface: &DomSurface, edit: &PlannedEdit) -> Result<(), MutationError> {
        if let Err(e) = clipboard::write_text(&edit.replacement).await {
            tracing::debug!(target: "lingo::mutation", error = ?e, "clipboard write failed, pasting anyway");
        }

        match edit.scope {
            EditScope::WholeBuffer => surface.select_all()?,
            EditScope::Span => surface.select_range(edit.range)?,
        }
        TimeoutFuture::new(self.settle).await;

        surface.ensure_attached()?;
        dispatch_paste(surface.element(), &edit.replacement).map_err(js_err("paste"))?;
        TimeoutFuture::new(self.grace).await;
        Ok(())
    }
}

/// Delete and retype the span one key at a time.
pub struct Keystrokes {
    pause: u32,
}

impl Keystrokes {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            pause: millis(config.keystroke_pause),
        }
    }
}

#[async_trait(?Send)]
impl lingo_core::MutationStrategy<DomSurface> for Keystrokes {
    fn name(&self) -> &'static str {
        "keystrokes"
    }

    fn supports(&self, kind: SurfaceKind, scope: EditScope) -> bool {
        kind == SurfaceKind::ContentEditable && scope == EditScope::Span
    }

    async fn apply(&self, surface: &DomSurface, edit: &PlannedEdit) -> Result<(), MutationError> {
        let target = surface.element();
        surface.select_range(Range::caret(edit.range.end))?;

        let mut len = surface.text()?.chars().count();
        let mut remaining = edit.range.end;
        while remaining > edit.range.start {
            dispatch_key(target, "Backspace", "Backspace").map_err(js_err("keystrokes"))?;
            if !exec_command("delete", None) {
                tracing::debug!(target: "lingo::mutation", "execCommand(delete) refused, writing directly");
                let rest = Range::new(edit.range.start, remaining);
                surface.replace_range(rest, &edit.replacement)?;
                return Ok(());
            }
            dispatch_input(target, "deleteContentBackward", None).map_err(js_err("keystrokes"))?;

            // One delete takes a whole grapheme, which may span several chars.
            let now = surface.text()?.chars().count();
            let removed = len.saturating_sub(now);
            if removed == 0 {
                return Err(MutationError::rejected("keystrokes", "delete removed nothing"));
            }
            if removed > remaining - edit.range.start {
                tracing::debug!(target: "lingo::mutation", "delete crossed the start of the span");
                return Ok(());
            }
            remaining -= removed;
            len = now;
        }

        TimeoutFuture::new(self.pause).await;
        surface.ensure_attached()?;

        for (i, c) in edit.replacement.chars().enumerate() {
            let (key, code) = key_code_for(c);
            dispatch_key(target, &key, &code).map_err(js_err("keystrokes"))?;
            if !exec_command("insertText", Some(&key)) {
                tracing::debug!(target: "lingo::mutation", "execCommand(insertText) refused, writing directly");
                let typed = Range::caret(edit.range.start + i);
                let rest: String = edit.replacement.chars().skip(i).collect();
                surface.replace_range(typed, &rest)?;
                return Ok(());
            }
            dispatch_input(target, "insertText", Some(&key)).map_err(js_err("keystrokes"))?;
        }
        Ok(())
    }
}

/// The browser cascade for `config`.
///
/// No tier writes unconditionally: an edit the host editor refuses everywhere
/// is abandoned.
pub fn cascade(config: &EngineConfig) -> Cascade<DomSurface> {
    let mut tiers: Cascade<DomSurface> = vec![Box::new(NativeRange)];
    if config.probe_framework_handles {
        tiers.push(Box::new(FrameworkProps::new(config)));
    }
    tiers.push(Box::new(Paste::new(config)));
    tiers.push(Box::new(Keystrokes::new(config)));
    tiers
}
