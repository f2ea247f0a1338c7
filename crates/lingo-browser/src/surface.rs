//! DOM implementation of [`TextSurface`].
//!
//! Native inputs use the `value`/selection API. contentEditable roots are
//! read as the concatenation of their text nodes; offsets are mapped onto
//! (text node, UTF-16 offset) pairs with a tree walk.

use std::time::Duration;

use gloo_timers::callback::Timeout;
use lingo_core::offsets::{char_to_utf16, utf16_to_char};
use lingo_core::{CaretRect, Range, SurfaceError, SurfaceKind, TextSurface};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlElement, HtmlInputElement, HtmlTextAreaElement, Node, SelectionMode};

/// `NodeFilter.SHOW_TEXT`.
const SHOW_TEXT: u32 = 0x4;

/// Input types whose value is free text with a selection API.
const TEXT_INPUT_TYPES: &[&str] = &["text", "search", "url", "tel", "email", ""];

pub(crate) fn dom_err(what: &'static str) -> impl Fn(JsValue) -> SurfaceError {
    move |e| SurfaceError::Dom(format!("{what} failed: {e:?}"))
}

/// Handle to the focused editable element.
#[derive(Debug, Clone)]
pub struct DomSurface {
    element: HtmlElement,
    kind: SurfaceKind,
}

enum Native<'a> {
    Input(&'a HtmlInputElement),
    TextArea(&'a HtmlTextAreaElement),
}

impl Native<'_> {
    fn value(&self) -> String {
        match self {
            Native::Input(el) => el.value(),
            Native::TextArea(el) => el.value(),
        }
    }

    fn set_value(&self, value: &str) {
        match self {
            Native::Input(el) => el.set_value(value),
            Native::TextArea(el) => el.set_value(value),
        }
    }

    fn selection_start(&self) -> Result<Option<u32>, JsValue> {
        match self {
            Native::Input(el) => el.selection_start(),
            Native::TextArea(el) => el.selection_start(),
        }
    }

    fn set_selection_range(&self, start: u32, end: u32) -> Result<(), JsValue> {
        match self {
            Native::Input(el) => el.set_selection_range(start, end),
            Native::TextArea(el) => el.set_selection_range(start, end),
        }
    }

    fn set_range_text(&self, text: &str, start: u32, end: u32) -> Result<(), JsValue> {
        match self {
            Native::Input(el) => el.set_range_text_with_start_and_end_and_selection_mode(
                text,
                start,
                end,
                SelectionMode::End,
            ),
            Native::TextArea(el) => el.set_range_text_with_start_and_end_and_mode(
                text,
                start,
                end,
                "end",
            ),
        }
    }
}

impl DomSurface {
    /// Bind to the editable element behind a focus target.
    ///
    /// Text nodes are normalized to their parent. Inside a contentEditable
    /// subtree the outermost editable ancestor is bound.
    pub fn bind(target: &JsValue) -> Option<Self> {
        let node = target.dyn_ref::<Node>()?;
        let element = if node.node_type() == Node::TEXT_NODE {
            node.parent_element()?
        } else {
            node.dyn_ref::<web_sys::Element>()?.clone()
        };

        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            let ty = input.type_().to_ascii_lowercase();
            return TEXT_INPUT_TYPES.contains(&ty.as_str()).then(|| Self {
                element: input.clone().unchecked_into(),
                kind: SurfaceKind::PlainInput,
            });
        }
        if element.is_instance_of::<HtmlTextAreaElement>() {
            return Some(Self {
                element: element.unchecked_into(),
                kind: SurfaceKind::PlainInput,
            });
        }

        let mut root = element.dyn_into::<HtmlElement>().ok()?;
        if !root.is_content_editable() {
            return None;
        }
        while let Some(parent) = root
            .parent_element()
            .and_then(|p| p.dyn_into::<HtmlElement>().ok())
            .filter(|p| p.is_content_editable())
        {
            root = parent;
        }
        Some(Self {
            element: root,
            kind: SurfaceKind::ContentEditable,
        })
    }

    pub fn element(&self) -> &HtmlElement {
        &self.element
    }

    fn native(&self) -> Option<Native<'_>> {
        if let Some(input) = self.element.dyn_ref::<HtmlInputElement>() {
            Some(Native::Input(input))
        } else {
            self.element.dyn_ref::<HtmlTextAreaElement>().map(Native::TextArea)
        }
    }

    fn text_nodes(&self) -> Result<Vec<Node>, SurfaceError> {
        let document = gloo_utils::document();
        let walker = document
            .create_tree_walker_with_what_to_show(&self.element, SHOW_TEXT)
            .map_err(dom_err("create_tree_walker"))?;
        let mut nodes = Vec::new();
        while let Ok(Some(node)) = walker.next_node() {
            nodes.push(node);
        }
        Ok(nodes)
    }

    /// Text node and in-node UTF-16 offset for a UTF-16 offset in the root.
    ///
    /// Past the end resolves to the end of the last text node. An empty root
    /// resolves to the root itself at offset 0.
    fn boundary_at(&self, target_utf16: usize) -> Result<(Node, u32), SurfaceError> {
        let mut accumulated = 0;
        let mut last: Option<(Node, usize)> = None;
        for node in self.text_nodes()? {
            let len = node
                .text_content()
                .map(|t| t.encode_utf16().count())
                .unwrap_or(0);
            if accumulated + len >= target_utf16 {
                return Ok((node, (target_utf16 - accumulated) as u32));
            }
            accumulated += len;
            last = Some((node, len));
        }
        match last {
            Some((node, len)) => Ok((node, len as u32)),
            None => Ok((self.element.clone().unchecked_into(), 0)),
        }
    }

    /// DOM range over a char range of a contentEditable root.
    fn dom_range(&self, range: Range) -> Result<web_sys::Range, SurfaceError> {
        let text = self.text()?;
        let range = range.normalize();
        let (start_node, start_off) = self.boundary_at(char_to_utf16(&text, range.start))?;
        let (end_node, end_off) = self.boundary_at(char_to_utf16(&text, range.end))?;

        let dom_range = gloo_utils::document()
            .create_range()
            .map_err(dom_err("create_range"))?;
        dom_range
            .set_start(&start_node, start_off)
            .map_err(dom_err("set_start"))?;
        dom_range
            .set_end(&end_node, end_off)
            .map_err(dom_err("set_end"))?;
        Ok(dom_range)
    }

    fn apply_selection(range: &web_sys::Range) -> Result<(), SurfaceError> {
        let selection = gloo_utils::window()
            .get_selection()
            .map_err(dom_err("get_selection"))?
            .ok_or(SurfaceError::Dom("no selection object".into()))?;
        selection
            .remove_all_ranges()
            .map_err(dom_err("remove_all_ranges"))?;
        selection.add_range(range).map_err(dom_err("add_range"))?;
        Ok(())
    }

    /// Select a char range, so the host editor's next input replaces it.
    pub fn select_range(&self, range: Range) -> Result<(), SurfaceError> {
        self.ensure_attached()?;
        if let Some(native) = self.native() {
            let value = native.value();
            let start = char_to_utf16(&value, range.start) as u32;
            let end = char_to_utf16(&value, range.end) as u32;
            return native
                .set_selection_range(start, end)
                .map_err(dom_err("set_selection_range"));
        }
        let dom_range = self.dom_range(range)?;
        Self::apply_selection(&dom_range)
    }

    /// Select the whole surface.
    pub fn select_all(&self) -> Result<(), SurfaceError> {
        self.ensure_attached()?;
        if self.native().is_some() {
            let len = self.text()?.chars().count();
            return self.select_range(Range::new(0, len));
        }
        let dom_range = gloo_utils::document()
            .create_range()
            .map_err(dom_err("create_range"))?;
        dom_range
            .select_node_contents(&self.element)
            .map_err(dom_err("select_node_contents"))?;
        Self::apply_selection(&dom_range)
    }

    /// The current selection range, if it starts inside this root.
    fn selection_range_inside(&self) -> Option<web_sys::Range> {
        let selection = gloo_utils::window().get_selection().ok()??;
        if selection.range_count() == 0 {
            return None;
        }
        let range = selection.get_range_at(0).ok()?;
        let container = range.start_container().ok()?;
        self.element.contains(Some(&container)).then_some(range)
    }
}

impl TextSurface for DomSurface {
    fn kind(&self) -> SurfaceKind {
        self.kind
    }

    fn is_attached(&self) -> bool {
        self.element.is_connected()
    }

    fn text(&self) -> Result<String, SurfaceError> {
        self.ensure_attached()?;
        if let Some(native) = self.native() {
            return Ok(native.value());
        }
        Ok(self
            .text_nodes()?
            .iter()
            .filter_map(|n| n.text_content())
            .collect())
    }

    fn caret_offset(&self) -> Result<Option<usize>, SurfaceError> {
        self.ensure_attached()?;
        if let Some(native) = self.native() {
            let Ok(Some(start)) = native.selection_start() else {
                return Ok(None);
            };
            return Ok(Some(utf16_to_char(&native.value(), start as usize)));
        }

        let Some(selection) = self.selection_range_inside() else {
            return Ok(None);
        };
        let prefix = gloo_utils::document()
            .create_range()
            .map_err(dom_err("create_range"))?;
        prefix
            .select_node_contents(&self.element)
            .map_err(dom_err("select_node_contents"))?;
        let container = selection
            .start_container()
            .map_err(dom_err("start_container"))?;
        let offset = selection.start_offset().map_err(dom_err("start_offset"))?;
        prefix
            .set_end(&container, offset)
            .map_err(dom_err("set_end"))?;

        let utf16_len = prefix.to_string().length() as usize;
        Ok(Some(utf16_to_char(&self.text()?, utf16_len)))
    }

    fn replace_range(&self, range: Range, text: &str) -> Result<(), SurfaceError> {
        self.ensure_attached()?;
        let range = range.normalize();

        if let Some(native) = self.native() {
            let value = native.value();
            let start = char_to_utf16(&value, range.start) as u32;
            let end = char_to_utf16(&value, range.end) as u32;
            if native.set_range_text(text, start, end).is_ok() {
                return Ok(());
            }
            tracing::trace!(target: "lingo::surface", "setRangeText refused, splicing value");
            let chars: Vec<char> = value.chars().collect();
            let end_char = range.end.min(chars.len());
            let start_char = range.start.min(end_char);
            let mut spliced: String = chars[..start_char].iter().collect();
            spliced.push_str(text);
            spliced.extend(&chars[end_char..]);
            native.set_value(&spliced);
            let caret = char_to_utf16(&spliced, start_char + text.chars().count()) as u32;
            return native
                .set_selection_range(caret, caret)
                .map_err(dom_err("set_selection_range"));
        }

        let dom_range = self.dom_range(range)?;
        dom_range
            .delete_contents()
            .map_err(dom_err("delete_contents"))?;
        if !text.is_empty() {
            let node = gloo_utils::document().create_text_node(text);
            dom_range
                .insert_node(&node)
                .map_err(dom_err("insert_node"))?;
            dom_range
                .set_start_after(&node)
                .map_err(dom_err("set_start_after"))?;
        }
        dom_range.collapse_with_to_start(true);
        Self::apply_selection(&dom_range)
    }

    fn set_caret_offset(&self, offset: usize) -> Result<(), SurfaceError> {
        self.ensure_attached()?;
        if let Some(native) = self.native() {
            let value = native.value();
            let pos = char_to_utf16(&value, offset) as u32;
            return native
                .set_selection_range(pos, pos)
                .map_err(dom_err("set_selection_range"));
        }

        let text = self.text()?;
        let (node, node_offset) = self.boundary_at(char_to_utf16(&text, offset))?;
        let range = gloo_utils::document()
            .create_range()
            .map_err(dom_err("create_range"))?;
        range
            .set_start(&node, node_offset)
            .map_err(dom_err("set_start"))?;
        range.collapse_with_to_start(true);
        Self::apply_selection(&range)
    }

    fn caret_rect(&self) -> Option<CaretRect> {
        if self.kind == SurfaceKind::PlainInput {
            let rect = self.element.get_bounding_client_rect();
            return Some(CaretRect::new(rect.left(), rect.top(), rect.bottom()));
        }

        let range = self.selection_range_inside()?.clone_range();
        range.collapse_with_to_start(true);
        let rect = range
            .get_client_rects()
            .and_then(|rects| rects.get(0))
            .unwrap_or_else(|| self.element.get_bounding_client_rect());
        Some(CaretRect::new(rect.left(), rect.top(), rect.bottom()))
    }

    fn flash(&self, color: &str, duration: Duration) {
        let style = self.element.style();
        let previous = style.get_property_value("background-color").unwrap_or_default();
        if style.set_property("background-color", color).is_err() {
            return;
        }
        let element = self.element.clone();
        Timeout::new(duration.as_millis() as u32, move || {
            let _ = element.style().set_property("background-color", &previous);
        })
        .forget();
    }
}
