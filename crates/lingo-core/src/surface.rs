//! Text surface abstraction.
//!
//! A surface is a transient handle to the focused editable element. It never
//! owns the element: the host page may remove or replace it at any moment,
//! after which every operation returns [`SurfaceError::Detached`].
//!
//! All offsets are char offsets into [`TextSurface::text`].

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use ropey::Rope;

use crate::error::SurfaceError;
use crate::types::{CaretRect, Range};

/// Which family of editable element a surface wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// `<input>` or `<textarea>`, with a `value` and a selection API.
    PlainInput,
    /// A contentEditable root, possibly owned by a framework editor.
    ContentEditable,
}

impl SurfaceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurfaceKind::PlainInput => "plain_input",
            SurfaceKind::ContentEditable => "content_editable",
        }
    }
}

/// Read/write access to an editable element's flat text.
///
/// Methods take `&self`: implementations are handles onto state that lives
/// elsewhere (the DOM, or shared memory), and strategies hold a shared
/// reference across await points.
pub trait TextSurface {
    fn kind(&self) -> SurfaceKind;

    /// Whether the underlying element is still part of the document.
    fn is_attached(&self) -> bool;

    /// Full text of the surface.
    fn text(&self) -> Result<String, SurfaceError>;

    /// Absolute caret offset, or `None` if the selection is outside the
    /// surface or cannot be mapped.
    fn caret_offset(&self) -> Result<Option<usize>, SurfaceError>;

    /// Replace `range` with `text` directly, bypassing host editor hooks.
    fn replace_range(&self, range: Range, text: &str) -> Result<(), SurfaceError>;

    /// Collapse the selection at `offset`, clamping to the end of the text.
    fn set_caret_offset(&self, offset: usize) -> Result<(), SurfaceError>;

    /// Viewport rectangle of the caret, for overlay placement.
    fn caret_rect(&self) -> Option<CaretRect> {
        None
    }

    /// Briefly tint the surface to acknowledge a whole-buffer transform.
    fn flash(&self, _color: &str, _duration: Duration) {}

    fn ensure_attached(&self) -> Result<(), SurfaceError> {
        if self.is_attached() {
            Ok(())
        } else {
            Err(SurfaceError::Detached)
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    rope: Rope,
    caret: Option<usize>,
    detached: bool,
    flashes: usize,
}

/// Rope-backed surface for hosts without a DOM, and for tests.
///
/// Clones share the same buffer, the way two handles to one element would.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    kind: SurfaceKind,
    state: Rc<RefCell<MemoryState>>,
}

impl MemorySurface {
    pub fn new(kind: SurfaceKind, text: &str) -> Self {
        let rope = Rope::from_str(text);
        let caret = Some(rope.len_chars());
        Self {
            kind,
            state: Rc::new(RefCell::new(MemoryState {
                rope,
                caret,
                ..Default::default()
            })),
        }
    }

    pub fn plain(text: &str) -> Self {
        Self::new(SurfaceKind::PlainInput, text)
    }

    pub fn content_editable(text: &str) -> Self {
        Self::new(SurfaceKind::ContentEditable, text)
    }

    /// Simulate the host page removing the element.
    pub fn detach(&self) {
        self.state.borrow_mut().detached = true;
    }

    /// Simulate the selection leaving the element (or being unmappable).
    pub fn clear_caret(&self) {
        self.state.borrow_mut().caret = None;
    }

    /// Simulate user typing at the caret.
    pub fn type_text(&self, text: &str) {
        let mut state = self.state.borrow_mut();
        let len = state.rope.len_chars();
        let at = state.caret.unwrap_or(len).min(len);
        state.rope.insert(at, text);
        state.caret = Some(at + text.chars().count());
    }

    /// Overwrite the whole buffer, as a host editor re-render would.
    pub fn set_text(&self, text: &str) {
        let mut state = self.state.borrow_mut();
        state.rope = Rope::from_str(text);
        let len = state.rope.len_chars();
        state.caret = state.caret.map(|c| c.min(len));
    }

    /// Number of times [`TextSurface::flash`] was called.
    pub fn flash_count(&self) -> usize {
        self.state.borrow().flashes
    }
}

impl TextSurface for MemorySurface {
    fn kind(&self) -> SurfaceKind {
        self.kind
    }

    fn is_attached(&self) -> bool {
        !self.state.borrow().detached
    }

    fn text(&self) -> Result<String, SurfaceError> {
        self.ensure_attached()?;
        Ok(self.state.borrow().rope.to_string())
    }

    fn caret_offset(&self) -> Result<Option<usize>, SurfaceError> {
        self.ensure_attached()?;
        Ok(self.state.borrow().caret)
    }

    fn replace_range(&self, range: Range, text: &str) -> Result<(), SurfaceError> {
        self.ensure_attached()?;
        let range = range.normalize();
        let mut state = self.state.borrow_mut();
        let len = state.rope.len_chars();
        if range.end > len {
            return Err(SurfaceError::OutOfBounds {
                offset: range.end,
                len,
            });
        }
        state.rope.remove(range.start..range.end);
        state.rope.insert(range.start, text);
        state.caret = Some(range.start + text.chars().count());
        Ok(())
    }

    fn set_caret_offset(&self, offset: usize) -> Result<(), SurfaceError> {
        self.ensure_attached()?;
        let mut state = self.state.borrow_mut();
        let len = state.rope.len_chars();
        state.caret = Some(offset.min(len));
        Ok(())
    }

    fn flash(&self, _color: &str, _duration: Duration) {
        self.state.borrow_mut().flashes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caret_round_trip() {
        let surface = MemorySurface::plain("hello world");
        for offset in [0, 5, 11] {
            surface.set_caret_offset(offset).unwrap();
            assert_eq!(surface.caret_offset().unwrap(), Some(offset));
        }
        surface.set_caret_offset(100).unwrap();
        assert_eq!(surface.caret_offset().unwrap(), Some(11));
    }

    #[test]
    fn test_replace_range_moves_caret() {
        let surface = MemorySurface::content_editable("I'll brb now");
        surface.replace_range(Range::new(5, 8), "be right back").unwrap();
        assert_eq!(surface.text().unwrap(), "I'll be right back now");
        assert_eq!(surface.caret_offset().unwrap(), Some(18));
    }

    #[test]
    fn test_multibyte_offsets_are_chars() {
        let surface = MemorySurface::plain("¯\\_(ツ)_/¯ ok");
        surface.replace_range(Range::new(10, 12), "fine").unwrap();
        assert_eq!(surface.text().unwrap(), "¯\\_(ツ)_/¯ fine");
    }

    #[test]
    fn test_detached_surface_fails_safely() {
        let surface = MemorySurface::plain("text");
        let handle = surface.clone();
        handle.detach();
        assert_eq!(surface.text(), Err(SurfaceError::Detached));
        assert_eq!(surface.caret_offset(), Err(SurfaceError::Detached));
        assert_eq!(
            surface.replace_range(Range::new(0, 1), "x"),
            Err(SurfaceError::Detached)
        );
    }

    #[test]
    fn test_out_of_bounds_replace() {
        let surface = MemorySurface::plain("abc");
        assert_eq!(
            surface.replace_range(Range::new(1, 9), "x"),
            Err(SurfaceError::OutOfBounds { offset: 9, len: 3 })
        );
        assert_eq!(surface.text().unwrap(), "abc");
    }
}
