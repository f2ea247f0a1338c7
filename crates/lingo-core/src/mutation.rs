//! Mutation planning and the strategy cascade.
//!
//! Host editors disagree about which kind of write they accept. Native inputs
//! take a `value` splice; framework-controlled contentEditable roots often
//! revert anything that did not arrive through their own event handlers. So an
//! edit is first *planned* against the current text, then handed to an ordered
//! list of [`MutationStrategy`] tiers. The driver tries each compatible tier in
//! turn, re-reads the text afterwards and moves on when nothing changed.
//! Before every tier the target is checked again, since tiers await timers
//! and the page keeps running in between. A tier that leaves anything other
//! than the planned result ends the cascade.

use async_trait::async_trait;

use crate::error::MutationError;
use crate::offsets::byte_to_char;
use crate::surface::{SurfaceKind, TextSurface};
use crate::types::Range;

/// An edit expressed as "replace this text before the caret".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRequest {
    /// Text expected immediately before (or ending before) the caret.
    pub original: String,
    pub replacement: String,
    /// Caret offset captured when the trigger fired.
    pub caret: usize,
}

impl MutationRequest {
    pub fn new(original: impl Into<String>, replacement: impl Into<String>, caret: usize) -> Self {
        Self {
            original: original.into(),
            replacement: replacement.into(),
            caret,
        }
    }

    /// Insert `text` at `caret` without removing anything.
    pub fn insert(text: impl Into<String>, caret: usize) -> Self {
        Self::new(String::new(), text, caret)
    }

    /// Locate the original text in `current` and plan a span edit.
    ///
    /// The target is the nearest occurrence that ends at or before the
    /// captured caret, so typing that happened after the trigger does not
    /// shift the edit onto a later duplicate.
    pub fn resolve(&self, current: &str) -> Result<PlannedEdit, MutationError> {
        let caret_byte = crate::offsets::char_to_byte(current, self.caret);
        let prefix = &current[..caret_byte];

        let Some(start_byte) = prefix.rfind(self.original.as_str()) else {
            return Err(MutationError::TargetNotFound {
                original: self.original.clone(),
                caret: self.caret,
            });
        };

        let start = byte_to_char(current, start_byte);
        let end = start + self.original.chars().count();
        Ok(PlannedEdit::span(current, Range::new(start, end), &self.replacement))
    }
}

/// Whether an edit touches a sub-range or the whole buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditScope {
    Span,
    WholeBuffer,
}

/// A resolved edit ready for the cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEdit {
    pub range: Range,
    pub replacement: String,
    /// Text being replaced, as read when the edit was planned.
    pub original: String,
    /// Full surface text once the edit is applied.
    pub expected: String,
    pub caret_after: usize,
    pub scope: EditScope,
}

impl PlannedEdit {
    /// Plan replacing `range` of `current` with `replacement`.
    pub fn span(current: &str, range: Range, replacement: &str) -> Self {
        let range = range.normalize();
        let start_byte = crate::offsets::char_to_byte(current, range.start);
        let end_byte = crate::offsets::char_to_byte(current, range.end);

        let mut expected = String::with_capacity(current.len() + replacement.len());
        expected.push_str(&current[..start_byte]);
        expected.push_str(replacement);
        expected.push_str(&current[end_byte..]);

        Self {
            range,
            replacement: replacement.to_string(),
            original: current[start_byte..end_byte].to_string(),
            expected,
            caret_after: range.start + replacement.chars().count(),
            scope: EditScope::Span,
        }
    }

    /// Plan replacing all of `current` with `replacement`.
    pub fn whole_buffer(current: &str, replacement: impl Into<String>) -> Self {
        let replacement = replacement.into();
        let len = replacement.chars().count();
        Self {
            range: Range::new(0, current.chars().count()),
            original: current.to_string(),
            expected: replacement.clone(),
            replacement,
            caret_after: len,
            scope: EditScope::WholeBuffer,
        }
    }

    /// True when applying the edit would leave the text as it is.
    pub fn is_noop(&self) -> bool {
        self.original == self.replacement
    }

    /// Re-plan against text read just before a tier runs.
    ///
    /// A span edit survives changes outside its range; a whole-buffer edit
    /// survives none.
    fn replan(&self, current: &str) -> Result<PlannedEdit, MutationError> {
        let still_there = match self.scope {
            EditScope::WholeBuffer => current == self.original,
            EditScope::Span => {
                self.range.end <= current.chars().count() && {
                    let start = crate::offsets::char_to_byte(current, self.range.start);
                    let end = crate::offsets::char_to_byte(current, self.range.end);
                    current[start..end] == self.original
                }
            }
        };
        if !still_there {
            return Err(MutationError::TargetNotFound {
                original: self.original.clone(),
                caret: self.range.end,
            });
        }
        Ok(match self.scope {
            EditScope::WholeBuffer => self.clone(),
            EditScope::Span => PlannedEdit::span(current, self.range, &self.replacement),
        })
    }
}

/// One way of getting an edit into a surface.
///
/// `apply` returning `Ok` means the strategy did its part; the driver still
/// verifies the text actually changed before accepting it.
#[async_trait(?Send)]
pub trait MutationStrategy<S: TextSurface + ?Sized> {
    fn name(&self) -> &'static str;

    /// Whether this tier can handle the surface kind and edit scope.
    fn supports(&self, kind: SurfaceKind, scope: EditScope) -> bool;

    async fn apply(&self, surface: &S, edit: &PlannedEdit) -> Result<(), MutationError>;
}

/// Writes straight through [`TextSurface::replace_range`].
///
/// On a DOM surface this bypasses host editor hooks, so it belongs at the end
/// of a cascade. On [`MemorySurface`](crate::surface::MemorySurface) it is the
/// whole cascade.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectReplace;

#[async_trait(?Send)]
impl<S: TextSurface + ?Sized> MutationStrategy<S> for DirectReplace {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn supports(&self, _kind: SurfaceKind, _scope: EditScope) -> bool {
        true
    }

    async fn apply(&self, surface: &S, edit: &PlannedEdit) -> Result<(), MutationError> {
        surface.replace_range(edit.range, &edit.replacement)?;
        Ok(())
    }
}

/// Ordered strategy tiers for one surface type.
pub type Cascade<S> = Vec<Box<dyn MutationStrategy<S>>>;

/// Run `edit` through `strategies` until one takes effect.
///
/// Returns the name of the strategy that succeeded. A detached surface stops
/// the cascade immediately, since no later tier can do better. So does a
/// target that changed underneath the edit, or a tier that left text other
/// than the planned result.
#[tracing::instrument(level = "debug", skip_all, fields(kind = surface.kind().as_str(), scope = ?edit.scope))]
pub async fn apply_with_fallback<S: TextSurface + ?Sized>(
    surface: &S,
    edit: &PlannedEdit,
    strategies: &[Box<dyn MutationStrategy<S>>],
) -> Result<&'static str, MutationError> {
    if edit.is_noop() {
        return Ok("noop");
    }

    let kind = surface.kind();
    for strategy in strategies {
        if !strategy.supports(kind, edit.scope) {
            continue;
        }

        surface.ensure_attached()?;
        let before = surface.text()?;
        let plan = edit.replan(&before).inspect_err(|e| {
            tracing::warn!(target: "lingo::mutation", error = %e, "target changed before the edit landed, edit abandoned");
        })?;

        if let Err(e) = strategy.apply(surface, &plan).await {
            tracing::debug!(target: "lingo::mutation", strategy = strategy.name(), error = %e, "strategy failed, trying next");
            continue;
        }

        surface.ensure_attached()?;
        let after = surface.text()?;
        if after == before {
            tracing::debug!(target: "lingo::mutation", strategy = strategy.name(), "no visible change, trying next");
            continue;
        }
        if after != plan.expected {
            tracing::warn!(
                target: "lingo::mutation",
                strategy = strategy.name(),
                "text differs from the planned result, edit abandoned"
            );
            return Err(MutationError::Diverged {
                strategy: strategy.name(),
            });
        }

        if let Err(e) = surface.set_caret_offset(plan.caret_after) {
            tracing::debug!(target: "lingo::mutation", error = %e, "could not place caret after edit");
        }
        tracing::debug!(target: "lingo::mutation", strategy = strategy.name(), "edit applied");
        return Ok(strategy.name());
    }

    tracing::warn!(target: "lingo::mutation", original = %edit.original, "all mutation strategies failed, edit abandoned");
    Err(MutationError::Exhausted)
}

/// Resolve a request against the surface's current text and run the cascade.
pub async fn apply_request<S: TextSurface + ?Sized>(
    surface: &S,
    request: &MutationRequest,
    strategies: &[Box<dyn MutationStrategy<S>>],
) -> Result<&'static str, MutationError> {
    surface.ensure_attached()?;
    let current = surface.text()?;
    let edit = request.resolve(&current)?;
    apply_with_fallback(surface, &edit, strategies).await
}

/// Replace the whole surface text with `transform(current)`.
///
/// Returns `Ok(None)` when the transform leaves the text unchanged.
pub async fn apply_transform<S, F>(
    surface: &S,
    transform: F,
    strategies: &[Box<dyn MutationStrategy<S>>],
) -> Result<Option<&'static str>, MutationError>
where
    S: TextSurface + ?Sized,
    F: FnOnce(&str) -> String,
{
    surface.ensure_attached()?;
    let current = surface.text()?;
    let next = transform(&current);
    if next == current {
        return Ok(None);
    }
    let edit = PlannedEdit::whole_buffer(&current, next);
    apply_with_fallback(surface, &edit, strategies).await.map(Some)
}
