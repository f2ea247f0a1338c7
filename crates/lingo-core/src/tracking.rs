//! Caret and word tracking.
//!
//! Everything here works on a text snapshot plus a char caret offset, so the
//! same logic serves native inputs and contentEditable roots.

use crate::mutation::MutationRequest;
use crate::settings::Settings;
use crate::types::Range;

/// A run of text with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSpan {
    pub range: Range,
    pub text: String,
}

/// Characters that finish a word and fire inline replacement.
pub fn is_trigger(c: char) -> bool {
    c.is_whitespace() || matches!(c, '.' | '?' | '!' | ',' | ';' | ':' | ')' | ']')
}

/// Start of the maximal non-whitespace run ending at `end` in `chars`.
fn word_start(chars: &[char], end: usize) -> usize {
    chars[..end]
        .iter()
        .rposition(|c| c.is_whitespace())
        .map(|p| p + 1)
        .unwrap_or(0)
}

/// Maximal non-whitespace run ending exactly at the caret.
pub fn current_word(text: &str, caret: usize) -> Option<WordSpan> {
    let chars: Vec<char> = text.chars().collect();
    let caret = caret.min(chars.len());
    let start = word_start(&chars, caret);
    if start == caret {
        return None;
    }
    Some(WordSpan {
        range: Range::new(start, caret),
        text: chars[start..caret].iter().collect(),
    })
}

/// The char immediately before the caret, if it is a trigger.
pub fn trigger_char(text: &str, caret: usize) -> Option<char> {
    let c = text.chars().nth(caret.checked_sub(1)?)?;
    is_trigger(c).then_some(c)
}

/// The word finished by the trigger char before the caret.
///
/// Returns the word and the trigger. There is no finished word when the char
/// before the trigger is whitespace (or the trigger opens the text).
pub fn finished_word(text: &str, caret: usize) -> Option<(WordSpan, char)> {
    let trigger = trigger_char(text, caret)?;
    let chars: Vec<char> = text.chars().collect();
    let end = caret.min(chars.len()) - 1;
    let start = word_start(&chars, end);
    if start == end {
        return None;
    }
    Some((
        WordSpan {
            range: Range::new(start, end),
            text: chars[start..end].iter().collect(),
        },
        trigger,
    ))
}

/// What typing a trigger should do to the finished word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineAction {
    /// The word is a shortcut trigger and belongs to autocomplete.
    Shortcut,
    /// Swap the word for its replacement.
    Replace(MutationRequest),
    /// Delete the word, keeping the trigger.
    Remove(MutationRequest),
}

impl InlineAction {
    pub fn request(&self) -> Option<&MutationRequest> {
        match self {
            InlineAction::Shortcut => None,
            InlineAction::Replace(r) | InlineAction::Remove(r) => Some(r),
        }
    }
}

/// Decide the inline action for the text and caret of an input event.
///
/// Shortcut keys take precedence over replacements, and replacements over
/// removed words. Returns `None` when disabled or nothing applies.
pub fn inline_action(settings: &Settings, text: &str, caret: usize) -> Option<InlineAction> {
    if !settings.enabled {
        return None;
    }
    let (word, trigger) = finished_word(text, caret)?;

    if settings.is_shortcut(&word.text) {
        tracing::trace!(target: "lingo::tracking", word = %word.text, "finished word is a shortcut");
        return Some(InlineAction::Shortcut);
    }

    let original = format!("{}{}", word.text, trigger);
    if let Some(value) = settings.replacement_for(&word.text) {
        tracing::debug!(target: "lingo::tracking", word = %word.text, "inline replacement");
        return Some(InlineAction::Replace(MutationRequest::new(
            original,
            format!("{value}{trigger}"),
            caret,
        )));
    }

    if settings.is_removed_word(&word.text) {
        tracing::debug!(target: "lingo::tracking", word = %word.text, "inline removal");
        return Some(InlineAction::Remove(MutationRequest::new(
            original,
            trigger.to_string(),
            caret,
        )));
    }

    None
}
