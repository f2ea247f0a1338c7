//! Formatting transform pipeline.
//!
//! Pure `text -> text` passes behind the formatting hotkeys:
//!
//! - [`format_text`] (Alt+F): cleanup and punctuation normalization
//! - [`apply_replacements`] (Alt+R): whole-word replacements only
//! - [`convert_number_words`](crate::numbers::convert_number_words) (Alt+N)
//! - [`format_all`] (Alt+A): replacements, numbers, then formatting
//!
//! Formatting is idempotent. Removing a listed word can splice together a new
//! occurrence of another, so [`format_text`] repeats the pipeline until the
//! output stops changing.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex_lite::{Captures, Regex};

use crate::numbers::convert_number_words;
use crate::settings::{FormattingFlags, Settings};

/// Upper bound on pipeline repetitions in [`format_text`].
/// Punctuation that gets exactly one following space.
fn is_spaced_punct(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | ',' | ';' | ':')
}

fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Delete every literal occurrence of each entry, in list order, until none
/// is left. A deletion can splice together a new occurrence.
pub fn remove_listed_words(text: &str, words: &[String]) -> String {
    let mut current = text.to_string();
    loop {
        let next = words
            .iter()
            .filter(|w| !w.is_empty())
            .fold(current.clone(), |acc, w| acc.replace(w.as_str(), ""));
        // Each round either shrinks the text or leaves it unchanged.
        if next.len() == current.len() {
            return next;
        }
        current = next;
    }
}

static BRACKETED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").unwrap());

/// Inside each non-empty `[...]`, strip edge commas, periods and whitespace,
/// and lowercase.
pub fn normalize_brackets(text: &str) -> String {
    BRACKETED
        .replace_all(text, |caps: &Captures<'_>| {
            let inner = caps.get(1).map_or("", |m| m.as_str());
            let cleaned = inner.trim_matches(|c: char| c == ',' || c == '.' || c.is_whitespace());
            format!("[{}]", cleaned.to_lowercase())
        })
        .into_owned()
}

/// Give each of `. ! ? , ; :` exactly one space before the next non-space.
///
/// Whitespace runs (newlines included) between the mark and the next
/// character collapse to a single space. Trailing marks are left alone.
pub fn space_after_punctuation(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        if !is_spaced_punct(c) {
            continue;
        }
        let next = chars[i..]
            .iter()
            .position(|c| !c.is_whitespace())
            .map(|p| i + p);
        if let Some(next) = next {
            out.push(' ');
            i = next;
        }
    }
    out
}

/// Collapse runs of ASCII spaces to one.
pub fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_space = false;
    for c in text.chars() {
        if c == ' ' && prev_space {
            continue;
        }
        prev_space = c == ' ';
        out.push(c);
    }
    out
}

/// Uppercase the first `a-z` of the text and any `a-z` that follows
/// `. ! ?` plus at least one whitespace character.
pub fn capitalize_sentences(text: &str) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    if let Some(first) = chars.first_mut() {
        if first.is_ascii_lowercase() {
            *first = first.to_ascii_uppercase();
        }
    }

    let mut i = 0;
    while i < chars.len() {
        if !is_sentence_end(chars[i]) {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        while j < chars.len() && chars[j].is_whitespace() {
            j += 1;
        }
        if j > i + 1 && j < chars.len() && chars[j].is_ascii_lowercase() {
            chars[j] = chars[j].to_ascii_uppercase();
        }
        i = j.max(i + 1);
    }
    chars.into_iter().collect()
}

/// `"` to a left double quote and `'` to a right single quote, everywhere.
pub fn smart_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '"' => '\u{201C}',
            '\'' => '\u{2019}',
            other => other,
        })
        .collect()
}

/// One pass of the cleanup pipeline, without the replacement stages.
fn format_once(text: &str, removed: &[String], flags: FormattingFlags) -> String {
    let mut out = remove_listed_words(text, removed);
    out = normalize_brackets(&out);
    if flags.space_after_punctuation {
        out = space_after_punctuation(&out);
    }
    if flags.remove_double_spaces {
        out = collapse_spaces(&out);
    }
    if flags.auto_capitalize {
        out = capitalize_sentences(&out);
    }
    if flags.smart_quotes {
        out = smart_quotes(&out);
    }
    out.trim().to_string()
}

/// Repeat [`format_once`] until the output stops changing.
///
/// After the first pass, only removals and bracket trimming can still change
/// the text, and both shrink it, so the byte length bounds the loop.
fn format_to_fixpoint(text: &str, removed: &[String], flags: FormattingFlags) -> String {
    let mut current = format_once(text, removed, flags);
    for _ in 0..=current.len() {
        let next = format_once(&current, removed, flags);
        if next == current {
            return current;
        }
        current = next;
    }
    tracing::warn!(target: "lingo::formatting", "formatting did not settle, returning last pass");
    current
}

/// The Alt+F pipeline.
pub fn format_text(text: &str, settings: &Settings) -> String {
    format_to_fixpoint(text, &settings.formatting_removed_words, settings.formatting)
}

/// Replace every key of `replacements` as a whole word, ignoring case.
pub fn apply_replacements(text: &str, replacements: &IndexMap<String, String>) -> String {
    let mut out = text.to_string();
    for (key, value) in replacements {
        if key.is_empty() {
            continue;
        }
        let pattern = format!(r"(?i)\b{}\b", regex_lite::escape(key));
        match Regex::new(&pattern) {
            Ok(re) => {
                out = re
                    .replace_all(&out, regex_lite::NoExpand(value.as_str()))
                    .into_owned();
            }
            Err(e) => {
                tracing::debug!(target: "lingo::formatting", key = %key, error = %e, "skipping unusable replacement key");
            }
        }
    }
    out
}

/// Alt+N: number words to digits, when enabled.
pub fn convert_numbers(text: &str, settings: &Settings) -> String {
    if settings.formatting.convert_word_numbers {
        convert_number_words(text)
    } else {
        text.to_string()
    }
}

/// The Alt+A pass: replacements, numbers, then the formatting pipeline.
pub fn format_all(text: &str, settings: &Settings) -> String {
    let replaced = apply_replacements(text, &settings.replacements);
    let numbered = convert_numbers(&replaced, settings);
    format_text(&numbered, settings)
}

/// A whole-buffer transform bound to a hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transform {
    Format,
    Replace,
    FormatAll,
    Numbers,
}

impl Transform {
    pub fn apply(self, text: &str, settings: &Settings) -> String {
        match self {
            Transform::Format => format_text(text, settings),
            Transform::Replace => apply_replacements(text, &settings.replacements),
            Transform::FormatAll => format_all(text, settings),
            Transform::Numbers => convert_numbers(text, settings),
        }
    }

    /// Number conversion alone is a no-op unless switched on.
    pub fn is_enabled(self, settings: &Settings) -> bool {
        match self {
            Transform::Numbers => settings.formatting.convert_word_numbers,
            _ => true,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Transform::Format => "format",
            Transform::Replace => "replace",
            Transform::FormatAll => "format_all",
            Transform::Numbers => "numbers",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        let mut s = Settings {
            enabled: true,
            formatting: FormattingFlags::ALL,
            ..Default::default()
        };
        s.formatting_removed_words = vec!["[um]".into(), "[uh]".into()];
        s.replacements.insert("brb".into(), "be right back".into());
        s.replacements.insert("dont".into(), "don't".into());
        s
    }

    #[test]
    fn test_bracket_normalization() {
        assert_eq!(normalize_brackets("He said [ Um, ] hi"), "He said [um] hi");
        assert_eq!(normalize_brackets("[.SIGH.] and []"), "[sigh] and []");
    }

    #[test]
    fn test_space_after_punctuation() {
        assert_eq!(space_after_punctuation("hi,there.  ok"), "hi, there. ok");
        assert_eq!(space_after_punctuation("end.\nnext"), "end. next");
        assert_eq!(space_after_punctuation("trailing.  "), "trailing.  ");
        assert_eq!(space_after_punctuation("wait..."), "wait. . .");
    }

    #[test]
    fn test_capitalization() {
        assert_eq!(capitalize_sentences("hi. there! ok?yes"), "Hi. There! Ok?yes");
        assert_eq!(capitalize_sentences("émile. école"), "émile. école");
        assert_eq!(capitalize_sentences(""), "");
    }

    #[test]
    fn test_collapse_spaces_keeps_newlines() {
        assert_eq!(collapse_spaces("a   b \n  c"), "a b \n c");
    }

    #[test]
    fn test_format_text_snapshot() {
        let out = format_text(
            "  he said [ Um, ] \"hi\" ,and [um]left.it's   fine  ",
            &settings(),
        );
        insta::assert_snapshot!(out, @"He said “hi“ , and left. It’s fine");
    }

    #[test]
    fn test_removal_can_join_new_occurrences() {
        // Removing the inner "[um]" leaves a fresh "[um]" behind.
        let s = settings();
        let once = format_text("so [u[um]m] yes", &s);
        assert_eq!(once, "So yes");
        assert_eq!(format_text(&once, &s), once);
    }

    #[test]
    fn test_deeply_nested_removals_settle_in_one_call() {
        let s = settings();
        let mut nested = "[um]".to_string();
        for _ in 0..10 {
            nested = format!("[u{nested}m]");
        }
        assert_eq!(remove_listed_words(&nested, &s.formatting_removed_words), "");

        let once = format_text(&format!("ok {nested} yes"), &s);
        assert_eq!(once, "Ok yes");
        assert_eq!(format_text(&once, &s), once);
    }

    #[test]
    fn test_format_text_is_idempotent() {
        let s = settings();
        let inputs = [
            "hello world.how are you?fine",
            "  [ SIGH ] okay , so  'this' is \"it\"  ",
            "no punctuation here",
            "wait...what?!no",
            "line one.\n\nline two",
            "[um][uh] [ ,Hmm. ]",
        ];
        for input in inputs {
            let once = format_text(input, &s);
            assert_eq!(format_text(&once, &s), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_flags_off_only_removes_and_normalizes() {
        let mut s = settings();
        s.formatting = FormattingFlags::default();
        assert_eq!(
            format_text(" a  [um]b.c [ X ] ", &s),
            "a  b.c [x]"
        );
    }

    #[test]
    fn test_replacements_whole_word_case_insensitive() {
        let s = settings();
        assert_eq!(
            apply_replacements("BRB, I dont know brbx", &s.replacements),
            "be right back, I don't know brbx"
        );
    }

    #[test]
    fn test_replacement_values_are_literal() {
        let mut map = IndexMap::new();
        map.insert("cost".to_string(), "$5".to_string());
        assert_eq!(apply_replacements("the cost", &map), "the $5");
    }

    #[test]
    fn test_numbers_gated_by_flag() {
        let mut s = settings();
        assert_eq!(convert_numbers("two cats", &s), "2 cats");
        s.formatting.convert_word_numbers = false;
        assert_eq!(convert_numbers("two cats", &s), "two cats");
    }

    #[test]
    fn test_format_all_snapshot() {
        let out = format_all("brb in five minutes.dont wait [um]", &settings());
        insta::assert_snapshot!(out, @"Be right back in 5 minutes. Don’t wait");
    }
}
