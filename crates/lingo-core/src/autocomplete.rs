//! Autocomplete state machine.
//!
//! Closed until the current word is long enough and prefixes at least one
//! shortcut key. While open, arrow keys cycle the selection (wrapping both
//! ways) and Enter/Tab confirm. Any other caret movement closes it. Rendering lives in the browser crate; this
//! module only decides what is shown and what a confirmation writes.

use indexmap::IndexMap;

use crate::keymap::Key;
use crate::mutation::MutationRequest;
use crate::tracking::current_word;

/// One dropdown entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub trigger: String,
    pub expansion: String,
}

/// Shortcut entries whose key starts with `query`, in map order.
pub fn candidates(shortcuts: &IndexMap<String, String>, query: &str) -> Vec<Suggestion> {
    shortcuts
        .iter()
        .filter(|(key, _)| key.starts_with(query))
        .map(|(key, value)| Suggestion {
            trigger: key.clone(),
            expansion: value.clone(),
        })
        .collect()
}

/// An open dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionSession {
    pub query: String,
    pub candidates: Vec<Suggestion>,
    pub selected: usize,
    /// Caret offset when the query was read.
    pub caret: usize,
}

impl SuggestionSession {
    pub fn select_next(&mut self) {
        if !self.candidates.is_empty() {
            self.selected = (self.selected + 1) % self.candidates.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.candidates.is_empty() {
            self.selected = (self.selected + self.candidates.len() - 1) % self.candidates.len();
        }
    }

    pub fn selected(&self) -> Option<&Suggestion> {
        self.candidates.get(self.selected)
    }

    /// Request replacing the query with the suggestion at `index`.
    ///
    /// The expansion gets a trailing space unless it already ends with one.
    pub fn request_for(&self, index: usize) -> Option<MutationRequest> {
        let suggestion = self.candidates.get(index)?;
        let mut replacement = suggestion.expansion.clone();
        if !replacement.ends_with(' ') {
            replacement.push(' ');
        }
        Some(MutationRequest::new(self.query.clone(), replacement, self.caret))
    }
}

/// What an input event did to the dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    /// Opened, or re-opened with fresh candidates. Render it.
    Shown,
    /// Was open, now closed. Hide it.
    Hidden,
    /// Was closed, still closed.
    Unchanged,
}

/// Outcome of a keydown while the dropdown may be open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionKey {
    /// Key consumed; selection moved or dropdown closed. Re-render.
    Handled,
    /// Key consumed and the selected suggestion should be written.
    Confirm(MutationRequest),
    /// Not consumed, but the caret moves away so the dropdown closed.
    Closed,
    /// Not ours; let the page have it.
    NotHandled,
}

/// Dropdown controller.
#[derive(Debug, Clone, Default)]
pub struct Autocomplete {
    session: Option<SuggestionSession>,
    min_query_len: usize,
}

impl Autocomplete {
    pub fn new(min_query_len: usize) -> Self {
        Self {
            session: None,
            min_query_len,
        }
    }

    pub fn session(&self) -> Option<&SuggestionSession> {
        self.session.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Recompute the dropdown for an input event.
    ///
    /// An unknown caret closes the dropdown. A qualifying event always
    /// resets the selection to the first candidate.
    pub fn update(
        &mut self,
        shortcuts: &IndexMap<String, String>,
        text: &str,
        caret: Option<usize>,
    ) -> SessionChange {
        let next = caret.and_then(|caret| {
            let word = current_word(text, caret)?;
            if word.text.chars().count() < self.min_query_len {
                return None;
            }
            let candidates = candidates(shortcuts, &word.text);
            if candidates.is_empty() {
                return None;
            }
            Some(SuggestionSession {
                query: word.text,
                candidates,
                selected: 0,
                caret,
            })
        });

        let was_open = self.session.is_some();
        self.session = next;
        match (was_open, self.session.is_some()) {
            (_, true) => SessionChange::Shown,
            (true, false) => SessionChange::Hidden,
            (false, false) => SessionChange::Unchanged,
        }
    }

    /// Handle a navigation key. Only consumes keys while open.
    pub fn handle_key(&mut self, key: &Key) -> SessionKey {
        let Some(session) = self.session.as_mut() else {
            return SessionKey::NotHandled;
        };

        match key {
            Key::ArrowDown => {
                session.select_next();
                SessionKey::Handled
            }
            Key::ArrowUp => {
                session.select_prev();
                SessionKey::Handled
            }
            Key::Enter | Key::Tab => match self.confirm(None) {
                Some(request) => SessionKey::Confirm(request),
                None => SessionKey::Handled,
            },
            Key::Escape => {
                self.close();
                SessionKey::Handled
            }
            key if key.is_navigation() => {
                self.close();
                SessionKey::Closed
            }
            _ => SessionKey::NotHandled,
        }
    }

    /// Close the dropdown if the caret left the end of the query.
    ///
    /// Returns whether it closed. Covers clicks and selection changes that
    /// never reach the key handler.
    pub fn recheck(&mut self, text: &str, caret: Option<usize>) -> bool {
        let Some(session) = &self.session else {
            return false;
        };
        let still_at_query = caret.is_some_and(|caret| {
            caret == session.caret
                && current_word(text, caret).is_some_and(|word| word.text == session.query)
        });
        if still_at_query {
            return false;
        }
        tracing::debug!(target: "lingo::autocomplete", "caret left the query, closing");
        self.close()
    }

    /// Close the dropdown and return the request for the chosen suggestion.
    ///
    /// `index` picks a specific entry (a click); `None` takes the selection.
    pub fn confirm(&mut self, index: Option<usize>) -> Option<MutationRequest> {
        let session = self.session.take()?;
        let request = session.request_for(index.unwrap_or(session.selected));
        if let Some(r) = &request {
            tracing::debug!(target: "lingo::autocomplete", query = %r.original, "suggestion confirmed");
        }
        request
    }

    /// Close on escape, blur or focus change.
    pub fn close(&mut self) -> bool {
        self.session.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shortcuts() -> IndexMap<String, String> {
        let mut map = IndexMap::new();
        map.insert("sp".to_string(), "[short pause]".to_string());
        map.insert("sg".to_string(), "[sigh]".to_string());
        map.insert("shrug".to_string(), "¯\\_(ツ)_/¯".to_string());
        map.insert("brb".to_string(), "be right back ".to_string());
        map
    }

    #[test]
    fn test_candidate_order_and_wrap() {
        let mut map = IndexMap::new();
        map.insert("sp".to_string(), "[short pause]".to_string());
        map.insert("sg".to_string(), "[sigh]".to_string());

        let triggers: Vec<_> = candidates(&map, "s").into_iter().map(|s| s.trigger).collect();
        assert_eq!(triggers, ["sp", "sg"]);

        let mut session = SuggestionSession {
            query: "s".to_string(),
            candidates: candidates(&map, "s"),
            selected: 0,
            caret: 1,
        };
        session.select_next();
        assert_eq!(session.selected, 1);
        session.select_next();
        assert_eq!(session.selected, 0);
        session.select_prev();
        assert_eq!(session.selected, 1);
    }

    #[test]
    fn test_short_query_stays_closed() {
        let mut ac = Autocomplete::new(2);
        assert_eq!(ac.update(&shortcuts(), "s", Some(1)), SessionChange::Unchanged);
        assert!(!ac.is_open());
    }

    #[test]
    fn test_arrow_keys_cycle_open_session() {
        let mut ac = Autocomplete::new(2);
        let mut map = IndexMap::new();
        map.insert("sxp".to_string(), "[short pause]".to_string());
        map.insert("sxg".to_string(), "[sigh]".to_string());
        assert_eq!(ac.update(&map, "sx", Some(2)), SessionChange::Shown);
        assert_eq!(ac.session().unwrap().selected, 0);

        assert_eq!(ac.handle_key(&Key::ArrowDown), SessionKey::Handled);
        assert_eq!(ac.session().unwrap().selected, 1);
        ac.handle_key(&Key::ArrowDown);
        assert_eq!(ac.session().unwrap().selected, 0);
        ac.handle_key(&Key::ArrowUp);
        assert_eq!(ac.session().unwrap().selected, 1);
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        let mut ac = Autocomplete::new(2);
        assert_eq!(ac.update(&shortcuts(), "SH", Some(2)), SessionChange::Unchanged);
        assert_eq!(ac.update(&shortcuts(), "sh", Some(2)), SessionChange::Shown);
    }

    #[test]
    fn test_closes_when_candidates_empty_or_caret_unknown() {
        let mut ac = Autocomplete::new(2);
        assert_eq!(ac.update(&shortcuts(), "sh", Some(2)), SessionChange::Shown);
        assert_eq!(ac.update(&shortcuts(), "shx", Some(3)), SessionChange::Hidden);

        assert_eq!(ac.update(&shortcuts(), "sh", Some(2)), SessionChange::Shown);
        assert_eq!(ac.update(&shortcuts(), "sh", None), SessionChange::Hidden);

        assert_eq!(ac.update(&shortcuts(), "sh", Some(2)), SessionChange::Shown);
        assert_eq!(ac.update(&shortcuts(), "sh ", Some(3)), SessionChange::Hidden);
    }

    #[test]
    fn test_reopen_resets_selection() {
        let mut ac = Autocomplete::new(2);
        ac.update(&shortcuts(), "s", Some(1));
        ac.update(&shortcuts(), "sp", Some(2));
        ac.update(&shortcuts(), "s", Some(1));
        ac.update(&shortcuts(), "sh", Some(2));
        assert_eq!(ac.session().unwrap().selected, 0);
    }

    #[test]
    fn test_confirm_appends_space() {
        let mut ac = Autocomplete::new(2);
        ac.update(&shortcuts(), "hi sp", Some(5));
        let request = match ac.handle_key(&Key::Enter) {
            SessionKey::Confirm(r) => r,
            other => panic!("expected confirm, got {other:?}"),
        };
        assert_eq!(request, MutationRequest::new("sp", "[short pause] ", 5));
        assert!(!ac.is_open());
    }

    #[test]
    fn test_confirm_keeps_existing_trailing_space() {
        let mut ac = Autocomplete::new(2);
        ac.update(&shortcuts(), "brb", Some(3));
        let request = ac.confirm(Some(0)).unwrap();
        assert_eq!(request.replacement, "be right back ");
    }

    #[test]
    fn test_escape_closes_and_keys_pass_when_closed() {
        let mut ac = Autocomplete::new(2);
        assert_eq!(ac.handle_key(&Key::ArrowDown), SessionKey::NotHandled);
        ac.update(&shortcuts(), "sg", Some(2));
        assert_eq!(ac.handle_key(&Key::character("x")), SessionKey::NotHandled);
        assert_eq!(ac.handle_key(&Key::Escape), SessionKey::Handled);
        assert!(!ac.is_open());
    }

    #[test]
    fn test_caret_movement_closes_session() {
        for key in [Key::ArrowLeft, Key::ArrowRight, Key::Home, Key::End, Key::PageUp] {
            let mut ac = Autocomplete::new(2);
            ac.update(&shortcuts(), "sh", Some(2));
            assert_eq!(ac.handle_key(&key), SessionKey::Closed, "{key:?}");
            assert!(!ac.is_open());
            assert_eq!(ac.handle_key(&Key::Enter), SessionKey::NotHandled);
        }
    }

    #[test]
    fn test_recheck_closes_when_caret_moves() {
        let mut ac = Autocomplete::new(2);
        ac.update(&shortcuts(), "sh and", Some(2));
        assert!(!ac.recheck("sh and", Some(2)));
        assert!(ac.is_open());

        assert!(ac.recheck("sh and", Some(6)));
        assert!(!ac.is_open());
        assert!(!ac.recheck("sh and", Some(6)));

        ac.update(&shortcuts(), "sh", Some(2));
        assert!(ac.recheck("sx", Some(2)));
        ac.update(&shortcuts(), "sh", Some(2));
        assert!(ac.recheck("sh", None));
    }
}
