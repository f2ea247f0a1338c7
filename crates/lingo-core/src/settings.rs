//! User settings as persisted by the extension's key-value store.
//!
//! The core only ever reads settings. Every field is optional on the wire:
//! a missing, null or mistyped key decodes to the feature's disabled/empty
//! default without disturbing its neighbours.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SettingsError;

/// Full settings snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Trigger prefix → expansion, offered by autocomplete. Order matters.
    pub shortcuts: IndexMap<String, String>,
    /// Whole-word replacements. Keys match case-insensitively.
    pub replacements: IndexMap<String, String>,
    /// Words deleted as soon as they are finished (case-insensitive).
    pub removed_words: Vec<String>,
    /// Literal substrings removed by the formatting pass, in this order.
    pub formatting_removed_words: Vec<String>,
    /// Quick-insert snippets, addressable by Alt+1..Alt+0.
    pub word_picker_items: Vec<String>,
    pub formatting: FormattingFlags,
    pub enabled: bool,
}

/// Toggles for the individual formatting steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormattingFlags {
    pub auto_capitalize: bool,
    pub smart_quotes: bool,
    pub remove_double_spaces: bool,
    pub space_after_punctuation: bool,
    pub remove_words: bool,
    pub convert_word_numbers: bool,
}

impl FormattingFlags {
    /// Every step switched on.
    pub const ALL: Self = Self {
        auto_capitalize: true,
        smart_quotes: true,
        remove_double_spaces: true,
        space_after_punctuation: true,
        remove_words: true,
        convert_word_numbers: true,
    };
}

impl Settings {
    /// Settings written on first install.
    pub fn install_defaults() -> Self {
        fn map(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        }
        fn list(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            shortcuts: map(&[
                ("brb", "be right back"),
                ("omw", "on my way"),
                ("email", "user@example.com"),
                ("shrug", "¯\\_(ツ)_/¯"),
                ("sp", "[short pause]"),
            ]),
            replacements: map(&[
                ("brb", "be right back"),
                ("omw", "on my way"),
                ("teh", "the"),
                ("dont", "don't"),
                ("cant", "can't"),
            ]),
            removed_words: list(&["literally", "basically"]),
            formatting_removed_words: list(&["[inhale]", "[exhale]", "[um]", "[uh]", "[hmm]"]),
            word_picker_items: list(&["Sincerely,", "Best regards,", "Thank you,"]),
            formatting: FormattingFlags::ALL,
            enabled: true,
        }
    }

    /// Decode a JSON object as read from the store.
    ///
    /// Each field decodes on its own. Entries of the wrong type inside a map
    /// or list are dropped; a field that cannot be read at all keeps its
    /// default.
    pub fn from_json(value: Value) -> Result<Self, SettingsError> {
        let mut object = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(object) => object,
            other => {
                return Err(SettingsError::Invalid(format!(
                    "expected an object, got {}",
                    json_kind(&other)
                )));
            }
        };

        let formatting = match object.remove("formatting") {
            Some(Value::Object(mut flags)) => FormattingFlags {
                auto_capitalize: field(&mut flags, "autoCapitalize"),
                smart_quotes: field(&mut flags, "smartQuotes"),
                remove_double_spaces: field(&mut flags, "removeDoubleSpaces"),
                space_after_punctuation: field(&mut flags, "spaceAfterPunctuation"),
                remove_words: field(&mut flags, "removeWords"),
                convert_word_numbers: field(&mut flags, "convertWordNumbers"),
            },
            None | Some(Value::Null) => FormattingFlags::default(),
            Some(other) => {
                skipped("formatting", &other);
                FormattingFlags::default()
            }
        };

        Ok(Self {
            shortcuts: string_map(&mut object, "shortcuts"),
            replacements: string_map(&mut object, "replacements"),
            removed_words: string_list(&mut object, "removedWords"),
            formatting_removed_words: string_list(&mut object, "formattingRemovedWords"),
            word_picker_items: string_list(&mut object, "wordPickerItems"),
            formatting,
            enabled: field(&mut object, "enabled"),
        })
    }

    /// Decode, falling back to empty settings when the object is malformed.
    pub fn from_json_or_default(value: Value) -> Self {
        Self::from_json(value).unwrap_or_else(|e| {
            tracing::warn!(target: "lingo::settings", error = %e, "unreadable settings, using empty settings");
            Self::default()
        })
    }

    /// Look up a replacement for a finished word, ignoring case.
    pub fn replacement_for(&self, word: &str) -> Option<&str> {
        let lower = word.to_lowercase();
        self.replacements
            .iter()
            .find(|(k, _)| k.to_lowercase() == lower)
            .map(|(_, v)| v.as_str())
    }

    /// Whether a finished word is on the auto-remove list, ignoring case.
    pub fn is_removed_word(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        self.removed_words.iter().any(|w| w.to_lowercase() == lower)
    }

    /// Whether a word is a shortcut trigger, as typed or lowercased.
    pub fn is_shortcut(&self, word: &str) -> bool {
        self.shortcuts.contains_key(word) || self.shortcuts.contains_key(&word.to_lowercase())
    }

    /// Picker item addressed by a zero-based hotkey index.
    pub fn picker_item(&self, index: usize) -> Option<&str> {
        self.word_picker_items.get(index).map(String::as_str)
    }
}

/// Top-level keys of the install defaults that are absent from `stored`.
///
/// The background worker writes the returned patch on install and update, so
/// settings added in a new release appear without clobbering user edits.
pub fn missing_defaults(stored: &Map<String, Value>) -> Map<String, Value> {
    let Ok(Value::Object(defaults)) = serde_json::to_value(Settings::install_defaults()) else {
        return Map::new();
    };

    defaults
        .into_iter()
        .filter(|(key, _)| stored.get(key).is_none_or(Value::is_null))
        .collect()
}

fn skipped(key: &str, value: &Value) {
    tracing::debug!(target: "lingo::settings", key, kind = json_kind(value), "ignoring unreadable setting");
}

fn field<T: DeserializeOwned + Default>(object: &mut Map<String, Value>, key: &str) -> T {
    match object.remove(key) {
        None | Some(Value::Null) => T::default(),
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|_| {
            skipped(key, &value);
            T::default()
        }),
    }
}

fn string_map(object: &mut Map<String, Value>, key: &str) -> IndexMap<String, String> {
    match object.remove(key) {
        None | Some(Value::Null) => IndexMap::new(),
        Some(Value::Object(entries)) => entries
            .into_iter()
            .filter_map(|(k, v)| match v {
                Value::String(v) => Some((k, v)),
                other => {
                    skipped(&format!("{key}.{k}"), &other);
                    None
                }
            })
            .collect(),
        Some(other) => {
            skipped(key, &other);
            IndexMap::new()
        }
    }
}

fn string_list(object: &mut Map<String, Value>, key: &str) -> Vec<String> {
    match object.remove(key) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(item) => Some(item),
                other => {
                    skipped(key, &other);
                    None
                }
            })
            .collect(),
        Some(other) => {
            skipped(key, &other);
            Vec::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_keys_are_disabled() {
        let settings = Settings::from_json(json!({ "shortcuts": { "sp": "[short pause]" } })).unwrap();
        assert!(!settings.enabled);
        assert!(settings.replacements.is_empty());
        assert_eq!(settings.formatting, FormattingFlags::default());
        assert_eq!(settings.shortcuts.get("sp").map(String::as_str), Some("[short pause]"));
    }

    #[test]
    fn test_shortcut_order_preserved() {
        let settings = Settings::from_json(json!({
            "shortcuts": { "sp": "[short pause]", "sg": "[sigh]", "sa": "[sad]" }
        }))
        .unwrap();
        let keys: Vec<_> = settings.shortcuts.keys().map(String::as_str).collect();
        assert_eq!(keys, ["sp", "sg", "sa"]);
    }

    #[test]
    fn test_camel_case_fields() {
        let settings = Settings::from_json(json!({
            "removedWords": ["Literally"],
            "formattingRemovedWords": ["[um]"],
            "wordPickerItems": ["Okay."],
            "formatting": { "autoCapitalize": true, "convertWordNumbers": true },
            "enabled": true
        }))
        .unwrap();
        assert!(settings.is_removed_word("LITERALLY"));
        assert_eq!(settings.formatting_removed_words, ["[um]"]);
        assert_eq!(settings.picker_item(0), Some("Okay."));
        assert!(settings.formatting.auto_capitalize);
        assert!(settings.formatting.convert_word_numbers);
        assert!(!settings.formatting.smart_quotes);
    }

    #[test]
    fn test_malformed_settings_fall_back_to_empty() {
        assert_eq!(Settings::from_json_or_default(json!("nope")), Settings::default());
        assert_eq!(
            Settings::from_json_or_default(json!({ "shortcuts": 12 })),
            Settings::default()
        );
        assert_eq!(Settings::from_json_or_default(Value::Null), Settings::default());
    }

    #[test]
    fn test_bad_field_keeps_the_others() {
        let settings = Settings::from_json_or_default(json!({
            "enabled": true,
            "shortcuts": { "sp": "[short pause]" },
            "replacements": null
        }));
        assert!(settings.enabled);
        assert_eq!(settings.shortcuts.get("sp").map(String::as_str), Some("[short pause]"));
        assert!(settings.replacements.is_empty());

        let settings = Settings::from_json(json!({
            "enabled": "yes",
            "shortcuts": { "sp": "[short pause]", "bad": 3 },
            "removedWords": ["um", null, "uh"],
            "wordPickerItems": "Okay.",
            "formatting": { "autoCapitalize": true, "smartQuotes": 1 }
        }))
        .unwrap();
        assert!(!settings.enabled);
        assert_eq!(settings.shortcuts.len(), 1);
        assert_eq!(settings.removed_words, ["um", "uh"]);
        assert!(settings.word_picker_items.is_empty());
        assert!(settings.formatting.auto_capitalize);
        assert!(!settings.formatting.smart_quotes);
    }

    #[test]
    fn test_replacement_lookup_ignores_case() {
        let mut settings = Settings::default();
        settings.replacements.insert("Teh".into(), "the".into());
        assert_eq!(settings.replacement_for("TEH"), Some("the"));
        assert_eq!(settings.replacement_for("teh"), Some("the"));
        assert_eq!(settings.replacement_for("tea"), None);
    }

    #[test]
    fn test_missing_defaults_only_fills_absent_keys() {
        let stored = json!({ "enabled": false, "shortcuts": {}, "replacements": null });
        let patch = missing_defaults(stored.as_object().unwrap());

        assert!(!patch.contains_key("enabled"));
        assert!(!patch.contains_key("shortcuts"));
        assert!(patch.contains_key("replacements"));
        assert!(patch.contains_key("wordPickerItems"));
        assert_eq!(patch["removedWords"], json!(["literally", "basically"]));
    }

    #[test]
    fn test_missing_defaults_on_fresh_install() {
        let patch = missing_defaults(&Map::new());
        let settings = Settings::from_json(Value::Object(patch)).unwrap();
        assert_eq!(settings, Settings::install_defaults());
    }
}
