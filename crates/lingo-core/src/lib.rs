//! lingo-core: platform-agnostic text enhancement logic.
//!
//! This crate provides:
//! - `TextSurface` trait over editable elements, with `MemorySurface` as a
//!   rope-backed implementation
//! - Word tracking and inline replacement decisions
//! - Mutation planning and the strategy cascade driver
//! - The autocomplete state machine, word picker state and hotkey map
//! - The formatting pipeline
//! - `EnhancerContext<S>`, the shared state the event handlers drive
//!
//! Nothing here touches the DOM; see `lingo-browser` for that.

pub mod autocomplete;
pub mod config;
pub mod context;
pub mod error;
pub mod formatting;
pub mod keymap;
pub mod mutation;
pub mod numbers;
pub mod offsets;
pub mod picker;
pub mod settings;
pub mod store;
pub mod surface;
pub mod tracking;
pub mod types;

pub use autocomplete::{Autocomplete, SessionChange, SessionKey, Suggestion, SuggestionSession};
pub use config::EngineConfig;
pub use context::{Edit, Effect, EnhancerContext, perform_edit};
pub use error::{MutationError, SettingsError, SurfaceError};
pub use formatting::{Transform, apply_replacements, format_all, format_text};
pub use keymap::{Command, Key, KeyCombo, KeydownResult, Modifiers, command_for};
pub use mutation::{
    Cascade, DirectReplace, EditScope, MutationRequest, MutationStrategy, PlannedEdit,
    apply_request, apply_transform, apply_with_fallback,
};
pub use numbers::convert_number_words;
pub use picker::Picker;
pub use settings::{FormattingFlags, Settings, missing_defaults};
pub use smol_str::SmolStr;
pub use store::{AuthGate, MemoryStore, SettingsStore, StaticAuth};
pub use surface::{MemorySurface, SurfaceKind, TextSurface};
pub use tracking::{InlineAction, WordSpan, current_word, finished_word, inline_action};
pub use types::{CaretRect, Range};
