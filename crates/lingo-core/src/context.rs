//! The process-wide enhancer context.
//!
//! One [`EnhancerContext`] holds everything the event handlers share: the
//! settings snapshot, the bound surface, the dropdown session and the picker.
//! Handlers are synchronous and return [`Effect`]s; the host performs the
//! effects afterwards, outside any borrow of the context, because edits
//! suspend on timers and clipboard promises.

use std::rc::Rc;

use crate::autocomplete::{Autocomplete, SessionChange, SessionKey};
use crate::config::EngineConfig;
use crate::error::MutationError;
use crate::formatting::Transform;
use crate::keymap::{Command, KeyCombo, KeydownResult, command_for};
use crate::mutation::{MutationRequest, MutationStrategy, apply_request, apply_transform};
use crate::picker::{Picker, insert_request};
use crate::settings::Settings;
use crate::surface::TextSurface;
use crate::tracking::inline_action;

/// An edit for the mutation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Replace text before the caret.
    Span(MutationRequest),
    /// Rewrite the whole buffer.
    Transform(Transform),
}

/// Work for the host to do after a handler returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Edit(Edit),
    /// Render the open suggestion session.
    ShowDropdown,
    HideDropdown,
    ShowPicker,
    HidePicker,
    /// Picker items changed; re-render the tray.
    RenderPicker,
}

fn dropdown_effect(change: SessionChange) -> Option<Effect> {
    match change {
        SessionChange::Shown => Some(Effect::ShowDropdown),
        SessionChange::Hidden => Some(Effect::HideDropdown),
        SessionChange::Unchanged => None,
    }
}

/// Shared state for one page.
pub struct EnhancerContext<S> {
    settings: Rc<Settings>,
    config: EngineConfig,
    surface: Option<S>,
    autocomplete: Autocomplete,
    picker: Picker,
    /// Edits started by the host and not yet finished.
    edits_in_flight: usize,
}

impl<S: TextSurface + Clone> EnhancerContext<S> {
    pub fn new(settings: Settings, config: EngineConfig) -> Self {
        let autocomplete = Autocomplete::new(config.min_query_len);
        Self {
            settings: Rc::new(settings),
            config,
            surface: None,
            autocomplete,
            picker: Picker::default(),
            edits_in_flight: 0,
        }
    }

    /// Snapshot of the current settings, cheap to hold across awaits.
    pub fn settings(&self) -> Rc<Settings> {
        self.settings.clone()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn autocomplete(&self) -> &Autocomplete {
        &self.autocomplete
    }

    pub fn picker(&self) -> &Picker {
        &self.picker
    }

    pub fn picker_mut(&mut self) -> &mut Picker {
        &mut self.picker
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    /// Handle to the bound surface, if it is still attached.
    pub fn active_surface(&self) -> Result<S, MutationError> {
        let surface = self.surface.as_ref().ok_or(MutationError::NoSurface)?;
        surface.ensure_attached()?;
        Ok(surface.clone())
    }

    /// Mark an edit as running. Input and selection events raised while any
    /// edit runs come from the strategies themselves and are not tracked.
    pub fn begin_edit(&mut self) {
        self.edits_in_flight += 1;
    }

    pub fn end_edit(&mut self) {
        self.edits_in_flight = self.edits_in_flight.saturating_sub(1);
    }

    pub fn is_applying(&self) -> bool {
        self.edits_in_flight > 0
    }

    /// Swap in new settings after a store change notification.
    pub fn reinit(&mut self, settings: Settings) -> Vec<Effect> {
        tracing::debug!(target: "lingo::context", "settings changed, reinitialising");
        self.settings = Rc::new(settings);
        let mut effects = Vec::new();
        if self.autocomplete.close() {
            effects.push(Effect::HideDropdown);
        }
        effects.push(Effect::RenderPicker);
        effects
    }

    /// Rebind on focus. `None` means focus moved outside any editable.
    pub fn on_focus(&mut self, surface: Option<S>) -> Vec<Effect> {
        if let Some(s) = &surface {
            tracing::trace!(target: "lingo::context", kind = s.kind().as_str(), "surface bound");
        }
        self.surface = surface;
        self.autocomplete
            .close()
            .then_some(Effect::HideDropdown)
            .into_iter()
            .collect()
    }

    /// The surface stays bound so picker clicks still reach it.
    pub fn on_blur(&mut self) -> Vec<Effect> {
        self.autocomplete
            .close()
            .then_some(Effect::HideDropdown)
            .into_iter()
            .collect()
    }

    /// Track the current word after an input event.
    pub fn on_input(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if !self.settings.enabled {
            if self.autocomplete.close() {
                effects.push(Effect::HideDropdown);
            }
            return effects;
        }
        if self.is_applying() {
            tracing::trace!(target: "lingo::tracking", "input during own edit ignored");
            return effects;
        }
        let Ok(surface) = self.active_surface() else {
            return effects;
        };

        let (text, caret) = match (surface.text(), surface.caret_offset()) {
            (Ok(text), Ok(caret)) => (text, caret),
            (Err(e), _) | (_, Err(e)) => {
                tracing::debug!(target: "lingo::tracking", error = %e, "could not read surface");
                return effects;
            }
        };

        let change = self
            .autocomplete
            .update(&self.settings.shortcuts, &text, caret);
        effects.extend(dropdown_effect(change));

        let Some(caret) = caret else {
            tracing::trace!(target: "lingo::tracking", "caret position unknown");
            return effects;
        };
        if let Some(request) = inline_action(&self.settings, &text, caret)
            .and_then(|action| action.request().cloned())
        {
            effects.push(Effect::Edit(Edit::Span(request)));
        }
        effects
    }

    /// The selection moved without a keydown we saw, e.g. a click.
    pub fn on_selection_change(&mut self) -> Vec<Effect> {
        if !self.autocomplete.is_open() || self.is_applying() {
            return Vec::new();
        }
        let Ok(surface) = self.active_surface() else {
            return Vec::new();
        };
        let (text, caret) = match (surface.text(), surface.caret_offset()) {
            (Ok(text), Ok(caret)) => (text, caret),
            (Err(e), _) | (_, Err(e)) => {
                tracing::debug!(target: "lingo::tracking", error = %e, "could not read surface");
                return Vec::new();
            }
        };
        self.autocomplete
            .recheck(&text, caret)
            .then_some(Effect::HideDropdown)
            .into_iter()
            .collect()
    }

    /// Route a keydown: hotkeys first, then dropdown navigation.
    pub fn on_keydown(&mut self, combo: &KeyCombo) -> (KeydownResult, Vec<Effect>) {
        if let Some(command) = command_for(combo) {
            return self.run_command(command);
        }

        let m = combo.modifiers;
        if m.ctrl || m.alt || m.meta {
            return (KeydownResult::NotHandled, Vec::new());
        }
        match self.autocomplete.handle_key(&combo.key) {
            SessionKey::NotHandled => (KeydownResult::NotHandled, Vec::new()),
            SessionKey::Closed => (KeydownResult::NotHandled, vec![Effect::HideDropdown]),
            SessionKey::Handled => {
                let effect = if self.autocomplete.is_open() {
                    Effect::ShowDropdown
                } else {
                    Effect::HideDropdown
                };
                (KeydownResult::Handled, vec![effect])
            }
            SessionKey::Confirm(request) => (
                KeydownResult::Handled,
                vec![Effect::HideDropdown, Effect::Edit(Edit::Span(request))],
            ),
        }
    }

    /// A dropdown entry was clicked.
    pub fn confirm_suggestion(&mut self, index: usize) -> Vec<Effect> {
        let mut effects = vec![Effect::HideDropdown];
        if let Some(request) = self.autocomplete.confirm(Some(index)) {
            effects.push(Effect::Edit(Edit::Span(request)));
        }
        effects
    }

    /// A picker chip was clicked, or a picker hotkey pressed.
    ///
    /// Inserts at the caret, or at the end when the caret cannot be read.
    pub fn insert_picker_item(&self, index: usize) -> Option<Effect> {
        let surface = self.active_surface().ok()?;
        let caret = match surface.caret_offset() {
            Ok(Some(caret)) => caret,
            Ok(None) => surface.text().ok()?.chars().count(),
            Err(e) => {
                tracing::debug!(target: "lingo::picker", error = %e, "could not read caret");
                return None;
            }
        };
        insert_request(&self.settings, index, caret).map(|r| Effect::Edit(Edit::Span(r)))
    }

    fn run_command(&mut self, command: Command) -> (KeydownResult, Vec<Effect>) {
        tracing::debug!(target: "lingo::keymap", ?command, "hotkey");
        let transform = match command {
            Command::Format => Transform::Format,
            Command::Replace => Transform::Replace,
            Command::FormatAll => Transform::FormatAll,
            Command::Numbers => Transform::Numbers,
            Command::TogglePicker => {
                let effect = if self.picker.toggle() {
                    Effect::ShowPicker
                } else {
                    Effect::HidePicker
                };
                return (KeydownResult::Handled, vec![effect]);
            }
            Command::InsertPickerItem(index) => {
                return match self.insert_picker_item(index) {
                    Some(effect) => (KeydownResult::Handled, vec![effect]),
                    None => (KeydownResult::NotHandled, Vec::new()),
                };
            }
        };

        if self.surface.is_none() || !transform.is_enabled(&self.settings) {
            return (KeydownResult::Handled, Vec::new());
        }
        let mut effects = Vec::new();
        if self.autocomplete.close() {
            effects.push(Effect::HideDropdown);
        }
        effects.push(Effect::Edit(Edit::Transform(transform)));
        (KeydownResult::Handled, effects)
    }
}

/// Carry out an edit against a surface.
///
/// Whole-buffer transforms flash the surface when they change something.
pub async fn perform_edit<S: TextSurface + ?Sized>(
    surface: &S,
    edit: &Edit,
    settings: &Settings,
    config: &EngineConfig,
    strategies: &[Box<dyn MutationStrategy<S>>],
) -> Result<(), MutationError> {
    match edit {
        Edit::Span(request) => {
            apply_request(surface, request, strategies).await?;
        }
        Edit::Transform(transform) => {
            let applied =
                apply_transform(surface, |text| transform.apply(text, settings), strategies).await?;
            if applied.is_some() {
                surface.flash(&config.flash_color, config.flash_duration);
            } else {
                tracing::debug!(target: "lingo::formatting", transform = transform.name(), "text already formatted");
            }
        }
    }
    Ok(())
}
