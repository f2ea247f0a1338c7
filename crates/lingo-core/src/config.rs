//! Engine tuning that is not user-facing.

use std::time::Duration;

/// Timing and layout constants for the enhancer.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Shortest current word that opens the suggestion dropdown.
    pub min_query_len: usize,
    /// Wait between selecting the target and dispatching the paste event,
    /// so the host editor sees the selection change first.
    pub paste_settle: Duration,
    /// Wait after the paste event before checking whether it took effect.
    pub paste_grace: Duration,
    /// Pause between the delete burst and the insert burst of the keystroke tier.
    pub keystroke_pause: Duration,
    /// Vertical gap between the caret rectangle and the dropdown, in CSS px.
    pub overlay_offset_y: f64,
    /// Horizontal inset of the dropdown for native inputs, in CSS px.
    pub native_input_inset_x: f64,
    pub flash_color: String,
    pub flash_duration: Duration,
    /// Try the framework-props tier before paste.
    ///
    /// Content scripts live in an isolated world where page expandos are
    /// usually not visible, so this is off unless the script runs in the
    /// main world.
    pub probe_framework_handles: bool,
    /// Ancestors above the root searched for framework expandos.
    pub framework_ancestor_depth: usize,
    /// `return` links walked looking for an `onChange` prop.
    pub framework_fiber_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_query_len: 2,
            paste_settle: Duration::from_millis(10),
            paste_grace: Duration::from_millis(50),
            keystroke_pause: Duration::from_millis(10),
            overlay_offset_y: 5.0,
            native_input_inset_x: 20.0,
            flash_color: "#fffacd".to_string(),
            flash_duration: Duration::from_millis(200),
            probe_framework_handles: false,
            framework_ancestor_depth: 10,
            framework_fiber_depth: 50,
        }
    }
}
