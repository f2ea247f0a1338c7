//! Word picker tray state.

use crate::mutation::MutationRequest;
use crate::settings::Settings;

/// Visibility of the quick-insert tray. The overlay keeps its drag offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Picker {
    visible: bool,
}

impl Picker {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn toggle(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}

/// Request inserting picker item `index` at `caret`.
///
/// `None` when the index is out of range.
pub fn insert_request(settings: &Settings, index: usize, caret: usize) -> Option<MutationRequest> {
    let item = settings.picker_item(index)?;
    Some(MutationRequest::insert(item, caret))
}
