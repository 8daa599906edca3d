// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Interaction state shared by every structure: mode, selection, clipboard, default element and
//! the active structure's history and display settings.

use crate::crystolecule::error::ModelError;
use crate::crystolecule::functional_group::{builtin_group, FunctionalGroup};
use crate::crystolecule::geometry::smart_offset_with;
use crate::crystolecule::model::Model;
use crate::editor::clipboard::Clipboard;
use crate::editor::error::EditorError;
use crate::editor::history::History;
use crate::editor::selection::Selection;
use crate::editor::settings::EditorSettings;
use glam::f64::DVec3;
use log::{debug, warn};
use periodic_table::Element;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    Manual,
    /// New atoms and pasted fragments are placed clear of existing atoms
    Smart,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectMode {
    #[default]
    Rectangle,
    Lasso,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MoveMode {
    #[default]
    Translate,
    Orbit,
    Trackball,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Edit(EditMode),
    Select(SelectMode),
    Move(MoveMode),
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Edit(EditMode::default())
    }
}

/// Display settings kept per structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureSettings {
    pub bond_threshold: f64,
    pub display_scale: f64,
}

impl StructureSettings {
    pub fn from_editor_settings(settings: &EditorSettings) -> Self {
        Self {
            bond_threshold: settings.bond_threshold,
            display_scale: settings.display_scale,
        }
    }
}

#[derive(Debug)]
pub struct Editor {
    pub mode: Mode,
    pub selection: Selection,
    /// History of the active structure
    pub history: History,
    /// Display settings of the active structure
    pub structure_settings: StructureSettings,
    clipboard: Option<Clipboard>,
    default_element: i16,
    selected_group: String,
    settings: EditorSettings,
}

impl Editor {
    pub fn new(settings: EditorSettings) -> Self {
        let default_element = periodic_table::atomic_number_from_symbol(&settings.default_element)
            .unwrap_or_else(|| {
                warn!(
                    "unknown default element '{}', using carbon",
                    settings.default_element
                );
                Element::Carbon.atomic_number() as i16
            });
        Self {
            mode: Mode::default(),
            selection: Selection::new(),
            history: History::new(settings.history_capacity),
            structure_settings: StructureSettings::from_editor_settings(&settings),
            clipboard: None,
            default_element,
            selected_group: "methyl".to_string(),
            settings,
        }
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn default_element(&self) -> i16 {
        self.default_element
    }

    pub fn set_default_element(&mut self, symbol: &str) -> Result<(), ModelError> {
        self.default_element = periodic_table::atomic_number_from_symbol(symbol)
            .ok_or_else(|| ModelError::UnknownElement(symbol.to_string()))?;
        Ok(())
    }

    pub fn selected_group_name(&self) -> &str {
        &self.selected_group
    }

    pub fn selected_group(&self) -> Result<FunctionalGroup, ModelError> {
        builtin_group(&self.selected_group)
            .ok_or_else(|| ModelError::InvalidGroup(format!("no group named '{}'", self.selected_group)))
    }

    pub fn select_group(&mut self, name: &str) -> Result<(), ModelError> {
        if builtin_group(name).is_none() {
            return Err(ModelError::InvalidGroup(format!("no group named '{}'", name)));
        }
        self.selected_group = name.to_string();
        Ok(())
    }

    pub fn clipboard(&self) -> Option<&Clipboard> {
        self.clipboard.as_ref()
    }

    pub fn set_clipboard(&mut self, clipboard: Clipboard) {
        self.clipboard = Some(clipboard);
    }

    /// Copies the selected atoms. Returns how many were copied.
    pub fn copy_selection(&mut self, model: &Model) -> Result<usize, EditorError> {
        if self.selection.is_empty() {
            return Err(EditorError::NothingSelected);
        }
        let clipboard = Clipboard::copy(model.structure(), self.selection.atoms())?;
        let count = clipboard.len();
        self.clipboard = Some(clipboard);
        Ok(count)
    }

    /// Pastes the clipboard into `model` and selects the pasted atoms. In smart edit mode the
    /// copy is lifted along +z until it clears the existing atoms, otherwise it is shifted by the
    /// configured paste offset.
    pub fn paste(&mut self, model: &mut Model) -> Result<Vec<u32>, EditorError> {
        let clipboard = self.clipboard.as_ref().ok_or(EditorError::EmptyClipboard)?;
        let offset = match self.mode {
            Mode::Edit(EditMode::Smart) => {
                let fixed: Vec<DVec3> = model.structure().iter_atoms().map(|a| a.position).collect();
                let moving: Vec<DVec3> = clipboard.atoms().iter().map(|a| a.position).collect();
                self.smart_offset(&fixed, &moving)
            }
            _ => self.settings.paste_offset,
        };
        let ids = clipboard.paste(model.structure_mut(), offset)?;
        self.selection.set(ids.iter().copied());
        Ok(ids)
    }

    /// Offset that separates `moving` from `fixed` using the configured smart-offset parameters.
    pub fn smart_offset(&self, fixed: &[DVec3], moving: &[DVec3]) -> DVec3 {
        smart_offset_with(
            fixed,
            moving,
            self.settings.smart_offset_min_distance,
            self.settings.smart_offset_step,
            self.settings.smart_offset_max_steps,
        )
    }

    pub fn save_state(&mut self, model: &Model) {
        self.history.save_state(model.to_snapshot());
    }

    /// Restores the previous state into `model`. Returns false when there is nothing to undo.
    /// The history only moves once the state has been rebuilt.
    pub fn undo(&mut self, model: &mut Model) -> Result<bool, EditorError> {
        let Some(snapshot) = self.history.peek_undo() else {
            return Ok(false);
        };
        let restored = Model::from_snapshot(snapshot)?;
        self.history.undo();
        self.restore(model, restored);
        Ok(true)
    }

    pub fn redo(&mut self, model: &mut Model) -> Result<bool, EditorError> {
        let Some(snapshot) = self.history.peek_redo() else {
            return Ok(false);
        };
        let restored = Model::from_snapshot(snapshot)?;
        self.history.redo();
        self.restore(model, restored);
        Ok(true)
    }

    fn restore(&mut self, model: &mut Model, mut restored: Model) {
        // Renames are not part of the history.
        restored.set_name(model.name().to_string());
        *model = restored;
        self.selection.retain_existing(model.structure());
        debug!("restored '{}' with {} atoms", model.name(), model.structure().get_num_of_atoms());
    }
}
