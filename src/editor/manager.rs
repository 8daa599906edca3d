// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Named collection of structures. The active structure's history and display settings live in
//! the [`Editor`]; every other entry keeps its own until it is switched to.

use crate::crystolecule::atomic_structure::AtomicStructure;
use crate::crystolecule::crystal::Crystal;
use crate::crystolecule::error::ModelError;
use crate::crystolecule::functional_group::{attach_group, AttachOptions, FunctionalGroup};
use crate::crystolecule::model::Model;
use crate::editor::editor::{Editor, StructureSettings};
use crate::editor::error::EditorError;
use crate::editor::history::History;
use glam::f64::DVec3;
use indexmap::IndexMap;
use log::{debug, info};

const DEFAULT_STRUCTURE_NAME: &str = "molecule";

#[derive(Debug)]
struct StructureEntry {
    model: Model,
    history: History,
    settings: StructureSettings,
    /// The cell as first imported or created
    original_crystal: Option<Crystal>,
}

#[derive(Debug)]
pub struct MoleculeManager {
    entries: IndexMap<String, StructureEntry>,
    active: usize,
    lattice_fixed: bool,
}

impl MoleculeManager {
    /// Manager holding `model` as its only, active, structure.
    pub fn new(model: Model, editor: &mut Editor) -> Self {
        let mut manager = Self {
            entries: IndexMap::new(),
            active: 0,
            lattice_fixed: false,
        };
        manager.add(model, editor);
        manager.swap_active_state(editor);
        manager
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn model(&self, name: &str) -> Option<&Model> {
        self.entries.get(name).map(|entry| &entry.model)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_name(&self) -> &str {
        self.entries
            .get_index(self.active)
            .map(|(name, _)| name.as_str())
            .unwrap_or_default()
    }

    pub fn active_model(&self) -> &Model {
        &self.entries[self.active].model
    }

    pub fn active_model_mut(&mut self) -> &mut Model {
        &mut self.entries[self.active].model
    }

    /// `base` if unused, otherwise `base_1`, `base_2`, ...
    pub fn unique_name(&self, base: &str) -> String {
        let base = if base.trim().is_empty() {
            DEFAULT_STRUCTURE_NAME
        } else {
            base.trim()
        };
        if !self.entries.contains_key(base) {
            return base.to_string();
        }
        let mut counter = 1;
        loop {
            let candidate = format!("{}_{}", base, counter);
            if !self.entries.contains_key(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Adds `model` without activating it and returns the name it was stored under.
    pub fn add(&mut self, model: Model, editor: &Editor) -> String {
        let original = model
            .as_crystal()
            .filter(|crystal| crystal.lattice().is_some())
            .cloned();
        self.add_with_original(model, original, editor)
    }

    /// Adds a structure derived from another one, carrying over the cell the lattice-fixing
    /// toggle refers to.
    pub fn add_with_original(
        &mut self,
        mut model: Model,
        original_crystal: Option<Crystal>,
        editor: &Editor,
    ) -> String {
        let name = self.unique_name(model.name());
        model.set_name(name.clone());
        let history = History::with_initial(editor.settings().history_capacity, model.to_snapshot());
        self.entries.insert(
            name.clone(),
            StructureEntry {
                model,
                history,
                settings: StructureSettings::from_editor_settings(editor.settings()),
                original_crystal,
            },
        );
        info!("created structure '{}'", name);
        name
    }

    /// Adds `model` and makes it active.
    pub fn create(&mut self, model: Model, editor: &mut Editor) -> Result<String, EditorError> {
        let name = self.add(model, editor);
        self.switch_to(&name, editor)?;
        Ok(name)
    }

    pub fn switch_to(&mut self, name: &str, editor: &mut Editor) -> Result<(), EditorError> {
        let target = self
            .entries
            .get_index_of(name)
            .ok_or_else(|| EditorError::UnknownStructure(name.to_string()))?;
        if target == self.active {
            return Ok(());
        }
        self.swap_active_state(editor);
        self.active = target;
        self.swap_active_state(editor);
        editor.selection.clear();
        info!("switched to '{}'", name);
        Ok(())
    }

    /// Removes a structure. The last one cannot be removed; removing the active one activates
    /// the entry before it (or after it, if it was first).
    pub fn remove(&mut self, name: &str, editor: &mut Editor) -> Result<(), EditorError> {
        let index = self
            .entries
            .get_index_of(name)
            .ok_or_else(|| EditorError::UnknownStructure(name.to_string()))?;
        if self.entries.len() == 1 {
            return Err(EditorError::LastStructure);
        }
        if index == self.active {
            self.entries.shift_remove_index(index);
            self.active = index.saturating_sub(1).min(self.entries.len() - 1);
            // The editor still holds the removed entry's state; take the new active one's.
            self.swap_active_state(editor);
            editor.selection.clear();
            info!("removed active structure '{}', now at '{}'", name, self.active_name());
        } else {
            self.remove_inactive(index);
            info!("removed structure '{}'", name);
        }
        Ok(())
    }

    /// Renames a structure, keeping its position. Returns the name actually used, which gets a
    /// counter suffix if `new_name` is taken.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> Result<String, EditorError> {
        let index = self
            .entries
            .get_index_of(old_name)
            .ok_or_else(|| EditorError::UnknownStructure(old_name.to_string()))?;
        if old_name == new_name {
            return Ok(new_name.to_string());
        }
        let name = self.unique_name(new_name);
        self.entries = self
            .entries
            .drain(..)
            .enumerate()
            .map(|(i, (key, mut entry))| {
                if i == index {
                    entry.model.set_name(name.clone());
                    (name.clone(), entry)
                } else {
                    (key, entry)
                }
            })
            .collect();
        info!("renamed '{}' to '{}'", old_name, name);
        Ok(name)
    }

    /// Moves every atom of `source` into the active structure, lifted clear of the existing
    /// atoms, and removes `source`. Returns the new ids in source order.
    pub fn merge(&mut self, source: &str, editor: &mut Editor) -> Result<Vec<u32>, EditorError> {
        let source_index = self.inactive_index(source)?;
        let mut incoming: AtomicStructure = self.entries[source_index].model.structure().clone();

        let target = self.entries[self.active].model.structure_mut();
        let fixed: Vec<DVec3> = target.iter_atoms().map(|a| a.position).collect();
        let moving: Vec<DVec3> = incoming.iter_atoms().map(|a| a.position).collect();
        let offset = editor.smart_offset(&fixed, &moving);
        let all: Vec<u32> = incoming.atom_ids().collect();
        incoming.translate_atoms(&all, offset)?;

        let id_map = target.add_atomic_structure(&incoming);
        let new_ids: Vec<u32> = all.iter().filter_map(|id| id_map.get(id).copied()).collect();
        debug!("merged {} atoms from '{}' with offset {:?}", new_ids.len(), source, offset);

        self.remove_inactive(source_index);
        editor.selection.set(new_ids.iter().copied());
        Ok(new_ids)
    }

    /// Attaches the structure `source` to `host_anchor` in the active structure and removes
    /// `source`.
    ///
    /// The source's attachment pair is `source_pair` (anchor, leaving atom) or, when absent, its
    /// first dummy atom with exactly one neighbor. The new bond points from the host anchor
    /// towards `host_leaving`, which is removed, or along the VSEPR direction when no leaving atom
    /// is given.
    pub fn substitute_group(
        &mut self,
        host_anchor: u32,
        host_leaving: Option<u32>,
        source: &str,
        source_pair: Option<(u32, u32)>,
        editor: &mut Editor,
    ) -> Result<Vec<u32>, EditorError> {
        let source_index = self.inactive_index(source)?;
        let source_structure = self.entries[source_index].model.structure();
        let leaving = match source_pair {
            Some((anchor, leaving)) => {
                if !source_structure.has_bond_between(anchor, leaving) {
                    return Err(ModelError::InvalidGroup(format!(
                        "atoms {} and {} of '{}' are not bonded",
                        anchor, leaving, source
                    ))
                    .into());
                }
                leaving
            }
            None => terminal_dummy(source_structure)?,
        };
        let group = FunctionalGroup::from_structure(source_structure, leaving)?;

        let model = &mut self.entries[self.active].model;
        let mut staged = model.clone();
        let direction = match host_leaving {
            Some(leaving_id) => {
                let structure = staged.structure();
                if !structure.has_bond_between(host_anchor, leaving_id) {
                    return Err(ModelError::InvalidArgument(format!(
                        "atom {} is not bonded to the host anchor {}",
                        leaving_id, host_anchor
                    ))
                    .into());
                }
                let direction = structure.atom_position(leaving_id)? - structure.atom_position(host_anchor)?;
                staged.remove_atom(leaving_id);
                Some(direction)
            }
            None => None,
        };
        let new_ids = attach_group(
            staged.structure_mut(),
            host_anchor,
            &group,
            AttachOptions {
                direction,
                bond_length: None,
            },
        )?;
        *model = staged;

        self.remove_inactive(source_index);
        editor.selection.set(new_ids.iter().copied());
        info!("substituted '{}' onto atom {}", source, host_anchor);
        Ok(new_ids)
    }

    pub fn lattice_fixed(&self) -> bool {
        self.lattice_fixed
    }

    pub fn set_lattice_fixed(&mut self, fixed: bool) {
        self.lattice_fixed = fixed;
    }

    pub fn original_crystal(&self) -> Option<&Crystal> {
        self.entries[self.active].original_crystal.as_ref()
    }

    /// The crystal supercell and slab generation read: the originally imported cell while the
    /// lattice is fixed, the active structure otherwise.
    pub fn lattice_source(&self) -> Result<&Crystal, ModelError> {
        let entry = &self.entries[self.active];
        if self.lattice_fixed {
            if let Some(original) = &entry.original_crystal {
                return Ok(original);
            }
        }
        entry.model.as_crystal().ok_or(ModelError::MissingLattice)
    }

    fn inactive_index(&self, name: &str) -> Result<usize, EditorError> {
        let index = self
            .entries
            .get_index_of(name)
            .ok_or_else(|| EditorError::UnknownStructure(name.to_string()))?;
        if index == self.active {
            return Err(ModelError::InvalidArgument(format!(
                "'{}' is the active structure",
                name
            ))
            .into());
        }
        Ok(index)
    }

    fn remove_inactive(&mut self, index: usize) {
        self.entries.shift_remove_index(index);
        if index < self.active {
            self.active -= 1;
        }
    }

    /// Exchanges the editor's per-structure state with the active entry's.
    fn swap_active_state(&mut self, editor: &mut Editor) {
        let entry = &mut self.entries[self.active];
        std::mem::swap(&mut editor.history, &mut entry.history);
        std::mem::swap(&mut editor.structure_settings, &mut entry.settings);
    }
}

/// First dummy atom bonded to exactly one other atom.
fn terminal_dummy(structure: &AtomicStructure) -> Result<u32, ModelError> {
    structure
        .iter_atoms()
        .find(|atom| atom.is_dummy() && atom.bonds.len() == 1)
        .map(|atom| atom.id)
        .ok_or_else(|| {
            ModelError::InvalidGroup(format!(
                "'{}' has no terminal dummy atom to attach through",
                structure.name()
            ))
        })
}
