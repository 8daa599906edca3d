// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Typed console commands and their dispatch.
//!
//! Commands that edit the active structure run against a working copy which replaces the
//! structure only when the command succeeds; a history state is then saved. Failed commands leave
//! the structure, the selection and the history as they were.

use crate::crystolecule::atomic_structure::{connected_component, AtomicStructure};
use crate::crystolecule::crystal::{Crystal, LatticeUpdate};
use crate::crystolecule::error::ModelError;
use crate::crystolecule::functional_group::{attach_group, builtin_group, AttachOptions};
use crate::crystolecule::geometry::{
    default_moving_set, measure_atoms, rotate_euler, set_angle, set_dihedral, set_distance,
    Measurement,
};
use crate::crystolecule::lattice::{Lattice, LatticeParameters};
use crate::crystolecule::model::Model;
use crate::crystolecule::placement::{add_hydrogens, place_bonded_atom};
use crate::crystolecule::slab::{generate_slab, SlabInfo, SlabParameters};
use crate::editor::clipboard::Clipboard;
use crate::editor::editor::{Editor, Mode};
use crate::editor::error::EditorError;
use crate::editor::manager::MoleculeManager;
use crate::editor::settings::EditorSettings;
use crate::editor::smiles::{install_import, resolve_import, ImportTarget, SmilesResolver};
use crate::util::imat3::IMat3;
use glam::f64::DVec3;
use log::{debug, info};
use std::str::FromStr;

/// 0-based atom indices into the ordered atom list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomSelector {
    Index(usize),
    /// Inclusive
    Range(usize, usize),
    All,
}

impl AtomSelector {
    /// Parses `i`, `i:j` or `:`.
    pub fn parse(text: &str) -> Result<Self, EditorError> {
        let invalid = || EditorError::InvalidSelector(text.to_string());
        let text = text.trim();
        if text == ":" {
            return Ok(AtomSelector::All);
        }
        match text.split_once(':') {
            Some((first, last)) => {
                let first: usize = first.trim().parse().map_err(|_| invalid())?;
                let last: usize = last.trim().parse().map_err(|_| invalid())?;
                if first > last {
                    return Err(invalid());
                }
                Ok(AtomSelector::Range(first, last))
            }
            None => Ok(AtomSelector::Index(text.parse().map_err(|_| invalid())?)),
        }
    }

    /// Atom ids, in atom-list order.
    pub fn resolve(&self, structure: &AtomicStructure) -> Result<Vec<u32>, ModelError> {
        match *self {
            AtomSelector::Index(index) => Ok(vec![structure.atom_id_at(index)?]),
            AtomSelector::Range(first, last) => {
                // Fails on the end of the range before anything is collected.
                structure.atom_id_at(last)?;
                Ok(structure.atom_ids().skip(first).take(last - first + 1).collect())
            }
            AtomSelector::All => Ok(structure.atom_ids().collect()),
        }
    }
}

impl FromStr for AtomSelector {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AtomSelector::parse(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTarget {
    Atoms(AtomSelector),
    /// Everything bonded, directly or not, to the atom at this index
    Fragment(usize),
    Molecule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateTarget {
    Fragment(usize),
    Molecule,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Free atom; the editor's default element when `element` is `None`
    AddAtom {
        element: Option<String>,
        position: DVec3,
    },
    /// Atom bonded to `anchor` along its VSEPR direction
    GrowAtom {
        anchor: usize,
        element: Option<String>,
    },
    AddBond {
        atoms: (usize, usize),
        order: u8,
    },
    AddHydrogens(AtomSelector),
    /// Built-in group; the editor's selected group when `group` is `None`
    AttachGroup {
        anchor: usize,
        group: Option<String>,
    },
    /// Resolves SMILES through the external helper. With a name, the result becomes a new
    /// structure; without one it is merged into the active structure.
    AddMolecule {
        smiles: String,
        name: Option<String>,
    },
    DeleteAtoms(AtomSelector),
    DeleteBond(usize, usize),
    DeleteMolecule(String),
    Select(AtomSelector),
    ClearSelection,
    SetMode(Mode),
    SetDefaultElement(String),
    SelectGroup(String),
    /// Route supercell and slab generation to the originally imported cell
    FixLattice(bool),
    /// Distance between the first two selected atoms
    SetDistance {
        value: f64,
        moving: Option<AtomSelector>,
    },
    /// Angle at the second of the first three selected atoms
    SetAngle {
        value: f64,
        moving: Option<AtomSelector>,
    },
    SetDihedral {
        value: f64,
        moving: Option<AtomSelector>,
    },
    SetThreshold(f64),
    SetScale(f64),
    Measure,
    Rebond,
    Center,
    Move {
        target: MoveTarget,
        delta: DVec3,
    },
    /// Euler angles in degrees about the centroid of the target
    Rotate {
        target: RotateTarget,
        degrees: DVec3,
    },
    SubstituteAtom {
        atoms: AtomSelector,
        element: String,
    },
    SubstituteGroup {
        anchor: usize,
        leaving: Option<usize>,
        source: String,
        source_pair: Option<(usize, usize)>,
    },
    Supercell(IMat3),
    Wrap,
    Cell {
        parameters: LatticeParameters,
        update: LatticeUpdate,
    },
    AutoBond {
        threshold: Option<f64>,
    },
    Slab(SlabParameters),
    New {
        name: String,
        lattice: Option<LatticeParameters>,
    },
    Switch(String),
    Rename(String),
    Merge(String),
    Copy,
    Cut,
    Paste,
    Undo,
    Redo,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    Done,
    /// Ids of atoms created or affected
    Atoms(Vec<u32>),
    Count(usize),
    Measurement(Measurement),
    Offset(DVec3),
    /// Name of the structure created or activated
    Structure(String),
    Slab {
        structure: String,
        info: SlabInfo,
    },
    /// Whether undo/redo had a state to move to
    History(bool),
}

/// An editor session: the structures, the interaction state and the external helper.
pub struct Session {
    pub editor: Editor,
    pub manager: MoleculeManager,
    resolver: Option<Box<dyn SmilesResolver>>,
}

impl Session {
    pub fn new(settings: EditorSettings) -> Self {
        Self::with_model(Model::Molecule(AtomicStructure::default()), settings)
    }

    pub fn with_model(model: Model, settings: EditorSettings) -> Self {
        let mut editor = Editor::new(settings);
        let manager = MoleculeManager::new(model, &mut editor);
        Self {
            editor,
            manager,
            resolver: None,
        }
    }

    pub fn set_resolver(&mut self, resolver: Box<dyn SmilesResolver>) {
        self.resolver = Some(resolver);
    }

    pub fn model(&self) -> &Model {
        self.manager.active_model()
    }

    pub fn execute(&mut self, command: Command) -> Result<CommandOutput, EditorError> {
        debug!("executing {:?}", command);
        match command {
            Command::AddAtom { element, position } => self.edit(|model, editor| {
                let atomic_number = element_or_default(element.as_deref(), editor)?;
                let id = model.structure_mut().try_add_atom(atomic_number, position)?;
                editor.selection.set([id]);
                Ok(CommandOutput::Atoms(vec![id]))
            }),
            Command::GrowAtom { anchor, element } => self.edit(|model, editor| {
                let atomic_number = element_or_default(element.as_deref(), editor)?;
                let structure = model.structure_mut();
                let anchor = structure.atom_id_at(anchor)?;
                let id = place_bonded_atom(structure, anchor, atomic_number)?;
                editor.selection.set([id]);
                Ok(CommandOutput::Atoms(vec![id]))
            }),
            Command::AddBond { atoms, order } => self.edit(|model, _| {
                let structure = model.structure_mut();
                let id1 = structure.atom_id_at(atoms.0)?;
                let id2 = structure.atom_id_at(atoms.1)?;
                structure.add_bond(id1, id2, order)?;
                Ok(CommandOutput::Done)
            }),
            Command::AddHydrogens(selector) => self.edit(|model, _| {
                let structure = model.structure_mut();
                let mut added = Vec::new();
                for id in selector.resolve(structure)? {
                    if structure.atom(id)?.is_dummy() {
                        continue;
                    }
                    added.extend(add_hydrogens(structure, id, None)?);
                }
                Ok(CommandOutput::Atoms(added))
            }),
            Command::AttachGroup { anchor, group } => self.edit(|model, editor| {
                let group = match group {
                    Some(name) => {
                        builtin_group(&name).ok_or_else(|| {
                            ModelError::InvalidGroup(format!("no group named '{}'", name))
                        })?
                    }
                    None => editor.selected_group()?,
                };
                let structure = model.structure_mut();
                let anchor = structure.atom_id_at(anchor)?;
                let ids = attach_group(structure, anchor, &group, AttachOptions::default())?;
                editor.selection.set(ids.iter().copied());
                Ok(CommandOutput::Atoms(ids))
            }),
            Command::AddMolecule { smiles, name } => self.add_molecule(&smiles, name),
            Command::DeleteAtoms(selector) => self.edit(|model, editor| {
                let ids = selector.resolve(model.structure())?;
                for &id in &ids {
                    model.remove_atom(id);
                    editor.selection.deselect(id);
                }
                Ok(CommandOutput::Count(ids.len()))
            }),
            Command::DeleteBond(i, j) => self.edit(|model, _| {
                let structure = model.structure_mut();
                let id1 = structure.atom_id_at(i)?;
                let id2 = structure.atom_id_at(j)?;
                structure
                    .remove_bond(id1, id2)
                    .ok_or(ModelError::BondNotFound(id1, id2))?;
                Ok(CommandOutput::Done)
            }),
            Command::DeleteMolecule(name) => {
                self.manager.remove(&name, &mut self.editor)?;
                Ok(CommandOutput::Structure(self.manager.active_name().to_string()))
            }
            Command::Select(selector) => {
                let ids = selector.resolve(self.model().structure())?;
                self.editor.selection.extend(ids);
                Ok(CommandOutput::Atoms(self.editor.selection.atoms().to_vec()))
            }
            Command::ClearSelection => {
                self.editor.selection.clear();
                Ok(CommandOutput::Done)
            }
            Command::SetMode(mode) => {
                self.editor.mode = mode;
                Ok(CommandOutput::Done)
            }
            Command::SetDefaultElement(symbol) => {
                self.editor.set_default_element(&symbol)?;
                Ok(CommandOutput::Done)
            }
            Command::SelectGroup(name) => {
                self.editor.select_group(&name)?;
                Ok(CommandOutput::Done)
            }
            Command::FixLattice(fixed) => {
                self.manager.set_lattice_fixed(fixed);
                Ok(CommandOutput::Done)
            }
            Command::SetDistance { value, moving } => self.edit(|model, editor| {
                let atoms = editor.selection.leading::<2>()?;
                let moving = moving_set(model.structure(), &atoms, moving)?;
                set_distance(model.structure_mut(), atoms, value, &moving)?;
                Ok(CommandOutput::Atoms(moving))
            }),
            Command::SetAngle { value, moving } => self.edit(|model, editor| {
                let atoms = editor.selection.leading::<3>()?;
                let moving = moving_set(model.structure(), &atoms, moving)?;
                set_angle(model.structure_mut(), atoms, value, &moving)?;
                Ok(CommandOutput::Atoms(moving))
            }),
            Command::SetDihedral { value, moving } => self.edit(|model, editor| {
                let atoms = editor.selection.leading::<4>()?;
                let moving = moving_set(model.structure(), &atoms, moving)?;
                set_dihedral(model.structure_mut(), atoms, value, &moving)?;
                Ok(CommandOutput::Atoms(moving))
            }),
            Command::SetThreshold(threshold) => {
                check_positive("bond threshold", threshold)?;
                self.editor.structure_settings.bond_threshold = threshold;
                Ok(CommandOutput::Done)
            }
            Command::SetScale(scale) => {
                check_positive("display scale", scale)?;
                self.editor.structure_settings.display_scale = scale;
                Ok(CommandOutput::Done)
            }
            Command::Measure => {
                if self.editor.selection.is_empty() {
                    return Err(EditorError::NothingSelected);
                }
                let measurement = measure_atoms(self.model().structure(), self.editor.selection.atoms())?;
                info!("{:?}", measurement);
                Ok(CommandOutput::Measurement(measurement))
            }
            Command::Rebond => {
                let threshold = self.editor.structure_settings.bond_threshold;
                self.edit(|model, _| Ok(CommandOutput::Count(model.rebond(threshold)?)))
            }
            Command::AutoBond { threshold } => {
                let threshold = threshold.unwrap_or(self.editor.structure_settings.bond_threshold);
                self.edit(|model, _| Ok(CommandOutput::Count(model.auto_bond(threshold)?)))
            }
            Command::Center => self.edit(|model, _| {
                Ok(CommandOutput::Offset(model.structure_mut().center_at_origin()))
            }),
            Command::Move { target, delta } => self.edit(|model, _| {
                let structure = model.structure_mut();
                let ids = match target {
                    MoveTarget::Atoms(selector) => selector.resolve(structure)?,
                    MoveTarget::Fragment(index) => fragment_ids(structure, index)?,
                    MoveTarget::Molecule => structure.atom_ids().collect(),
                };
                structure.translate_atoms(&ids, delta)?;
                Ok(CommandOutput::Atoms(ids))
            }),
            Command::Rotate { target, degrees } => self.edit(|model, _| {
                let structure = model.structure_mut();
                let ids = match target {
                    RotateTarget::Fragment(index) => fragment_ids(structure, index)?,
                    RotateTarget::Molecule => structure.atom_ids().collect(),
                };
                rotate_euler(structure, &ids, degrees);
                Ok(CommandOutput::Atoms(ids))
            }),
            Command::SubstituteAtom { atoms, element } => self.edit(|model, _| {
                let atomic_number = periodic_table::atomic_number_from_symbol(&element)
                    .ok_or(ModelError::UnknownElement(element))?;
                let structure = model.structure_mut();
                let ids = atoms.resolve(structure)?;
                for &id in &ids {
                    structure.set_element(id, atomic_number);
                }
                Ok(CommandOutput::Atoms(ids))
            }),
            Command::SubstituteGroup {
                anchor,
                leaving,
                source,
                source_pair,
            } => self.substitute_group(anchor, leaving, &source, source_pair),
            Command::Supercell(matrix) => self.supercell(&matrix),
            Command::Slab(params) => self.slab(&params),
            Command::Wrap => self.edit(|model, _| {
                let crystal = model.as_crystal_mut().ok_or(ModelError::MissingLattice)?;
                crystal.wrap_atoms()?;
                Ok(CommandOutput::Done)
            }),
            Command::Cell { parameters, update } => self.edit(|model, _| {
                let lattice = Lattice::from_parameters(parameters)?;
                match model {
                    Model::Crystal(crystal) => crystal.set_lattice(lattice, update)?,
                    Model::Molecule(structure) => {
                        let structure = std::mem::take(structure);
                        *model = Model::Crystal(Crystal::from_structure(structure, Some(lattice)));
                    }
                }
                Ok(CommandOutput::Done)
            }),
            Command::New { name, lattice } => {
                let model = match lattice {
                    Some(parameters) => Model::Crystal(Crystal::new(name, Lattice::from_parameters(parameters)?)),
                    None => Model::Molecule(AtomicStructure::new(name)),
                };
                Ok(CommandOutput::Structure(self.manager.create(model, &mut self.editor)?))
            }
            Command::Switch(name) => {
                self.manager.switch_to(&name, &mut self.editor)?;
                Ok(CommandOutput::Structure(name))
            }
            Command::Rename(name) => {
                let active = self.manager.active_name().to_string();
                Ok(CommandOutput::Structure(self.manager.rename(&active, &name)?))
            }
            Command::Merge(source) => {
                let ids = self.manager.merge(&source, &mut self.editor)?;
                self.editor.save_state(self.manager.active_model());
                Ok(CommandOutput::Atoms(ids))
            }
            Command::Copy => Ok(CommandOutput::Count(
                self.editor.copy_selection(self.manager.active_model())?,
            )),
            Command::Cut => {
                if self.editor.selection.is_empty() {
                    return Err(EditorError::NothingSelected);
                }
                let clipboard = Clipboard::copy(self.model().structure(), self.editor.selection.atoms())?;
                let count = clipboard.len();
                let output = self.edit(|model, editor| {
                    for &id in editor.selection.atoms() {
                        model.remove_atom(id);
                    }
                    editor.selection.clear();
                    Ok(CommandOutput::Count(count))
                })?;
                self.editor.set_clipboard(clipboard);
                Ok(output)
            }
            Command::Paste => self.edit(|model, editor| Ok(CommandOutput::Atoms(editor.paste(model)?))),
            Command::Undo => Ok(CommandOutput::History(
                self.editor.undo(self.manager.active_model_mut())?,
            )),
            Command::Redo => Ok(CommandOutput::History(
                self.editor.redo(self.manager.active_model_mut())?,
            )),
        }
    }

    /// Runs `f` on a copy of the active structure and installs the copy only when `f` succeeds
    /// and the result is still a valid structure.
    fn edit<F>(&mut self, f: F) -> Result<CommandOutput, EditorError>
    where
        F: FnOnce(&mut Model, &mut Editor) -> Result<CommandOutput, EditorError>,
    {
        let mut staged = self.manager.active_model().clone();
        let selection = self.editor.selection.clone();
        let result = f(&mut staged, &mut self.editor).and_then(|output| {
            staged.validate()?;
            Ok(output)
        });
        match result {
            Ok(output) => {
                *self.manager.active_model_mut() = staged;
                self.editor.save_state(self.manager.active_model());
                Ok(output)
            }
            Err(e) => {
                self.editor.selection = selection;
                Err(e)
            }
        }
    }

    fn add_molecule(&mut self, smiles: &str, name: Option<String>) -> Result<CommandOutput, EditorError> {
        let resolver = self
            .resolver
            .as_deref()
            .ok_or_else(|| EditorError::Helper("no SMILES resolver configured".to_string()))?;
        let import = resolve_import(resolver, smiles)?;
        let target = match name {
            Some(name) => ImportTarget::NewStructure(name),
            None => ImportTarget::Active,
        };
        let threshold = self.editor.structure_settings.bond_threshold;
        let installed = install_import(&mut self.manager, &mut self.editor, import, target, Some(threshold))?;
        self.editor.selection.set(installed.atom_ids.iter().copied());
        Ok(CommandOutput::Atoms(installed.atom_ids))
    }

    fn substitute_group(
        &mut self,
        anchor: usize,
        leaving: Option<usize>,
        source: &str,
        source_pair: Option<(usize, usize)>,
    ) -> Result<CommandOutput, EditorError> {
        let host = self.model().structure();
        let host_anchor = host.atom_id_at(anchor)?;
        let host_leaving = leaving.map(|index| host.atom_id_at(index)).transpose()?;
        let source_pair = match source_pair {
            Some((anchor, leaving)) => {
                let structure = self
                    .manager
                    .model(source)
                    .ok_or_else(|| EditorError::UnknownStructure(source.to_string()))?
                    .structure();
                Some((structure.atom_id_at(anchor)?, structure.atom_id_at(leaving)?))
            }
            None => None,
        };
        let ids = self.manager.substitute_group(
            host_anchor,
            host_leaving,
            source,
            source_pair,
            &mut self.editor,
        )?;
        self.editor.save_state(self.manager.active_model());
        Ok(CommandOutput::Atoms(ids))
    }

    /// Builds a supercell of the lattice source as a new structure, inferring bonds through the
    /// new cell when the source had any.
    fn supercell(&mut self, matrix: &IMat3) -> Result<CommandOutput, EditorError> {
        let source = self.manager.lattice_source()?;
        let had_bonds = source.structure().get_num_of_bonds() > 0;
        let mut model = Model::Crystal(source.generate_supercell_matrix(matrix)?);
        if had_bonds {
            model.auto_bond(self.editor.structure_settings.bond_threshold)?;
        }
        let name = self.install_derived(model)?;
        Ok(CommandOutput::Structure(name))
    }

    fn slab(&mut self, params: &SlabParameters) -> Result<CommandOutput, EditorError> {
        let source = self.manager.lattice_source()?;
        let had_bonds = source.structure().get_num_of_bonds() > 0;
        let slab = generate_slab(source, params)?;
        let mut model = Model::Crystal(slab.crystal);
        if had_bonds {
            model.auto_bond(self.editor.structure_settings.bond_threshold)?;
        }
        let structure = self.install_derived(model)?;
        Ok(CommandOutput::Slab {
            structure,
            info: slab.info,
        })
    }

    fn install_derived(&mut self, model: Model) -> Result<String, EditorError> {
        let original = self.manager.original_crystal().cloned();
        let name = self.manager.add_with_original(model, original, &self.editor);
        self.manager.switch_to(&name, &mut self.editor)?;
        Ok(name)
    }
}

fn element_or_default(symbol: Option<&str>, editor: &Editor) -> Result<i16, ModelError> {
    match symbol {
        Some(symbol) => periodic_table::atomic_number_from_symbol(symbol)
            .ok_or_else(|| ModelError::UnknownElement(symbol.to_string())),
        None => Ok(editor.default_element()),
    }
}

fn moving_set(
    structure: &AtomicStructure,
    atoms: &[u32],
    moving: Option<AtomSelector>,
) -> Result<Vec<u32>, ModelError> {
    match moving {
        Some(selector) => selector.resolve(structure),
        None => Ok(default_moving_set(structure, atoms)),
    }
}

fn fragment_ids(structure: &AtomicStructure, index: usize) -> Result<Vec<u32>, ModelError> {
    let mut ids: Vec<u32> = connected_component(structure, structure.atom_id_at(index)?)
        .into_iter()
        .collect();
    ids.sort_unstable();
    Ok(ids)
}

fn check_positive(what: &str, value: f64) -> Result<(), ModelError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ModelError::InvalidArgument(format!(
            "{} must be positive, got {}",
            what, value
        )))
    }
}
