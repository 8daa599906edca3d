// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Seam for the external SMILES to 3D helper.
//!
//! Resolving runs the helper and builds the new atoms without touching any structure. Installing
//! is a separate step that applies a finished import in one go.

use crate::crystolecule::atomic_structure::AtomicStructure;
use crate::crystolecule::error::ModelError;
use crate::crystolecule::model::Model;
use crate::editor::editor::Editor;
use crate::editor::error::EditorError;
use crate::editor::manager::MoleculeManager;
use glam::f64::DVec3;
use log::info;

#[derive(Debug, Clone, PartialEq)]
pub struct ImportedAtom {
    pub element: String,
    pub position: DVec3,
}

/// Turns a SMILES string into 3D atoms.
pub trait SmilesResolver {
    fn resolve(&self, smiles: &str) -> Result<Vec<ImportedAtom>, String>;
}

/// A completed helper result, not yet part of any structure.
#[derive(Debug, Clone)]
pub struct ResolvedImport {
    pub smiles: String,
    pub structure: AtomicStructure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportTarget {
    /// A new structure with this (base) name
    NewStructure(String),
    /// Merged into the active structure, lifted clear of its atoms
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledImport {
    pub structure: String,
    pub atom_ids: Vec<u32>,
}

pub fn resolve_import(resolver: &dyn SmilesResolver, smiles: &str) -> Result<ResolvedImport, EditorError> {
    let atoms = resolver.resolve(smiles).map_err(EditorError::Helper)?;
    if atoms.is_empty() {
        return Err(EditorError::Helper(format!("no atoms returned for '{}'", smiles)));
    }
    let mut structure = AtomicStructure::new(smiles);
    for atom in &atoms {
        let atomic_number = periodic_table::atomic_number_from_symbol(&atom.element)
            .ok_or_else(|| ModelError::UnknownElement(atom.element.clone()))?;
        if !atom.position.is_finite() {
            return Err(EditorError::Helper(format!(
                "non-finite position for {} in '{}'",
                atom.element, smiles
            )));
        }
        structure.add_atom(atomic_number, atom.position);
    }
    Ok(ResolvedImport {
        smiles: smiles.to_string(),
        structure,
    })
}

/// Applies a resolved import. With `bond_threshold` set, bonds are inferred on the imported atoms
/// before they are installed.
pub fn install_import(
    manager: &mut MoleculeManager,
    editor: &mut Editor,
    mut import: ResolvedImport,
    target: ImportTarget,
    bond_threshold: Option<f64>,
) -> Result<InstalledImport, EditorError> {
    if let Some(threshold) = bond_threshold {
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(ModelError::InvalidArgument(format!(
                "bond threshold must be positive, got {}",
                threshold
            ))
            .into());
        }
        import.structure.auto_create_bonds(threshold);
    }

    let installed = match target {
        ImportTarget::NewStructure(name) => {
            import.structure.set_name(name);
            let atom_ids = import.structure.atom_ids().collect();
            let structure = manager.create(Model::Molecule(import.structure), editor)?;
            InstalledImport { structure, atom_ids }
        }
        ImportTarget::Active => {
            let model = manager.active_model_mut();
            let fixed: Vec<DVec3> = model.structure().iter_atoms().map(|a| a.position).collect();
            let moving: Vec<DVec3> = import.structure.iter_atoms().map(|a| a.position).collect();
            let offset = editor.smart_offset(&fixed, &moving);
            let ids: Vec<u32> = import.structure.atom_ids().collect();
            import.structure.translate_atoms(&ids, offset)?;
            let id_map = model.structure_mut().add_atomic_structure(&import.structure);
            let atom_ids = ids.iter().filter_map(|id| id_map.get(id).copied()).collect();
            editor.save_state(manager.active_model());
            InstalledImport {
                structure: manager.active_name().to_string(),
                atom_ids,
            }
        }
    };
    info!(
        "installed {} atoms from '{}' into '{}'",
        installed.atom_ids.len(),
        import.smiles,
        installed.structure
    );
    Ok(installed)
}
