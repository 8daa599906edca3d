// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::crystolecule::atomic_structure::AtomicStructure;
use crate::crystolecule::crystal::Crystal;
use crate::crystolecule::error::ModelError;
use crate::crystolecule::pbc_bonds::pbc_auto_bond;

/// A structure that is either aperiodic or periodic. Operations that depend on periodicity
/// branch on this tag.
#[derive(Debug, Clone)]
pub enum Model {
    Molecule(AtomicStructure),
    Crystal(Crystal),
}

impl Model {
    pub fn structure(&self) -> &AtomicStructure {
        match self {
            Model::Molecule(structure) => structure,
            Model::Crystal(crystal) => crystal.structure(),
        }
    }

    pub fn structure_mut(&mut self) -> &mut AtomicStructure {
        match self {
            Model::Molecule(structure) => structure,
            Model::Crystal(crystal) => crystal.structure_mut(),
        }
    }

    pub fn as_crystal(&self) -> Option<&Crystal> {
        match self {
            Model::Crystal(crystal) => Some(crystal),
            Model::Molecule(_) => None,
        }
    }

    pub fn as_crystal_mut(&mut self) -> Option<&mut Crystal> {
        match self {
            Model::Crystal(crystal) => Some(crystal),
            Model::Molecule(_) => None,
        }
    }

    pub fn is_crystal(&self) -> bool {
        matches!(self, Model::Crystal(_))
    }

    pub fn name(&self) -> &str {
        self.structure().name()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.structure_mut().set_name(name);
    }

    /// Removes an atom, keeping a crystal's fractional cache in sync.
    pub fn remove_atom(&mut self, atom_id: u32) -> bool {
        match self {
            Model::Molecule(structure) => structure.remove_atom(atom_id).is_some(),
            Model::Crystal(crystal) => crystal.remove_atom(atom_id).is_some(),
        }
    }

    /// Infers bonds from covalent radii, through periodic images on crystals with a lattice.
    pub fn auto_bond(&mut self, threshold: f64) -> Result<usize, ModelError> {
        check_threshold(threshold)?;
        match self {
            Model::Crystal(crystal) if crystal.lattice().is_some() => pbc_auto_bond(crystal, threshold),
            _ => Ok(self.structure_mut().auto_create_bonds(threshold)),
        }
    }

    /// Drops every bond and infers them again.
    pub fn rebond(&mut self, threshold: f64) -> Result<usize, ModelError> {
        check_threshold(threshold)?;
        let structure = self.structure_mut();
        let bonds: Vec<(u32, u32)> = structure
            .bonds()
            .iter()
            .map(|bond| (bond.atom_id1, bond.atom_id2))
            .collect();
        for (id1, id2) in bonds {
            structure.remove_bond(id1, id2);
        }
        self.auto_bond(threshold)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        self.structure().validate()
    }
}

fn check_threshold(threshold: f64) -> Result<(), ModelError> {
    if threshold.is_finite() && threshold > 0.0 {
        Ok(())
    } else {
        Err(ModelError::InvalidArgument(format!(
            "bond threshold must be positive, got {}",
            threshold
        )))
    }
}

impl From<AtomicStructure> for Model {
    fn from(structure: AtomicStructure) -> Self {
        Model::Molecule(structure)
    }
}

impl From<Crystal> for Model {
    fn from(crystal: Crystal) -> Self {
        Model::Crystal(crystal)
    }
}
