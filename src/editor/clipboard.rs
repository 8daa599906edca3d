// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::crystolecule::atomic_structure::AtomicStructure;
use crate::crystolecule::error::ModelError;
use glam::f64::DVec3;
use log::debug;
use rustc_hash::FxHashSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipboardAtom {
    pub atomic_number: i16,
    pub position: DVec3,
}

/// Bond between two clipboard atoms, by position in the clipboard's atom list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipboardBond {
    pub atom1: usize,
    pub atom2: usize,
    pub order: u8,
}

/// Copied atoms and the bonds among them, detached from any structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Clipboard {
    atoms: Vec<ClipboardAtom>,
    bonds: Vec<ClipboardBond>,
    centroid: DVec3,
}

impl Clipboard {
    /// Copies `atom_ids` (in order, repeated ids once) and every bond whose two endpoints are
    /// both copied.
    pub fn copy(structure: &AtomicStructure, atom_ids: &[u32]) -> Result<Self, ModelError> {
        let mut seen = FxHashSet::default();
        let atom_ids: Vec<u32> = atom_ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        if atom_ids.is_empty() {
            return Err(ModelError::SelectionSize {
                expected: "at least 1",
                actual: 0,
            });
        }
        let atoms = atom_ids
            .iter()
            .map(|&id| {
                structure.atom(id).map(|atom| ClipboardAtom {
                    atomic_number: atom.atomic_number,
                    position: atom.position,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let slot = |id: u32| atom_ids.iter().position(|&x| x == id);
        let bonds = structure
            .bonds()
            .iter()
            .filter_map(|bond| {
                Some(ClipboardBond {
                    atom1: slot(bond.atom_id1)?,
                    atom2: slot(bond.atom_id2)?,
                    order: bond.order,
                })
            })
            .collect();
        let centroid = atoms.iter().map(|a| a.position).sum::<DVec3>() / atoms.len() as f64;

        Ok(Self {
            atoms,
            bonds,
            centroid,
        })
    }

    /// Inserts the copied atoms shifted by `offset` and returns their new ids.
    pub fn paste(&self, structure: &mut AtomicStructure, offset: DVec3) -> Result<Vec<u32>, ModelError> {
        let ids: Vec<u32> = self
            .atoms
            .iter()
            .map(|atom| structure.add_atom(atom.atomic_number, atom.position + offset))
            .collect();
        for bond in &self.bonds {
            structure.add_bond(ids[bond.atom1], ids[bond.atom2], bond.order)?;
        }
        debug!("pasted {} atoms and {} bonds", ids.len(), self.bonds.len());
        Ok(ids)
    }

    pub fn atoms(&self) -> &[ClipboardAtom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[ClipboardBond] {
        &self.bonds
    }

    /// Centroid of the atoms at the time they were copied.
    pub fn centroid(&self) -> DVec3 {
        self.centroid
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}
