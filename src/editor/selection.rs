// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::crystolecule::atomic_structure::AtomicStructure;
use crate::crystolecule::error::ModelError;

/// Selected atom ids in the order they were picked, without duplicates. Geometry operations read
/// the first two, three or four entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    atoms: Vec<u32>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids(ids: impl IntoIterator<Item = u32>) -> Self {
        let mut selection = Self::new();
        selection.extend(ids);
        selection
    }

    /// Appends `atom_id` unless it is already selected. Returns whether it was added.
    pub fn select(&mut self, atom_id: u32) -> bool {
        if self.atoms.contains(&atom_id) {
            return false;
        }
        self.atoms.push(atom_id);
        true
    }

    pub fn extend(&mut self, ids: impl IntoIterator<Item = u32>) {
        for id in ids {
            self.select(id);
        }
    }

    pub fn deselect(&mut self, atom_id: u32) -> bool {
        let len = self.atoms.len();
        self.atoms.retain(|&id| id != atom_id);
        self.atoms.len() != len
    }

    pub fn toggle(&mut self, atom_id: u32) {
        if !self.deselect(atom_id) {
            self.atoms.push(atom_id);
        }
    }

    pub fn set(&mut self, ids: impl IntoIterator<Item = u32>) {
        self.atoms.clear();
        self.extend(ids);
    }

    pub fn clear(&mut self) {
        self.atoms.clear();
    }

    pub fn contains(&self, atom_id: u32) -> bool {
        self.atoms.contains(&atom_id)
    }

    pub fn atoms(&self) -> &[u32] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Drops ids that no longer exist in `structure`.
    pub fn retain_existing(&mut self, structure: &AtomicStructure) {
        self.atoms.retain(|&id| structure.get_atom(id).is_some());
    }

    /// The first `N` selected atoms.
    pub fn leading<const N: usize>(&self) -> Result<[u32; N], ModelError> {
        self.atoms
            .get(..N)
            .and_then(|ids| <[u32; N]>::try_from(ids).ok())
            .ok_or(ModelError::SelectionSize {
                expected: at_least(N),
                actual: self.atoms.len(),
            })
    }
}

fn at_least(n: usize) -> &'static str {
    match n {
        0 | 1 => "at least 1",
        2 => "at least 2",
        3 => "at least 3",
        _ => "at least 4",
    }
}
