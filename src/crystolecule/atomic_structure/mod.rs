// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Molecular graph: atoms with stable integer ids plus an ordered list of bonds.
//!
//! Atoms live in a slot vector (index = id - 1) so that lookups by id are O(1) and ids are never
//! reused while the structure is alive. Each atom also keeps a compact inline adjacency list
//! (29-bit atom id + 3-bit bond order per entry) which mirrors the structure-level bond list and
//! serves the graph traversals. A sparse spatial grid accelerates radius queries.

use crate::crystolecule::error::ModelError;
use crate::util::transform::Transform;
use glam::f64::{DQuat, DVec3};
use log::debug;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

pub mod atom;
pub mod bond;
pub mod fragment;
pub mod inline_bond;

// Re-export types for convenience
pub use atom::Atom;
pub use bond::Bond;
pub use fragment::{compute_moving_fragment, connected_component};
pub use inline_bond::{InlineBond, BOND_DOUBLE, BOND_SINGLE, BOND_TRIPLE, MAX_BOND_ORDER};

// Cell size for spatial grid - larger than typical bond length for efficient neighbor lookup
const ATOM_GRID_CELL_SIZE: f64 = 4.0;

/// Default tolerance factor applied to the sum of covalent radii when inferring bonds.
pub const BOND_DISTANCE_MULTIPLIER: f64 = 1.15;

#[derive(Debug, Clone)]
pub struct AtomicStructure {
    name: String,
    atoms: Vec<Option<Atom>>, // Index = atom_id - 1, next ID = atoms.len() + 1
    num_atoms: usize,         // Count of non-None atoms
    bonds: Vec<Bond>,         // Insertion ordered, mirrored in the atoms' inline bonds
    // Spatial acceleration: sparse spatial grid of atoms
    grid: FxHashMap<(i32, i32, i32), Vec<u32>>,
}

impl Default for AtomicStructure {
    fn default() -> Self {
        Self::new("molecule")
    }
}

impl AtomicStructure {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            atoms: Vec::new(),
            num_atoms: 0,
            bonds: Vec::new(),
            grid: FxHashMap::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    // Atom access methods
    fn get_atom_mut(&mut self, id: u32) -> Option<&mut Atom> {
        if id == 0 {
            return None;
        }
        let index = (id - 1) as usize;
        self.atoms.get_mut(index).and_then(|slot| slot.as_mut())
    }

    pub fn get_atom(&self, atom_id: u32) -> Option<&Atom> {
        if atom_id == 0 {
            return None;
        }
        let index = (atom_id - 1) as usize;
        self.atoms.get(index).and_then(|slot| slot.as_ref())
    }

    /// Like [`Self::get_atom`] but reports a missing atom as an error.
    pub fn atom(&self, atom_id: u32) -> Result<&Atom, ModelError> {
        self.get_atom(atom_id)
            .ok_or(ModelError::AtomNotFound(atom_id))
    }

    pub fn atom_position(&self, atom_id: u32) -> Result<DVec3, ModelError> {
        self.atom(atom_id).map(|atom| atom.position)
    }

    /// Atoms in id order.
    pub fn iter_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.iter().filter_map(|slot| slot.as_ref())
    }

    pub fn atom_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.iter_atoms().map(|atom| atom.id)
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn get_num_of_atoms(&self) -> usize {
        self.num_atoms
    }

    pub fn get_num_of_bonds(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_atoms == 0
    }

    pub fn next_atom_id(&self) -> u32 {
        (self.atoms.len() + 1) as u32
    }

    /// Id of the atom at `index` in the ordered atom sequence.
    pub fn atom_id_at(&self, index: usize) -> Result<u32, ModelError> {
        self.atom_ids()
            .nth(index)
            .ok_or(ModelError::IndexOutOfRange {
                index,
                len: self.num_atoms,
            })
    }

    /// Position of `atom_id` in the ordered atom sequence.
    pub fn index_of(&self, atom_id: u32) -> Option<usize> {
        self.get_atom(atom_id)?;
        self.atom_ids().position(|id| id == atom_id)
    }

    pub fn get_cell_for_pos(&self, pos: &DVec3) -> (i32, i32, i32) {
        let cell = (*pos / ATOM_GRID_CELL_SIZE).floor().as_ivec3();
        (cell.x, cell.y, cell.z)
    }

    /// Adds an atom to the structure and returns its ID
    pub fn add_atom(&mut self, atomic_number: i16, position: DVec3) -> u32 {
        // Next ID is always: Vec length + 1 (since IDs are 1-indexed)
        let id = (self.atoms.len() + 1) as u32;

        let atom = Atom {
            id,
            atomic_number,
            position,
            bonds: SmallVec::new(),
        };

        // Always append to end (index = id - 1 = atoms.len())
        self.atoms.push(Some(atom));
        self.num_atoms += 1;
        self.add_atom_to_grid(id, &position);

        id
    }

    /// [`Self::add_atom`] for positions that come from outside the model. Non-finite positions
    /// are rejected before anything is added.
    pub fn try_add_atom(&mut self, atomic_number: i16, position: DVec3) -> Result<u32, ModelError> {
        if !position.is_finite() {
            return Err(ModelError::NonFinitePosition(self.next_atom_id()));
        }
        Ok(self.add_atom(atomic_number, position))
    }

    /// Places an atom under a caller chosen id. Used when rebuilding a structure from a
    /// snapshot; gaps below `id` stay empty so later [`Self::add_atom`] calls continue after the
    /// highest id.
    pub fn insert_atom_with_id(
        &mut self,
        id: u32,
        atomic_number: i16,
        position: DVec3,
    ) -> Result<(), ModelError> {
        if id == 0 || id > inline_bond::MAX_ATOM_ID {
            return Err(ModelError::InvalidArgument(format!("atom id {} is out of range", id)));
        }
        if !position.is_finite() {
            return Err(ModelError::NonFinitePosition(id));
        }
        let index = (id - 1) as usize;
        if index < self.atoms.len() && self.atoms[index].is_some() {
            return Err(ModelError::DuplicateAtomId(id));
        }
        if index >= self.atoms.len() {
            self.atoms.resize_with(index + 1, || None);
        }
        self.atoms[index] = Some(Atom {
            id,
            atomic_number,
            position,
            bonds: SmallVec::new(),
        });
        self.num_atoms += 1;
        self.add_atom_to_grid(id, &position);
        Ok(())
    }

    /// Removes an atom together with every bond incident to it.
    pub fn remove_atom(&mut self, id: u32) -> Option<Atom> {
        if id == 0 {
            return None;
        }

        let index = (id - 1) as usize;
        let mut atom = self.atoms.get_mut(index)?.take()?;

        for bond in &atom.bonds {
            let other_atom_id = bond.other_atom_id();
            if let Some(other_atom) = self.get_atom_mut(other_atom_id) {
                other_atom.bonds.retain(|bond| bond.other_atom_id() != id);
            }
        }
        self.bonds.retain(|bond| !bond.contains(id));
        atom.bonds.clear();

        self.remove_atom_from_grid(id, &atom.position);
        self.num_atoms -= 1;

        Some(atom)
    }

    /// Adds a bond, or returns the existing one unchanged when the atoms are already bonded.
    pub fn add_bond(
        &mut self,
        atom_id1: u32,
        atom_id2: u32,
        bond_order: u8,
    ) -> Result<Bond, ModelError> {
        if atom_id1 == atom_id2 {
            return Err(ModelError::SelfBond(atom_id1));
        }
        if bond_order == 0 || bond_order > MAX_BOND_ORDER {
            return Err(ModelError::InvalidBondOrder(bond_order));
        }
        self.atom(atom_id1)?;
        self.atom(atom_id2)?;

        if let Some(existing) = self.get_bond(atom_id1, atom_id2) {
            return Ok(*existing);
        }

        if let Some(atom) = self.get_atom_mut(atom_id1) {
            atom.bonds.push(InlineBond::new(atom_id2, bond_order));
        }
        if let Some(atom) = self.get_atom_mut(atom_id2) {
            atom.bonds.push(InlineBond::new(atom_id1, bond_order));
        }

        let bond = Bond {
            atom_id1,
            atom_id2,
            order: bond_order,
        };
        self.bonds.push(bond);
        Ok(bond)
    }

    pub fn get_bond(&self, atom_id1: u32, atom_id2: u32) -> Option<&Bond> {
        if !self.has_bond_between(atom_id1, atom_id2) {
            return None;
        }
        self.bonds
            .iter()
            .find(|bond| bond.connects(atom_id1, atom_id2))
    }

    pub fn has_bond_between(&self, atom_id1: u32, atom_id2: u32) -> bool {
        if let Some(atom) = self.get_atom(atom_id1) {
            atom.bonds
                .iter()
                .any(|bond| bond.other_atom_id() == atom_id2)
        } else {
            false
        }
    }

    pub fn remove_bond(&mut self, atom_id1: u32, atom_id2: u32) -> Option<Bond> {
        let position = self
            .bonds
            .iter()
            .position(|bond| bond.connects(atom_id1, atom_id2))?;
        let bond = self.bonds.remove(position);

        if let Some(atom1) = self.get_atom_mut(atom_id1) {
            atom1.bonds.retain(|bond| bond.other_atom_id() != atom_id2);
        }
        if let Some(atom2) = self.get_atom_mut(atom_id2) {
            atom2.bonds.retain(|bond| bond.other_atom_id() != atom_id1);
        }

        Some(bond)
    }

    pub fn set_bond_order(
        &mut self,
        atom_id1: u32,
        atom_id2: u32,
        bond_order: u8,
    ) -> Result<(), ModelError> {
        if bond_order == 0 || bond_order > MAX_BOND_ORDER {
            return Err(ModelError::InvalidBondOrder(bond_order));
        }
        let bond = self
            .bonds
            .iter_mut()
            .find(|bond| bond.connects(atom_id1, atom_id2))
            .ok_or(ModelError::BondNotFound(atom_id1, atom_id2))?;
        bond.order = bond_order;

        for (from, to) in [(atom_id1, atom_id2), (atom_id2, atom_id1)] {
            if let Some(atom) = self.get_atom_mut(from) {
                if let Some(inline) = atom.bonds.iter_mut().find(|b| b.other_atom_id() == to) {
                    inline.set_bond_order(bond_order);
                }
            }
        }
        Ok(())
    }

    /// Ids of the atoms bonded to `atom_id`, in bond insertion order.
    pub fn neighbors(&self, atom_id: u32) -> Vec<u32> {
        self.get_atom(atom_id)
            .map(|atom| atom.neighbor_ids().collect())
            .unwrap_or_default()
    }

    /// Removes all atoms and bonds. Ids start again from 1 afterwards.
    pub fn clear(&mut self) {
        self.atoms.clear();
        self.bonds.clear();
        self.grid.clear();
        self.num_atoms = 0;
    }

    /// Sets the position of an atom directly.
    /// Updates the atom position in the grid.
    ///
    /// # Returns
    ///
    /// `true` if the atom was found and updated, `false` otherwise
    pub fn set_atom_position(&mut self, atom_id: u32, new_position: DVec3) -> bool {
        let old_position = match self.get_atom_mut(atom_id) {
            Some(atom) => std::mem::replace(&mut atom.position, new_position),
            None => return false,
        };

        let old_cell = self.get_cell_for_pos(&old_position);
        let new_cell = self.get_cell_for_pos(&new_position);
        if old_cell != new_cell {
            self.remove_atom_from_grid(atom_id, &old_position);
            self.add_atom_to_grid(atom_id, &new_position);
        }
        true
    }

    /// Replaces the atomic number of an atom with a new value
    ///
    /// # Returns
    ///
    /// `true` if the atom was found and updated, `false` otherwise
    pub fn set_element(&mut self, atom_id: u32, atomic_number: i16) -> bool {
        if let Some(atom) = self.get_atom_mut(atom_id) {
            atom.atomic_number = atomic_number;
            true
        } else {
            false
        }
    }

    /// Applies `transform` to the listed atoms. Unknown ids are ignored.
    pub fn transform_atoms(&mut self, atom_ids: &[u32], transform: &Transform) {
        for &atom_id in atom_ids {
            if let Some(atom) = self.get_atom(atom_id) {
                let new_position = transform.apply_to_position(&atom.position);
                self.set_atom_position(atom_id, new_position);
            }
        }
    }

    /// Fails without moving anything when `delta` is not finite.
    pub fn translate_atoms(&mut self, atom_ids: &[u32], delta: DVec3) -> Result<(), ModelError> {
        if !delta.is_finite() {
            return Err(ModelError::InvalidArgument(format!(
                "translation {:?} is not finite",
                delta
            )));
        }
        self.transform_atoms(atom_ids, &Transform::from_translation(delta));
        Ok(())
    }

    pub fn rotate_atoms(&mut self, atom_ids: &[u32], pivot: DVec3, rotation: DQuat) {
        self.transform_atoms(
            atom_ids,
            &Transform::new_rotation_around_point(pivot, rotation),
        );
    }

    pub fn transform(&mut self, transform: &Transform) {
        let atom_ids: Vec<u32> = self.atom_ids().collect();
        self.transform_atoms(&atom_ids, transform);
    }

    /// Mean position of the listed atoms, `None` if none of them exist.
    pub fn centroid_of(&self, atom_ids: &[u32]) -> Option<DVec3> {
        let positions: Vec<DVec3> = atom_ids
            .iter()
            .filter_map(|&id| self.get_atom(id).map(|atom| atom.position))
            .collect();
        if positions.is_empty() {
            return None;
        }
        Some(positions.iter().copied().sum::<DVec3>() / positions.len() as f64)
    }

    pub fn centroid(&self) -> Option<DVec3> {
        if self.num_atoms == 0 {
            return None;
        }
        Some(self.iter_atoms().map(|atom| atom.position).sum::<DVec3>() / self.num_atoms as f64)
    }

    /// Translates every atom so that the centroid sits at the origin. Returns the applied shift.
    pub fn center_at_origin(&mut self) -> DVec3 {
        let Some(centroid) = self.centroid() else {
            return DVec3::ZERO;
        };
        let atom_ids: Vec<u32> = self.atom_ids().collect();
        self.transform_atoms(&atom_ids, &Transform::from_translation(-centroid));
        -centroid
    }

    // Helper method to add an atom to the grid at a specific position
    fn add_atom_to_grid(&mut self, atom_id: u32, position: &DVec3) {
        let cell = self.get_cell_for_pos(position);
        self.grid.entry(cell).or_default().push(atom_id);
    }

    // Helper method to remove an atom from the grid at a specific position
    fn remove_atom_from_grid(&mut self, atom_id: u32, position: &DVec3) {
        let cell = self.get_cell_for_pos(position);
        if let Some(cell_atoms) = self.grid.get_mut(&cell) {
            cell_atoms.retain(|&x| x != atom_id);
            if cell_atoms.is_empty() {
                self.grid.remove(&cell);
            }
        }
    }

    /// Returns atom IDs within radius of position using spatial grid
    pub fn atoms_in_radius(&self, position: &DVec3, radius: f64) -> Vec<u32> {
        let mut result = Vec::new();

        // Calculate how many cells we need to check in each direction
        let cell_radius = (radius / ATOM_GRID_CELL_SIZE).ceil() as i32;

        // Get the cell coordinates for the center position
        let center_cell = self.get_cell_for_pos(position);

        for dx in -cell_radius..=cell_radius {
            for dy in -cell_radius..=cell_radius {
                for dz in -cell_radius..=cell_radius {
                    let current_cell = (center_cell.0 + dx, center_cell.1 + dy, center_cell.2 + dz);

                    if let Some(cell_atoms) = self.grid.get(&current_cell) {
                        // For each atom in this cell, check if it's within the radius
                        for &atom_id in cell_atoms {
                            if let Some(atom) = self.get_atom(atom_id) {
                                let squared_distance = position.distance_squared(atom.position);

                                if squared_distance <= radius * radius {
                                    result.push(atom_id);
                                }
                            }
                        }
                    }
                }
            }
        }

        result.sort_unstable();
        result
    }

    /// Creates single bonds between every pair of atoms closer than
    /// `multiplier * (r_cov(a) + r_cov(b))`. Existing bonds are kept.
    /// Returns the number of bonds added.
    pub fn auto_create_bonds(&mut self, multiplier: f64) -> usize {
        let max_radius = self
            .iter_atoms()
            .map(|atom| periodic_table::covalent_radius(atom.atomic_number))
            .fold(0.0_f64, f64::max);

        let mut pairs: Vec<(u32, u32)> = Vec::new();
        for atom in self.iter_atoms() {
            let radius = periodic_table::covalent_radius(atom.atomic_number);
            let search_radius = (radius + max_radius) * multiplier;

            for other_id in self.atoms_in_radius(&atom.position, search_radius) {
                // Only consider each pair once
                if other_id <= atom.id {
                    continue;
                }
                let Some(other) = self.get_atom(other_id) else {
                    continue;
                };
                let max_bond_length =
                    (radius + periodic_table::covalent_radius(other.atomic_number)) * multiplier;
                if atom.position.distance(other.position) < max_bond_length
                    && !self.has_bond_between(atom.id, other_id)
                {
                    pairs.push((atom.id, other_id));
                }
            }
        }

        let mut added = 0;
        for (id1, id2) in pairs {
            if self.add_bond(id1, id2, BOND_SINGLE).is_ok() {
                added += 1;
            }
        }
        debug!("auto bonding added {} bonds", added);
        added
    }

    /// Merges another structure into this one with remapped IDs
    pub fn add_atomic_structure(&mut self, other: &AtomicStructure) -> FxHashMap<u32, u32> {
        let mut atom_id_map: FxHashMap<u32, u32> = FxHashMap::default();

        for atom in other.iter_atoms() {
            let new_atom_id = self.add_atom(atom.atomic_number, atom.position);
            atom_id_map.insert(atom.id, new_atom_id);
        }

        // Both endpoints were just inserted, so the bonds cannot fail validation.
        for bond in other.bonds() {
            if let (Some(&id1), Some(&id2)) = (
                atom_id_map.get(&bond.atom_id1),
                atom_id_map.get(&bond.atom_id2),
            ) {
                let _ = self.add_bond(id1, id2, bond.order);
            }
        }

        atom_id_map
    }

    /// Checks that every bond references live, distinct atoms, that the bond list and the inline
    /// adjacency agree, and that all positions are finite.
    pub fn validate(&self) -> Result<(), ModelError> {
        for atom in self.iter_atoms() {
            if !atom.position.is_finite() {
                return Err(ModelError::NonFinitePosition(atom.id));
            }
        }

        let mut inline_count = 0;
        for atom in self.iter_atoms() {
            for inline in &atom.bonds {
                inline_count += 1;
                let other = inline.other_atom_id();
                if !self.bonds.iter().any(|bond| bond.connects(atom.id, other)) {
                    return Err(ModelError::Inconsistent(format!(
                        "adjacency of atom {} lists {} without a bond entry",
                        atom.id, other
                    )));
                }
            }
        }

        for bond in &self.bonds {
            if bond.atom_id1 == bond.atom_id2 {
                return Err(ModelError::SelfBond(bond.atom_id1));
            }
            self.atom(bond.atom_id1)?;
            self.atom(bond.atom_id2)?;
        }

        if inline_count != 2 * self.bonds.len() {
            return Err(ModelError::Inconsistent(format!(
                "{} adjacency entries for {} bonds",
                inline_count,
                self.bonds.len()
            )));
        }
        Ok(())
    }

    /// Returns a detailed string representation.
    /// Includes counts, and details of first 10 atoms and bonds.
    pub fn to_detailed_string(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("name: {}", self.name));
        lines.push(format!("atoms: {}", self.num_atoms));
        lines.push(format!("bonds: {}", self.bonds.len()));

        // First 10 atoms
        let atoms: Vec<&Atom> = self.iter_atoms().take(10).collect();
        if !atoms.is_empty() {
            lines.push(format!("first {} atoms:", atoms.len()));
            for atom in &atoms {
                lines.push(format!(
                    "  [{}] {} pos=({:.6}, {:.6}, {:.6}) bonds={}",
                    atom.id,
                    atom.symbol(),
                    atom.position.x,
                    atom.position.y,
                    atom.position.z,
                    atom.bonds.len()
                ));
            }
            if self.num_atoms > 10 {
                lines.push(format!("  ... and {} more atoms", self.num_atoms - 10));
            }
        }

        if !self.bonds.is_empty() {
            lines.push(format!(
                "first {} bonds:",
                std::cmp::min(10, self.bonds.len())
            ));
            for bond in self.bonds.iter().take(10) {
                lines.push(format!(
                    "  {} -- {} (order={})",
                    bond.atom_id1, bond.atom_id2, bond.order
                ));
            }
            if self.bonds.len() > 10 {
                lines.push(format!("  ... and {} more bonds", self.bonds.len() - 10));
            }
        }

        lines.join("\n")
    }
}
