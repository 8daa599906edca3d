// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! A periodic structure: an [`AtomicStructure`] plus a [`Lattice`] plus a per-atom cache of
//! fractional coordinates.
//!
//! Structure operations are reached through [`Crystal::structure`] and
//! [`Crystal::structure_mut`]. A cached fractional coordinate remembers the Cartesian position it
//! was computed for and is only reported while the atom still sits there, so moving atoms through
//! the plain structure API never yields a stale fractional coordinate.

use crate::crystolecule::atomic_structure::{Atom, AtomicStructure};
use crate::crystolecule::error::ModelError;
use crate::crystolecule::lattice::Lattice;
use crate::util::imat3::IMat3;
use crate::util::mat_utils::wrap_unit_dvec3;
use glam::f64::DVec3;
use log::{debug, info};
use rustc_hash::FxHashMap;

pub const DEFAULT_SPACE_GROUP: &str = "P 1";
pub const DEFAULT_SPACE_GROUP_NUMBER: u32 = 1;

/// Acceptance window for supercell fractional coordinates: `[-ε, 1 - ε)`.
const SUPERCELL_EPSILON: f64 = 1e-6;
const MIN_SUPERCELL_DETERMINANT: f64 = 0.1;
// Squared Cartesian tolerance for a cached fractional coordinate to stay valid.
const FRAC_CACHE_TOLERANCE_SQUARED: f64 = 1e-18;

#[derive(Debug, Clone, Copy, PartialEq)]
struct FracEntry {
    frac: DVec3,
    cart: DVec3,
}

/// How atoms follow a lattice replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatticeUpdate {
    /// Atoms keep their fractional coordinates and move with the cell.
    ScaleAtoms,
    /// Atoms keep their Cartesian positions.
    KeepCartesian,
}

#[derive(Debug, Clone)]
pub struct Crystal {
    structure: AtomicStructure,
    lattice: Option<Lattice>,
    frac_coords: FxHashMap<u32, FracEntry>,
    space_group: String,
    space_group_number: u32,
}

impl Crystal {
    pub fn new(name: impl Into<String>, lattice: Lattice) -> Self {
        Self::from_structure(AtomicStructure::new(name), Some(lattice))
    }

    /// A crystal whose cell is not known yet. Fractional operations fail until
    /// [`Crystal::set_lattice`] is called.
    pub fn without_lattice(name: impl Into<String>) -> Self {
        Self::from_structure(AtomicStructure::new(name), None)
    }

    pub fn from_structure(structure: AtomicStructure, lattice: Option<Lattice>) -> Self {
        Self {
            structure,
            lattice,
            frac_coords: FxHashMap::default(),
            space_group: DEFAULT_SPACE_GROUP.to_string(),
            space_group_number: DEFAULT_SPACE_GROUP_NUMBER,
        }
    }

    pub fn structure(&self) -> &AtomicStructure {
        &self.structure
    }

    pub fn structure_mut(&mut self) -> &mut AtomicStructure {
        &mut self.structure
    }

    pub fn into_structure(self) -> AtomicStructure {
        self.structure
    }

    pub fn name(&self) -> &str {
        self.structure.name()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.structure.set_name(name);
    }

    pub fn lattice(&self) -> Option<&Lattice> {
        self.lattice.as_ref()
    }

    pub fn require_lattice(&self) -> Result<&Lattice, ModelError> {
        self.lattice.as_ref().ok_or(ModelError::MissingLattice)
    }

    pub fn space_group(&self) -> &str {
        &self.space_group
    }

    pub fn space_group_number(&self) -> u32 {
        self.space_group_number
    }

    pub fn set_space_group(&mut self, label: impl Into<String>, number: u32) {
        self.space_group = label.into();
        self.space_group_number = number;
    }

    /// Adds an atom at a Cartesian position. Its fractional coordinate is computed lazily.
    pub fn add_atom(&mut self, atomic_number: i16, position: DVec3) -> u32 {
        self.structure.add_atom(atomic_number, position)
    }

    pub fn add_atom_fractional(&mut self, atomic_number: i16, frac: DVec3) -> Result<u32, ModelError> {
        let cart = self.require_lattice()?.frac_to_cart(frac);
        let id = self.structure.add_atom(atomic_number, cart);
        self.frac_coords.insert(id, FracEntry { frac, cart });
        Ok(id)
    }

    pub fn remove_atom(&mut self, atom_id: u32) -> Option<Atom> {
        self.frac_coords.remove(&atom_id);
        self.structure.remove_atom(atom_id)
    }

    /// Cached fractional coordinate, `None` if there is none or the atom has moved since.
    pub fn get_frac(&self, atom_id: u32) -> Option<DVec3> {
        let entry = self.frac_coords.get(&atom_id)?;
        let atom = self.structure.get_atom(atom_id)?;
        (atom.position.distance_squared(entry.cart) <= FRAC_CACHE_TOLERANCE_SQUARED)
            .then_some(entry.frac)
    }

    /// Cached fractional coordinate, or one recomputed from the Cartesian position.
    pub fn get_frac_safe(&self, atom_id: u32) -> Result<DVec3, ModelError> {
        if let Some(frac) = self.get_frac(atom_id) {
            return Ok(frac);
        }
        let position = self.structure.atom_position(atom_id)?;
        Ok(self.require_lattice()?.cart_to_frac(position))
    }

    /// Moves an atom to a fractional coordinate and records it.
    pub fn set_frac(&mut self, atom_id: u32, frac: DVec3) -> Result<(), ModelError> {
        let cart = self.require_lattice()?.frac_to_cart(frac);
        if !self.structure.set_atom_position(atom_id, cart) {
            return Err(ModelError::AtomNotFound(atom_id));
        }
        self.frac_coords.insert(atom_id, FracEntry { frac, cart });
        Ok(())
    }

    /// Every atom's fractional coordinate (cached or recomputed), in atom order.
    pub fn fractional_coordinates(&self) -> Result<Vec<(u32, DVec3)>, ModelError> {
        self.structure
            .atom_ids()
            .map(|id| self.get_frac_safe(id).map(|frac| (id, frac)))
            .collect()
    }

    /// Cached entries that are still valid, in atom order.
    pub fn cached_fractional_coordinates(&self) -> Vec<(u32, DVec3)> {
        self.structure
            .atom_ids()
            .filter_map(|id| self.get_frac(id).map(|frac| (id, frac)))
            .collect()
    }

    /// Records a fractional coordinate for an atom at its current position without moving it.
    pub(crate) fn cache_frac(&mut self, atom_id: u32, frac: DVec3) -> Result<(), ModelError> {
        let cart = self.structure.atom_position(atom_id)?;
        self.frac_coords.insert(atom_id, FracEntry { frac, cart });
        Ok(())
    }

    /// Reduces every fractional component into `[0, 1)` and moves the atoms accordingly.
    pub fn wrap_atoms(&mut self) -> Result<(), ModelError> {
        let lattice = self.require_lattice()?.clone();
        let wrapped = self
            .fractional_coordinates()?
            .into_iter()
            .map(|(id, frac)| (id, wrap_unit_dvec3(frac)))
            .collect::<Vec<_>>();

        for (id, frac) in wrapped {
            let cart = lattice.frac_to_cart(frac);
            self.structure.set_atom_position(id, cart);
            self.frac_coords.insert(id, FracEntry { frac, cart });
        }
        debug!("wrapped {} atoms into the cell", self.structure.get_num_of_atoms());
        Ok(())
    }

    /// Replaces the lattice. With [`LatticeUpdate::ScaleAtoms`] every atom keeps its fractional
    /// coordinate; with [`LatticeUpdate::KeepCartesian`] the positions stay and the cache is
    /// rebuilt for the new cell.
    pub fn set_lattice(&mut self, lattice: Lattice, update: LatticeUpdate) -> Result<(), ModelError> {
        let fracs = match (update, &self.lattice) {
            (LatticeUpdate::ScaleAtoms, Some(_)) => self.fractional_coordinates()?,
            _ => Vec::new(),
        };

        self.lattice = Some(lattice.clone());
        self.frac_coords.clear();

        match update {
            LatticeUpdate::ScaleAtoms => {
                for (id, frac) in fracs {
                    self.set_frac(id, frac)?;
                }
            }
            LatticeUpdate::KeepCartesian => {
                let atoms: Vec<(u32, DVec3)> = self
                    .structure
                    .iter_atoms()
                    .map(|atom| (atom.id, atom.position))
                    .collect();
                for (id, cart) in atoms {
                    self.frac_coords.insert(
                        id,
                        FracEntry {
                            frac: lattice.cart_to_frac(cart),
                            cart,
                        },
                    );
                }
            }
        }
        Ok(())
    }

    /// Builds the supercell whose lattice vectors are `aⁿ_i = Σ_j S[i][j] · a_j`.
    ///
    /// Every original atom is replicated over integer offsets `n ∈ [-R, R]³` with
    /// `R = max|S_ij| + 1`; an image is kept when all components of `fⁿ = (Sᵀ)⁻¹ (f + n)` lie in
    /// `[-ε, 1 - ε)`. Bonds are not carried over. The result is labelled P 1 unless `S` is
    /// diagonal.
    pub fn generate_supercell_matrix(&self, matrix: &IMat3) -> Result<Crystal, ModelError> {
        let lattice = self.require_lattice()?;
        let det = matrix.determinant() as f64;
        if det.abs() < MIN_SUPERCELL_DETERMINANT {
            return Err(ModelError::SupercellDeterminant(det));
        }

        let (a, b, c) = lattice.vectors();
        let new_vector = |row: usize| {
            let s = matrix.row(row).as_dvec3();
            s.x * a + s.y * b + s.z * c
        };
        let new_lattice = Lattice::from_vectors(new_vector(0), new_vector(1), new_vector(2))?;
        let inverse_transpose = matrix.transpose_as_dmat3().inverse();

        let name = format!("{}_supercell", self.name());
        let mut supercell = Crystal::new(name, new_lattice);
        if matrix.is_diagonal() {
            supercell.set_space_group(self.space_group.clone(), self.space_group_number);
        }

        let range = matrix.max_abs() + 1;
        let in_window = |v: f64| (-SUPERCELL_EPSILON..1.0 - SUPERCELL_EPSILON).contains(&v);

        for atom in self.structure.iter_atoms() {
            let frac = self.get_frac_safe(atom.id)?;
            for n1 in -range..=range {
                for n2 in -range..=range {
                    for n3 in -range..=range {
                        let shifted = frac + DVec3::new(n1 as f64, n2 as f64, n3 as f64);
                        let new_frac = inverse_transpose * shifted;
                        if in_window(new_frac.x) && in_window(new_frac.y) && in_window(new_frac.z) {
                            supercell
                                .add_atom_fractional(atom.atomic_number, wrap_unit_dvec3(new_frac))?;
                        }
                    }
                }
            }
        }

        info!(
            "generated supercell with {} atoms (det {})",
            supercell.structure.get_num_of_atoms(),
            det
        );
        Ok(supercell)
    }

    /// Diagonal repeat, `diag(na, nb, nc)`.
    pub fn generate_supercell(&self, na: i32, nb: i32, nc: i32) -> Result<Crystal, ModelError> {
        self.generate_supercell_matrix(&IMat3::diagonal(na, nb, nc))
    }

    /// Drops cache entries of atoms that no longer exist.
    pub fn prune_frac_cache(&mut self) {
        let structure = &self.structure;
        self.frac_coords
            .retain(|id, _| structure.get_atom(*id).is_some());
    }
}
