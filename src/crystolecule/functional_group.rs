// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Functional groups are small templates with one dummy atom marking where the group attaches.
//! Attaching aligns the dummy→anchor axis of the template with the attachment direction on the
//! host, drops the dummy and bonds the group anchor to the host anchor.

use crate::crystolecule::atomic_structure::{AtomicStructure, BOND_DOUBLE, BOND_SINGLE, BOND_TRIPLE};
use crate::crystolecule::error::ModelError;
use crate::crystolecule::placement::{
    bond_length, neighbor_directions, vsepr_direction, TETRAHEDRAL_ANGLE,
};
use glam::f64::{DQuat, DVec3};
use log::debug;
use periodic_table::{Element, DUMMY_ATOMIC_NUMBER};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupAtom {
    pub atomic_number: i16,
    pub position: DVec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupBond {
    pub atom1: usize,
    pub atom2: usize,
    pub order: u8,
}

/// A validated group template: exactly one dummy atom with exactly one neighbor.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionalGroup {
    name: String,
    atoms: Vec<GroupAtom>,
    bonds: Vec<GroupBond>,
    dummy: usize,
    anchor: usize,
}

/// Caller overrides for an attachment (drag-drop supplies both).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AttachOptions {
    pub direction: Option<DVec3>,
    pub bond_length: Option<f64>,
}

impl FunctionalGroup {
    pub fn new(
        name: impl Into<String>,
        atoms: Vec<GroupAtom>,
        bonds: Vec<GroupBond>,
    ) -> Result<Self, ModelError> {
        let dummies: Vec<usize> = atoms
            .iter()
            .enumerate()
            .filter(|(_, atom)| atom.atomic_number == DUMMY_ATOMIC_NUMBER)
            .map(|(i, _)| i)
            .collect();
        let dummy = match dummies.as_slice() {
            [dummy] => *dummy,
            _ => {
                return Err(ModelError::InvalidGroup(format!(
                    "expected exactly one dummy atom, found {}",
                    dummies.len()
                )))
            }
        };
        Self::with_leaving_atom(name, atoms, bonds, dummy)
    }

    /// Template whose attachment placeholder is `leaving`, whatever its element. Used when a
    /// whole structure is substituted onto a host.
    pub fn with_leaving_atom(
        name: impl Into<String>,
        atoms: Vec<GroupAtom>,
        bonds: Vec<GroupBond>,
        leaving: usize,
    ) -> Result<Self, ModelError> {
        for bond in &bonds {
            if bond.atom1 >= atoms.len() || bond.atom2 >= atoms.len() || bond.atom1 == bond.atom2 {
                return Err(ModelError::InvalidGroup(format!(
                    "bond {}-{} does not connect two group atoms",
                    bond.atom1, bond.atom2
                )));
            }
            if bond.order == 0 || bond.order > crate::crystolecule::atomic_structure::MAX_BOND_ORDER {
                return Err(ModelError::InvalidBondOrder(bond.order));
            }
        }
        if leaving >= atoms.len() {
            return Err(ModelError::InvalidGroup(format!(
                "leaving atom {} is not part of the group",
                leaving
            )));
        }

        let neighbors: Vec<usize> = bonds
            .iter()
            .filter_map(|bond| match (bond.atom1 == leaving, bond.atom2 == leaving) {
                (true, false) => Some(bond.atom2),
                (false, true) => Some(bond.atom1),
                _ => None,
            })
            .collect();
        let anchor = match neighbors.as_slice() {
            [anchor] => *anchor,
            _ => {
                return Err(ModelError::InvalidGroup(format!(
                    "the dummy atom must have exactly one neighbor, found {}",
                    neighbors.len()
                )))
            }
        };
        if atoms[leaving].position.distance_squared(atoms[anchor].position) < 1e-12 {
            return Err(ModelError::InvalidGroup(
                "dummy and anchor atoms coincide".to_string(),
            ));
        }

        Ok(Self {
            name: name.into(),
            atoms,
            bonds,
            dummy: leaving,
            anchor,
        })
    }

    /// Template from the atoms and bonds of `structure`, with `leaving_id` as the placeholder.
    pub fn from_structure(structure: &AtomicStructure, leaving_id: u32) -> Result<Self, ModelError> {
        let ids: Vec<u32> = structure.atom_ids().collect();
        let index_of = |id: u32| ids.iter().position(|&x| x == id);

        let atoms = structure
            .iter_atoms()
            .map(|atom| GroupAtom {
                atomic_number: atom.atomic_number,
                position: atom.position,
            })
            .collect();
        let bonds = structure
            .bonds()
            .iter()
            .filter_map(|bond| {
                Some(GroupBond {
                    atom1: index_of(bond.atom_id1)?,
                    atom2: index_of(bond.atom_id2)?,
                    order: bond.order,
                })
            })
            .collect();
        let leaving = index_of(leaving_id).ok_or(ModelError::AtomNotFound(leaving_id))?;
        Self::with_leaving_atom(structure.name(), atoms, bonds, leaving)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn atoms(&self) -> &[GroupAtom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[GroupBond] {
        &self.bonds
    }

    pub fn dummy_index(&self) -> usize {
        self.dummy
    }

    /// The dummy's unique neighbor.
    pub fn anchor_index(&self) -> usize {
        self.anchor
    }

    /// Number of atoms inserted by an attachment.
    pub fn inserted_atom_count(&self) -> usize {
        self.atoms.len() - 1
    }
}

/// Attaches `group` to `host_anchor` and returns the ids of the inserted atoms (group order,
/// dummy skipped). All positions are computed before the structure is touched.
pub fn attach_group(
    structure: &mut AtomicStructure,
    host_anchor: u32,
    group: &FunctionalGroup,
    options: AttachOptions,
) -> Result<Vec<u32>, ModelError> {
    let host = structure.atom(host_anchor)?;
    let host_pos = host.position;
    let host_number = host.atomic_number;

    let direction = match options.direction {
        Some(dir) => dir.try_normalize().ok_or_else(|| {
            ModelError::InvalidArgument("attachment direction has zero length".to_string())
        })?,
        None => vsepr_direction(&neighbor_directions(structure, host_anchor)?),
    };

    let group_anchor = group.atoms[group.anchor];
    let dummy = group.atoms[group.dummy];
    let length = options
        .bond_length
        .unwrap_or_else(|| bond_length(host_number, group_anchor.atomic_number));

    let anchor_pos = host_pos + direction * length;
    let rotation = DQuat::from_rotation_arc(
        (group_anchor.position - dummy.position).normalize(),
        direction,
    );

    // Stage
    let staged: Vec<(usize, i16, DVec3)> = group
        .atoms
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != group.dummy)
        .map(|(i, atom)| {
            let offset = atom.position - group_anchor.position;
            (i, atom.atomic_number, anchor_pos + rotation.mul_vec3(offset))
        })
        .collect();

    // Install
    let mut index_to_id = vec![0u32; group.atoms.len()];
    let mut new_ids = Vec::with_capacity(staged.len());
    for (i, atomic_number, position) in staged {
        let id = structure.add_atom(atomic_number, position);
        index_to_id[i] = id;
        new_ids.push(id);
    }
    structure.add_bond(host_anchor, index_to_id[group.anchor], BOND_SINGLE)?;
    for bond in &group.bonds {
        if bond.atom1 == group.dummy || bond.atom2 == group.dummy {
            continue;
        }
        structure.add_bond(index_to_id[bond.atom1], index_to_id[bond.atom2], bond.order)?;
    }

    debug!(
        "attached group '{}' ({} atoms) to atom {}",
        group.name,
        new_ids.len(),
        host_anchor
    );
    Ok(new_ids)
}

// ============================================================================
// Built-in library
// ============================================================================

pub const BUILTIN_GROUP_NAMES: [&str; 6] =
    ["methyl", "hydroxyl", "amino", "cyano", "phenyl", "carboxyl"];

const C: i16 = Element::Carbon as i16;
const H: i16 = Element::Hydrogen as i16;
const N: i16 = Element::Nitrogen as i16;
const O: i16 = Element::Oxygen as i16;

/// Looks up a built-in group by (case-insensitive) name.
pub fn builtin_group(name: &str) -> Option<FunctionalGroup> {
    let (atoms, bonds) = match name.to_ascii_lowercase().as_str() {
        "methyl" => substituted_center(C, &[(H, 1.09, 0.0), (H, 1.09, 120.0), (H, 1.09, 240.0)]),
        "hydroxyl" => substituted_center(O, &[(H, 0.96, 0.0)]),
        "amino" => substituted_center(N, &[(H, 1.01, 0.0), (H, 1.01, 120.0)]),
        "cyano" => cyano(),
        "phenyl" => phenyl(),
        "carboxyl" => carboxyl(),
        _ => return None,
    };
    FunctionalGroup::new(name.to_ascii_lowercase(), atoms, bonds).ok()
}

fn atom(atomic_number: i16, x: f64, y: f64, z: f64) -> GroupAtom {
    GroupAtom {
        atomic_number,
        position: DVec3::new(x, y, z),
    }
}

fn bond(atom1: usize, atom2: usize, order: u8) -> GroupBond {
    GroupBond { atom1, atom2, order }
}

// Dummy on -x, center at the origin, substituents at the tetrahedral angle from the dummy bond
// spread around x by the given azimuths (degrees).
fn substituted_center(center: i16, substituents: &[(i16, f64, f64)]) -> (Vec<GroupAtom>, Vec<GroupBond>) {
    let mut atoms = vec![atom(DUMMY_ATOMIC_NUMBER, -1.0, 0.0, 0.0), atom(center, 0.0, 0.0, 0.0)];
    let mut bonds = vec![bond(0, 1, BOND_SINGLE)];
    let (sin_tet, cos_tet) = (std::f64::consts::PI - TETRAHEDRAL_ANGLE).sin_cos();
    for &(element, length, azimuth) in substituents {
        let (sin_phi, cos_phi) = azimuth.to_radians().sin_cos();
        let dir = DVec3::new(cos_tet, sin_tet * cos_phi, sin_tet * sin_phi);
        atoms.push(GroupAtom {
            atomic_number: element,
            position: dir * length,
        });
        bonds.push(bond(1, atoms.len() - 1, BOND_SINGLE));
    }
    (atoms, bonds)
}

fn cyano() -> (Vec<GroupAtom>, Vec<GroupBond>) {
    (
        vec![
            atom(DUMMY_ATOMIC_NUMBER, -1.0, 0.0, 0.0),
            atom(C, 0.0, 0.0, 0.0),
            atom(N, 1.16, 0.0, 0.0),
        ],
        vec![bond(0, 1, BOND_SINGLE), bond(1, 2, BOND_TRIPLE)],
    )
}

fn carboxyl() -> (Vec<GroupAtom>, Vec<GroupBond>) {
    let (s, c) = 60.0_f64.to_radians().sin_cos();
    let hydroxyl_o = DVec3::new(c, -s, 0.0) * 1.34;
    let h = hydroxyl_o + DVec3::X * 0.97;
    (
        vec![
            atom(DUMMY_ATOMIC_NUMBER, -1.0, 0.0, 0.0),
            atom(C, 0.0, 0.0, 0.0),
            atom(O, c * 1.21, s * 1.21, 0.0),
            atom(O, hydroxyl_o.x, hydroxyl_o.y, 0.0),
            atom(H, h.x, h.y, 0.0),
        ],
        vec![
            bond(0, 1, BOND_SINGLE),
            bond(1, 2, BOND_DOUBLE),
            bond(1, 3, BOND_SINGLE),
            bond(3, 4, BOND_SINGLE),
        ],
    )
}

// Kekulé ring in the xy-plane, ipso carbon at the origin.
fn phenyl() -> (Vec<GroupAtom>, Vec<GroupBond>) {
    const RING: f64 = 1.39;
    const CH: f64 = 1.09;
    let center = DVec3::new(RING, 0.0, 0.0);

    let mut atoms = vec![atom(DUMMY_ATOMIC_NUMBER, -1.0, 0.0, 0.0)];
    let mut bonds = vec![bond(0, 1, BOND_SINGLE)];
    for k in 0..6 {
        let theta = (180.0 + 60.0 * k as f64).to_radians();
        let dir = DVec3::new(theta.cos(), theta.sin(), 0.0);
        atoms.push(GroupAtom {
            atomic_number: C,
            position: center + dir * RING,
        });
    }
    for k in 0..6 {
        let order = if k % 2 == 0 { BOND_DOUBLE } else { BOND_SINGLE };
        bonds.push(bond(1 + k, 1 + (k + 1) % 6, order));
    }
    for k in 1..6 {
        let theta = (180.0 + 60.0 * k as f64).to_radians();
        let dir = DVec3::new(theta.cos(), theta.sin(), 0.0);
        atoms.push(GroupAtom {
            atomic_number: H,
            position: center + dir * (RING + CH),
        });
        bonds.push(bond(1 + k, atoms.len() - 1, BOND_SINGLE));
    }
    (atoms, bonds)
}
