// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::crystolecule::atomic_structure::{AtomicStructure, BOND_SINGLE};
use crate::crystolecule::error::ModelError;
use crate::util::mat_utils::arbitrary_perpendicular;
use glam::f64::DVec3;
use log::{debug, warn};
use periodic_table::Element;

// ============================================================================
// Core types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hybridization {
    Sp3,
    Sp2,
    Sp1,
}

impl Hybridization {
    /// Total coordination of the canonical geometry.
    pub fn coordination(self) -> usize {
        match self {
            Hybridization::Sp3 => 4,
            Hybridization::Sp2 => 3,
            Hybridization::Sp1 => 2,
        }
    }

    pub fn from_coordination(n: usize) -> Option<Self> {
        match n {
            4 => Some(Hybridization::Sp3),
            3 => Some(Hybridization::Sp2),
            2 => Some(Hybridization::Sp1),
            _ => None,
        }
    }
}

/// Tetrahedral angle in radians: arccos(-1/3) ≈ 109.47°
pub const TETRAHEDRAL_ANGLE: f64 = 1.9106332362490186;

// Below this length a sum of unit vectors counts as cancelled out.
const DEGENERATE_SUM: f64 = 1e-6;

// ============================================================================
// Directions
// ============================================================================

/// Unit directions from `atom_id` to each of its neighbors. A neighbor sitting on top of the
/// atom contributes +x.
pub fn neighbor_directions(structure: &AtomicStructure, atom_id: u32) -> Result<Vec<DVec3>, ModelError> {
    let atom = structure.atom(atom_id)?;
    Ok(atom
        .neighbor_ids()
        .filter_map(|id| structure.get_atom(id))
        .map(|neighbor| {
            let dir = neighbor.position - atom.position;
            if dir.length_squared() < 1e-12 {
                warn!("atom {} overlaps neighbor {}", atom_id, neighbor.id);
                DVec3::X // degenerate
            } else {
                dir.normalize()
            }
        })
        .collect())
}

/// Best direction for one new neighbor given the existing neighbor directions.
///
/// - no neighbors: +x
/// - one neighbor: opposite to it
/// - otherwise: opposite to the normalized sum. When the sum cancels out the result is
///   perpendicular to the neighbors instead.
pub fn vsepr_direction(dirs: &[DVec3]) -> DVec3 {
    match dirs {
        [] => DVec3::X,
        [v1] => -*v1,
        [v1, rest @ ..] => {
            let sum: DVec3 = dirs.iter().copied().sum();
            if sum.length() >= DEGENERATE_SUM {
                return (-sum).normalize();
            }
            // Neighbors cancel out: antiparallel pair or a planar star.
            let plane_normal = rest
                .iter()
                .map(|v| v1.cross(*v))
                .find(|n| n.length_squared() > 1e-12);
            match plane_normal {
                Some(n) => n.normalize(),
                None => arbitrary_perpendicular(*v1),
            }
        }
    }
}

/// Directions completing a canonical geometry of total coordination `n` around the existing
/// neighbor directions: linear for n = 2, trigonal planar for n = 3, tetrahedral for n = 4.
/// Returns `n - k` directions, or none when the atom already has `k >= n` neighbors.
pub fn saturation_directions(dirs: &[DVec3], n: usize) -> Result<Vec<DVec3>, ModelError> {
    let hybridization = Hybridization::from_coordination(n).ok_or_else(|| {
        ModelError::InvalidArgument(format!("coordination {} is not 2, 3 or 4", n))
    })?;
    if dirs.len() >= n {
        return Ok(Vec::new());
    }

    let result = match hybridization {
        Hybridization::Sp1 => match dirs {
            [] => vec![DVec3::X, -DVec3::X],
            _ => vec![-dirs[0]],
        },
        Hybridization::Sp2 => match dirs {
            [] => trigonal_around(DVec3::X, None),
            [v1] => trigonal_around(*v1, None)[1..].to_vec(),
            _ => vec![vsepr_direction(dirs)],
        },
        Hybridization::Sp3 => match dirs {
            [] => tetrahedral_star(),
            [v1] => tetrahedral_around(*v1),
            [b1, b2] => sp3_case2(*b1, *b2),
            _ => vec![sp3_case3(dirs)],
        },
    };
    Ok(result)
}

/// Three directions at 120° in a plane containing `first`.
fn trigonal_around(first: DVec3, plane_normal: Option<DVec3>) -> Vec<DVec3> {
    let p = plane_normal
        .map(|n| n.cross(first).normalize())
        .unwrap_or_else(|| arbitrary_perpendicular(first));
    let half_sqrt3 = 3.0_f64.sqrt() / 2.0;
    vec![
        first,
        (-0.5 * first + half_sqrt3 * p).normalize(),
        (-0.5 * first - half_sqrt3 * p).normalize(),
    ]
}

fn tetrahedral_star() -> Vec<DVec3> {
    [
        DVec3::new(1.0, 1.0, 1.0),
        DVec3::new(1.0, -1.0, -1.0),
        DVec3::new(-1.0, 1.0, -1.0),
        DVec3::new(-1.0, -1.0, 1.0),
    ]
    .into_iter()
    .map(DVec3::normalize)
    .collect()
}

/// sp3 with one existing bond: three directions at the tetrahedral angle from it, spread by 120°.
fn tetrahedral_around(v1: DVec3) -> Vec<DVec3> {
    let p = arbitrary_perpendicular(v1);
    let q = v1.cross(p).normalize();
    let cos_tet = TETRAHEDRAL_ANGLE.cos();
    let sin_tet = TETRAHEDRAL_ANGLE.sin();
    (0..3)
        .map(|i| {
            let phi = (i as f64) * 120.0_f64.to_radians();
            (v1 * cos_tet + (p * phi.cos() + q * phi.sin()) * sin_tet).normalize()
        })
        .collect()
}

/// sp3 case 3: one remaining direction, opposite the centroid of existing bonds.
fn sp3_case3(dirs: &[DVec3]) -> DVec3 {
    let sum: DVec3 = dirs.iter().copied().sum();
    if sum.length_squared() < 1e-12 {
        // Degenerate: all three bonds cancel out. Pick any perpendicular direction.
        vsepr_direction(dirs)
    } else {
        (-sum).normalize()
    }
}

/// sp3 case 2: two remaining directions, symmetric about the plane of existing bonds.
fn sp3_case2(b1: DVec3, b2: DVec3) -> Vec<DVec3> {
    let mid = (b1 + b2).normalize_or_zero();
    let n = b1.cross(b2);

    if n.length_squared() < 1e-12 || mid.length_squared() < 1e-12 {
        // Degenerate: bonds are parallel or anti-parallel
        let perp1 = arbitrary_perpendicular(b1);
        let perp2 = b1.cross(perp1).normalize();
        return vec![perp1, perp2];
    }

    let n = n.normalize();
    let neg_mid = -mid;

    // Find angle a such that dot(b1, d) = cos(109.47°)
    // d = -mid * cos(a) + n * sin(a)
    // dot(b1, n) = 0, so -dot(b1,mid)*cos(a) = cos(109.47°)
    let cos_tet = TETRAHEDRAL_ANGLE.cos();
    let b1_dot_mid = b1.dot(mid);

    let cos_a = (-cos_tet / b1_dot_mid).clamp(-1.0, 1.0);
    let sin_a = (1.0 - cos_a * cos_a).sqrt();

    vec![
        (neg_mid * cos_a + n * sin_a).normalize(),
        (neg_mid * cos_a - n * sin_a).normalize(),
    ]
}

// ============================================================================
// Bond lengths and hybridization
// ============================================================================

/// Sum of covalent radii.
pub fn bond_length(atomic_number1: i16, atomic_number2: i16) -> f64 {
    periodic_table::covalent_radius(atomic_number1) + periodic_table::covalent_radius(atomic_number2)
}

/// Geometry implied by the orders of the existing bonds: a triple bond or two double bonds make
/// the atom linear, one double bond makes it trigonal, otherwise tetrahedral.
pub fn detect_hybridization(structure: &AtomicStructure, atom_id: u32) -> Result<Hybridization, ModelError> {
    let atom = structure.atom(atom_id)?;
    let doubles = atom.bonds.iter().filter(|b| b.bond_order() == 2).count();
    let max_order = atom.bonds.iter().map(|b| b.bond_order()).max().unwrap_or(0);

    Ok(if max_order >= 3 || doubles >= 2 {
        Hybridization::Sp1
    } else if doubles == 1 {
        Hybridization::Sp2
    } else {
        Hybridization::Sp3
    })
}

// ============================================================================
// Mutations
// ============================================================================

/// Adds a new atom bonded to `anchor_id` along the VSEPR direction at covalent bond length.
pub fn place_bonded_atom(
    structure: &mut AtomicStructure,
    anchor_id: u32,
    atomic_number: i16,
) -> Result<u32, ModelError> {
    let anchor = structure.atom(anchor_id)?;
    let anchor_pos = anchor.position;
    let length = bond_length(anchor.atomic_number, atomic_number);
    let direction = vsepr_direction(&neighbor_directions(structure, anchor_id)?);

    let id = structure.add_atom(atomic_number, anchor_pos + direction * length);
    structure.add_bond(anchor_id, id, BOND_SINGLE)?;
    Ok(id)
}

/// Saturates `atom_id` with hydrogens up to `valence` (the element's typical valence when
/// `None`). Returns the ids of the new hydrogens; none when the atom is already saturated.
pub fn add_hydrogens(
    structure: &mut AtomicStructure,
    atom_id: u32,
    valence: Option<u32>,
) -> Result<Vec<u32>, ModelError> {
    let atom = structure.atom(atom_id)?;
    let center = atom.position;
    let atomic_number = atom.atomic_number;
    let valence = match valence.or_else(|| periodic_table::typical_valence(atomic_number).map(u32::from)) {
        Some(v) => v,
        None => {
            return Err(ModelError::InvalidArgument(format!(
                "no typical valence known for {}",
                periodic_table::symbol(atomic_number)
            )))
        }
    };

    let missing = valence.saturating_sub(atom.bond_order_sum()) as usize;
    if missing == 0 {
        return Ok(Vec::new());
    }

    let hybridization = detect_hybridization(structure, atom_id)?;
    let dirs = neighbor_directions(structure, atom_id)?;
    let hydrogen = Element::Hydrogen.atomic_number() as i16;
    let length = bond_length(atomic_number, hydrogen);

    let positions: Vec<DVec3> = saturation_directions(&dirs, hybridization.coordination())?
        .into_iter()
        .take(missing)
        .map(|dir| center + dir * length)
        .collect();

    let mut added = Vec::with_capacity(positions.len());
    for position in positions {
        let id = structure.add_atom(hydrogen, position);
        structure.add_bond(atom_id, id, BOND_SINGLE)?;
        added.push(id);
    }
    debug!("added {} hydrogens to atom {}", added.len(), atom_id);
    Ok(added)
}
