// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Measurements (distance, angle, dihedral) and the rigid transforms that drive a measurement to
//! a target value.
//!
//! Every adjustment works in three phases: gather the reference positions, compute a single
//! [`Transform`], then apply it to the moving set. Nothing is mutated when gathering or computing
//! fails.

use crate::crystolecule::atomic_structure::{compute_moving_fragment, AtomicStructure};
use crate::crystolecule::error::ModelError;
use crate::util::mat_utils::arbitrary_perpendicular;
use crate::util::transform::Transform;
use glam::f64::{DQuat, DVec3};
use log::{debug, warn};
use rustc_hash::FxHashMap;

/// Distance changes below this are treated as no-ops.
pub const MIN_ADJUSTABLE_DISTANCE: f64 = 1e-4;

pub const SMART_OFFSET_STEP: f64 = 3.0;
pub const SMART_OFFSET_MAX_STEPS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    /// Å
    Distance(f64),
    /// Degrees in [0, 180]
    Angle(f64),
    /// Degrees in (-180, 180]
    Dihedral(f64),
}

impl Measurement {
    pub fn value(&self) -> f64 {
        match self {
            Measurement::Distance(v) | Measurement::Angle(v) | Measurement::Dihedral(v) => *v,
        }
    }
}

pub fn distance(p1: DVec3, p2: DVec3) -> f64 {
    p1.distance(p2)
}

/// Angle P1-P2-P3 in degrees, with P2 as the vertex. Zero if an arm has zero length.
pub fn angle_degrees(p1: DVec3, p2: DVec3, p3: DVec3) -> f64 {
    let u = p1 - p2;
    let v = p3 - p2;
    let denom = u.length() * v.length();
    if denom == 0.0 {
        return 0.0;
    }
    (u.dot(v) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Dihedral P1-P2-P3-P4 in degrees:
/// b₁=P2−P1, b₂=P3−P2, b₃=P4−P3; n₁=b₁×b₂, n₂=b₂×b₃, m₁=n₁×b̂₂; φ = atan2(m₁·n₂, n₁·n₂).
pub fn dihedral_degrees(p1: DVec3, p2: DVec3, p3: DVec3, p4: DVec3) -> f64 {
    let b1 = p2 - p1;
    let b2 = p3 - p2;
    let b3 = p4 - p3;

    let n1 = b1.cross(b2);
    let n2 = b2.cross(b3);
    let m1 = n1.cross(b2.normalize_or_zero());

    m1.dot(n2).atan2(n1.dot(n2)).to_degrees()
}

/// Measures 2, 3 or 4 positions as a distance, angle or dihedral.
pub fn measure(positions: &[DVec3]) -> Result<Measurement, ModelError> {
    match *positions {
        [p1, p2] => Ok(Measurement::Distance(distance(p1, p2))),
        [p1, p2, p3] => Ok(Measurement::Angle(angle_degrees(p1, p2, p3))),
        [p1, p2, p3, p4] => Ok(Measurement::Dihedral(dihedral_degrees(p1, p2, p3, p4))),
        _ => Err(ModelError::SelectionSize {
            expected: "2, 3 or 4",
            actual: positions.len(),
        }),
    }
}

pub fn measure_atoms(structure: &AtomicStructure, atom_ids: &[u32]) -> Result<Measurement, ModelError> {
    measure(&gather_positions(structure, atom_ids)?)
}

fn gather_positions(structure: &AtomicStructure, atom_ids: &[u32]) -> Result<Vec<DVec3>, ModelError> {
    atom_ids
        .iter()
        .map(|&id| structure.atom_position(id))
        .collect()
}

/// Translation moving P2 along P1→P2 so that |P1P2| becomes `target`. Identity when the two
/// points coincide (closer than [`MIN_ADJUSTABLE_DISTANCE`]).
pub fn distance_adjustment(p1: DVec3, p2: DVec3, target: f64) -> Transform {
    let current = p1.distance(p2);
    if current < MIN_ADJUSTABLE_DISTANCE {
        return Transform::IDENTITY;
    }
    let direction = (p2 - p1) / current;
    Transform::from_translation((target - current) * direction)
}

/// Rotation about P2 by `(θ_target − θ_current)` around `(P1−P2) × (P3−P2)`. For collinear
/// arms an arbitrary axis perpendicular to P1−P2 is used.
pub fn angle_adjustment(
    p1: DVec3,
    p2: DVec3,
    p3: DVec3,
    target_degrees: f64,
) -> Result<Transform, ModelError> {
    let u = p1 - p2;
    let v = p3 - p2;
    if u.length_squared() < MIN_ADJUSTABLE_DISTANCE * MIN_ADJUSTABLE_DISTANCE {
        return Err(ModelError::DegenerateGeometry(
            "first atom coincides with the vertex".to_string(),
        ));
    }

    let cross = u.cross(v);
    let axis = if cross.length_squared() < 1e-20 {
        warn!("angle arms are collinear, rotating around an arbitrary perpendicular axis");
        arbitrary_perpendicular(u)
    } else {
        cross.normalize()
    };

    let delta = target_degrees - angle_degrees(p1, p2, p3);
    Ok(Transform::new_axis_rotation(p2, axis, delta.to_radians()))
}

/// Rotation about the P2→P3 axis, pivot P3, by `−(φ_target − φ_current)` with the delta taken
/// on the short path in (−180°, 180°].
pub fn dihedral_adjustment(
    p1: DVec3,
    p2: DVec3,
    p3: DVec3,
    p4: DVec3,
    target_degrees: f64,
) -> Result<Transform, ModelError> {
    let axis = (p3 - p2).normalize_or_zero();
    if axis == DVec3::ZERO {
        return Err(ModelError::DegenerateGeometry(
            "center atoms overlap, cannot define rotation axis".to_string(),
        ));
    }

    let delta = normalize_angle_delta(target_degrees - dihedral_degrees(p1, p2, p3, p4));
    Ok(Transform::new_axis_rotation(p3, axis, (-delta).to_radians()))
}

/// Maps an angle difference in degrees onto (−180, 180].
pub fn normalize_angle_delta(mut delta: f64) -> f64 {
    while delta > 180.0 {
        delta -= 360.0;
    }
    while delta <= -180.0 {
        delta += 360.0;
    }
    delta
}

/// Sets |a₀a₁| to `target` by translating `moving`.
pub fn set_distance(
    structure: &mut AtomicStructure,
    atoms: [u32; 2],
    target: f64,
    moving: &[u32],
) -> Result<(), ModelError> {
    if !(target.is_finite() && target > 0.0) {
        return Err(ModelError::InvalidArgument(format!(
            "distance must be positive, got {}",
            target
        )));
    }
    let p = gather_positions(structure, &atoms)?;
    let transform = distance_adjustment(p[0], p[1], target);
    structure.transform_atoms(moving, &transform);
    debug!("set distance {:?} to {:.4}", atoms, target);
    Ok(())
}

/// Sets the angle a₀-a₁-a₂ (vertex a₁) to `target_degrees` by rotating `moving`.
pub fn set_angle(
    structure: &mut AtomicStructure,
    atoms: [u32; 3],
    target_degrees: f64,
    moving: &[u32],
) -> Result<(), ModelError> {
    if !(0.0..=180.0).contains(&target_degrees) {
        return Err(ModelError::InvalidArgument(format!(
            "angle must be between 0 and 180 degrees, got {}",
            target_degrees
        )));
    }
    let p = gather_positions(structure, &atoms)?;
    let transform = angle_adjustment(p[0], p[1], p[2], target_degrees)?;
    structure.transform_atoms(moving, &transform);
    Ok(())
}

/// Sets the dihedral a₀-a₁-a₂-a₃ to `target_degrees` by rotating `moving`.
pub fn set_dihedral(
    structure: &mut AtomicStructure,
    atoms: [u32; 4],
    target_degrees: f64,
    moving: &[u32],
) -> Result<(), ModelError> {
    if !target_degrees.is_finite() {
        return Err(ModelError::InvalidArgument("dihedral must be finite".to_string()));
    }
    let p = gather_positions(structure, &atoms)?;
    let transform = dihedral_adjustment(p[0], p[1], p[2], p[3], target_degrees)?;
    structure.transform_atoms(moving, &transform);
    Ok(())
}

/// The moving set used when the caller does not supply one: the last selected atom together with
/// every atom graph-closer to it than to the one before it.
pub fn default_moving_set(structure: &AtomicStructure, selection: &[u32]) -> Vec<u32> {
    let [.., reference, moving] = selection else {
        return Vec::new();
    };
    let mut ids: Vec<u32> = compute_moving_fragment(structure, *moving, *reference)
        .into_iter()
        .collect();
    ids.sort_unstable();
    ids
}

/// Smallest translation along +z, in whole steps, after which every pair between `fixed` and
/// `moving` is at least `min_distance` apart. Gives up after `max_steps` and returns that offset.
pub fn smart_offset_with(
    fixed: &[DVec3],
    moving: &[DVec3],
    min_distance: f64,
    step: f64,
    max_steps: u32,
) -> DVec3 {
    let min_distance_squared = min_distance * min_distance;
    for k in 0..=max_steps {
        let offset = DVec3::Z * (k as f64 * step);
        let clear = moving.iter().all(|m| {
            let shifted = *m + offset;
            fixed
                .iter()
                .all(|f| f.distance_squared(shifted) >= min_distance_squared)
        });
        if clear {
            return offset;
        }
    }
    DVec3::Z * (max_steps as f64 * step)
}

pub fn smart_offset(fixed: &[DVec3], moving: &[DVec3], min_distance: f64) -> DVec3 {
    smart_offset_with(
        fixed,
        moving,
        min_distance,
        SMART_OFFSET_STEP,
        SMART_OFFSET_MAX_STEPS,
    )
}

/// Copies the listed atoms, and the bonds between them, through `transform`. Returns the new ids
/// in the order of `atom_ids`.
pub fn transformed_copy(
    structure: &mut AtomicStructure,
    atom_ids: &[u32],
    transform: &Transform,
) -> Result<Vec<u32>, ModelError> {
    let staged: Vec<(u32, i16, DVec3)> = atom_ids
        .iter()
        .map(|&id| {
            structure
                .atom(id)
                .map(|atom| (id, atom.atomic_number, transform.apply_to_position(&atom.position)))
        })
        .collect::<Result<_, _>>()?;
    let bonds: Vec<(u32, u32, u8)> = structure
        .bonds()
        .iter()
        .filter(|bond| atom_ids.contains(&bond.atom_id1) && atom_ids.contains(&bond.atom_id2))
        .map(|bond| (bond.atom_id1, bond.atom_id2, bond.order))
        .collect();

    let mut id_map: FxHashMap<u32, u32> = FxHashMap::default();
    let mut new_ids = Vec::with_capacity(staged.len());
    for (old_id, atomic_number, position) in staged {
        let new_id = *id_map
            .entry(old_id)
            .or_insert_with(|| structure.add_atom(atomic_number, position));
        new_ids.push(new_id);
    }
    for (id1, id2, order) in bonds {
        if let (Some(&new1), Some(&new2)) = (id_map.get(&id1), id_map.get(&id2)) {
            structure.add_bond(new1, new2, order)?;
        }
    }
    Ok(new_ids)
}

pub fn translated_copy(
    structure: &mut AtomicStructure,
    atom_ids: &[u32],
    delta: DVec3,
) -> Result<Vec<u32>, ModelError> {
    transformed_copy(structure, atom_ids, &Transform::from_translation(delta))
}

/// Copy rotated by `rotation` around the centroid of the copied atoms.
pub fn rotated_copy(
    structure: &mut AtomicStructure,
    atom_ids: &[u32],
    rotation: DQuat,
) -> Result<Vec<u32>, ModelError> {
    let pivot = structure.centroid_of(atom_ids).unwrap_or(DVec3::ZERO);
    transformed_copy(
        structure,
        atom_ids,
        &Transform::new_rotation_around_point(pivot, rotation),
    )
}

/// Rotation from Euler angles in degrees about the fixed axes, applied X then Y then Z.
pub fn euler_rotation(degrees: DVec3) -> DQuat {
    DQuat::from_rotation_z(degrees.z.to_radians())
        * DQuat::from_rotation_y(degrees.y.to_radians())
        * DQuat::from_rotation_x(degrees.x.to_radians())
}

/// Rotates the listed atoms by Euler angles (degrees) around their centroid.
pub fn rotate_euler(structure: &mut AtomicStructure, atom_ids: &[u32], degrees: DVec3) {
    if let Some(pivot) = structure.centroid_of(atom_ids) {
        structure.rotate_atoms(atom_ids, pivot, euler_rotation(degrees));
    }
}
