use crystal_editor::crystolecule::atomic_structure::{AtomicStructure, BOND_SINGLE};
use crystal_editor::crystolecule::error::ModelError;
use crystal_editor::crystolecule::geometry::{
    angle_degrees, default_moving_set, dihedral_degrees, measure_atoms, rotate_euler,
    set_angle, set_dihedral, set_distance, smart_offset, smart_offset_with, translated_copy,
    Measurement,
};
use glam::f64::{DQuat, DVec3};

const EPS: f64 = 1e-6;

fn structure_with(atoms: &[(i16, DVec3)]) -> AtomicStructure {
    let mut s = AtomicStructure::new("geometry");
    for &(z, p) in atoms {
        s.add_atom(z, p);
    }
    s
}

fn position(s: &AtomicStructure, id: u32) -> DVec3 {
    s.atom_position(id).unwrap()
}

// ============================================================================
// Measurement
// ============================================================================

#[test]
fn measurements_follow_selection_size() {
    let s = structure_with(&[
        (6, DVec3::new(1.0, 0.0, 0.0)),
        (6, DVec3::ZERO),
        (6, DVec3::new(0.0, 1.0, 0.0)),
        (6, DVec3::new(0.0, 1.0, 1.0)),
    ]);
    assert_eq!(measure_atoms(&s, &[1, 2]), Ok(Measurement::Distance(1.0)));
    let angle = measure_atoms(&s, &[1, 2, 3]).unwrap();
    assert!(matches!(angle, Measurement::Angle(v) if (v - 90.0).abs() < EPS));
    let dihedral = measure_atoms(&s, &[1, 2, 3, 4]).unwrap();
    assert!(matches!(dihedral, Measurement::Dihedral(v) if (v.abs() - 90.0).abs() < EPS));
    assert!(matches!(
        measure_atoms(&s, &[1]),
        Err(ModelError::SelectionSize { actual: 1, .. })
    ));
    assert_eq!(measure_atoms(&s, &[1, 9]), Err(ModelError::AtomNotFound(9)));
}

#[test]
fn measurements_are_invariant_under_rigid_motion() {
    let points = [
        DVec3::new(0.3, -1.2, 0.8),
        DVec3::new(1.1, 0.4, -0.2),
        DVec3::new(2.0, 1.5, 0.9),
        DVec3::new(3.3, 1.1, 2.4),
    ];
    let rotation = DQuat::from_axis_angle(DVec3::new(1.0, 2.0, -0.5).normalize(), 1.234);
    let shift = DVec3::new(-4.0, 7.5, 2.25);
    let moved: Vec<DVec3> = points.iter().map(|p| rotation * *p + shift).collect();

    assert!(
        (angle_degrees(points[0], points[1], points[2])
            - angle_degrees(moved[0], moved[1], moved[2]))
        .abs()
            < 1e-9
    );
    assert!(
        (dihedral_degrees(points[0], points[1], points[2], points[3])
            - dihedral_degrees(moved[0], moved[1], moved[2], moved[3]))
        .abs()
            < 1e-9
    );
}

// ============================================================================
// Adjustments
// ============================================================================

#[test]
fn bond_length_adjustment_moves_only_the_moving_set() {
    let mut s = structure_with(&[(1, DVec3::ZERO), (17, DVec3::new(2.0, 0.0, 0.0))]);
    set_distance(&mut s, [1, 2], 1.27, &[2]).unwrap();
    assert!((position(&s, 2) - DVec3::new(1.27, 0.0, 0.0)).length() < EPS);
    assert_eq!(position(&s, 1), DVec3::ZERO);
}

#[test]
fn angle_adjustment_preserves_the_arm_length() {
    let mut s = structure_with(&[
        (6, DVec3::new(1.0, 0.0, 0.0)),
        (6, DVec3::ZERO),
        (6, DVec3::new(0.0, 1.0, 0.0)),
    ]);
    set_angle(&mut s, [1, 2, 3], 109.47, &[3]).unwrap();
    let c = position(&s, 3);
    assert!((angle_degrees(position(&s, 1), DVec3::ZERO, c) - 109.47).abs() < EPS);
    assert!((c.length() - 1.0).abs() < EPS);
}

#[test]
fn collinear_angles_open_to_the_target() {
    for (start, label) in [(DVec3::new(-2.0, 0.0, 0.0), "straight"), (DVec3::new(2.0, 0.0, 0.0), "folded")] {
        let mut s = structure_with(&[(6, DVec3::new(1.0, 0.0, 0.0)), (6, DVec3::ZERO), (6, start)]);
        set_angle(&mut s, [1, 2, 3], 90.0, &[3]).unwrap();
        let c = position(&s, 3);
        let angle = angle_degrees(position(&s, 1), DVec3::ZERO, c);
        assert!((angle - 90.0).abs() < EPS, "{} arm ended at {} degrees", label, angle);
        assert!((c.length() - 2.0).abs() < EPS);
        assert!(c.is_finite());
    }
}

#[test]
fn angle_with_the_first_atom_on_the_vertex_is_degenerate() {
    let mut s = structure_with(&[
        (6, DVec3::ZERO),
        (6, DVec3::ZERO),
        (6, DVec3::new(0.0, 1.0, 0.0)),
    ]);
    assert!(matches!(
        set_angle(&mut s, [1, 2, 3], 120.0, &[3]),
        Err(ModelError::DegenerateGeometry(_))
    ));
    assert_eq!(position(&s, 3), DVec3::new(0.0, 1.0, 0.0));
}

#[test]
fn dihedral_adjustment_reaches_a_negative_target() {
    let mut s = structure_with(&[
        (6, DVec3::new(1.0, 0.0, 0.0)),
        (6, DVec3::ZERO),
        (6, DVec3::new(0.0, 1.0, 0.0)),
        (6, DVec3::new(0.0, 1.0, 1.0)),
    ]);
    set_dihedral(&mut s, [1, 2, 3, 4], -60.0, &[4]).unwrap();
    let measured = dihedral_degrees(
        position(&s, 1),
        position(&s, 2),
        position(&s, 3),
        position(&s, 4),
    );
    assert!((measured + 60.0).abs() < EPS, "dihedral was {}", measured);
}

#[test]
fn adjustments_reject_bad_targets() {
    let mut s = structure_with(&[
        (6, DVec3::new(1.0, 0.0, 0.0)),
        (6, DVec3::ZERO),
        (6, DVec3::new(0.0, 1.0, 0.0)),
        (6, DVec3::new(0.0, 1.0, 0.0)),
    ]);
    assert!(matches!(
        set_distance(&mut s, [1, 2], -1.0, &[2]),
        Err(ModelError::InvalidArgument(_))
    ));
    assert!(matches!(
        set_angle(&mut s, [1, 2, 3], 190.0, &[3]),
        Err(ModelError::InvalidArgument(_))
    ));
    // atoms 3 and 4 coincide and leave no rotation axis
    assert!(matches!(
        set_dihedral(&mut s, [1, 3, 4, 2], 30.0, &[2]),
        Err(ModelError::DegenerateGeometry(_))
    ));
}

#[test]
fn default_moving_set_is_the_fragment_of_the_last_atom() {
    let mut s = structure_with(&[
        (6, DVec3::ZERO),
        (6, DVec3::new(1.5, 0.0, 0.0)),
        (1, DVec3::new(2.5, 0.0, 0.0)),
        (1, DVec3::new(-1.0, 0.0, 0.0)),
    ]);
    s.add_bond(1, 2, BOND_SINGLE).unwrap();
    s.add_bond(2, 3, BOND_SINGLE).unwrap();
    s.add_bond(1, 4, BOND_SINGLE).unwrap();
    assert_eq!(default_moving_set(&s, &[1, 2]), vec![2, 3]);
    assert_eq!(default_moving_set(&s, &[4, 1, 2]), vec![2, 3]);
    assert!(default_moving_set(&s, &[1]).is_empty());
}

// ============================================================================
// Offsets and copies
// ============================================================================

#[test]
fn smart_offset_steps_along_z_until_clear() {
    let fixed = [DVec3::ZERO];
    assert_eq!(smart_offset(&fixed, &[DVec3::new(5.0, 0.0, 0.0)], 2.0), DVec3::ZERO);
    assert_eq!(
        smart_offset(&fixed, &[DVec3::new(0.5, 0.0, 0.0)], 2.0),
        DVec3::new(0.0, 0.0, 3.0)
    );
    assert_eq!(
        smart_offset_with(&fixed, &[DVec3::ZERO], 10.0, 1.0, 4),
        DVec3::new(0.0, 0.0, 4.0)
    );
}

#[test]
fn translated_copy_duplicates_internal_bonds() {
    let mut s = structure_with(&[(8, DVec3::ZERO), (1, DVec3::new(0.96, 0.0, 0.0))]);
    s.add_bond(1, 2, BOND_SINGLE).unwrap();
    let copies = translated_copy(&mut s, &[1, 2], DVec3::new(0.0, 3.0, 0.0)).unwrap();
    assert_eq!(copies, vec![3, 4]);
    assert!(s.has_bond_between(3, 4));
    assert!((position(&s, 4) - DVec3::new(0.96, 3.0, 0.0)).length() < EPS);
}

#[test]
fn euler_rotation_keeps_the_centroid() {
    let mut s = structure_with(&[
        (6, DVec3::new(1.0, 2.0, 3.0)),
        (6, DVec3::new(2.0, 2.0, 3.0)),
        (6, DVec3::new(1.0, 4.0, 3.0)),
    ]);
    let before = s.centroid().unwrap();
    rotate_euler(&mut s, &[1, 2, 3], DVec3::new(30.0, 45.0, 90.0));
    assert!((s.centroid().unwrap() - before).length() < EPS);
    assert!((position(&s, 1).distance(position(&s, 2)) - 1.0).abs() < EPS);
}
