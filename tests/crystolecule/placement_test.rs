use crystal_editor::crystolecule::atomic_structure::{AtomicStructure, BOND_DOUBLE, BOND_SINGLE};
use crystal_editor::crystolecule::error::ModelError;
use crystal_editor::crystolecule::functional_group::{
    attach_group, builtin_group, AttachOptions, FunctionalGroup, GroupAtom, GroupBond,
    BUILTIN_GROUP_NAMES,
};
use crystal_editor::crystolecule::placement::{
    add_hydrogens, detect_hybridization, place_bonded_atom, saturation_directions,
    vsepr_direction, Hybridization, TETRAHEDRAL_ANGLE,
};
use glam::f64::DVec3;

const EPS: f64 = 1e-9;

fn pairwise_angles(center: DVec3, points: &[DVec3]) -> Vec<f64> {
    let mut angles = Vec::new();
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let u = (points[i] - center).normalize();
            let v = (points[j] - center).normalize();
            angles.push(u.dot(v).clamp(-1.0, 1.0).acos());
        }
    }
    angles
}

// ============================================================================
// VSEPR directions
// ============================================================================

#[test]
fn vsepr_direction_points_away_from_neighbors() {
    assert_eq!(vsepr_direction(&[]), DVec3::X);
    assert_eq!(vsepr_direction(&[DVec3::Y]), -DVec3::Y);
    let dir = vsepr_direction(&[DVec3::X, DVec3::Y]);
    assert!((dir - DVec3::new(-1.0, -1.0, 0.0).normalize()).length() < EPS);
    // antiparallel neighbors: any perpendicular will do
    let dir = vsepr_direction(&[DVec3::X, -DVec3::X]);
    assert!(dir.dot(DVec3::X).abs() < EPS);
    assert!((dir.length() - 1.0).abs() < EPS);
}

#[test]
fn saturation_completes_each_geometry() {
    let linear = saturation_directions(&[DVec3::Z], 2).unwrap();
    assert_eq!(linear, vec![-DVec3::Z]);

    let trigonal = saturation_directions(&[DVec3::X], 3).unwrap();
    assert_eq!(trigonal.len(), 2);
    for dir in &trigonal {
        assert!((dir.dot(DVec3::X) + 0.5).abs() < EPS);
    }

    let tetrahedral = saturation_directions(&[DVec3::X], 4).unwrap();
    assert_eq!(tetrahedral.len(), 3);
    let mut all = tetrahedral.clone();
    all.push(DVec3::X);
    for angle in pairwise_angles(DVec3::ZERO, &all) {
        assert!((angle - TETRAHEDRAL_ANGLE).abs() < 1e-6);
    }

    assert!(saturation_directions(&[DVec3::X, DVec3::Y], 2).unwrap().is_empty());
    assert!(matches!(
        saturation_directions(&[], 5),
        Err(ModelError::InvalidArgument(_))
    ));
}

// ============================================================================
// Hydrogen saturation
// ============================================================================

#[test]
fn bare_carbon_becomes_methane() {
    let mut s = AtomicStructure::new("methane");
    let c = s.add_atom(6, DVec3::ZERO);
    let hydrogens = add_hydrogens(&mut s, c, None).unwrap();

    assert_eq!(hydrogens.len(), 4);
    assert_eq!(s.get_num_of_bonds(), 4);
    let positions: Vec<DVec3> = hydrogens
        .iter()
        .map(|&id| s.atom_position(id).unwrap())
        .collect();
    for p in &positions {
        assert!((p.length() - 1.07).abs() < EPS);
    }
    for angle in pairwise_angles(DVec3::ZERO, &positions) {
        assert!((angle - TETRAHEDRAL_ANGLE).abs() < 1e-6);
    }

    // saturated atoms get nothing more
    assert!(add_hydrogens(&mut s, c, None).unwrap().is_empty());
}

#[test]
fn double_bond_gives_trigonal_hydrogens() {
    let mut s = AtomicStructure::new("ethylene");
    let c1 = s.add_atom(6, DVec3::ZERO);
    let c2 = s.add_atom(6, DVec3::new(1.34, 0.0, 0.0));
    s.add_bond(c1, c2, BOND_DOUBLE).unwrap();
    assert_eq!(detect_hybridization(&s, c1), Ok(Hybridization::Sp2));

    let hydrogens = add_hydrogens(&mut s, c1, None).unwrap();
    assert_eq!(hydrogens.len(), 2);
    let mut points: Vec<DVec3> = hydrogens
        .iter()
        .map(|&id| s.atom_position(id).unwrap())
        .collect();
    points.push(s.atom_position(c2).unwrap());
    for angle in pairwise_angles(DVec3::ZERO, &points) {
        assert!((angle.to_degrees() - 120.0).abs() < 1e-6);
    }
}

#[test]
fn explicit_valence_overrides_the_element_default() {
    let mut s = AtomicStructure::new("n");
    let n = s.add_atom(7, DVec3::ZERO);
    assert_eq!(add_hydrogens(&mut s, n, Some(2)).unwrap().len(), 2);
    assert_eq!(add_hydrogens(&mut s, 42, None), Err(ModelError::AtomNotFound(42)));
}

#[test]
fn grown_atom_sits_opposite_the_existing_neighbor() {
    let mut s = AtomicStructure::new("grow");
    let c1 = s.add_atom(6, DVec3::ZERO);
    let c2 = s.add_atom(6, DVec3::new(0.0, 1.52, 0.0));
    s.add_bond(c1, c2, BOND_SINGLE).unwrap();

    let o = place_bonded_atom(&mut s, c1, 8).unwrap();
    assert!(s.has_bond_between(c1, o));
    let p = s.atom_position(o).unwrap();
    assert!((p - DVec3::new(0.0, -1.42, 0.0)).length() < EPS);
}

// ============================================================================
// Functional groups
// ============================================================================

#[test]
fn every_builtin_group_resolves() {
    for name in BUILTIN_GROUP_NAMES {
        let group = builtin_group(name).unwrap();
        assert_eq!(group.name(), name);
        assert_eq!(group.inserted_atom_count(), group.atoms().len() - 1);
    }
    assert!(builtin_group("METHYL").is_some());
    assert!(builtin_group("trifluoromethyl").is_none());
}

#[test]
fn methyl_attaches_along_the_open_direction() {
    let mut s = AtomicStructure::new("ethane");
    let c1 = s.add_atom(6, DVec3::ZERO);
    let group = builtin_group("methyl").unwrap();
    let inserted = attach_group(&mut s, c1, &group, AttachOptions::default()).unwrap();

    assert_eq!(inserted.len(), 4);
    assert_eq!(s.get_num_of_atoms(), 5);
    assert_eq!(s.get_num_of_bonds(), 4);
    let c2 = inserted[0];
    assert!(s.has_bond_between(c1, c2));
    assert!((s.atom_position(c2).unwrap() - DVec3::new(1.52, 0.0, 0.0)).length() < EPS);
    assert!(s.iter_atoms().all(|atom| !atom.is_dummy()));
}

#[test]
fn attach_options_override_direction_and_length() {
    let mut s = AtomicStructure::new("host");
    let c = s.add_atom(6, DVec3::ZERO);
    let group = builtin_group("hydroxyl").unwrap();
    let options = AttachOptions {
        direction: Some(DVec3::new(0.0, 0.0, 2.0)),
        bond_length: Some(1.5),
    };
    let inserted = attach_group(&mut s, c, &group, options).unwrap();
    assert!((s.atom_position(inserted[0]).unwrap() - DVec3::new(0.0, 0.0, 1.5)).length() < EPS);

    let zero = AttachOptions {
        direction: Some(DVec3::ZERO),
        bond_length: None,
    };
    assert!(matches!(
        attach_group(&mut s, c, &group, zero),
        Err(ModelError::InvalidArgument(_))
    ));
}

#[test]
fn group_needs_exactly_one_dummy() {
    let atoms = vec![
        GroupAtom {
            atomic_number: 6,
            position: DVec3::ZERO,
        },
        GroupAtom {
            atomic_number: 1,
            position: DVec3::X,
        },
    ];
    let bonds = vec![GroupBond {
        atom1: 0,
        atom2: 1,
        order: BOND_SINGLE,
    }];
    assert!(matches!(
        FunctionalGroup::new("no-dummy", atoms, bonds),
        Err(ModelError::InvalidGroup(_))
    ));
}
