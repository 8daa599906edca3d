use crystal_editor::crystolecule::crystal::Crystal;
use crystal_editor::crystolecule::error::ModelError;
use crystal_editor::crystolecule::lattice::Lattice;
use crystal_editor::crystolecule::slab::{generate_slab, SlabParameters};
use glam::f64::DVec3;
use glam::i32::IVec3;

// ============================================================================
// Helper Functions
// ============================================================================

/// Cubic 3 Å cell with atoms at (0,0,0) and (0,0,1/2).
fn stacked_cubic() -> Crystal {
    let mut crystal = Crystal::new("cubic", Lattice::cubic(3.0).unwrap());
    crystal.add_atom_fractional(6, DVec3::ZERO).unwrap();
    crystal.add_atom_fractional(6, DVec3::new(0.0, 0.0, 0.5)).unwrap();
    crystal
}

fn triclinic() -> Crystal {
    let mut crystal = Crystal::new(
        "tri",
        Lattice::new(3.8, 4.2, 5.1, 84.0, 96.0, 103.0).unwrap(),
    );
    crystal.add_atom_fractional(14, DVec3::new(0.1, 0.2, 0.3)).unwrap();
    crystal.add_atom_fractional(8, DVec3::new(0.6, 0.4, 0.7)).unwrap();
    crystal
}

/// Conventional 4 Å face-centred cubic cell.
fn fcc() -> Crystal {
    let mut crystal = Crystal::new("fcc", Lattice::cubic(4.0).unwrap());
    for frac in [
        DVec3::ZERO,
        DVec3::new(0.5, 0.5, 0.0),
        DVec3::new(0.5, 0.0, 0.5),
        DVec3::new(0.0, 0.5, 0.5),
    ] {
        crystal.add_atom_fractional(29, frac).unwrap();
    }
    crystal
}

fn params(miller: IVec3, layers: usize, vacuum: f64, centered: bool) -> SlabParameters {
    SlabParameters {
        miller,
        layers,
        vacuum,
        centered,
    }
}

fn sorted_heights(crystal: &Crystal) -> Vec<f64> {
    let mut heights: Vec<f64> = crystal
        .fractional_coordinates()
        .unwrap()
        .into_iter()
        .map(|(_, frac)| frac.z)
        .collect();
    heights.sort_by(f64::total_cmp);
    heights
}

// ============================================================================
// Geometry
// ============================================================================

#[test]
fn centered_001_slab_on_a_cubic_cell() {
    let slab = generate_slab(&stacked_cubic(), &params(IVec3::new(0, 0, 1), 2, 6.0, true)).unwrap();
    let lattice = slab.crystal.require_lattice().unwrap();
    let (a, b, c) = lattice.vectors();

    assert!((a - DVec3::new(3.0, 0.0, 0.0)).length() < 1e-9);
    assert!((b - DVec3::new(0.0, 3.0, 0.0)).length() < 1e-9);
    assert!((c - DVec3::new(0.0, 0.0, 9.0)).length() < 1e-9);
    assert!(a.cross(b).dot(c) > 0.0);

    assert_eq!(slab.info.atom_count, 2);
    assert_eq!(slab.crystal.name(), "cubic_slab_001");
    // 3 Å of vacuum below, then layers at 3 and 4.5 Å
    let heights = sorted_heights(&slab.crystal);
    assert!((heights[0] - 3.0 / 9.0).abs() < 1e-9);
    assert!((heights[1] - 4.5 / 9.0).abs() < 1e-9);
}

#[test]
fn uncentered_slab_starts_at_the_bottom() {
    let slab =
        generate_slab(&stacked_cubic(), &params(IVec3::new(0, 0, 1), 3, 4.0, false)).unwrap();
    let heights = sorted_heights(&slab.crystal);
    assert_eq!(heights.len(), 3);
    assert!(heights[0].abs() < 1e-9);
    let c = slab.crystal.require_lattice().unwrap().vectors().2;
    assert!((c.length() - 8.5).abs() < 1e-9);
}

#[test]
fn miller_indices_are_reduced() {
    let slab = generate_slab(&stacked_cubic(), &params(IVec3::new(0, 0, 2), 2, 5.0, false)).unwrap();
    assert_eq!(slab.info.miller, [0, 0, 1]);
    assert_eq!(slab.crystal.name(), "cubic_slab_001");
}

#[test]
fn slab_c_vector_follows_the_surface_normal() {
    let crystal = triclinic();
    let lattice = crystal.require_lattice().unwrap().clone();
    for miller in [IVec3::new(1, 0, 0), IVec3::new(1, 1, 0), IVec3::new(1, 1, 1), IVec3::new(2, -1, 1)] {
        let slab = generate_slab(&crystal, &params(miller, 2, 8.0, true)).unwrap();
        let normal = lattice.miller_plane_props(miller).unwrap().normal;
        let (a, b, c) = slab.crystal.require_lattice().unwrap().vectors();
        assert!(c.normalize().cross(normal).length() < 1e-6, "c not along normal for {:?}", miller);
        assert!(a.dot(normal).abs() < 1e-6);
        assert!(b.dot(normal).abs() < 1e-6);
        assert!(a.cross(b).dot(c) > 0.0);
        for (_, frac) in slab.crystal.fractional_coordinates().unwrap() {
            assert!((-1e-9..1.0).contains(&frac.x));
            assert!((-1e-9..1.0).contains(&frac.y));
        }
    }
}

/// Atom counts per distinct fractional height, bottom first.
fn atoms_per_layer(crystal: &Crystal) -> Vec<usize> {
    let mut counts: Vec<(f64, usize)> = Vec::new();
    for z in sorted_heights(crystal) {
        match counts.last_mut() {
            Some((start, count)) if z - *start < 1e-3 => *count += 1,
            _ => counts.push((z, 1)),
        }
    }
    counts.into_iter().map(|(_, count)| count).collect()
}

#[test]
fn fcc_111_slab_has_complete_layers() {
    let slab = generate_slab(&fcc(), &params(IVec3::new(1, 1, 1), 3, 10.0, false)).unwrap();
    assert_eq!(slab.info.atom_count, 12);
    assert_eq!(atoms_per_layer(&slab.crystal), vec![4, 4, 4]);

    let d = 4.0 / 3f64.sqrt();
    assert!((slab.info.d_spacing - d).abs() < 1e-9);
    let c = slab.crystal.require_lattice().unwrap().vectors().2;
    assert!((c.length() - (3.0 * d + 10.0)).abs() < 1e-6);
    let heights = sorted_heights(&slab.crystal);
    assert!(heights[0].abs() < 1e-9);
}

#[test]
fn fcc_110_slab_alternates_equal_layers() {
    let slab = generate_slab(&fcc(), &params(IVec3::new(1, 1, 0), 4, 8.0, true)).unwrap();
    assert_eq!(slab.info.atom_count, 8);
    assert_eq!(atoms_per_layer(&slab.crystal), vec![2, 2, 2, 2]);

    // (110) planes of the conventional cell hold two atomic layers each
    let c = slab.crystal.require_lattice().unwrap().vectors().2;
    let thickness = 2.0 * 4.0 / 2f64.sqrt();
    assert!((c.length() - (thickness + 8.0)).abs() < 1e-6);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn invalid_slab_requests_are_rejected() {
    let crystal = stacked_cubic();
    assert!(matches!(
        generate_slab(&crystal, &params(IVec3::new(0, 0, 1), 0, 5.0, false)),
        Err(ModelError::InvalidArgument(_))
    ));
    assert!(matches!(
        generate_slab(&crystal, &params(IVec3::new(0, 0, 1), 2, -1.0, false)),
        Err(ModelError::InvalidArgument(_))
    ));
    assert!(matches!(
        generate_slab(&crystal, &params(IVec3::ZERO, 2, 5.0, false)),
        Err(ModelError::ZeroMillerIndices)
    ));
    assert!(matches!(
        generate_slab(&Crystal::without_lattice("bare"), &params(IVec3::Z, 2, 5.0, false)),
        Err(ModelError::MissingLattice)
    ));
}

#[test]
fn too_many_layers_reports_the_count_found() {
    let mut crystal = Crystal::new("single", Lattice::cubic(3.0).unwrap());
    crystal.add_atom_fractional(6, DVec3::ZERO).unwrap();
    let result = generate_slab(&crystal, &params(IVec3::new(0, 0, 1), 20, 5.0, false));
    assert_eq!(
        result.err(),
        Some(ModelError::InsufficientLayers {
            found: 8,
            requested: 20
        })
    );
}
