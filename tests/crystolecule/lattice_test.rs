use crystal_editor::crystolecule::error::ModelError;
use crystal_editor::crystolecule::lattice::{Lattice, LatticeParameters};
use glam::f64::DVec3;
use glam::i32::IVec3;

fn assert_vec_near(actual: DVec3, expected: DVec3, tolerance: f64) {
    assert!(
        (actual - expected).length() < tolerance,
        "expected {:?}, got {:?}",
        expected,
        actual
    );
}

fn triclinic() -> Lattice {
    Lattice::new(4.1, 5.3, 6.7, 81.0, 97.5, 112.0).unwrap()
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn cubic_cell_is_axis_aligned() {
    let lattice = Lattice::cubic(3.5).unwrap();
    let (a, b, c) = lattice.vectors();
    assert_vec_near(a, DVec3::new(3.5, 0.0, 0.0), 1e-12);
    assert_vec_near(b, DVec3::new(0.0, 3.5, 0.0), 1e-12);
    assert_vec_near(c, DVec3::new(0.0, 0.0, 3.5), 1e-12);
    assert!((lattice.volume() - 42.875).abs() < 1e-9);
}

#[test]
fn parameters_survive_the_vector_round_trip() {
    let lattice = triclinic();
    let (a, b, c) = lattice.vectors();
    let rebuilt = Lattice::from_vectors(a, b, c).unwrap();
    let p = rebuilt.parameters();
    let expected = LatticeParameters::new(4.1, 5.3, 6.7, 81.0, 97.5, 112.0);
    assert!((p.a - expected.a).abs() < 1e-9);
    assert!((p.b - expected.b).abs() < 1e-9);
    assert!((p.c - expected.c).abs() < 1e-9);
    assert!((p.alpha - expected.alpha).abs() < 1e-9);
    assert!((p.beta - expected.beta).abs() < 1e-9);
    assert!((p.gamma - expected.gamma).abs() < 1e-9);
    assert!(rebuilt.is_approximately_equal(&lattice));
}

#[test]
fn degenerate_parameters_are_rejected() {
    assert!(matches!(
        Lattice::new(0.0, 1.0, 1.0, 90.0, 90.0, 90.0),
        Err(ModelError::DegenerateLattice(_))
    ));
    assert!(matches!(
        Lattice::new(1.0, 1.0, 1.0, 90.0, 90.0, 180.0),
        Err(ModelError::DegenerateLattice(_))
    ));
    // alpha + beta < gamma leaves no room for c
    assert!(matches!(
        Lattice::new(1.0, 1.0, 1.0, 30.0, 30.0, 120.0),
        Err(ModelError::DegenerateLattice(_))
    ));
    assert!(matches!(
        Lattice::from_vectors(DVec3::ZERO, DVec3::Y, DVec3::Z),
        Err(ModelError::DegenerateLattice(_))
    ));
}

// ============================================================================
// Coordinate conversion
// ============================================================================

#[test]
fn fractional_and_cartesian_coordinates_round_trip() {
    let lattice = triclinic();
    for frac in [
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(0.25, 0.5, 0.75),
        DVec3::new(-1.3, 2.2, 0.01),
    ] {
        let cart = lattice.frac_to_cart(frac);
        assert_vec_near(lattice.cart_to_frac(cart), frac, 1e-10);
    }
    let (_, b, _) = lattice.vectors();
    assert_vec_near(lattice.cart_to_frac(b), DVec3::Y, 1e-12);
}

#[test]
fn minimum_image_picks_the_nearest_copy() {
    let lattice = Lattice::cubic(10.0).unwrap();
    assert_vec_near(
        lattice.minimum_image(DVec3::new(9.5, 0.0, 0.0)),
        DVec3::new(-0.5, 0.0, 0.0),
        1e-12,
    );
    assert_vec_near(
        lattice.minimum_image(DVec3::new(1.0, -8.0, 4.0)),
        DVec3::new(1.0, 2.0, 4.0),
        1e-12,
    );
}

#[test]
fn minimum_image_ignores_whole_lattice_shifts() {
    let lattice = triclinic();
    let d = DVec3::new(1.2, -0.7, 2.9);
    let reference = lattice.minimum_image(d);
    for cell in [IVec3::new(1, 0, 0), IVec3::new(-2, 3, 1), IVec3::new(0, 0, -4)] {
        let shifted = lattice.minimum_image(d + lattice.translation(cell));
        assert_vec_near(shifted, reference, 1e-9);
    }
}

// ============================================================================
// Miller planes
// ============================================================================

#[test]
fn cubic_miller_planes_have_the_expected_spacing() {
    let lattice = Lattice::cubic(4.0).unwrap();
    let p100 = lattice.miller_plane_props(IVec3::new(1, 0, 0)).unwrap();
    assert_vec_near(p100.normal, DVec3::X, 1e-12);
    assert!((p100.d_spacing - 4.0).abs() < 1e-12);

    let p111 = lattice.miller_plane_props(IVec3::new(1, 1, 1)).unwrap();
    assert_vec_near(p111.normal, DVec3::ONE.normalize(), 1e-12);
    assert!((p111.d_spacing - 4.0 / 3f64.sqrt()).abs() < 1e-12);
}

#[test]
fn zero_miller_indices_are_rejected() {
    let lattice = Lattice::cubic(4.0).unwrap();
    assert!(matches!(
        lattice.miller_plane_props(IVec3::ZERO),
        Err(ModelError::ZeroMillerIndices)
    ));
}
