use crystal_editor::crystolecule::crystal::Crystal;
use crystal_editor::crystolecule::error::ModelError;
use crystal_editor::crystolecule::lattice::Lattice;
use crystal_editor::crystolecule::model::Model;
use crystal_editor::crystolecule::pbc_bonds::pbc_auto_bond;
use glam::f64::DVec3;

/// Two carbons 1.2 Å apart through the x boundary of a 10 Å cell.
fn boundary_pair() -> Crystal {
    let mut crystal = Crystal::new("boundary", Lattice::cubic(10.0).unwrap());
    crystal.add_atom(6, DVec3::new(0.5, 5.0, 5.0));
    crystal.add_atom(6, DVec3::new(9.3, 5.0, 5.0));
    crystal
}

#[test]
fn bonds_are_found_across_the_cell_boundary() {
    let mut crystal = boundary_pair();
    assert_eq!(crystal.structure_mut().auto_create_bonds(1.15), 0);
    assert_eq!(pbc_auto_bond(&mut crystal, 1.15).unwrap(), 1);
    assert!(crystal.structure().has_bond_between(1, 2));
    // second pass finds nothing new
    assert_eq!(pbc_auto_bond(&mut crystal, 1.15).unwrap(), 0);
}

#[test]
fn atoms_are_never_bonded_to_their_own_images() {
    let mut crystal = Crystal::new("tiny", Lattice::cubic(1.4).unwrap());
    crystal.add_atom(6, DVec3::ZERO);
    assert_eq!(pbc_auto_bond(&mut crystal, 1.15).unwrap(), 0);
    assert_eq!(crystal.structure().get_num_of_bonds(), 0);
}

#[test]
fn threshold_must_be_positive() {
    let mut crystal = boundary_pair();
    assert!(matches!(
        pbc_auto_bond(&mut crystal, 0.0),
        Err(ModelError::InvalidArgument(_))
    ));
    assert!(matches!(
        pbc_auto_bond(&mut Crystal::without_lattice("bare"), 1.15),
        Err(ModelError::MissingLattice)
    ));
}

#[test]
fn crystal_models_bond_periodically() {
    let mut model = Model::from(boundary_pair());
    assert_eq!(model.auto_bond(1.15).unwrap(), 1);

    let mut molecule = Model::from(boundary_pair().into_structure());
    assert_eq!(molecule.auto_bond(1.15).unwrap(), 0);
}

#[test]
fn rebond_replaces_stale_bonds() {
    let mut crystal = boundary_pair();
    crystal.add_atom(8, DVec3::new(5.0, 5.0, 5.0));
    crystal
        .structure_mut()
        .add_bond(1, 3, 2)
        .unwrap();
    let mut model = Model::from(crystal);
    assert_eq!(model.rebond(1.15).unwrap(), 1);
    assert!(model.structure().has_bond_between(1, 2));
    assert!(!model.structure().has_bond_between(1, 3));
}
