use crystal_editor::crystolecule::atomic_structure::{AtomicStructure, BOND_SINGLE};
use crystal_editor::crystolecule::crystal::Crystal;
use crystal_editor::crystolecule::error::ModelError;
use crystal_editor::crystolecule::lattice::Lattice;
use crystal_editor::crystolecule::model::Model;
use crystal_editor::editor::editor::Editor;
use crystal_editor::editor::error::EditorError;
use crystal_editor::editor::manager::MoleculeManager;
use crystal_editor::editor::settings::EditorSettings;
use glam::f64::DVec3;
use periodic_table::DUMMY_ATOMIC_NUMBER;

// ============================================================================
// Helper Functions
// ============================================================================

fn molecule(name: &str, atoms: &[(i16, DVec3)]) -> Model {
    let mut s = AtomicStructure::new(name);
    for &(z, p) in atoms {
        s.add_atom(z, p);
    }
    Model::Molecule(s)
}

fn setup() -> (MoleculeManager, Editor) {
    let mut editor = Editor::new(EditorSettings::default());
    let manager = MoleculeManager::new(molecule("first", &[(6, DVec3::ZERO)]), &mut editor);
    (manager, editor)
}

/// Methane with one hydrogen replaced by a dummy atom.
fn methyl_source() -> Model {
    let mut s = AtomicStructure::new("methyl");
    let c = s.add_atom(6, DVec3::ZERO);
    let x = s.add_atom(DUMMY_ATOMIC_NUMBER, DVec3::new(-1.0, 0.0, 0.0));
    s.add_bond(c, x, BOND_SINGLE).unwrap();
    for p in [
        DVec3::new(0.36, 1.03, 0.0),
        DVec3::new(0.36, -0.51, 0.89),
        DVec3::new(0.36, -0.51, -0.89),
    ] {
        let h = s.add_atom(1, p);
        s.add_bond(c, h, BOND_SINGLE).unwrap();
    }
    Model::Molecule(s)
}

// ============================================================================
// Naming
// ============================================================================

#[test]
fn duplicate_names_get_a_counter() {
    let (mut manager, editor) = setup();
    assert_eq!(manager.add(molecule("first", &[]), &editor), "first_1");
    assert_eq!(manager.add(molecule("first", &[]), &editor), "first_2");
    assert_eq!(manager.add(molecule("  ", &[]), &editor), "molecule");
    assert_eq!(
        manager.names().collect::<Vec<_>>(),
        vec!["first", "first_1", "first_2", "molecule"]
    );
    assert_eq!(manager.model("first_1").unwrap().name(), "first_1");
}

#[test]
fn rename_keeps_the_position_in_the_list() {
    let (mut manager, editor) = setup();
    manager.add(molecule("second", &[]), &editor);
    manager.add(molecule("third", &[]), &editor);

    assert_eq!(manager.rename("second", "renamed").unwrap(), "renamed");
    assert_eq!(manager.rename("third", "first").unwrap(), "first_1");
    assert_eq!(
        manager.names().collect::<Vec<_>>(),
        vec!["first", "renamed", "first_1"]
    );
    assert!(matches!(
        manager.rename("missing", "x"),
        Err(EditorError::UnknownStructure(_))
    ));
}

// ============================================================================
// Switching and removal
// ============================================================================

#[test]
fn switching_swaps_per_structure_history_and_settings() {
    let (mut manager, mut editor) = setup();
    editor.structure_settings.bond_threshold = 1.3;
    let mut grown = manager.active_model().clone();
    grown.structure_mut().add_atom(6, DVec3::new(1.5, 0.0, 0.0));
    *manager.active_model_mut() = grown;
    editor.save_state(manager.active_model());
    assert_eq!(editor.history.len(), 2);

    manager.create(molecule("other", &[]), &mut editor).unwrap();
    assert_eq!(manager.active_name(), "other");
    assert_eq!(editor.history.len(), 1);
    assert_eq!(editor.structure_settings.bond_threshold, 1.15);

    manager.switch_to("first", &mut editor).unwrap();
    assert_eq!(editor.history.len(), 2);
    assert_eq!(editor.structure_settings.bond_threshold, 1.3);
    assert!(editor.undo(manager.active_model_mut()).unwrap());
    assert_eq!(manager.active_model().structure().get_num_of_atoms(), 1);
}

#[test]
fn switching_clears_the_selection() {
    let (mut manager, mut editor) = setup();
    manager.add(molecule("other", &[]), &editor);
    editor.selection.select(1);
    manager.switch_to("other", &mut editor).unwrap();
    assert!(editor.selection.is_empty());
    assert!(matches!(
        manager.switch_to("nope", &mut editor),
        Err(EditorError::UnknownStructure(_))
    ));
}

#[test]
fn last_structure_cannot_be_removed() {
    let (mut manager, mut editor) = setup();
    assert!(matches!(
        manager.remove("first", &mut editor),
        Err(EditorError::LastStructure)
    ));
    assert_eq!(manager.len(), 1);
}

#[test]
fn removing_the_active_structure_activates_a_neighbor() {
    let (mut manager, mut editor) = setup();
    manager.create(molecule("second", &[]), &mut editor).unwrap();
    manager.add(molecule("third", &[]), &editor);

    manager.remove("second", &mut editor).unwrap();
    assert_eq!(manager.active_name(), "first");

    manager.remove("first", &mut editor).unwrap();
    assert_eq!(manager.active_name(), "third");
    assert_eq!(manager.len(), 1);
}

#[test]
fn removing_an_earlier_structure_keeps_the_active_one() {
    let (mut manager, mut editor) = setup();
    manager.create(molecule("second", &[(8, DVec3::ZERO)]), &mut editor).unwrap();
    manager.remove("first", &mut editor).unwrap();
    assert_eq!(manager.active_name(), "second");
    assert_eq!(manager.active_index(), 0);
    assert_eq!(manager.active_model().structure().atom(1).unwrap().atomic_number, 8);
}

// ============================================================================
// Merge and substitution
// ============================================================================

#[test]
fn merge_lifts_the_source_clear_and_removes_it() {
    let (mut manager, mut editor) = setup();
    manager.add(molecule("water", &[(8, DVec3::ZERO), (1, DVec3::new(0.96, 0.0, 0.0))]), &editor);

    let ids = manager.merge("water", &mut editor).unwrap();
    assert_eq!(ids, vec![2, 3]);
    assert!(!manager.contains("water"));
    assert_eq!(editor.selection.atoms(), &[2, 3]);
    let structure = manager.active_model().structure();
    assert_eq!(structure.atom_position(2).unwrap(), DVec3::new(0.0, 0.0, 3.0));

    assert!(matches!(
        manager.merge("first", &mut editor),
        Err(EditorError::Model(ModelError::InvalidArgument(_)))
    ));
}

#[test]
fn substitution_replaces_the_host_leaving_atom() {
    let mut editor = Editor::new(EditorSettings::default());
    let mut host = AtomicStructure::new("host");
    let c = host.add_atom(6, DVec3::ZERO);
    let h = host.add_atom(1, DVec3::new(0.0, 1.09, 0.0));
    host.add_bond(c, h, BOND_SINGLE).unwrap();
    let mut manager = MoleculeManager::new(Model::Molecule(host), &mut editor);
    manager.add(methyl_source(), &editor);

    let ids = manager
        .substitute_group(c, Some(h), "methyl", None, &mut editor)
        .unwrap();
    assert_eq!(ids.len(), 4);
    assert!(!manager.contains("methyl"));

    let structure = manager.active_model().structure();
    assert!(structure.get_atom(h).is_none());
    assert_eq!(structure.get_num_of_atoms(), 5);
    let new_c = structure.atom_position(ids[0]).unwrap();
    assert!((new_c - DVec3::new(0.0, 1.52, 0.0)).length() < 1e-9);
    assert!(structure.has_bond_between(c, ids[0]));
    assert!(structure.iter_atoms().all(|atom| !atom.is_dummy()));
}

#[test]
fn failed_substitution_leaves_everything_in_place() {
    let (mut manager, mut editor) = setup();
    manager.add(molecule("plain", &[(6, DVec3::ZERO)]), &editor);
    assert!(matches!(
        manager.substitute_group(1, None, "plain", None, &mut editor),
        Err(EditorError::Model(ModelError::InvalidGroup(_)))
    ));
    assert!(manager.contains("plain"));

    manager.add(methyl_source(), &editor);
    // host atom 1 has no neighbor 5
    assert!(manager
        .substitute_group(1, Some(5), "methyl", None, &mut editor)
        .is_err());
    assert!(manager.contains("methyl"));
    assert_eq!(manager.active_model().structure().get_num_of_atoms(), 1);
}

// ============================================================================
// Lattice fixing
// ============================================================================

#[test]
fn fixed_lattice_reads_the_original_cell() {
    let mut editor = Editor::new(EditorSettings::default());
    let mut crystal = Crystal::new("cell", Lattice::cubic(3.0).unwrap());
    crystal.add_atom_fractional(6, DVec3::ZERO).unwrap();
    let mut manager = MoleculeManager::new(Model::Crystal(crystal), &mut editor);

    manager
        .active_model_mut()
        .as_crystal_mut()
        .unwrap()
        .add_atom(8, DVec3::splat(1.0));
    assert_eq!(manager.lattice_source().unwrap().structure().get_num_of_atoms(), 2);

    manager.set_lattice_fixed(true);
    assert!(manager.lattice_fixed());
    assert_eq!(manager.lattice_source().unwrap().structure().get_num_of_atoms(), 1);
}

#[test]
fn molecules_have_no_lattice_source() {
    let (manager, _) = setup();
    assert!(manager.original_crystal().is_none());
    assert_eq!(manager.lattice_source().err(), Some(ModelError::MissingLattice));
}
