use crystal_editor::crystolecule::atomic_structure::{AtomicStructure, BOND_DOUBLE, BOND_SINGLE};
use crystal_editor::crystolecule::crystal::Crystal;
use crystal_editor::crystolecule::error::ModelError;
use crystal_editor::crystolecule::lattice::Lattice;
use crystal_editor::crystolecule::model::Model;
use crystal_editor::crystolecule::snapshot::{SnapshotError, StructureSnapshot};
use glam::f64::DVec3;

fn formaldehyde() -> AtomicStructure {
    let mut s = AtomicStructure::new("formaldehyde");
    let c = s.add_atom(6, DVec3::ZERO);
    let o = s.add_atom(8, DVec3::new(1.21, 0.0, 0.0));
    let h1 = s.add_atom(1, DVec3::new(-0.55, 0.94, 0.0));
    let h2 = s.add_atom(1, DVec3::new(-0.55, -0.94, 0.0));
    s.add_bond(c, o, BOND_DOUBLE).unwrap();
    s.add_bond(c, h1, BOND_SINGLE).unwrap();
    s.add_bond(c, h2, BOND_SINGLE).unwrap();
    s
}

#[test]
fn molecule_snapshot_keeps_ids_after_deletions() {
    let mut s = formaldehyde();
    s.remove_atom(3);
    let snapshot = s.to_snapshot();
    assert_eq!(snapshot.atom_count(), 3);

    let json = snapshot.to_json().unwrap();
    let restored = AtomicStructure::from_snapshot(&StructureSnapshot::from_json(&json).unwrap())
        .unwrap();
    assert_eq!(restored.atom_ids().collect::<Vec<_>>(), vec![1, 2, 4]);
    assert_eq!(restored.get_bond(1, 2).unwrap().order, BOND_DOUBLE);
    assert!(restored.has_bond_between(1, 4));
    assert_eq!(restored.next_atom_id(), 5);
    assert_eq!(restored.name(), "formaldehyde");
}

#[test]
fn snapshot_json_uses_camel_case_keys() {
    let mut crystal = Crystal::new("cell", Lattice::cubic(3.0).unwrap());
    crystal.add_atom_fractional(14, DVec3::splat(0.25)).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&crystal.to_snapshot().to_json().unwrap()).unwrap();

    assert_eq!(value["isCrystal"], serde_json::json!(true));
    assert_eq!(value["spaceGroup"], serde_json::json!("P 1"));
    assert_eq!(value["atoms"][0]["element"], serde_json::json!("Si"));
    assert_eq!(value["lattice"]["a"], serde_json::json!(3.0));
    assert_eq!(value["fracCoords"][0]["fx"], serde_json::json!(0.25));

    let molecule: serde_json::Value =
        serde_json::from_str(&formaldehyde().to_snapshot().to_json().unwrap()).unwrap();
    assert!(molecule.get("isCrystal").is_none());
    assert_eq!(molecule["bonds"][0]["atom1Id"], serde_json::json!(1));
}

#[test]
fn crystal_snapshot_restores_cell_and_fractions() {
    let lattice = Lattice::from_vectors(
        DVec3::new(0.0, 2.7, 2.7),
        DVec3::new(2.7, 0.0, 2.7),
        DVec3::new(2.7, 2.7, 0.0),
    )
    .unwrap();
    let mut crystal = Crystal::new("fcc", lattice.clone());
    crystal.add_atom_fractional(14, DVec3::ZERO).unwrap();
    crystal.add_atom_fractional(14, DVec3::splat(0.25)).unwrap();
    crystal.set_space_group("F d -3 m", 227);

    let model = Model::from_snapshot(&Model::from(crystal).to_snapshot()).unwrap();
    let restored = model.as_crystal().unwrap();
    assert_eq!(restored.require_lattice().unwrap().vectors(), lattice.vectors());
    assert_eq!(restored.space_group(), "F d -3 m");
    assert_eq!(restored.space_group_number(), 227);
    assert_eq!(restored.get_frac(2), Some(DVec3::splat(0.25)));
}

#[test]
fn unknown_elements_fail_to_restore() {
    let mut snapshot = formaldehyde().to_snapshot();
    snapshot.atoms[0].element = "Qq".to_string();
    assert_eq!(
        AtomicStructure::from_snapshot(&snapshot).err(),
        Some(ModelError::UnknownElement("Qq".to_string()))
    );
}

#[test]
fn malformed_json_is_reported() {
    assert!(matches!(
        StructureSnapshot::from_json("{\"name\": 3}"),
        Err(SnapshotError::Json(_))
    ));
}
