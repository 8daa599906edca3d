use crystal_editor::crystolecule::atomic_structure::AtomicStructure;
use crystal_editor::crystolecule::error::ModelError;
use crystal_editor::crystolecule::model::Model;
use crystal_editor::editor::commands::{Command, CommandOutput, Session};
use crystal_editor::editor::editor::Editor;
use crystal_editor::editor::error::EditorError;
use crystal_editor::editor::manager::MoleculeManager;
use crystal_editor::editor::settings::EditorSettings;
use crystal_editor::editor::smiles::{
    install_import, resolve_import, ImportTarget, ImportedAtom, SmilesResolver,
};
use glam::f64::DVec3;

// ============================================================================
// Helper Functions
// ============================================================================

/// Returns the same answer for every SMILES string.
#[derive(Clone)]
struct FixedResolver(Result<Vec<ImportedAtom>, String>);

impl SmilesResolver for FixedResolver {
    fn resolve(&self, _smiles: &str) -> Result<Vec<ImportedAtom>, String> {
        self.0.clone()
    }
}

fn imported(element: &str, x: f64, y: f64, z: f64) -> ImportedAtom {
    ImportedAtom {
        element: element.to_string(),
        position: DVec3::new(x, y, z),
    }
}

fn water() -> FixedResolver {
    FixedResolver(Ok(vec![
        imported("O", 0.0, 0.0, 0.0),
        imported("H", 0.96, 0.0, 0.0),
        imported("H", -0.24, 0.93, 0.0),
    ]))
}

fn setup() -> (MoleculeManager, Editor) {
    let mut editor = Editor::new(EditorSettings::default());
    let mut structure = AtomicStructure::new("host");
    structure.add_atom(6, DVec3::ZERO);
    let manager = MoleculeManager::new(Model::Molecule(structure), &mut editor);
    (manager, editor)
}

// ============================================================================
// Resolving
// ============================================================================

#[test]
fn resolving_builds_a_detached_structure() {
    let import = resolve_import(&water(), "O").unwrap();
    assert_eq!(import.smiles, "O");
    assert_eq!(import.structure.get_num_of_atoms(), 3);
    assert_eq!(import.structure.get_num_of_bonds(), 0);
    assert_eq!(import.structure.atom(1).unwrap().symbol(), "O");
}

#[test]
fn helper_failures_become_helper_errors() {
    let failing = FixedResolver(Err("rdkit not installed".to_string()));
    assert!(matches!(
        resolve_import(&failing, "CCO"),
        Err(EditorError::Helper(message)) if message == "rdkit not installed"
    ));

    let empty = FixedResolver(Ok(Vec::new()));
    assert!(matches!(resolve_import(&empty, "CCO"), Err(EditorError::Helper(_))));

    let non_finite = FixedResolver(Ok(vec![imported("C", f64::NAN, 0.0, 0.0)]));
    assert!(matches!(resolve_import(&non_finite, "C"), Err(EditorError::Helper(_))));
}

#[test]
fn unknown_elements_are_rejected() {
    let resolver = FixedResolver(Ok(vec![imported("C", 0.0, 0.0, 0.0), imported("Qq", 1.0, 0.0, 0.0)]));
    assert!(matches!(
        resolve_import(&resolver, "C[Qq]"),
        Err(EditorError::Model(ModelError::UnknownElement(symbol))) if symbol == "Qq"
    ));
}

// ============================================================================
// Installing
// ============================================================================

#[test]
fn new_structure_import_is_bonded_and_activated() {
    let (mut manager, mut editor) = setup();
    let import = resolve_import(&water(), "O").unwrap();
    let installed = install_import(
        &mut manager,
        &mut editor,
        import,
        ImportTarget::NewStructure("water".to_string()),
        Some(1.15),
    )
    .unwrap();

    assert_eq!(installed.structure, "water");
    assert_eq!(installed.atom_ids, vec![1, 2, 3]);
    assert_eq!(manager.active_name(), "water");
    assert_eq!(manager.len(), 2);
    let structure = manager.active_model().structure();
    assert!(structure.has_bond_between(1, 2));
    assert!(structure.has_bond_between(1, 3));
    assert!(!structure.has_bond_between(2, 3));
}

#[test]
fn active_import_is_lifted_clear_and_recorded() {
    let (mut manager, mut editor) = setup();
    let history_len = editor.history.len();
    let import = resolve_import(&water(), "O").unwrap();
    let installed =
        install_import(&mut manager, &mut editor, import, ImportTarget::Active, None).unwrap();

    assert_eq!(installed.structure, "host");
    assert_eq!(installed.atom_ids, vec![2, 3, 4]);
    let structure = manager.active_model().structure();
    assert_eq!(structure.get_num_of_atoms(), 4);
    assert_eq!(structure.get_num_of_bonds(), 0);
    assert_eq!(structure.atom_position(2).unwrap(), DVec3::new(0.0, 0.0, 3.0));
    assert_eq!(editor.history.len(), history_len + 1);

    assert!(editor.undo(manager.active_model_mut()).unwrap());
    assert_eq!(manager.active_model().structure().get_num_of_atoms(), 1);
}

#[test]
fn invalid_threshold_installs_nothing() {
    let (mut manager, mut editor) = setup();
    let import = resolve_import(&water(), "O").unwrap();
    let result = install_import(
        &mut manager,
        &mut editor,
        import,
        ImportTarget::NewStructure("water".to_string()),
        Some(0.0),
    );
    assert!(matches!(result, Err(EditorError::Model(ModelError::InvalidArgument(_)))));
    assert_eq!(manager.len(), 1);
    assert_eq!(manager.active_name(), "host");
}

// ============================================================================
// Session
// ============================================================================

#[test]
fn add_molecule_needs_a_resolver() {
    let mut session = Session::new(EditorSettings::default());
    let result = session.execute(Command::AddMolecule {
        smiles: "O".to_string(),
        name: None,
    });
    assert!(matches!(result, Err(EditorError::Helper(_))));
    assert_eq!(session.model().structure().get_num_of_atoms(), 0);
}

#[test]
fn add_molecule_selects_the_new_atoms() {
    let mut session = Session::new(EditorSettings::default());
    session.set_resolver(Box::new(water()));

    let output = session
        .execute(Command::AddMolecule {
            smiles: "O".to_string(),
            name: Some("water".to_string()),
        })
        .unwrap();
    assert_eq!(output, CommandOutput::Atoms(vec![1, 2, 3]));
    assert_eq!(session.manager.active_name(), "water");
    assert_eq!(session.model().structure().get_num_of_bonds(), 2);

    session
        .execute(Command::AddMolecule {
            smiles: "O".to_string(),
            name: None,
        })
        .unwrap();
    assert_eq!(session.manager.active_name(), "water");
    assert_eq!(session.model().structure().get_num_of_atoms(), 6);
    assert_eq!(session.editor.selection.atoms(), &[4, 5, 6]);
}
