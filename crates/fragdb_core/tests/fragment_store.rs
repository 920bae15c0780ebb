use fragdb_core::db::open_db;
use fragdb_core::{
    DeleteOutcome, FragmentAtom, FragmentId, FragmentRepository, FragmentStore, NamePresence,
    NewFragment, RestraintLine, Source, SqliteFragmentRepository, StoreConfig, StoreError,
    USER_ID_OFFSET,
};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    config: StoreConfig,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join("fragment-database.sqlite");
        seed_primary(&primary);
        let config = StoreConfig::new(primary, dir.path().join("user-fragment-database.sqlite"));
        Self { _dir: dir, config }
    }

    fn open(&self) -> FragmentStore {
        FragmentStore::open(&self.config).unwrap()
    }

    fn user_path(&self) -> PathBuf {
        self.config.user_path.clone()
    }
}

fn seed_primary(path: &Path) {
    let conn = open_db(path).unwrap();
    let repo = SqliteFragmentRepository::new(&conn, Source::Primary);
    for fragment in [
        benzene(),
        NewFragment::new("Toluene, C7H8", vec![atom("C1", [0.0, 0.0, 0.0])]),
        NewFragment::new("tert-Butyl, C4H9", vec![atom("C1", [0.0, 0.0, 0.0])]),
    ] {
        repo.insert_fragment(&fragment).unwrap();
    }
}

fn atom(name: &str, position: [f64; 3]) -> FragmentAtom {
    FragmentAtom::new(name, "6", position)
}

fn benzene() -> NewFragment {
    let mut fragment = NewFragment::new(
        "Benzene, C6H6",
        vec![atom("C1", [1.39, 0.0, 0.0]), atom("C2", [0.695, 1.204, 0.0])],
    );
    fragment.reference = Some("CCDC 123456".to_string());
    fragment.residue_class = "BENZ".to_string();
    fragment
}

fn dichlorobenzene() -> NewFragment {
    let mut fragment = NewFragment::new(
        "1,2-Dichlorobenzene, C6H4Cl2",
        vec![
            atom("C1", [0.0, 0.0, 0.0]),
            atom("C2", [1.39, 0.0, 0.0]),
            FragmentAtom::new("CL1", "17", [-0.9, -1.4, 0.0]),
        ],
    );
    fragment.restraints = vec![RestraintLine::parse("DFIX 1.39 C1 C2").unwrap()];
    fragment
}

#[test]
fn primary_and_user_sources_are_overlaid() {
    let fixture = Fixture::new();
    let mut store = fixture.open();
    assert_eq!(store.len().unwrap(), 3);

    let id = store.store(&dichlorobenzene()).unwrap();
    assert_eq!(id.source(), Source::User);
    assert_eq!(id.to_public(), USER_ID_OFFSET + 1);
    assert_eq!(store.len().unwrap(), 4);

    assert_eq!(store.get(1).unwrap().unwrap().len(), 2);
    assert_eq!(store.get(id.to_public()).unwrap().unwrap().len(), 3);
    assert!(store.contains(USER_ID_OFFSET + 1).unwrap());
    assert!(!store.contains(USER_ID_OFFSET + 2).unwrap());
    assert!(!store.contains(0).unwrap());
    assert!(matches!(store.get(-3), Err(StoreError::InvalidId(_))));
}

#[test]
fn catalog_sorts_by_name_key_and_marks_user_fragments() {
    let fixture = Fixture::new();
    let mut store = fixture.open();
    store.store(&dichlorobenzene()).unwrap();

    let names = store
        .catalog()
        .unwrap()
        .iter()
        .map(|entry| entry.display_name())
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        vec![
            "Benzene, C6H6",
            "tert-Butyl, C4H9",
            "1,2-Dichlorobenzene, C6H4Cl2  *user*",
            "Toluene, C7H8",
        ]
    );
}

#[test]
fn search_ranks_closest_names_first() {
    let fixture = Fixture::new();
    let mut store = fixture.open();
    store.store(&dichlorobenzene()).unwrap();

    let hits = store.find_by_name("benzene", 2).unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].entry.name, "Benzene, C6H6");
    assert_eq!(hits[1].entry.name, "1,2-Dichlorobenzene, C6H4Cl2");
    assert!(hits[0].score < hits[1].score);
}

#[test]
fn metadata_accessors_fall_back_to_sentinels() {
    let fixture = Fixture::new();
    let mut store = fixture.open();
    let user = store.store(&dichlorobenzene()).unwrap();
    let primary = FragmentId::from_public(1).unwrap();

    assert_eq!(store.get_reference(primary).unwrap(), "CCDC 123456");
    assert_eq!(store.get_reference(user).unwrap(), "no reference found");
    assert_eq!(store.get_residue_class(primary).unwrap(), "BENZ");
    assert_eq!(store.get_residue_class(user).unwrap(), "");
    assert_eq!(store.get_picture(user).unwrap(), None);
    assert_eq!(
        store.get_restraints(user).unwrap()[0].to_line(),
        "DFIX 1.39 C1 C2"
    );
    assert!(store.has_residue_class("BENZ").unwrap());
    assert!(!store.has_residue_class("XYZ").unwrap());
}

#[test]
fn name_lookups_prefer_the_user_source() {
    let fixture = Fixture::new();
    let mut store = fixture.open();

    assert_eq!(store.has_exact_name("Toluene, C7H8").unwrap(), NamePresence::Primary);
    assert_eq!(store.has_exact_name("toluene, c7h8").unwrap(), NamePresence::Absent);
    assert_eq!(store.has_name("BENZ").unwrap(), NamePresence::Primary);

    store.store(&dichlorobenzene()).unwrap();
    store
        .store(&NewFragment::new("Toluene, C7H8", vec![atom("C1", [0.0; 3])]))
        .unwrap();
    assert_eq!(store.has_exact_name("Toluene, C7H8").unwrap(), NamePresence::User);
    assert_eq!(store.has_name("benz").unwrap(), NamePresence::User);
    assert_eq!(store.has_name("100%").unwrap(), NamePresence::Absent);
}

#[test]
fn primary_fragments_cannot_be_deleted() {
    let fixture = Fixture::new();
    let mut store = fixture.open();
    let user = store.store(&dichlorobenzene()).unwrap();

    assert_eq!(store.delete(1).unwrap(), DeleteOutcome::RefusedPrimary);
    assert!(store.contains(1).unwrap());

    assert_eq!(store.delete(user.to_public()).unwrap(), DeleteOutcome::Deleted);
    assert_eq!(store.delete(user.to_public()).unwrap(), DeleteOutcome::NotFound);
    assert_eq!(store.get(user.to_public()).unwrap(), None);
}

#[test]
fn catalog_goes_stale_after_mutation() {
    let fixture = Fixture::new();
    let mut store = fixture.open();
    let catalog = store.catalog().unwrap();
    store.ensure_current(&catalog).unwrap();

    store.store(&dichlorobenzene()).unwrap();
    assert!(matches!(
        store.ensure_current(&catalog),
        Err(StoreError::StaleCatalog { .. })
    ));
    store.ensure_current(&store.catalog().unwrap()).unwrap();
}

#[test]
fn user_fragments_survive_reopening() {
    let fixture = Fixture::new();
    let mut store = fixture.open();
    let id = store.store(&dichlorobenzene()).unwrap();
    store.close().unwrap();

    let store = fixture.open();
    assert_eq!(
        store.fragment_name(id).unwrap().as_deref(),
        Some("1,2-Dichlorobenzene, C6H4Cl2")
    );
}

#[test]
fn failed_store_leaves_no_partial_rows() {
    let fixture = Fixture::new();
    let user_path = fixture.user_path();
    let conn = open_db(&user_path).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_restraints BEFORE INSERT ON Restraints
         BEGIN
             SELECT RAISE(ABORT, 'restraints rejected');
         END;",
    )
    .unwrap();
    drop(conn);

    let mut store = fixture.open();
    let err = store.store(&dichlorobenzene()).unwrap_err();
    assert!(matches!(err, StoreError::Repo(_)));
    assert_eq!(store.len().unwrap(), 3);
    store.close().unwrap();

    let conn = Connection::open(&user_path).unwrap();
    for table in ["Fragment", "Atoms", "Restraints"] {
        let rows: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 0, "table {table} kept rows");
    }
}

#[test]
fn uninitialized_user_file_is_recreated() {
    let fixture = Fixture::new();
    std::fs::write(fixture.user_path(), b"").unwrap();

    let mut store = fixture.open();
    let id = store.store(&dichlorobenzene()).unwrap();
    assert_eq!(id.to_public(), USER_ID_OFFSET + 1);
}

#[test]
fn invalid_fragments_are_rejected_before_sql() {
    let fixture = Fixture::new();
    let mut store = fixture.open();

    let mut bad_class = dichlorobenzene();
    bad_class.residue_class = "1ABC".to_string();
    assert!(matches!(
        store.store(&bad_class),
        Err(StoreError::Validation(_))
    ));
    assert!(matches!(
        store.store(&NewFragment::new("  ", Vec::new())),
        Err(StoreError::Validation(_))
    ));
    assert_eq!(store.len().unwrap(), 3);
}

#[test]
fn missing_primary_file_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(
        dir.path().join("absent.sqlite"),
        dir.path().join("user.sqlite"),
    );
    assert!(matches!(
        FragmentStore::open(&config),
        Err(StoreError::Db(_))
    ));
}

#[test]
fn primary_ids_at_the_user_offset_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let primary = dir.path().join("primary.sqlite");
    let conn = open_db(&primary).unwrap();
    conn.execute(
        "INSERT INTO Fragment (Id, Name) VALUES (?1, 'Overflow');",
        [USER_ID_OFFSET],
    )
    .unwrap();
    drop(conn);

    let config = StoreConfig::new(primary, dir.path().join("user.sqlite"));
    assert!(matches!(
        FragmentStore::open(&config),
        Err(StoreError::PrimaryIdOutOfRange(id)) if id == USER_ID_OFFSET
    ));
}
