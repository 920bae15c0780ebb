use fragdb_core::db::migrations::latest_version;
use fragdb_core::db::{open_db, open_db_in_memory, open_db_read_only, prepare_user_db, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "Fragment");
    assert_table_exists(&conn, "Atoms");
    assert_table_exists(&conn, "Restraints");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user-fragment-database.sqlite");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "Fragment");
}

#[test]
fn legacy_file_without_user_version_is_adopted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.sqlite");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE Fragment (Id INTEGER PRIMARY KEY AUTOINCREMENT, class VARCHAR(4),
             Name TEXT NOT NULL, Reference TEXT, comment TEXT, picture BLOB);
         INSERT INTO Fragment (Name) VALUES ('Benzene, C6H6');",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "Atoms");
    let names: i64 = conn
        .query_row("SELECT COUNT(*) FROM Fragment;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(names, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn read_only_open_requires_fragment_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("not-fragments.sqlite");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE unrelated (id INTEGER);").unwrap();
    drop(conn);

    match open_db_read_only(&path).unwrap_err() {
        DbError::MissingTable(table) => assert_eq!(table, "Fragment"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn read_only_open_rejects_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fragment-database.sqlite");
    drop(open_db(&path).unwrap());

    let conn = open_db_read_only(&path).unwrap();
    let result = conn.execute("INSERT INTO Fragment (Name) VALUES ('Water');", []);
    assert!(result.is_err());
}

#[test]
fn prepare_user_db_recreates_tiny_files_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user.sqlite");

    assert!(prepare_user_db(&path, 100).unwrap());

    std::fs::write(&path, b"stub").unwrap();
    assert!(prepare_user_db(&path, 100).unwrap());
    assert!(!path.exists());

    drop(open_db(&path).unwrap());
    assert!(!prepare_user_db(&path, 100).unwrap());
    assert!(path.exists());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
