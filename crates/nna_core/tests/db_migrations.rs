use nna_core::db::migrations::latest_version;
use nna_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn in_memory_database_has_counter_tables() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "sequence_counters");
    assert_table_exists(&conn, "sequence_issue_log");
}

#[test]
fn reopening_file_database_keeps_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counters.db");

    let first = open_db(&path).unwrap();
    first
        .execute(
            "INSERT INTO sequence_counters (layer, category, subcategory, next_value)
             VALUES ('G', 'POP', 'BAS', 4);",
            [],
        )
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    let next: i64 = second
        .query_row(
            "SELECT next_value FROM sequence_counters WHERE layer = 'G';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(next, 4);
}

#[test]
fn database_from_newer_binary_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 42;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 42);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn counters_reject_zero_and_log_rejects_duplicates() {
    let conn = open_db_in_memory().unwrap();

    let zero = conn.execute(
        "INSERT INTO sequence_counters (layer, category, subcategory, next_value)
         VALUES ('S', 'POP', 'HPM', 0);",
        [],
    );
    assert!(zero.is_err());

    let insert_issue = "INSERT INTO sequence_issue_log (layer, category, subcategory, issued_value)
                        VALUES ('S', 'POP', 'HPM', 1);";
    conn.execute(insert_issue, []).unwrap();
    assert!(conn.execute(insert_issue, []).is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
