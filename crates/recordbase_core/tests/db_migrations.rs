use recordbase_core::db::migrations::latest_version;
use recordbase_core::db::{open_db, open_db_in_memory, DbError, Migration};
use recordbase_core::StoreConfig;
use rusqlite::Connection;

const MIGRATIONS: &[Migration] = &[
    Migration::new(
        1,
        "CREATE TABLE accounts (account_id TEXT PRIMARY KEY, email TEXT NOT NULL);",
    ),
    Migration::new(
        2,
        "CREATE TABLE sessions (
            id INTEGER PRIMARY KEY,
            account_id TEXT NOT NULL REFERENCES accounts(account_id)
        );",
    ),
];

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory(&StoreConfig::default(), MIGRATIONS).unwrap();

    assert_eq!(schema_version(&conn), latest_version(MIGRATIONS));
    assert_table_exists(&conn, "accounts");
    assert_table_exists(&conn, "sessions");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.db");

    let conn_first = open_db(&path, &StoreConfig::default(), MIGRATIONS).unwrap();
    assert_eq!(schema_version(&conn_first), 2);
    drop(conn_first);

    let conn_second = open_db(&path, &StoreConfig::default(), MIGRATIONS).unwrap();
    assert_eq!(schema_version(&conn_second), 2);
    assert_table_exists(&conn_second, "sessions");
}

#[test]
fn reopening_applies_only_new_migrations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.db");

    let conn = open_db(&path, &StoreConfig::default(), &MIGRATIONS[..1]).unwrap();
    conn.execute(
        "INSERT INTO accounts (account_id, email) VALUES ('a1', 'a@example.com');",
        [],
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path, &StoreConfig::default(), MIGRATIONS).unwrap();
    assert_eq!(schema_version(&conn), 2);
    let accounts: i64 = conn
        .query_row("SELECT COUNT(*) FROM accounts;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(accounts, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path, &StoreConfig::default(), MIGRATIONS).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn out_of_order_migrations_are_rejected() {
    let shuffled = [MIGRATIONS[1], MIGRATIONS[0]];
    let err = open_db_in_memory(&StoreConfig::default(), &shuffled).unwrap_err();
    assert!(matches!(
        err,
        DbError::MigrationOrder {
            previous: 2,
            next: 1
        }
    ));
}

#[test]
fn foreign_keys_follow_store_config() {
    let enforced = open_db_in_memory(&StoreConfig::default(), MIGRATIONS).unwrap();
    assert!(enforced
        .execute("INSERT INTO sessions (account_id) VALUES ('ghost');", [])
        .is_err());

    let relaxed = StoreConfig {
        foreign_keys: false,
        ..StoreConfig::default()
    };
    let relaxed = open_db_in_memory(&relaxed, MIGRATIONS).unwrap();
    relaxed
        .execute("INSERT INTO sessions (account_id) VALUES ('ghost');", [])
        .unwrap();
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
