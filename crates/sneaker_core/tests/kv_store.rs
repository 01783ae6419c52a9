use rusqlite::Connection;
use sneaker_core::db::migrations::latest_version;
use sneaker_core::db::{open_db, open_db_in_memory, DbError};
use sneaker_core::kv::{catalog_key, collection_key, CATALOG_PREFIX, COLLECTION_PREFIX};
use sneaker_core::{KeyValueStore, SqliteKvStore};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "kv_entries");
}

#[test]
fn values_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sneakers.db");

    let conn = open_db(&path).unwrap();
    SqliteKvStore::new(&conn).set("catalog:A", "{}").unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert_eq!(
        SqliteKvStore::new(&conn).get("catalog:A").unwrap().as_deref(),
        Some("{}")
    );
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
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
fn prefix_scan_keeps_namespaces_apart() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKvStore::new(&conn);
    store.set(&catalog_key("A"), "c").unwrap();
    store.set(&collection_key("A"), "u").unwrap();
    store.set(&collection_key("B"), "u").unwrap();
    store.set("myCollection", "[]").unwrap();

    assert_eq!(store.list_keys(CATALOG_PREFIX).unwrap(), vec!["catalog:A"]);
    assert_eq!(
        store.list_keys(COLLECTION_PREFIX).unwrap(),
        vec!["collection:A", "collection:B"]
    );
}

#[test]
fn multi_get_spanning_several_chunks_keeps_order_and_gaps() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKvStore::new(&conn);
    for n in (0..600).filter(|n| n % 3 != 0) {
        store.set(&collection_key(&format!("{n:04}")), &n.to_string()).unwrap();
    }

    // Descending, so the result order cannot come from the table order.
    let keys = (0..600)
        .rev()
        .map(|n| collection_key(&format!("{n:04}")))
        .collect::<Vec<_>>();
    let values = store.multi_get(&keys).unwrap();

    assert_eq!(values.len(), 600);
    for (value, n) in values.iter().zip((0..600).rev()) {
        let expected = (n % 3 != 0).then(|| n.to_string());
        assert_eq!(value, &expected, "key {n:04}");
    }
}

#[test]
fn multi_get_repeats_duplicate_keys() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKvStore::new(&conn);
    store.set("a", "1").unwrap();

    let keys = vec!["a".to_string(), "missing".to_string(), "a".to_string()];
    assert_eq!(
        store.multi_get(&keys).unwrap(),
        vec![Some("1".to_string()), None, Some("1".to_string())]
    );
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
