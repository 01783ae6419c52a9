//! SQLite-backed `KeyValueStore`.

use super::KeyValueStore;
use crate::db::DbResult;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::HashMap;

// Stays well below SQLite's bound-parameter limit.
const MULTI_GET_CHUNK: usize = 256;

/// Key-value store over the `kv_entries` table.
///
/// Borrows a connection returned by `open_db`/`open_db_in_memory`, so the
/// schema is guaranteed to exist.
#[derive(Clone, Copy)]
pub struct SqliteKvStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKvStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl KeyValueStore for SqliteKvStore<'_> {
    fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> DbResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(changed > 0)
    }

    fn list_keys(&self, prefix: &str) -> DbResult<Vec<String>> {
        // substr comparison keeps `%` and `_` in ids literal, unlike LIKE.
        let mut stmt = self.conn.prepare(
            "SELECT key FROM kv_entries
             WHERE substr(key, 1, length(?1)) = ?1
             ORDER BY key ASC;",
        )?;
        let keys = stmt
            .query_map([prefix], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    fn multi_get(&self, keys: &[String]) -> DbResult<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut found = HashMap::with_capacity(keys.len());
        for chunk in keys.chunks(MULTI_GET_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let mut stmt = self.conn.prepare(&format!(
                "SELECT key, value FROM kv_entries WHERE key IN ({placeholders});"
            ))?;
            let mut rows = stmt.query(params_from_iter(chunk.iter()))?;
            while let Some(row) = rows.next()? {
                found.insert(row.get::<_, String>(0)?, row.get::<_, String>(1)?);
            }
        }

        Ok(keys.iter().map(|key| found.get(key).cloned()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteKvStore;
    use crate::db::open_db_in_memory;
    use crate::kv::KeyValueStore;

    #[test]
    fn get_missing_key_is_none() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteKvStore::new(&conn);
        assert_eq!(store.get("nope").unwrap(), None);
    }

    #[test]
    fn set_overwrites_existing_value() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteKvStore::new(&conn);
        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
    }

    #[test]
    fn delete_reports_prior_existence() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteKvStore::new(&conn);
        store.set("k", "v").unwrap();
        assert!(store.delete("k").unwrap());
        assert!(!store.delete("k").unwrap());
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn list_keys_treats_prefix_literally() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteKvStore::new(&conn);
        store.set("a_1", "x").unwrap();
        store.set("ab1", "x").unwrap();
        store.set("a%2", "x").unwrap();

        assert_eq!(store.list_keys("a_").unwrap(), vec!["a_1".to_string()]);
        assert_eq!(store.list_keys("a%").unwrap(), vec!["a%2".to_string()]);
        assert_eq!(store.list_keys("").unwrap().len(), 3);
    }

    #[test]
    fn multi_get_preserves_order_and_gaps() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteKvStore::new(&conn);
        store.set("b", "2").unwrap();
        store.set("a", "1").unwrap();

        let keys = vec!["b".to_string(), "missing".to_string(), "a".to_string()];
        let values = store.multi_get(&keys).unwrap();
        assert_eq!(
            values,
            vec![Some("2".to_string()), None, Some("1".to_string())]
        );
        assert!(store.multi_get(&[]).unwrap().is_empty());
    }
}
