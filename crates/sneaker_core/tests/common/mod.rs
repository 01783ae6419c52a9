#![allow(dead_code)]

use rusqlite::Connection;
use sneaker_core::db::{DbError, DbResult};
use sneaker_core::{KeyValueStore, SqliteKvStore};
use std::cell::RefCell;
use std::collections::HashSet;

/// Store wrapper that fails writes to selected keys with a disk I/O error.
pub struct FaultyStore<'conn> {
    inner: SqliteKvStore<'conn>,
    failing_keys: RefCell<HashSet<String>>,
}

impl<'conn> FaultyStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            inner: SqliteKvStore::new(conn),
            failing_keys: RefCell::new(HashSet::new()),
        }
    }

    pub fn fail_writes_to(&self, key: &str) {
        self.failing_keys.borrow_mut().insert(key.to_string());
    }

    pub fn heal(&self) {
        self.failing_keys.borrow_mut().clear();
    }
}

fn io_failure() -> DbError {
    DbError::Sqlite(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_IOERR),
        Some("disk I/O error".to_string()),
    ))
}

impl KeyValueStore for FaultyStore<'_> {
    fn get(&self, key: &str) -> DbResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> DbResult<()> {
        if self.failing_keys.borrow().contains(key) {
            return Err(io_failure());
        }
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> DbResult<bool> {
        self.inner.delete(key)
    }

    fn list_keys(&self, prefix: &str) -> DbResult<Vec<String>> {
        self.inner.list_keys(prefix)
    }

    fn multi_get(&self, keys: &[String]) -> DbResult<Vec<Option<String>>> {
        self.inner.multi_get(keys)
    }
}
