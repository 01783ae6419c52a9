//! Flat key-value persistence primitive.
//!
//! # Responsibility
//! - Define the string-key/string-value contract every repository builds on.
//! - Own the reserved key layout so namespaces never collide.
//!
//! # Invariants
//! - Each operation is atomic for one key. There is no cross-key
//!   transaction; callers that touch several keys must tolerate a crash
//!   between writes.
//! - A missing key is `Ok(None)`, never an error.
//! - `catalog:`, `collection:` and `migration:` prefixes are disjoint and
//!   owned by exactly one repository each.

use crate::db::DbResult;

mod sqlite_store;

pub use sqlite_store::SqliteKvStore;

/// Key prefix for authoritative catalog items.
pub const CATALOG_PREFIX: &str = "catalog:";
/// Key prefix for the user's collection entries.
pub const COLLECTION_PREFIX: &str = "collection:";
/// Reserved key of the one-shot legacy import flag.
pub const MIGRATION_COMPLETED_KEY: &str = "migration:completed";

/// Builds the storage key of one catalog item.
pub fn catalog_key(id: &str) -> String {
    format!("{CATALOG_PREFIX}{id}")
}

/// Builds the storage key of one collection entry.
pub fn collection_key(id: &str) -> String {
    format!("{COLLECTION_PREFIX}{id}")
}

/// String key-value store contract.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> DbResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> DbResult<()>;
    /// Returns whether the key existed before deletion.
    fn delete(&self, key: &str) -> DbResult<bool>;
    /// Returns every key starting with `prefix` (literal match), ascending.
    fn list_keys(&self, prefix: &str) -> DbResult<Vec<String>>;
    /// Returns values in the same order and length as `keys`.
    fn multi_get(&self, keys: &[String]) -> DbResult<Vec<Option<String>>>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> DbResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> DbResult<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> DbResult<bool> {
        (**self).delete(key)
    }

    fn list_keys(&self, prefix: &str) -> DbResult<Vec<String>> {
        (**self).list_keys(prefix)
    }

    fn multi_get(&self, keys: &[String]) -> DbResult<Vec<Option<String>>> {
        (**self).multi_get(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::{catalog_key, collection_key, CATALOG_PREFIX, COLLECTION_PREFIX};

    #[test]
    fn namespaces_do_not_overlap() {
        assert!(!CATALOG_PREFIX.starts_with(COLLECTION_PREFIX));
        assert!(!COLLECTION_PREFIX.starts_with(CATALOG_PREFIX));
        assert_ne!(catalog_key("A"), collection_key("A"));
    }

    #[test]
    fn keys_embed_id_verbatim() {
        assert_eq!(catalog_key("a:b%_"), "catalog:a:b%_");
        assert_eq!(collection_key("x"), "collection:x");
    }
}
