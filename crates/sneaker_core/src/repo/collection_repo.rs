//! Collection repository over `collection:{id}` keys.
//!
//! # Responsibility
//! - Add, remove, list and look up the user's claimed items.
//! - Provide the overwrite and write-through hooks used by the legacy import
//!   and the catalog.
//!
//! # Invariants
//! - At most one entry per id: the key is the id.
//! - `add` checks existence before writing, in sequence, and never touches an
//!   existing entry.
//! - Collection writes never reach the `catalog:*` namespace.

use crate::kv::{collection_key, KeyValueStore, COLLECTION_PREFIX};
use crate::model::collection::CollectionEntry;
use crate::model::item::{Item, ItemId, PartialItem};
use crate::repo::{decode_value, encode_value, RepoResult};
use chrono::Utc;
use log::{debug, info};

/// Repository for the user's collection.
pub struct CollectionRepository<S> {
    store: S,
}

impl<S: KeyValueStore> CollectionRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Claims an item. Returns the id; a second call with the same id returns
    /// the same id and leaves the stored entry untouched.
    ///
    /// # Errors
    /// - `Validation` when the id is missing or blank.
    /// - `Io` on storage failure.
    pub fn add(&self, item: &PartialItem) -> RepoResult<ItemId> {
        let id = item.require_id()?;
        let key = collection_key(id);

        if self.store.get(&key)?.is_some() {
            debug!("event=collection_add module=repo status=skip reason=exists id={id}");
            return Ok(id.to_string());
        }

        let entry = CollectionEntry::normalize(item, Utc::now())?;
        self.store.set(&key, &encode_value(&key, &entry)?)?;
        info!("event=collection_add module=repo status=ok id={id}");
        Ok(entry.id)
    }

    /// Removes an entry. Returns `false` when there was nothing to remove.
    pub fn remove(&self, id: &str) -> RepoResult<bool> {
        if id.trim().is_empty() {
            return Ok(false);
        }
        let removed = self.store.delete(&collection_key(id))?;
        info!("event=collection_remove module=repo status=ok id={id} removed={removed}");
        Ok(removed)
    }

    pub fn get(&self, id: &str) -> RepoResult<Option<CollectionEntry>> {
        if id.trim().is_empty() {
            return Ok(None);
        }
        let key = collection_key(id);
        self.store
            .get(&key)?
            .map(|raw| decode_value(&key, &raw))
            .transpose()
    }

    pub fn contains(&self, id: &str) -> RepoResult<bool> {
        if id.trim().is_empty() {
            return Ok(false);
        }
        Ok(self.store.get(&collection_key(id))?.is_some())
    }

    /// Returns every entry via prefix scan. Order follows key order, but
    /// callers must not rely on it.
    pub fn list_all(&self) -> RepoResult<Vec<CollectionEntry>> {
        let keys = self.store.list_keys(COLLECTION_PREFIX)?;
        let values = self.store.multi_get(&keys)?;

        // A key deleted between the scan and the read simply drops out.
        keys.iter()
            .zip(values)
            .filter_map(|(key, raw)| raw.map(|raw| decode_value(key, &raw)))
            .collect()
    }

    /// Writes `entry` unconditionally, replacing any existing value.
    ///
    /// Only the legacy import uses this; everyone else goes through `add`.
    pub(crate) fn put_entry(&self, entry: &CollectionEntry) -> RepoResult<()> {
        let key = collection_key(&entry.id);
        self.store.set(&key, &encode_value(&key, entry)?)?;
        Ok(())
    }

    /// Copies display fields of a freshly updated catalog item into the
    /// matching entry, if the user holds one. Returns whether an entry was
    /// rewritten.
    pub(crate) fn sync_from_item(&self, item: &Item) -> RepoResult<bool> {
        let Some(mut entry) = self.get(&item.id)? else {
            return Ok(false);
        };
        entry.apply_item(item);
        self.put_entry(&entry)?;
        Ok(true)
    }
}
