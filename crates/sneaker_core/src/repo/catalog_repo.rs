//! Catalog repository over `catalog:{id}` keys.
//!
//! # Responsibility
//! - Store the authoritative item records.
//! - Propagate display-field edits into the collection (write-through).
//!
//! # Invariants
//! - `update` is a full overwrite of an existing item, never a merge.
//! - Items are never deleted here.
//! - Write-through is best effort: the catalog write commits first, so a
//!   failed collection write leaves the catalog updated and the entry stale
//!   until the next successful update of the same id.

use crate::kv::{catalog_key, KeyValueStore, CATALOG_PREFIX};
use crate::model::item::{Item, ItemId, ItemValidationError, OwnershipRecord, PartialItem};
use crate::repo::collection_repo::CollectionRepository;
use crate::repo::{decode_value, encode_value, RepoError, RepoResult};
use log::{error, info};

/// Repository for catalog items.
pub struct CatalogRepository<S> {
    store: S,
}

impl<S: KeyValueStore> CatalogRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn get(&self, id: &str) -> RepoResult<Option<Item>> {
        if id.trim().is_empty() {
            return Ok(None);
        }
        let key = catalog_key(id);
        self.store
            .get(&key)?
            .map(|raw| decode_value(&key, &raw))
            .transpose()
    }

    /// Returns every catalog item. Order is unspecified.
    pub fn list_all(&self) -> RepoResult<Vec<Item>> {
        let keys = self.store.list_keys(CATALOG_PREFIX)?;
        let values = self.store.multi_get(&keys)?;
        keys.iter()
            .zip(values)
            .filter_map(|(key, raw)| raw.map(|raw| decode_value(key, &raw)))
            .collect()
    }

    /// Creates a new catalog item.
    ///
    /// # Errors
    /// - `Validation` on a blank id or blank history fields.
    /// - `AlreadyExists` when the id is taken.
    pub fn insert(&self, item: &Item) -> RepoResult<ItemId> {
        item.validate()?;
        let key = catalog_key(&item.id);
        if self.store.get(&key)?.is_some() {
            return Err(RepoError::AlreadyExists(item.id.clone()));
        }
        self.store.set(&key, &encode_value(&key, item)?)?;
        info!("event=catalog_insert module=repo status=ok id={}", item.id);
        Ok(item.id.clone())
    }

    /// Replaces an existing item wholesale and refreshes the matching
    /// collection entry's `name`, `description` and `imageUrl`.
    ///
    /// # Errors
    /// - `Validation` on a blank id.
    /// - `NotFound` when the id is not in the catalog.
    /// - `Io` on storage failure, including a failed write-through after the
    ///   catalog write already committed.
    pub fn update(&self, item: &Item) -> RepoResult<()> {
        item.validate()?;
        let key = catalog_key(&item.id);
        if self.store.get(&key)?.is_none() {
            return Err(RepoError::NotFound(item.id.clone()));
        }
        self.store.set(&key, &encode_value(&key, item)?)?;

        match CollectionRepository::new(&self.store).sync_from_item(item) {
            Ok(synced) => {
                info!(
                    "event=catalog_update module=repo status=ok id={} collection_synced={}",
                    item.id, synced
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=catalog_update module=repo status=partial id={} error_code=write_through_failed error={}",
                    item.id, err
                );
                Err(err)
            }
        }
    }

    /// Resolves a decoded scan payload to its catalog item, registering the
    /// item on first scan.
    ///
    /// A payload for a known id never overwrites the stored item.
    pub fn ingest_scan(&self, payload: &str) -> RepoResult<Item> {
        let partial = PartialItem::parse_payload(payload)?;
        let id = partial.require_id()?.to_string();
        if let Some(existing) = self.get(&id)? {
            info!("event=scan_ingest module=repo status=ok id={id} known=true");
            return Ok(existing);
        }

        let item = partial.into_item()?;
        self.insert(&item)?;
        info!("event=scan_ingest module=repo status=ok id={id} known=false");
        Ok(item)
    }

    /// Appends one ownership record and returns the updated item.
    pub fn append_history(&self, id: &str, record: OwnershipRecord) -> RepoResult<Item> {
        if id.trim().is_empty() {
            return Err(ItemValidationError::EmptyId.into());
        }
        record.validate()?;
        let mut item = self
            .get(id)?
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?;
        item.history.push(record);
        self.update(&item)?;
        Ok(item)
    }
}
