//! Scan/claim/edit use cases.
//!
//! # Responsibility
//! - Compose catalog, collection and verification for host callers.
//! - Gate catalog edits on the caller's `Session` capabilities.
//!
//! # Invariants
//! - Service APIs never bypass repository validation.
//! - Verification is answered by the registry alone, never by catalog
//!   presence.

use crate::kv::KeyValueStore;
use crate::model::collection::CollectionEntry;
use crate::model::item::{Item, ItemId, OwnershipRecord, PartialItem};
use crate::model::session::{Capability, Session};
use crate::repo::catalog_repo::CatalogRepository;
use crate::repo::collection_repo::CollectionRepository;
use crate::repo::{RepoError, RepoResult};
use crate::verification::VerificationRegistry;
use log::warn;
use serde::Serialize;

/// What the detail screen needs after a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    pub item: Item,
    pub verified: bool,
    pub in_collection: bool,
}

/// Use-case facade over one store.
pub struct SneakerService<S> {
    store: S,
    registry: VerificationRegistry,
}

impl<S: KeyValueStore> SneakerService<S> {
    pub fn new(store: S, registry: VerificationRegistry) -> Self {
        Self { store, registry }
    }

    pub fn catalog(&self) -> CatalogRepository<&S> {
        CatalogRepository::new(&self.store)
    }

    pub fn collection(&self) -> CollectionRepository<&S> {
        CollectionRepository::new(&self.store)
    }

    pub fn is_verified(&self, id: &str) -> bool {
        self.registry.is_verified(id)
    }

    /// Resolves a decoded scan payload, registering unknown items.
    pub fn scan(&self, payload: &str) -> RepoResult<ScanOutcome> {
        let item = self.catalog().ingest_scan(payload)?;
        let in_collection = self.collection().contains(&item.id)?;
        Ok(ScanOutcome {
            verified: self.registry.is_verified(&item.id),
            in_collection,
            item,
        })
    }

    /// Adds a catalog item to the collection. Claiming twice is a no-op.
    pub fn claim(&self, id: &str) -> RepoResult<ItemId> {
        let item = self
            .catalog()
            .get(id)?
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?;
        self.collection().add(&PartialItem::from(&item))
    }

    pub fn release(&self, id: &str) -> RepoResult<bool> {
        self.collection().remove(id)
    }

    pub fn my_collection(&self) -> RepoResult<Vec<CollectionEntry>> {
        self.collection().list_all()
    }

    /// Overwrites a catalog item. Requires `EditCatalog`.
    pub fn edit_item(&self, session: &Session, item: &Item) -> RepoResult<()> {
        require(session, Capability::EditCatalog)?;
        self.catalog().update(item)
    }

    /// Appends an ownership record. Requires `EditCatalog`.
    pub fn record_ownership(
        &self,
        session: &Session,
        id: &str,
        record: OwnershipRecord,
    ) -> RepoResult<Item> {
        require(session, Capability::EditCatalog)?;
        self.catalog().append_history(id, record)
    }
}

fn require(session: &Session, capability: Capability) -> RepoResult<()> {
    if session.has(capability) {
        return Ok(());
    }
    warn!(
        "event=capability_check module=service status=denied capability={}",
        capability
    );
    Err(RepoError::PermissionDenied(capability))
}
