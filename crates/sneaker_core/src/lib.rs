//! Local persistence core for SneakerSecure.
//! This crate is the single source of truth for catalog, collection and
//! verification invariants.

pub mod config;
pub mod db;
pub mod kv;
pub mod logging;
pub mod migration;
pub mod model;
pub mod repo;
pub mod service;
pub mod verification;

pub use config::{default_log_level, normalize_log_level, ConfigError, CoreConfig};
pub use kv::{KeyValueStore, SqliteKvStore};
pub use logging::{init_logging, logging_status};
pub use migration::{
    LegacySources, MigrationEngine, MigrationError, MigrationOutcome, MigrationReport,
    MigrationState, DEFAULT_LEGACY_COLLECTION_KEYS, DEFAULT_LEGACY_ITEM_PREFIX,
};
pub use model::collection::{CollectionEntry, UNKNOWN_ITEM_NAME};
pub use model::item::{Item, ItemId, ItemValidationError, OwnershipRecord, PartialItem};
pub use model::session::{Capability, Session};
pub use repo::catalog_repo::CatalogRepository;
pub use repo::collection_repo::CollectionRepository;
pub use repo::{RepoError, RepoResult};
pub use service::sneaker_service::{ScanOutcome, SneakerService};
pub use verification::{VerificationRegistry, DEFAULT_VERIFIED_IDS};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
