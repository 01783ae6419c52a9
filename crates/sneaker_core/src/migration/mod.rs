//! One-shot import of the legacy flat-array collection.
//!
//! # Responsibility
//! - Move records from the legacy `myCollection`/`userCollection` arrays and
//!   `db_collection_{id}` keys into per-item `collection:{id}` keys exactly
//!   once per store.
//! - Own the `migration:completed` flag; nothing else writes it.
//!
//! # Invariants
//! - Once the flag reads `"true"` every later run is a no-op.
//! - Each record is written as an overwrite keyed by its own id, so re-running
//!   the same blob after a crash converges to the same state.
//! - A record without an id is skipped with a warning, never fatal.
//! - The flag is only set when every usable record was written.

use crate::kv::{KeyValueStore, MIGRATION_COMPLETED_KEY};
use crate::model::collection::CollectionEntry;
use crate::model::item::{ItemValidationError, PartialItem};
use crate::repo::collection_repo::CollectionRepository;
use crate::repo::RepoError;
use chrono::Utc;
use log::{error, info, warn};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Raw keys the legacy app kept whole collection arrays under. Startup code
/// wrote `myCollection`; the detail and collection screens wrote
/// `userCollection`.
pub const DEFAULT_LEGACY_COLLECTION_KEYS: [&str; 2] = ["myCollection", "userCollection"];

/// Prefix of the legacy per-item keys (`db_collection_{id}`).
pub const DEFAULT_LEGACY_ITEM_PREFIX: &str = "db_collection_";

const FLAG_DONE: &str = "true";

/// Where `run_from_store` looks for legacy records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacySources {
    /// Raw keys each holding a JSON array of records.
    pub array_keys: Vec<String>,
    /// Prefix whose keys each hold one JSON record.
    pub item_prefix: Option<String>,
}

impl Default for LegacySources {
    fn default() -> Self {
        Self {
            array_keys: DEFAULT_LEGACY_COLLECTION_KEYS
                .iter()
                .map(|key| key.to_string())
                .collect(),
            item_prefix: Some(DEFAULT_LEGACY_ITEM_PREFIX.to_string()),
        }
    }
}

/// Persisted import state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    Pending,
    Done,
}

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The flag was already set; nothing was read or written.
    AlreadyCompleted,
    /// No legacy records; the flag was set.
    NothingToMigrate,
    /// Records were processed and the flag was set.
    Migrated,
}

/// Counters for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub outcome: MigrationOutcome,
    pub migrated: usize,
    /// Records dropped because they carried no usable id.
    pub skipped: usize,
    /// Records whose write failed; non-zero only inside `Incomplete`.
    pub failed: usize,
}

impl MigrationReport {
    fn empty(outcome: MigrationOutcome) -> Self {
        Self {
            outcome,
            migrated: 0,
            skipped: 0,
            failed: 0,
        }
    }
}

/// Import failures.
#[derive(Debug)]
pub enum MigrationError {
    /// The run could not start (flag or legacy keys unreadable, an array key
    /// not holding an array). Nothing was written.
    Repo(RepoError),
    /// Data may be partially written but the flag is unset. Retrying `run`
    /// with the same blob is safe.
    Incomplete {
        report: MigrationReport,
        source: RepoError,
    },
}

impl Display for MigrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "legacy migration could not start: {err}"),
            Self::Incomplete { report, source } => write!(
                f,
                "legacy migration incomplete (migrated={}, skipped={}, failed={}): {source}",
                report.migrated, report.skipped, report.failed
            ),
        }
    }
}

impl Error for MigrationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Incomplete { source, .. } => Some(source),
        }
    }
}

impl From<RepoError> for MigrationError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Guarded legacy collection importer.
pub struct MigrationEngine<S> {
    store: S,
}

impl<S: KeyValueStore> MigrationEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Reads the persisted flag. Anything but `"true"` counts as pending.
    pub fn state(&self) -> Result<MigrationState, MigrationError> {
        let flag = self
            .store
            .get(MIGRATION_COMPLETED_KEY)
            .map_err(RepoError::from)?;
        Ok(match flag.as_deref() {
            Some(FLAG_DONE) => MigrationState::Done,
            _ => MigrationState::Pending,
        })
    }

    /// Imports `legacy` once.
    ///
    /// # Errors
    /// - `Repo` when the flag cannot be read.
    /// - `Incomplete` when a record write or the final flag write fails.
    pub fn run(&self, legacy: Option<&[PartialItem]>) -> Result<MigrationReport, MigrationError> {
        if self.state()? == MigrationState::Done {
            info!("event=legacy_migration module=migration status=skip reason=already_completed");
            return Ok(MigrationReport::empty(MigrationOutcome::AlreadyCompleted));
        }
        self.import(legacy.unwrap_or_default())
    }

    /// Gathers legacy records from `sources` and imports them.
    ///
    /// Array keys are read first, in order, then every key under the
    /// per-item prefix. Each record is read leniently: fields with an
    /// unexpected type count as absent, and only records without a usable id
    /// are skipped. Legacy keys are left in place.
    ///
    /// # Errors
    /// - `Repo(Validation)` when an array key holds something other than a
    ///   JSON array; nothing is written and the flag stays unset.
    /// - Everything `run` returns.
    pub fn run_from_store(
        &self,
        sources: &LegacySources,
    ) -> Result<MigrationReport, MigrationError> {
        if self.state()? == MigrationState::Done {
            info!("event=legacy_migration module=migration status=skip reason=already_completed");
            return Ok(MigrationReport::empty(MigrationOutcome::AlreadyCompleted));
        }

        let mut records = Vec::new();
        for key in &sources.array_keys {
            records.extend(self.read_legacy_array(key)?);
        }
        if let Some(prefix) = &sources.item_prefix {
            records.extend(self.read_legacy_items(prefix)?);
        }
        self.import(&records)
    }

    fn read_legacy_array(&self, key: &str) -> Result<Vec<PartialItem>, MigrationError> {
        let Some(raw) = self.store.get(key).map_err(RepoError::from)? else {
            return Ok(Vec::new());
        };
        let elements: Vec<Value> = serde_json::from_str(&raw).map_err(|err| {
            error!(
                "event=legacy_migration module=migration status=error error_code=legacy_blob_malformed key={key} error={err}"
            );
            RepoError::from(ItemValidationError::MalformedPayload(format!(
                "legacy blob under `{key}` is not a JSON array: {err}"
            )))
        })?;
        info!(
            "event=legacy_migration module=migration status=read key={key} records={}",
            elements.len()
        );
        Ok(elements.iter().map(PartialItem::from_legacy_value).collect())
    }

    fn read_legacy_items(&self, prefix: &str) -> Result<Vec<PartialItem>, MigrationError> {
        let keys = self.store.list_keys(prefix).map_err(RepoError::from)?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let values = self.store.multi_get(&keys).map_err(RepoError::from)?;
        info!(
            "event=legacy_migration module=migration status=read prefix={prefix} records={}",
            keys.len()
        );
        Ok(values
            .iter()
            .flatten()
            .map(|raw| {
                // Unparseable text yields a record without an id, skipped later.
                let value = serde_json::from_str::<Value>(raw).unwrap_or(Value::Null);
                PartialItem::from_legacy_value(&value)
            })
            .collect())
    }

    fn import(&self, records: &[PartialItem]) -> Result<MigrationReport, MigrationError> {
        let started_at = Instant::now();
        let mut report = MigrationReport::empty(if records.is_empty() {
            MigrationOutcome::NothingToMigrate
        } else {
            MigrationOutcome::Migrated
        });
        info!(
            "event=legacy_migration module=migration status=start records={}",
            records.len()
        );

        let collection = CollectionRepository::new(&self.store);
        let now = Utc::now();
        let mut first_failure = None;

        for (index, record) in records.iter().enumerate() {
            let entry = match CollectionEntry::normalize(record, now) {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(
                        "event=legacy_migration module=migration status=skip index={index} reason={err}"
                    );
                    report.skipped += 1;
                    continue;
                }
            };

            match collection.put_entry(&entry) {
                Ok(()) => report.migrated += 1,
                Err(err) => {
                    warn!(
                        "event=legacy_migration module=migration status=error index={index} id={} error={err}",
                        entry.id
                    );
                    report.failed += 1;
                    first_failure.get_or_insert(err);
                }
            }
        }

        if let Some(source) = first_failure {
            error!(
                "event=legacy_migration module=migration status=error error_code=record_write_failed migrated={} skipped={} failed={}",
                report.migrated, report.skipped, report.failed
            );
            return Err(MigrationError::Incomplete { report, source });
        }

        if let Err(err) = self.store.set(MIGRATION_COMPLETED_KEY, FLAG_DONE) {
            error!(
                "event=legacy_migration module=migration status=error error_code=flag_write_failed migrated={} skipped={} error={err}",
                report.migrated, report.skipped
            );
            return Err(MigrationError::Incomplete {
                report,
                source: err.into(),
            });
        }

        info!(
            "event=legacy_migration module=migration status=ok migrated={} skipped={} duration_ms={}",
            report.migrated,
            report.skipped,
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }
}
