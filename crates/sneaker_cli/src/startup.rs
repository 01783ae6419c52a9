//! Startup legacy import policy.

use log::warn;
use sneaker_core::{
    KeyValueStore, LegacySources, MigrationEngine, MigrationError, MigrationReport,
};

/// Runs the one-shot legacy import ahead of any command.
///
/// Never aborts startup. A failed run is logged and handed back as its
/// message; the flag stays unset, so the next launch retries.
pub fn run_startup_migration<S: KeyValueStore>(
    store: S,
    sources: &LegacySources,
) -> Result<MigrationReport, String> {
    MigrationEngine::new(store)
        .run_from_store(sources)
        .map_err(|err| {
            let status = match err {
                MigrationError::Incomplete { .. } => "partial",
                MigrationError::Repo(_) => "error",
            };
            warn!("event=cli_startup module=cli status={status} error={err}");
            err.to_string()
        })
}
