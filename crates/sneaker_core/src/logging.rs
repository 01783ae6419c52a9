//! Core logging bootstrap and safety policy.
//!
//! # Responsibility
//! - Turn the `log_level`/`log_dir` part of `CoreConfig` into rolling file
//!   logs, once per process.
//! - Capture panics as sanitised log events.
//!
//! # Invariants
//! - Events are metadata only: ids and counters, never item names,
//!   descriptions or owner names.

use crate::config::CoreConfig;
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "sneakersecure";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

struct LoggingState {
    level: &'static str,
    log_dir: PathBuf,
    _logger: LoggerHandle,
}

/// Starts rolling file logs as described by `config`.
///
/// Returns `Ok(false)` when `config.log_dir` is unset and logging stays off,
/// `Ok(true)` once file logging is active.
///
/// # Invariants
/// - Repeating the call with the same level and directory is a no-op.
/// - A different level or directory after the first success is rejected.
/// - Never panics.
///
/// # Errors
/// - The config fails `CoreConfig::validate`.
/// - The directory cannot be created or the backend fails to start.
pub fn init_logging(config: &CoreConfig) -> Result<bool, String> {
    config.validate().map_err(|err| err.to_string())?;
    let Some(log_dir) = config.log_dir.as_deref() else {
        return Ok(false);
    };
    let level = config.log_level();

    if let Some(state) = LOGGING_STATE.get() {
        return ensure_same_config(state, level, log_dir).map(|()| true);
    }

    let state = LOGGING_STATE.get_or_try_init(|| start_logger(config, level, log_dir))?;

    // A concurrent first call may have won the race with other settings.
    ensure_same_config(state, level, log_dir).map(|()| true)
}

fn start_logger(
    config: &CoreConfig,
    level: &'static str,
    log_dir: &Path,
) -> Result<LoggingState, String> {
    std::fs::create_dir_all(log_dir).map_err(|err| {
        format!(
            "failed to create log directory `{}`: {err}",
            log_dir.display()
        )
    })?;

    let logger = Logger::try_with_str(level)
        .map_err(|err| format!("invalid log level `{level}`: {err}"))?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        // [YYYY-MM-DD HH:MM:SS.ffffff TZ] LEVEL [module] file:line: message
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))?;

    install_panic_hook_once();

    info!(
        "event=app_start module=core status=ok platform={} build_mode={} version={}",
        std::env::consts::OS,
        build_mode(),
        env!("CARGO_PKG_VERSION")
    );
    info!(
        "event=core_init module=core status=ok level={level} log_dir={} db={} legacy_array_keys={} legacy_item_prefix={} verified_ids={}",
        log_dir.display(),
        if config.db_path.is_some() { "file" } else { "default" },
        config.legacy_collection_keys.len(),
        config.legacy_item_prefix.as_deref().unwrap_or("off"),
        config.verification_registry().len()
    );

    Ok(LoggingState {
        level,
        log_dir: log_dir.to_path_buf(),
        _logger: logger,
    })
}

fn ensure_same_config(state: &LoggingState, level: &str, log_dir: &Path) -> Result<(), String> {
    if state.log_dir != log_dir {
        return Err(format!(
            "logging already initialized at `{}`; refusing to switch to `{}`",
            state.log_dir.display(),
            log_dir.display()
        ));
    }
    if state.level != level {
        return Err(format!(
            "logging already initialized with level `{}`; refusing to switch to `{}`",
            state.level, level
        ));
    }
    Ok(())
}

/// Active `(level, log_dir)`, or `None` before a successful `init_logging`.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.level, state.log_dir.clone()))
}

fn build_mode() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    }
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.get().is_some() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Payload may carry scanned text; strip newlines and cap length.
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_payload_summary(panic_info);
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            location, payload
        );
        previous_hook(panic_info);
    }));

    let _ = PANIC_HOOK_INSTALLED.set(());
}

fn panic_payload_summary(info: &std::panic::PanicHookInfo<'_>) -> String {
    let payload = if let Some(message) = info.payload().downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = info.payload().downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    };

    sanitize_message(&payload, MAX_PANIC_PAYLOAD_CHARS)
}

fn sanitize_message(value: &str, max_chars: usize) -> String {
    let normalized = value.replace(['\n', '\r'], " ");
    let mut truncated = normalized.chars().take(max_chars).collect::<String>();
    if normalized.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}

#[cfg(test)]
mod tests {
    use super::{init_logging, logging_status, sanitize_message};
    use crate::config::CoreConfig;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    // Outlives the test: the global logger keeps writing here.
    fn unique_temp_dir(suffix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "sneakersecure-logging-{suffix}-{}-{nanos}",
            std::process::id()
        ))
    }

    fn config_with(level: &str, log_dir: Option<PathBuf>) -> CoreConfig {
        CoreConfig {
            log_level: Some(level.to_string()),
            log_dir,
            ..CoreConfig::default()
        }
    }

    #[test]
    fn sanitize_message_removes_newlines_and_truncates() {
        let sanitized = sanitize_message("Jordan 1\nowner: Sam\rdate", 8);
        assert!(!sanitized.contains('\n'));
        assert!(!sanitized.contains('\r'));
        assert!(sanitized.ends_with("..."));
    }

    #[test]
    fn init_logging_without_log_dir_stays_off() {
        assert_eq!(init_logging(&config_with("info", None)), Ok(false));
    }

    #[test]
    fn init_logging_rejects_invalid_config_before_touching_disk() {
        let relative = config_with("info", Some(PathBuf::from("logs/dev")));
        let error = init_logging(&relative).expect_err("relative log_dir must be rejected");
        assert!(error.contains("absolute"));

        let dir = tempfile::tempdir().unwrap();
        let loud = config_with("loud", Some(dir.path().join("logs")));
        let error = init_logging(&loud).expect_err("unknown level must be rejected");
        assert!(error.contains("log_level"));
        assert!(!dir.path().join("logs").exists());
    }

    // The only test that starts the global logger.
    #[test]
    fn init_logging_is_idempotent_for_same_config_and_rejects_conflicts() {
        let log_dir = unique_temp_dir("idempotent");
        let config = config_with("INFO", Some(log_dir.clone()));

        assert_eq!(init_logging(&config), Ok(true));
        assert_eq!(init_logging(&config_with("info", Some(log_dir.clone()))), Ok(true));

        let level_error = init_logging(&config_with("debug", Some(log_dir.clone())))
            .expect_err("level conflict should fail");
        assert!(level_error.contains("refusing to switch"));

        let dir_error = init_logging(&config_with("info", Some(unique_temp_dir("other"))))
            .expect_err("directory conflict should fail");
        assert!(dir_error.contains("refusing to switch"));

        let (active_level, active_dir) = logging_status().expect("logging should be active");
        assert_eq!(active_level, "info");
        assert_eq!(active_dir, log_dir);
        assert!(log_dir.is_dir());
    }
}
