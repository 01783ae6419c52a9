//! Host configuration.
//!
//! # Responsibility
//! - Load the optional JSON config file the host passes at startup.
//! - Resolve defaults for everything the file leaves out.
//!
//! # Invariants
//! - A missing field always has a default; an empty file (`{}`) is valid.
//! - Unknown fields are rejected so typos do not silently fall back.

use crate::kv::{CATALOG_PREFIX, COLLECTION_PREFIX, MIGRATION_COMPLETED_KEY};
use crate::migration::{LegacySources, DEFAULT_LEGACY_COLLECTION_KEYS, DEFAULT_LEGACY_ITEM_PREFIX};
use crate::verification::VerificationRegistry;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const RESERVED_PREFIXES: [&str; 3] = [CATALOG_PREFIX, COLLECTION_PREFIX, MIGRATION_COMPLETED_KEY];

/// Maps a user-supplied level to its canonical name.
///
/// Accepts `trace|debug|info|warn|error` in any case, plus `warning`.
pub fn normalize_log_level(level: &str) -> Option<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

/// Returns the default log level for current build mode.
///
/// - `debug` builds -> `debug`
/// - `release` builds -> `info`
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// `trace|debug|info|warn|error`; build-mode default when absent.
    pub log_level: Option<String>,
    /// Absolute directory for rolling logs; logging stays off when absent.
    pub log_dir: Option<PathBuf>,
    /// Store database file.
    pub db_path: Option<PathBuf>,
    /// Raw keys each holding a legacy collection array.
    pub legacy_collection_keys: Vec<String>,
    /// Prefix of legacy per-item keys; `null` disables the prefix scan.
    pub legacy_item_prefix: Option<String>,
    /// Overrides the compiled-in trusted id list when present.
    pub verified_ids: Option<Vec<String>>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: None,
            log_dir: None,
            db_path: None,
            legacy_collection_keys: DEFAULT_LEGACY_COLLECTION_KEYS
                .iter()
                .map(|key| key.to_string())
                .collect(),
            legacy_item_prefix: Some(DEFAULT_LEGACY_ITEM_PREFIX.to_string()),
            verified_ids: None,
        }
    }
}

impl CoreConfig {
    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(level) = &self.log_level {
            if normalize_log_level(level).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "unsupported log_level `{level}`; expected trace|debug|info|warn|error"
                )));
            }
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be absolute, got `{}`",
                    dir.display()
                )));
            }
        }

        for key in &self.legacy_collection_keys {
            if key.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "legacy_collection_keys must not contain an empty key".to_string(),
                ));
            }
            if RESERVED_PREFIXES.iter().any(|reserved| key.starts_with(reserved)) {
                return Err(ConfigError::Invalid(format!(
                    "legacy collection key `{key}` collides with a reserved namespace"
                )));
            }
        }
        if let Some(prefix) = &self.legacy_item_prefix {
            if prefix.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "legacy_item_prefix must not be empty".to_string(),
                ));
            }
            // Overlap either way would sweep current keys into the import.
            let overlaps = RESERVED_PREFIXES.iter().any(|reserved| {
                prefix.starts_with(reserved) || reserved.starts_with(prefix.as_str())
            });
            if overlaps {
                return Err(ConfigError::Invalid(format!(
                    "legacy_item_prefix `{prefix}` overlaps a reserved namespace"
                )));
            }
        }
        Ok(())
    }

    /// Effective canonical log level; falls back to the build-mode default
    /// when unset or unrecognised.
    pub fn log_level(&self) -> &'static str {
        self.log_level
            .as_deref()
            .and_then(normalize_log_level)
            .unwrap_or(default_log_level())
    }

    /// Legacy keys the startup import reads.
    pub fn legacy_sources(&self) -> LegacySources {
        LegacySources {
            array_keys: self.legacy_collection_keys.clone(),
            item_prefix: self.legacy_item_prefix.clone(),
        }
    }

    pub fn verification_registry(&self) -> VerificationRegistry {
        match &self.verified_ids {
            Some(ids) => VerificationRegistry::new(ids),
            None => VerificationRegistry::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config JSON: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}
