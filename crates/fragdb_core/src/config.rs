//! Store and logging configuration.
//!
//! Both structs deserialize from partial JSON: missing fields take their
//! defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_PRIMARY_DB: &str = "fragment-database.sqlite";
pub const DEFAULT_USER_DB: &str = "user-fragment-database.sqlite";
pub const DEFAULT_SEARCH_LIMIT: usize = 5;
/// A user file smaller than this has never been initialized.
pub const DEFAULT_USER_DB_MIN_BYTES: u64 = 100;

/// What storing a fragment with repeated atom labels does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateAtomPolicy {
    /// Store and report the duplicates.
    #[default]
    Report,
    /// Refuse to store.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub primary_path: PathBuf,
    pub user_path: PathBuf,
    /// Open the primary file read-only and only check its schema.
    pub primary_read_only: bool,
    pub duplicate_atoms: DuplicateAtomPolicy,
    pub search_limit: usize,
    pub user_db_min_bytes: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            primary_path: PathBuf::from(DEFAULT_PRIMARY_DB),
            user_path: PathBuf::from(DEFAULT_USER_DB),
            primary_read_only: true,
            duplicate_atoms: DuplicateAtomPolicy::default(),
            search_limit: DEFAULT_SEARCH_LIMIT,
            user_db_min_bytes: DEFAULT_USER_DB_MIN_BYTES,
        }
    }
}

impl StoreConfig {
    pub fn new(primary_path: impl Into<PathBuf>, user_path: impl Into<PathBuf>) -> Self {
        Self {
            primary_path: primary_path.into(),
            user_path: user_path.into(),
            ..Self::default()
        }
    }
}

/// Settings for [`crate::logging::init_logging`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
    /// Absolute directory for rotated log files.
    pub log_dir: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            log_dir: std::env::temp_dir().join("fragdb-logs"),
        }
    }
}
