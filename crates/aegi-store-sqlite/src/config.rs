// aegi-store-sqlite/src/config.rs
// ============================================================================
// Module: SQLite Store Config
// Description: Connection and durability configuration for the SQLite store.
// Dependencies: serde
// ============================================================================

use std::path::PathBuf;

use serde::Deserialize;

/// `SQLite` journal mode.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended for concurrent readers).
    #[default]
    Wal,
    /// Delete journal mode (legacy, simpler on constrained filesystems).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` synchronous mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest, default).
    #[default]
    Full,
    /// Normal synchronous mode (faster, still WAL-safe).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite`-backed store.
///
/// # Invariants
/// - `busy_timeout_ms` applies to every connection opened from this config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds, applied via `PRAGMA busy_timeout`.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl SqliteStoreConfig {
    /// Builds a config pointed at `path` with default durability settings.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}
