// aegi-store-sqlite/src/error.rs
// ============================================================================
// Module: SQLite Store Errors
// Description: Internal error type for the SQLite adapter, mapped to the
//              backend-agnostic StoreError at the trait boundary.
// Dependencies: aegi-core, rusqlite, thiserror
// ============================================================================

use aegi_core::StoreError;
use thiserror::Error;

/// Internal `SQLite` adapter errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Backend I/O error (connection, path, filesystem).
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Row contents could not be deserialized back into a model type.
    #[error("sqlite store corrupt row: {0}")]
    Corrupt(String),
    /// Store schema version does not match what this build expects.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
}

impl From<rusqlite::Error> for SqliteStoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Db(error.to_string())
    }
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Io(message),
            SqliteStoreError::Corrupt(message) => Self::Invalid(message),
            SqliteStoreError::VersionMismatch(message) => Self::Invalid(message),
        }
    }
}
