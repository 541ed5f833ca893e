// aegi-store-sqlite/src/lib.rs
// ============================================================================
// Crate: aegi-store-sqlite
// Description: Durable EvidenceStore/GraphStore backed by SQLite.
// ============================================================================

pub mod config;
pub mod connection;
pub mod error;
pub mod store;

pub use config::SqliteStoreConfig;
pub use config::SqliteStoreMode;
pub use config::SqliteSyncMode;
pub use connection::open_connection;
pub use error::SqliteStoreError;
pub use store::SqliteStore;
