// aegi-store-sqlite/src/connection.rs
// ============================================================================
// Module: SQLite Connection Setup
// Description: Opens a connection with durability pragmas and initializes
//              (or validates) the store's schema.
// Dependencies: rusqlite
// ============================================================================

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;

use crate::config::SqliteStoreConfig;
use crate::error::SqliteStoreError;

/// Schema version this build expects. Bump and add a migration arm in
/// [`initialize_schema`] when the table shapes below change.
const SCHEMA_VERSION: i64 = 1;

/// Opens an `SQLite` connection with durability pragmas applied.
///
/// # Errors
///
/// Returns [`SqliteStoreError`] when the connection cannot be opened or a
/// pragma cannot be applied.
pub fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    if let Some(parent) = config.path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))?;
    }
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let mut connection = Connection::open_with_flags(&config.path, flags)?;
    apply_pragmas(&connection, config)?;
    initialize_schema(&mut connection)?;
    Ok(connection)
}

fn apply_pragmas(connection: &Connection, config: &SqliteStoreConfig) -> Result<(), SqliteStoreError> {
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))?;
    connection.busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))?;
    Ok(())
}

fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction()?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS chunks (
                    uid TEXT PRIMARY KEY,
                    case_uid TEXT NOT NULL,
                    data_json TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_chunks_case ON chunks (case_uid);

                CREATE TABLE IF NOT EXISTS source_claims (
                    uid TEXT PRIMARY KEY,
                    case_uid TEXT NOT NULL,
                    chunk_uid TEXT NOT NULL,
                    data_json TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_source_claims_chunk ON source_claims (chunk_uid);

                CREATE TABLE IF NOT EXISTS evidence (
                    uid TEXT PRIMARY KEY,
                    case_uid TEXT NOT NULL,
                    data_json TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_evidence_case ON evidence (case_uid);

                CREATE TABLE IF NOT EXISTS assertions (
                    uid TEXT PRIMARY KEY,
                    case_uid TEXT NOT NULL,
                    data_json TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_assertions_case ON assertions (case_uid);

                CREATE TABLE IF NOT EXISTS hypotheses (
                    uid TEXT PRIMARY KEY,
                    case_uid TEXT NOT NULL,
                    data_json TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_hypotheses_case ON hypotheses (case_uid);

                CREATE TABLE IF NOT EXISTS entities (
                    uid TEXT PRIMARY KEY,
                    case_uid TEXT NOT NULL,
                    data_json TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_entities_case ON entities (case_uid);

                CREATE TABLE IF NOT EXISTS relation_facts (
                    uid TEXT PRIMARY KEY,
                    subject_entity_uid TEXT NOT NULL,
                    object_entity_uid TEXT NOT NULL,
                    data_json TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_relation_facts_subject
                    ON relation_facts (subject_entity_uid);
                CREATE INDEX IF NOT EXISTS idx_relation_facts_object
                    ON relation_facts (object_entity_uid);

                CREATE TABLE IF NOT EXISTS identity_actions (
                    uid TEXT PRIMARY KEY,
                    case_uid TEXT NOT NULL,
                    status TEXT NOT NULL,
                    data_json TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_identity_actions_case_status
                    ON identity_actions (case_uid, status);",
            )?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value} (expected {SCHEMA_VERSION})"
            )));
        }
    }
    tx.commit()?;
    Ok(())
}
