// aegi-config/src/config.rs
// ============================================================================
// Module: AEGI Configuration
// Description: Configuration loading and validation for AEGI Core.
// Purpose: Provide strict, fail-closed config parsing with sane limits.
// Dependencies: aegi-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with a strict size limit and
//! validated fields, then overridden field-by-field from `AEGI_<SECTION>__
//! <KEY>`-shaped environment variables. Missing or invalid configuration
//! fails closed rather than falling back to a guessed value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "aegi.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "AEGI_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default GDELT poll interval in minutes.
pub(crate) const DEFAULT_GDELT_INTERVAL_MINUTES: u64 = 15;
/// Default GDELT initial poll delay in seconds.
pub(crate) const DEFAULT_GDELT_INITIAL_DELAY_SECONDS: u64 = 60;
/// Default evidence retention time-to-live, in hours (90 days).
pub(crate) const DEFAULT_RETENTION_TTL_HOURS: f64 = 24.0 * 90.0;
/// Default hard-delete grace period after expiry, in hours (7 days).
pub(crate) const DEFAULT_RETENTION_GRACE_HOURS: f64 = 24.0 * 7.0;
/// Default maximum concurrent pipeline runs.
pub(crate) const DEFAULT_MAX_CONCURRENT_TASKS: usize = 4;
/// Default per-stage task timeout in seconds.
pub(crate) const DEFAULT_TASK_TIMEOUT_SECONDS: u64 = 120;
/// Default graceful shutdown budget in seconds.
pub(crate) const DEFAULT_SHUTDOWN_TIMEOUT_SECONDS: u64 = 30;
/// Default maximum pushes delivered per subscriber per hour.
pub(crate) const DEFAULT_PUSH_MAX_PER_HOUR: u32 = 60;
/// Minimum allowed task timeout, in seconds.
pub(crate) const MIN_TASK_TIMEOUT_SECONDS: u64 = 1;
/// Maximum allowed task timeout, in seconds.
pub(crate) const MAX_TASK_TIMEOUT_SECONDS: u64 = 3600;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// AEGI Core configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AegiConfig {
    /// Pipeline orchestration settings.
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Push notification throttling settings.
    #[serde(default)]
    pub push: PushConfig,
    /// GDELT polling settings.
    #[serde(default)]
    pub gdelt: GdeltConfig,
    /// Evidence retention sweep settings.
    #[serde(default)]
    pub retention: RetentionConfig,
    /// Qdrant vector store connection settings.
    #[serde(default)]
    pub qdrant: QdrantConfig,
    /// Neo4j graph store connection settings.
    #[serde(default)]
    pub neo4j: Neo4jConfig,
    /// Evidence/graph/vector store backend selection.
    #[serde(default)]
    pub store: StoreConfig,
    /// Last-modified time of the file this config was loaded from, if any.
    #[serde(skip)]
    pub source_modified_at: Option<SystemTime>,
}

impl Default for AegiConfig {
    fn default() -> Self {
        Self {
            orchestrator: OrchestratorConfig::default(),
            push: PushConfig::default(),
            gdelt: GdeltConfig::default(),
            retention: RetentionConfig::default(),
            qdrant: QdrantConfig::default(),
            neo4j: Neo4jConfig::default(),
            store: StoreConfig::default(),
            source_modified_at: None,
        }
    }
}

impl AegiConfig {
    /// Loads configuration from `path`, falling back to `AEGI_CONFIG` or
    /// `aegi.toml`, then applies environment-variable overrides and
    /// validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading, parsing, or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.source_modified_at = fs::metadata(&resolved).and_then(|meta| meta.modified()).ok();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Applies `AEGI_<SECTION>__<KEY>`-shaped environment variable
    /// overrides on top of whatever was loaded from file (or left at
    /// default, for a config built in memory rather than loaded).
    pub fn apply_env_overrides(&mut self) {
        if let Some(value) = env_usize("AEGI_ORCHESTRATOR__MAX_CONCURRENT_TASKS") {
            self.orchestrator.max_concurrent_tasks = value;
        }
        if let Some(value) = env_u64("AEGI_ORCHESTRATOR__TASK_TIMEOUT_SECONDS") {
            self.orchestrator.task_timeout_seconds = value;
        }
        if let Some(value) = env_u64("AEGI_ORCHESTRATOR__SHUTDOWN_TIMEOUT_SECONDS") {
            self.orchestrator.shutdown_timeout_seconds = value;
        }
        if let Some(value) = env_u32("AEGI_PUSH__MAX_PER_HOUR") {
            self.push.max_per_hour = value;
        }
        if let Some(value) = env_u64("AEGI_GDELT__INTERVAL_MINUTES") {
            self.gdelt.interval_minutes = value;
        }
        if let Some(value) = env_u64("AEGI_GDELT__INITIAL_DELAY_SECONDS") {
            self.gdelt.initial_delay_seconds = value;
        }
        if let Ok(value) = env::var("AEGI_GDELT__FEED_URL") {
            self.gdelt.feed_url = value;
        }
        if let Ok(value) = env::var("AEGI_GDELT__EVENTS_FEED_URL") {
            self.gdelt.events_feed_url = Some(value);
        }
        if let Some(value) = env_u64("AEGI_GDELT__TIMEOUT_MS") {
            self.gdelt.timeout_ms = value;
        }
        if let Some(value) = env_usize("AEGI_GDELT__MAX_EVENTS") {
            self.gdelt.max_events = value;
        }
        if let Some(value) = env_f64("AEGI_RETENTION__TIME_TO_LIVE_HOURS") {
            self.retention.time_to_live_hours = value;
        }
        if let Some(value) = env_f64("AEGI_RETENTION__GRACE_PERIOD_HOURS") {
            self.retention.grace_period_hours = value;
        }
        if let Ok(value) = env::var("AEGI_QDRANT__URL") {
            self.qdrant.url = value;
        }
        if let Ok(value) = env::var("AEGI_QDRANT__COLLECTION") {
            self.qdrant.collection = value;
        }
        if let Some(value) = env_u64("AEGI_QDRANT__TIMEOUT_MS") {
            self.qdrant.timeout_ms = value;
        }
        if let Ok(value) = env::var("AEGI_NEO4J__URL") {
            self.neo4j.url = value;
        }
        if let Ok(value) = env::var("AEGI_NEO4J__USERNAME") {
            self.neo4j.username = value;
        }
        if let Ok(value) = env::var("AEGI_NEO4J__PASSWORD") {
            self.neo4j.password = value;
        }
        if let Ok(value) = env::var("AEGI_NEO4J__DATABASE") {
            self.neo4j.database = value;
        }
        if let Ok(value) = env::var("AEGI_STORE__BACKEND") {
            if let Some(backend) = StoreBackend::parse(&value) {
                self.store.backend = backend;
            }
        }
        if let Ok(value) = env::var("AEGI_STORE__SQLITE_PATH") {
            self.store.sqlite_path = value;
        }
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.orchestrator.validate()?;
        self.push.validate()?;
        self.gdelt.validate()?;
        self.retention.validate()?;
        self.qdrant.validate()?;
        self.neo4j.validate()?;
        self.store.validate()?;
        Ok(())
    }
}

/// Pipeline orchestration settings (§4.12).
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct OrchestratorConfig {
    /// Maximum number of case pipelines run concurrently.
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,
    /// Per-stage timeout before a stage is recorded as failed.
    #[serde(default = "default_task_timeout_seconds")]
    pub task_timeout_seconds: u64,
    /// Time budget allowed for in-flight runs to finish during shutdown.
    #[serde(default = "default_shutdown_timeout_seconds")]
    pub shutdown_timeout_seconds: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: DEFAULT_MAX_CONCURRENT_TASKS,
            task_timeout_seconds: DEFAULT_TASK_TIMEOUT_SECONDS,
            shutdown_timeout_seconds: DEFAULT_SHUTDOWN_TIMEOUT_SECONDS,
        }
    }
}

impl OrchestratorConfig {
    /// Validates orchestrator settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_tasks == 0 {
            return Err(ConfigError::Invalid(
                "orchestrator.max_concurrent_tasks must be at least 1".to_string(),
            ));
        }
        if !(MIN_TASK_TIMEOUT_SECONDS..=MAX_TASK_TIMEOUT_SECONDS).contains(&self.task_timeout_seconds) {
            return Err(ConfigError::Invalid(format!(
                "orchestrator.task_timeout_seconds must be between {MIN_TASK_TIMEOUT_SECONDS} and {MAX_TASK_TIMEOUT_SECONDS}"
            )));
        }
        Ok(())
    }
}

/// Push notification throttling settings (§4.13).
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct PushConfig {
    /// Maximum pushes delivered per subscriber per rolling hour.
    #[serde(default = "default_push_max_per_hour")]
    pub max_per_hour: u32,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self { max_per_hour: DEFAULT_PUSH_MAX_PER_HOUR }
    }
}

impl PushConfig {
    /// Validates push throttling settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_per_hour == 0 {
            return Err(ConfigError::Invalid("push.max_per_hour must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// GDELT polling settings (§4.14).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GdeltConfig {
    /// Minutes between scheduled GDELT polls.
    #[serde(default = "default_gdelt_interval_minutes")]
    pub interval_minutes: u64,
    /// Seconds to wait before the first poll after startup.
    #[serde(default = "default_gdelt_initial_delay_seconds")]
    pub initial_delay_seconds: u64,
    /// URL of the GDELT scoring export feed.
    #[serde(default = "default_gdelt_feed_url")]
    pub feed_url: String,
    /// Optional URL of the GDELT raw events feed.
    #[serde(default)]
    pub events_feed_url: Option<String>,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_gdelt_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum events accepted from a single poll.
    #[serde(default = "default_gdelt_max_events")]
    pub max_events: usize,
}

impl Default for GdeltConfig {
    fn default() -> Self {
        Self {
            interval_minutes: DEFAULT_GDELT_INTERVAL_MINUTES,
            initial_delay_seconds: DEFAULT_GDELT_INITIAL_DELAY_SECONDS,
            feed_url: default_gdelt_feed_url(),
            events_feed_url: None,
            timeout_ms: default_gdelt_timeout_ms(),
            max_events: default_gdelt_max_events(),
        }
    }
}

impl GdeltConfig {
    /// Validates GDELT polling settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_minutes == 0 {
            return Err(ConfigError::Invalid("gdelt.interval_minutes must be at least 1".to_string()));
        }
        if self.feed_url.trim().is_empty() {
            return Err(ConfigError::Invalid("gdelt.feed_url must be non-empty".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("gdelt.timeout_ms must be at least 1".to_string()));
        }
        if self.max_events == 0 {
            return Err(ConfigError::Invalid("gdelt.max_events must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Evidence retention sweep settings (§4.15).
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct RetentionConfig {
    /// Age at which an unpinned, un-expired evidence row becomes eligible
    /// for expiry.
    #[serde(default = "default_retention_ttl_hours")]
    pub time_to_live_hours: f64,
    /// Time after expiry before an evidence row becomes a hard-delete
    /// candidate.
    #[serde(default = "default_retention_grace_hours")]
    pub grace_period_hours: f64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            time_to_live_hours: DEFAULT_RETENTION_TTL_HOURS,
            grace_period_hours: DEFAULT_RETENTION_GRACE_HOURS,
        }
    }
}

impl RetentionConfig {
    /// Validates retention sweep settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.time_to_live_hours <= 0.0 {
            return Err(ConfigError::Invalid(
                "retention.time_to_live_hours must be positive".to_string(),
            ));
        }
        if self.grace_period_hours < 0.0 {
            return Err(ConfigError::Invalid(
                "retention.grace_period_hours must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Qdrant vector store connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QdrantConfig {
    /// Base URL of the Qdrant HTTP API.
    #[serde(default = "default_qdrant_url")]
    pub url: String,
    /// Collection name holding claim/chunk embeddings.
    #[serde(default = "default_qdrant_collection")]
    pub collection: String,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_qdrant_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            collection: default_qdrant_collection(),
            timeout_ms: default_qdrant_timeout_ms(),
        }
    }
}

impl QdrantConfig {
    /// Validates Qdrant connection settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Invalid("qdrant.url must be non-empty".to_string()));
        }
        if self.collection.trim().is_empty() {
            return Err(ConfigError::Invalid("qdrant.collection must be non-empty".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("qdrant.timeout_ms must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Neo4j graph store connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Neo4jConfig {
    /// Bolt URL of the Neo4j instance.
    #[serde(default = "default_neo4j_url")]
    pub url: String,
    /// Username used to authenticate.
    #[serde(default = "default_neo4j_username")]
    pub username: String,
    /// Password used to authenticate.
    #[serde(default)]
    pub password: String,
    /// Database name within the instance.
    #[serde(default = "default_neo4j_database")]
    pub database: String,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            url: default_neo4j_url(),
            username: default_neo4j_username(),
            password: String::new(),
            database: default_neo4j_database(),
        }
    }
}

impl Neo4jConfig {
    /// Validates Neo4j connection settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Invalid("neo4j.url must be non-empty".to_string()));
        }
        if self.database.trim().is_empty() {
            return Err(ConfigError::Invalid("neo4j.database must be non-empty".to_string()));
        }
        Ok(())
    }
}

/// Selects which backend implements `EvidenceStore`/`GraphStore`/
/// `VectorStore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local, non-persistent reference implementations.
    InMemory,
    /// SQLite-backed persistent store.
    Sqlite,
}

impl StoreBackend {
    /// Parses a backend name case-insensitively, returning `None` for an
    /// unrecognized value rather than failing closed on an env override.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "in_memory" | "in-memory" | "memory" => Some(Self::InMemory),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

/// Evidence/graph/vector store backend selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Backend implementation to wire at startup.
    #[serde(default)]
    pub backend: StoreBackend,
    /// Path to the SQLite database file, used when `backend = "sqlite"`.
    #[serde(default = "default_store_sqlite_path")]
    pub sqlite_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { backend: StoreBackend::InMemory, sqlite_path: default_store_sqlite_path() }
    }
}

impl Default for StoreBackend {
    fn default() -> Self {
        Self::InMemory
    }
}

impl StoreConfig {
    /// Validates store backend settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == StoreBackend::Sqlite {
            validate_path_string("store.sqlite_path", &self.sqlite_path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Field Defaults
// ============================================================================

pub(crate) const fn default_max_concurrent_tasks() -> usize {
    DEFAULT_MAX_CONCURRENT_TASKS
}

pub(crate) const fn default_task_timeout_seconds() -> u64 {
    DEFAULT_TASK_TIMEOUT_SECONDS
}

pub(crate) const fn default_shutdown_timeout_seconds() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT_SECONDS
}

pub(crate) const fn default_push_max_per_hour() -> u32 {
    DEFAULT_PUSH_MAX_PER_HOUR
}

pub(crate) const fn default_gdelt_interval_minutes() -> u64 {
    DEFAULT_GDELT_INTERVAL_MINUTES
}

pub(crate) const fn default_gdelt_initial_delay_seconds() -> u64 {
    DEFAULT_GDELT_INITIAL_DELAY_SECONDS
}

pub(crate) fn default_gdelt_feed_url() -> String {
    "http://data.gdeltproject.org/gdeltv2/lastupdate.txt".to_string()
}

pub(crate) const fn default_gdelt_timeout_ms() -> u64 {
    10_000
}

pub(crate) const fn default_gdelt_max_events() -> usize {
    1_000
}

pub(crate) const fn default_retention_ttl_hours() -> f64 {
    DEFAULT_RETENTION_TTL_HOURS
}

pub(crate) const fn default_retention_grace_hours() -> f64 {
    DEFAULT_RETENTION_GRACE_HOURS
}

pub(crate) fn default_qdrant_url() -> String {
    "http://localhost:6334".to_string()
}

pub(crate) fn default_qdrant_collection() -> String {
    "aegi_evidence".to_string()
}

pub(crate) const fn default_qdrant_timeout_ms() -> u64 {
    5_000
}

pub(crate) fn default_neo4j_url() -> String {
    "bolt://localhost:7687".to_string()
}

pub(crate) fn default_neo4j_username() -> String {
    "neo4j".to_string()
}

pub(crate) fn default_neo4j_database() -> String {
    "neo4j".to_string()
}

pub(crate) fn default_store_sqlite_path() -> String {
    "aegi.db".to_string()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    let path = Path::new(trimmed);
    for component in path.components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

fn env_usize(key: &str) -> Option<usize> {
    env::var(key).ok().and_then(|value| value.trim().parse().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    env::var(key).ok().and_then(|value| value.trim().parse().ok())
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|value| value.trim().parse().ok())
}

fn env_f64(key: &str) -> Option<f64> {
    env::var(key).ok().and_then(|value| value.trim().parse().ok())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp config");
        file.write_all(contents.as_bytes()).expect("write temp config");
        file
    }

    #[test]
    fn default_config_validates() {
        assert!(AegiConfig::default().validate().is_ok());
    }

    #[test]
    fn load_applies_defaults_for_missing_sections() {
        let file = write_config("[gdelt]\ninterval_minutes = 30\n");
        let config = AegiConfig::load(Some(file.path())).expect("loads");
        assert_eq!(config.gdelt.interval_minutes, 30);
        assert_eq!(config.orchestrator.max_concurrent_tasks, DEFAULT_MAX_CONCURRENT_TASKS);
    }

    #[test]
    fn load_rejects_oversized_file() {
        let file = write_config(&"#".repeat(MAX_CONFIG_FILE_SIZE + 1));
        let err = AegiConfig::load(Some(file.path())).expect_err("oversized file rejected");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn validate_rejects_zero_concurrent_tasks() {
        let mut config = AegiConfig::default();
        config.orchestrator.max_concurrent_tasks = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_sqlite_backend_without_path() {
        let mut config = AegiConfig::default();
        config.store.backend = StoreBackend::Sqlite;
        config.store.sqlite_path = "   ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn store_backend_parses_case_insensitively() {
        assert_eq!(StoreBackend::parse("SQLite"), Some(StoreBackend::Sqlite));
        assert_eq!(StoreBackend::parse("in-memory"), Some(StoreBackend::InMemory));
        assert_eq!(StoreBackend::parse("postgres"), None);
    }
}
