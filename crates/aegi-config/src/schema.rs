// aegi-config/src/schema.rs
// ============================================================================
// Module: Config Schema
// Description: JSON schema builder for aegi.toml.
// Purpose: Provide canonical validation schema for config artifacts.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! This module defines the JSON Schema for AEGI Core configuration. The
//! schema is generated from the canonical config model and is used by the
//! docs generator and external tooling.

use serde_json::Value;
use serde_json::json;

use crate::config::default_gdelt_feed_url;
use crate::config::default_gdelt_initial_delay_seconds;
use crate::config::default_gdelt_interval_minutes;
use crate::config::default_gdelt_max_events;
use crate::config::default_gdelt_timeout_ms;
use crate::config::default_max_concurrent_tasks;
use crate::config::default_neo4j_database;
use crate::config::default_neo4j_url;
use crate::config::default_neo4j_username;
use crate::config::default_push_max_per_hour;
use crate::config::default_qdrant_collection;
use crate::config::default_qdrant_timeout_ms;
use crate::config::default_qdrant_url;
use crate::config::default_retention_grace_hours;
use crate::config::default_retention_ttl_hours;
use crate::config::default_shutdown_timeout_seconds;
use crate::config::default_store_sqlite_path;
use crate::config::default_task_timeout_seconds;

/// Returns the JSON schema for `aegi.toml`.
#[must_use]
pub fn config_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "aegi://contract/schemas/config.schema.json",
        "title": "AEGI Core Configuration",
        "description": "Configuration for the AEGI Core orchestrator, GDELT monitor, and stores.",
        "type": "object",
        "properties": {
            "orchestrator": orchestrator_config_schema(),
            "push": push_config_schema(),
            "gdelt": gdelt_config_schema(),
            "retention": retention_config_schema(),
            "qdrant": qdrant_config_schema(),
            "neo4j": neo4j_config_schema(),
            "store": store_config_schema(),
        },
        "additionalProperties": false
    })
}

fn orchestrator_config_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "max_concurrent_tasks": {
                "type": "integer",
                "minimum": 1,
                "default": default_max_concurrent_tasks(),
                "description": "Maximum number of case pipelines run concurrently."
            },
            "task_timeout_seconds": {
                "type": "integer",
                "minimum": 1,
                "maximum": 3600,
                "default": default_task_timeout_seconds(),
                "description": "Per-stage timeout before a stage is recorded as failed."
            },
            "shutdown_timeout_seconds": {
                "type": "integer",
                "minimum": 0,
                "default": default_shutdown_timeout_seconds(),
                "description": "Time budget allowed for in-flight runs to finish during shutdown."
            }
        },
        "additionalProperties": false
    })
}

fn push_config_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "max_per_hour": {
                "type": "integer",
                "minimum": 1,
                "default": default_push_max_per_hour(),
                "description": "Maximum pushes delivered per subscriber per rolling hour."
            }
        },
        "additionalProperties": false
    })
}

fn gdelt_config_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "interval_minutes": {
                "type": "integer",
                "minimum": 1,
                "default": default_gdelt_interval_minutes(),
                "description": "Minutes between scheduled GDELT polls."
            },
            "initial_delay_seconds": {
                "type": "integer",
                "minimum": 0,
                "default": default_gdelt_initial_delay_seconds(),
                "description": "Seconds to wait before the first poll after startup."
            },
            "feed_url": {
                "type": "string",
                "default": default_gdelt_feed_url(),
                "description": "URL of the GDELT scoring export feed."
            },
            "events_feed_url": {
                "oneOf": [
                    { "type": "null" },
                    { "type": "string" }
                ],
                "default": null,
                "description": "Optional URL of the GDELT raw events feed."
            },
            "timeout_ms": {
                "type": "integer",
                "minimum": 1,
                "default": default_gdelt_timeout_ms(),
                "description": "Per-request timeout in milliseconds."
            },
            "max_events": {
                "type": "integer",
                "minimum": 1,
                "default": default_gdelt_max_events(),
                "description": "Maximum events accepted from a single poll."
            }
        },
        "additionalProperties": false
    })
}

fn retention_config_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "time_to_live_hours": {
                "type": "number",
                "exclusiveMinimum": 0,
                "default": default_retention_ttl_hours(),
                "description": "Age at which an unpinned evidence row becomes eligible for expiry."
            },
            "grace_period_hours": {
                "type": "number",
                "minimum": 0,
                "default": default_retention_grace_hours(),
                "description": "Time after expiry before an evidence row becomes a hard-delete candidate."
            }
        },
        "additionalProperties": false
    })
}

fn qdrant_config_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "url": {
                "type": "string",
                "default": default_qdrant_url(),
                "description": "Base URL of the Qdrant HTTP API."
            },
            "collection": {
                "type": "string",
                "default": default_qdrant_collection(),
                "description": "Collection name holding claim/chunk embeddings."
            },
            "timeout_ms": {
                "type": "integer",
                "minimum": 1,
                "default": default_qdrant_timeout_ms(),
                "description": "Per-request timeout in milliseconds."
            }
        },
        "additionalProperties": false
    })
}

fn neo4j_config_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "url": {
                "type": "string",
                "default": default_neo4j_url(),
                "description": "Bolt URL of the Neo4j instance."
            },
            "username": {
                "type": "string",
                "default": default_neo4j_username(),
                "description": "Username used to authenticate."
            },
            "password": {
                "type": "string",
                "default": "",
                "description": "Password used to authenticate."
            },
            "database": {
                "type": "string",
                "default": default_neo4j_database(),
                "description": "Database name within the instance."
            }
        },
        "additionalProperties": false
    })
}

fn store_config_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "backend": {
                "type": "string",
                "enum": ["in_memory", "sqlite"],
                "default": "in_memory",
                "description": "Evidence/graph/vector store backend selection."
            },
            "sqlite_path": {
                "type": "string",
                "default": default_store_sqlite_path(),
                "description": "Path to the SQLite database file, used when backend = \"sqlite\"."
            }
        },
        "additionalProperties": false
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_declares_every_top_level_section() {
        let schema = config_schema();
        let props = schema.get("properties").and_then(Value::as_object).expect("properties object");
        for section in ["orchestrator", "push", "gdelt", "retention", "qdrant", "neo4j", "store"] {
            assert!(props.contains_key(section), "missing section: {section}");
        }
    }

    #[test]
    fn orchestrator_schema_rejects_additional_properties() {
        let schema = orchestrator_config_schema();
        assert_eq!(schema.get("additionalProperties"), Some(&Value::Bool(false)));
    }
}
