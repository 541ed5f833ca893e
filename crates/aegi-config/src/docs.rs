// aegi-config/src/docs.rs
// ============================================================================
// Module: Config Docs Generator
// Description: Markdown generator for aegi.toml documentation.
// Purpose: Keep config docs in sync with the schema.
// Dependencies: serde_json, std
// ============================================================================

//! ## Overview
//! Generates `Docs/configuration/aegi.toml.md` from the canonical
//! configuration schema. This output is deterministic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::schema::config_schema;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default output path for generated configuration docs.
const DOCS_PATH: &str = "Docs/configuration/aegi.toml.md";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when generating or verifying config docs.
#[derive(Debug, Error)]
pub enum DocsError {
    /// IO failure while writing docs.
    #[error("docs io error: {0}")]
    Io(String),
    /// Schema traversal or rendering error.
    #[error("docs schema error: {0}")]
    Schema(String),
    /// Generated docs do not match the committed file.
    #[error("docs drift: {0}")]
    Drift(String),
}

// ============================================================================
// SECTION: Public API
// ============================================================================

/// Generates the configuration markdown documentation.
///
/// # Errors
///
/// Returns [`DocsError`] when schema traversal fails.
pub fn config_docs_markdown() -> Result<String, DocsError> {
    let schema = config_schema();
    let mut out = String::new();

    out.push_str("<!--\n");
    out.push_str("Docs/configuration/aegi.toml.md\n");
    out.push_str("============================================================================\n");
    out.push_str("Document: AEGI Core Configuration\n");
    out.push_str("Description: Reference for aegi.toml configuration fields.\n");
    out.push_str("Purpose: Document orchestrator, GDELT, retention, and store settings.\n");
    out.push_str("Generated: This file is auto-generated; do not edit manually.\n");
    out.push_str("============================================================================\n");
    out.push_str("-->\n\n");

    out.push_str("# aegi.toml Configuration\n\n");
    out.push_str("## Overview\n\n");
    out.push_str(
        "`aegi.toml` configures the pipeline orchestrator, push throttling, the GDELT\n\
         monitor, evidence retention, and the vector/graph store backends. Every field\n\
         has a default; unset sections fall back to it. Any field can also be set\n\
         through an `AEGI_<SECTION>__<KEY>` environment variable, which takes\n\
         precedence over the file.\n\n",
    );

    out.push_str("## Top-Level Sections\n\n");

    for section in build_sections() {
        out.push_str("### ");
        out.push_str(section.heading);
        out.push_str("\n\n");
        out.push_str(section.description);
        out.push_str("\n\n");
        let table = render_table(&schema, section.key).map_err(DocsError::Schema)?;
        out.push_str(&table);
        out.push('\n');
    }

    Ok(out)
}

/// Writes the generated docs to the standard location.
///
/// # Errors
///
/// Returns [`DocsError`] when file output fails.
pub fn write_config_docs(path: Option<&Path>) -> Result<(), DocsError> {
    let path = path.unwrap_or_else(|| Path::new(DOCS_PATH));
    let content = config_docs_markdown()?;
    fs::write(path, content.as_bytes()).map_err(|err| DocsError::Io(err.to_string()))
}

/// Verifies the on-disk docs match the generated output.
///
/// # Errors
///
/// Returns [`DocsError`] when the docs drift.
pub fn verify_config_docs(path: Option<&Path>) -> Result<(), DocsError> {
    let path = path.unwrap_or_else(|| Path::new(DOCS_PATH));
    let content = config_docs_markdown()?;
    let existing = fs::read_to_string(path).map_err(|err| DocsError::Io(err.to_string()))?;
    if existing != content {
        return Err(DocsError::Drift(format!("docs mismatch: {}", path.display())));
    }
    Ok(())
}

// ============================================================================
// SECTION: Section Registry
// ============================================================================

/// Specification for one rendered documentation section.
struct SectionSpec {
    /// Section heading, including the TOML table name.
    heading: &'static str,
    /// Section description displayed beneath the heading.
    description: &'static str,
    /// Top-level schema property key for this section.
    key: &'static str,
}

/// Builds the ordered list of configuration sections to render.
fn build_sections() -> Vec<SectionSpec> {
    vec![
        SectionSpec {
            heading: "[orchestrator]",
            description: "Pipeline concurrency, per-stage timeout, and shutdown budget.",
            key: "orchestrator",
        },
        SectionSpec {
            heading: "[push]",
            description: "Push notification delivery throttling.",
            key: "push",
        },
        SectionSpec {
            heading: "[gdelt]",
            description: "GDELT poll schedule, feed URLs, and per-request limits.",
            key: "gdelt",
        },
        SectionSpec {
            heading: "[retention]",
            description: "Evidence time-to-live and hard-delete grace period.",
            key: "retention",
        },
        SectionSpec {
            heading: "[qdrant]",
            description: "Vector store connection used for claim/chunk embeddings.",
            key: "qdrant",
        },
        SectionSpec {
            heading: "[neo4j]",
            description: "Graph store connection used for entities and relation facts.",
            key: "neo4j",
        },
        SectionSpec {
            heading: "[store]",
            description: "Backend selection for EvidenceStore/GraphStore/VectorStore.",
            key: "store",
        },
    ]
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders one section's properties as a markdown table.
fn render_table(schema: &Value, key: &str) -> Result<String, String> {
    let section_schema = schema
        .get("properties")
        .and_then(|value| value.as_object())
        .and_then(|props| props.get(key))
        .ok_or_else(|| format!("section not found in schema: {key}"))?;
    let props = section_schema
        .get("properties")
        .and_then(|value| value.as_object())
        .ok_or_else(|| format!("properties missing for section: {key}"))?;

    let mut fields: BTreeSet<&str> = BTreeSet::new();
    for field in props.keys() {
        fields.insert(field.as_str());
    }

    let mut table = String::new();
    table.push_str("| Field | Type | Default | Description |\n");
    table.push_str("| --- | --- | --- | --- |\n");

    for field in fields {
        let field_schema = props.get(field).ok_or_else(|| format!("missing field schema: {field}"))?;
        let field_type = format_schema_type(field_schema);
        let default_value = field_schema
            .get("default")
            .map(format_default_value)
            .unwrap_or_else(|| "-".to_string());
        let description = field_schema
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        table.push_str(&format!("| `{field}` | {field_type} | {default_value} | {description} |\n"));
    }

    Ok(table)
}

/// Formats a schema node's declared type for a markdown table cell.
fn format_schema_type(schema: &Value) -> String {
    if let Some(one_of) = schema.get("oneOf").and_then(Value::as_array) {
        let types: Vec<String> = one_of.iter().map(format_schema_type).collect();
        return types.join(" \\| ");
    }
    if let Some(values) = schema.get("enum").and_then(Value::as_array) {
        let variants: Vec<String> =
            values.iter().filter_map(|value| value.as_str()).map(|value| format!("`{value}`")).collect();
        return variants.join(" \\| ");
    }
    schema.get("type").and_then(Value::as_str).unwrap_or("any").to_string()
}

/// Formats a schema node's declared default for a markdown table cell.
fn format_default_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(val) => val.to_string(),
        Value::Number(val) => val.to_string(),
        Value::String(val) if val.is_empty() => "`\"\"`".to_string(),
        Value::String(val) => format!("`{val}`"),
        Value::Array(_) | Value::Object(_) => "-".to_string(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_docs_markdown_renders_every_section() {
        let markdown = config_docs_markdown().expect("renders");
        for heading in ["[orchestrator]", "[push]", "[gdelt]", "[retention]", "[qdrant]", "[neo4j]", "[store]"] {
            assert!(markdown.contains(heading), "missing heading: {heading}");
        }
    }

    #[test]
    fn config_docs_markdown_is_deterministic() {
        assert_eq!(config_docs_markdown().expect("renders"), config_docs_markdown().expect("renders"));
    }

    #[test]
    fn render_table_rejects_unknown_section() {
        let schema = config_schema();
        assert!(render_table(&schema, "does_not_exist").is_err());
    }
}
