// aegi-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A canonical example `aegi.toml`, kept in sync with the schema.

/// Returns a canonical example `aegi.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[orchestrator]
max_concurrent_tasks = 4
task_timeout_seconds = 120
shutdown_timeout_seconds = 30

[push]
max_per_hour = 60

[gdelt]
interval_minutes = 15
initial_delay_seconds = 60
feed_url = "http://data.gdeltproject.org/gdeltv2/lastupdate.txt"
# events_feed_url = "http://data.gdeltproject.org/gdeltv2/lastupdate-events.txt"
timeout_ms = 10000
max_events = 1000

[retention]
time_to_live_hours = 2160.0
grace_period_hours = 168.0

[qdrant]
url = "http://localhost:6334"
collection = "aegi_evidence"
timeout_ms = 5000

[neo4j]
url = "bolt://localhost:7687"
username = "neo4j"
# password = "changeme"
database = "neo4j"

[store]
backend = "in_memory"
# sqlite_path = "aegi.db"
"#,
    )
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_toml_parses_into_default_compatible_config() {
        let config: crate::config::AegiConfig =
            toml::from_str(&config_toml_example()).expect("example parses");
        assert!(config.validate().is_ok());
    }
}
