// crates/aegi-cli/tests/run_command.rs
// ============================================================================
// Module: CLI Run/Config Command Tests
// Description: Integration tests invoking the compiled `aegi` binary.
// Purpose: Exercise the pipeline smoke-test command and the config
//          inspection commands end-to-end.
// Dependencies: aegi-cli binary
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::io::Write as _;
use std::process::Command;

fn aegi_bin() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_BIN_EXE_aegi"))
}

#[test]
fn run_ingests_a_document_and_prints_a_summary() {
    let mut doc = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(doc, "Forces near the border conducted a joint exercise on Tuesday.").expect("write doc");

    let output = Command::new(aegi_bin())
        .arg("run")
        .arg("--case")
        .arg("smoke-test")
        .arg("--document")
        .arg(doc.path())
        .output()
        .expect("spawn aegi run");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("smoke-test"), "stdout: {stdout}");
    assert!(stdout.contains("report:"), "stdout: {stdout}");
}

#[test]
fn run_rejects_http_llm_without_endpoint() {
    let output =
        Command::new(aegi_bin()).arg("run").arg("--llm").arg("http").output().expect("spawn aegi run");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("llm-endpoint"), "stderr: {stderr}");
}

#[test]
fn config_example_round_trips_through_validate() {
    let example = Command::new(aegi_bin()).arg("config").arg("example").output().expect("spawn aegi config example");
    assert!(example.status.success());

    let mut path = tempfile::NamedTempFile::new().expect("temp file");
    path.write_all(&example.stdout).expect("write example config");

    let validate = Command::new(aegi_bin())
        .arg("config")
        .arg("validate")
        .arg("--config")
        .arg(path.path())
        .output()
        .expect("spawn aegi config validate");
    assert!(validate.status.success(), "stderr: {}", String::from_utf8_lossy(&validate.stderr));
}

#[test]
fn config_schema_prints_valid_json() {
    let output = Command::new(aegi_bin()).arg("config").arg("schema").output().expect("spawn aegi config schema");
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).expect("schema is valid json");
    assert!(parsed.get("properties").is_some());
}
