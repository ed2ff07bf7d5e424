//! CLI integration tests
//!
//! Tests for the command-line interface using assert_cmd.
//!
//! These tests verify:
//! - Help and version flags
//! - Configuration validation
//! - Dry run mode
//! - Processing metrics from stdin and files

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

/// Get a command for the strings-processor binary
#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin("strings-processor").expect("Failed to find strings-processor binary")
}

/// Helper to create a temporary config file with given content
fn create_temp_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file.flush().expect("Failed to flush");
    file
}

const HTTP_CONFIG: &str = r#"
strings:
  lowercase:
    - tag: method
  uppercase:
    - measurement: "*"
  trim_prefix:
    - field_key: "*"
      prefix: "resp_"
  replace:
    - tag: path
      old: "/"
      new: "_"
"#;

/// Test --help flag displays usage information
#[test]
fn test_help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:").or(predicate::str::contains("usage:")))
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--dry-run"));
}

/// Test --version flag displays version
#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

/// Test that a valid configuration is accepted via --validate flag
#[test]
fn test_validate_valid_config() {
    let file = create_temp_config(HTTP_CONFIG);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid (4 rules)"));
}

/// Test that malformed YAML is rejected
#[test]
fn test_validate_invalid_config_bad_yaml() {
    let file = create_temp_config("strings:\n  lowercase: [not valid yaml\n");

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("parse"));
}

/// Test that a misspelled converter kind is rejected
#[test]
fn test_unknown_converter_kind() {
    let file = create_temp_config("strings:\n  lowercas:\n    - tag: method\n");

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .failure();
}

/// Test that a converter without any selector is rejected
#[test]
fn test_converter_without_selector() {
    let file = create_temp_config("strings:\n  trim:\n    - cutset: \"x\"\n");

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no selector"));
}

/// Test that a zero batch size is rejected even when set from the CLI
#[test]
fn test_zero_batch_size() {
    let file = create_temp_config(HTTP_CONFIG);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--batch-size")
        .arg("0")
        .arg("--validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"))
        .stderr(predicate::str::contains("batch_size"));
}

/// Test that a missing config file falls back to a pass-through processor
#[test]
fn test_missing_config_passes_through() {
    cmd()
        .arg("-c")
        .arg("/nonexistent/path/strings.yaml")
        .write_stdin("cpu,host=A usage=1i\n")
        .assert()
        .success()
        .stdout("cpu,host=A usage=1i\n");
}

/// Test transforming line protocol from stdin to stdout
#[test]
fn test_process_stdin() {
    let file = create_temp_config(HTTP_CONFIG);

    cmd()
        .arg("-c")
        .arg(file.path())
        .write_stdin("http,method=GET,path=/api/v1 resp_code=200i,resp_size=512i 1700000000\n")
        .assert()
        .success()
        .stdout("HTTP,method=get,path=_api_v1 code=200i,size=512i 1700000000\n");
}

/// Test that logs never end up on stdout
#[test]
fn test_logs_go_to_stderr() {
    let file = create_temp_config(HTTP_CONFIG);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--log-level")
        .arg("debug")
        .write_stdin("http,method=GET v=1i\n")
        .assert()
        .success()
        .stdout("HTTP,method=get v=1i\n")
        .stderr(predicate::str::contains("Starting strings-processor"));
}

/// Test JSON output format override
#[test]
fn test_json_output() {
    let file = create_temp_config(HTTP_CONFIG);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--output-format")
        .arg("json")
        .write_stdin("http,method=POST resp_code=201i\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""name":"HTTP""#))
        .stdout(predicate::str::contains(r#""method":"post""#))
        .stdout(predicate::str::contains(r#""code":201"#));
}

/// Test that undecodable lines are skipped without failing the run
#[test]
fn test_skips_undecodable_lines() {
    let file = create_temp_config(HTTP_CONFIG);

    cmd()
        .arg("-c")
        .arg(file.path())
        .write_stdin("http,method=GET v=1i\nthis is not a metric\nhttp,method=PUT v=2i\n")
        .assert()
        .success()
        .stdout("HTTP,method=get v=1i\nHTTP,method=put v=2i\n")
        .stderr(predicate::str::contains("Skipping undecodable input line"));
}

/// Test reading from and writing to files
#[test]
fn test_input_and_output_files() {
    let file = create_temp_config(HTTP_CONFIG);
    let input = create_temp_config("http,method=DELETE v=1i\n");
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("out.lp");

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("-i")
        .arg(input.path())
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout("");

    let written = std::fs::read_to_string(&output).expect("Failed to read output");
    assert_eq!(written, "HTTP,method=delete v=1i\n");
}

/// Test that a missing input file is reported
#[test]
fn test_missing_input_file() {
    let file = create_temp_config(HTTP_CONFIG);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("-i")
        .arg("/nonexistent/metrics.lp")
        .assert()
        .failure()
        .stderr(predicate::str::contains("/nonexistent/metrics.lp"));
}

/// Test dry run text output lists rules in catalog order
#[test]
fn test_dry_run_text() {
    let file = create_temp_config(HTTP_CONFIG);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Compiled 4 rules:"))
        .stdout(predicate::str::contains("[0] lowercase tag=method"))
        .stdout(predicate::str::contains("[1] uppercase measurement=*"))
        .stdout(predicate::str::contains("[2] trim_prefix field_key=*"))
        .stdout(predicate::str::contains("[3] replace tag=path"));
}

/// Test dry run JSON output
#[test]
fn test_dry_run_json() {
    let file = create_temp_config(HTTP_CONFIG);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--dry-run")
        .arg("--report-format")
        .arg("json")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""kind": "trim_prefix""#))
        .stdout(predicate::str::contains(r#""prefix": "resp_""#));
}

/// Test dry run YAML output
#[test]
fn test_dry_run_yaml() {
    let file = create_temp_config(HTTP_CONFIG);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--dry-run")
        .arg("--report-format")
        .arg("yaml")
        .assert()
        .success()
        .stdout(predicate::str::contains("kind: replace"));
}

/// Test environment variable override for the config path
#[test]
fn test_env_config_override() {
    let file = create_temp_config(HTTP_CONFIG);

    cmd()
        .env("STRINGS_CONFIG", file.path())
        .arg("--validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}
