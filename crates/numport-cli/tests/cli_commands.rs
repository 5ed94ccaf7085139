// crates/numport-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: End-to-end tests for the numport binary.
// Purpose: Ensure commands print verdicts and exit codes scripts can rely on.
// Dependencies: numport-cli binary, tempfile
// ============================================================================

//! ## Overview
//! Runs the compiled binary in an isolated working directory so no ambient
//! `numport.toml` or `NUMPORT_CONFIG` leaks into the run.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const SUBMISSION: &str = r#"{
    "userId": "user-1",
    "fields": {
        "phoneNumber": "0821234567",
        "currentNetwork": "MTN",
        "targetNetwork": "Vodacom",
        "fullName": "John Doe",
        "idNumber": "8001015009087",
        "dateOfBirth": "1980-01-01",
        "contactEmail": "john.doe@example.com",
        "contactMobile": "0821234567"
    },
    "consents": {"ownership": true, "dataProcessing": true, "marketing": false},
    "signature": "John Doe",
    "documents": [
        {"kind": "id_document", "name": "id.pdf", "sizeBytes": 2048, "contentType": "application/pdf"}
    ]
}"#;

fn numport_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_numport"))
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(numport_bin())
        .args(args)
        .current_dir(dir)
        .env_remove("NUMPORT_CONFIG")
        .env("NUMPORT_LOG", "error")
        .output()
        .expect("run numport")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write_file(dir: &TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write file");
    path.display().to_string()
}

// ============================================================================
// SECTION: Validate
// ============================================================================

/// Verifies a checksummed identity number validates cleanly.
#[test]
fn validate_accepts_checksummed_id_number() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["validate", "--field", "idNumber", "--value", "8001015009087"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("\"isValid\": true"));
}

/// Verifies a checksum failure prints the verdict and exits non-zero.
#[test]
fn validate_rejects_bad_checksum() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["validate", "--field", "idNumber", "--value", "8001015009088"]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("\"isValid\": false"));
}

/// Verifies unknown field labels are reported on stderr.
#[test]
fn validate_rejects_unknown_field() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["validate", "--field", "shoeSize", "--value", "9"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("shoeSize"));
}

// ============================================================================
// SECTION: Compat
// ============================================================================

/// Verifies unsupported network pairs are reported as incompatible.
#[test]
fn compat_reports_unsupported_pair() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["compat", "--from", "MakroCall", "--to", "Vodacom"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("\"compatible\": false"));
}

/// Verifies a lone `--from` is rejected.
#[test]
fn compat_requires_both_networks() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["compat", "--from", "MTN"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("--from and --to"));
}

// ============================================================================
// SECTION: Upload Check
// ============================================================================

#[test]
fn upload_check_accepts_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(
        dir.path(),
        &[
            "upload-check",
            "--name",
            "id.pdf",
            "--size",
            "2048",
            "--content-type",
            "application/pdf",
        ],
    );
    assert!(output.status.success(), "stdout: {}", stdout(&output));
}

/// Verifies traversal in upload names fails the check.
#[test]
fn upload_check_rejects_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["upload-check", "--name", "../etc/passwd.pdf", "--size", "10"]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("\"isValid\": false"));
}

// ============================================================================
// SECTION: Config
// ============================================================================

#[test]
fn config_validate_accepts_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "numport.toml", "[recovery]\nmax_attempts = 3\n");
    let output = run(dir.path(), &["config", "validate", "--config", &path]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("config valid"));
}

/// Verifies out-of-range recovery limits fail validation.
#[test]
fn config_validate_rejects_invalid_limits() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "numport.toml", "[recovery]\nmax_attempts = 0\n");
    let output = run(dir.path(), &["config", "validate", "--config", &path]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("recovery.max_attempts must be between 1 and 10"));
}

// ============================================================================
// SECTION: Submit
// ============================================================================

/// Verifies a complete application is persisted against the in-memory backend.
#[test]
fn submit_persists_complete_application() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(&dir, "john.json", SUBMISSION);
    let output = run(dir.path(), &["submit", "--input", &input]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let printed = stdout(&output);
    assert!(printed.contains("\"status\": \"submitted\""));
    assert!(printed.contains("req-1"));
}

#[test]
fn submit_without_consents_fails() {
    let dir = tempfile::tempdir().unwrap();
    let body = SUBMISSION.replace(
        r#""consents": {"ownership": true, "dataProcessing": true, "marketing": false},"#,
        r#""consents": {"ownership": false, "dataProcessing": false, "marketing": false},"#,
    );
    let input = write_file(&dir, "john.json", &body);
    let output = run(dir.path(), &["submit", "--input", &input]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("consents are required"));
}

/// Verifies field errors are printed as JSON keyed by wire label.
#[test]
fn submit_reports_invalid_fields() {
    let dir = tempfile::tempdir().unwrap();
    let body = SUBMISSION.replace("john.doe@example.com", "not-an-email");
    let input = write_file(&dir, "john.json", &body);
    let output = run(dir.path(), &["submit", "--input", &input]);
    assert!(!output.status.success());
    let printed = stdout(&output);
    assert!(printed.contains("\"error\": \"invalid_fields\""));
    assert!(printed.contains("\"contactEmail\""));
}
