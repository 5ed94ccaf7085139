// crates/numport-cli/tests/submission.rs
// ============================================================================
// Module: CLI Submission Tests
// Description: Library-level tests for file-driven submission.
// Purpose: Ensure submission files are bounded, parsed, and replayed faithfully.
// Dependencies: numport-cli, numport-config, numport-core, tempfile, tokio
// ============================================================================

//! ## Overview
//! Drives the submission helpers against the in-memory backend selected by a
//! default configuration.

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
use std::sync::Arc;

use numport_cli::CliError;
use numport_cli::logging::env_filter;
use numport_cli::services::build_services;
use numport_cli::services::open_ledger;
use numport_cli::submission::MAX_SUBMISSION_BYTES;
use numport_cli::submission::SubmissionInput;
use numport_cli::submission::load_submission;
use numport_cli::submission::submit_application;
use numport_config::NumportConfig;
use numport_core::FieldName;
use numport_core::PortingServices;
use numport_core::PortingStatus;
use numport_core::SubmitError;
use numport_core::SyncChannel;
use numport_core::SystemClock;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const JOHN_DOE: &str = r#"{
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

async fn in_memory(input: &SubmissionInput) -> (Arc<PortingServices>, SyncChannel) {
    in_memory_with(&NumportConfig::default(), input).await
}

async fn in_memory_with(
    config: &NumportConfig,
    input: &SubmissionInput,
) -> (Arc<PortingServices>, SyncChannel) {
    let services = Arc::new(build_services(config, Arc::new(SystemClock)).unwrap());
    let sync = open_ledger(config, &services, &input.owner()).await.unwrap();
    (services, sync)
}

fn with_fields(edit: impl FnOnce(&mut serde_json::Value)) -> SubmissionInput {
    let mut value: serde_json::Value = serde_json::from_str(JOHN_DOE).unwrap();
    edit(&mut value);
    SubmissionInput::from_json(value.to_string().as_bytes()).unwrap()
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

#[test]
fn submission_file_parses() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("john.json");
    fs::write(&path, JOHN_DOE).unwrap();

    let input = load_submission(&path).unwrap();
    assert_eq!(input.owner().as_str(), "user-1");
    assert_eq!(input.fields.len(), 8);
    assert!(input.consents.mandatory_granted());
    assert_eq!(input.documents.len(), 1);
    assert_eq!(input.documents[0].file.name, "id.pdf");
}

/// Verifies submission files are size-checked before parsing.
#[test]
fn oversized_submission_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.json");
    let limit = usize::try_from(MAX_SUBMISSION_BYTES).unwrap();
    fs::write(&path, " ".repeat(limit + 1)).unwrap();

    let err = load_submission(&path).unwrap_err();
    assert!(matches!(err, CliError::Input(ref message) if message.contains("byte limit")));
}

#[test]
fn missing_owner_is_rejected() {
    let err = SubmissionInput::from_json(br#"{"userId": "  "}"#).unwrap_err();
    assert!(matches!(err, CliError::Input(ref message) if message.contains("userId")));
}

#[test]
fn unknown_top_level_keys_are_rejected() {
    let err = SubmissionInput::from_json(br#"{"userId": "u", "bypass": true}"#).unwrap_err();
    assert!(matches!(err, CliError::Input(_)));
}

// ============================================================================
// SECTION: Submission
// ============================================================================

#[tokio::test]
async fn complete_submission_is_persisted() {
    let input = SubmissionInput::from_json(JOHN_DOE.as_bytes()).unwrap();
    let (services, sync) = in_memory(&input).await;

    let report = submit_application(&input, services, &sync).await.unwrap();
    assert_eq!(report.request.status(), PortingStatus::Submitted);
    assert_eq!(report.request.id().map(|id| id.as_str()), Some("req-1"));
    assert!(report.compatibility.unwrap().compatible);
    assert_eq!(report.documents.len(), 1);
    assert_eq!(sync.requests().unwrap().len(), 1);
}

/// Verifies a number with an open request cannot be submitted again.
#[tokio::test]
async fn second_submission_for_same_number_is_refused() {
    let input = SubmissionInput::from_json(JOHN_DOE.as_bytes()).unwrap();
    let (services, sync) = in_memory(&input).await;

    submit_application(&input, Arc::clone(&services), &sync).await.unwrap();
    let err = submit_application(&input, services, &sync).await.unwrap_err();
    assert!(matches!(err, CliError::Submit(SubmitError::DuplicateOpenRequest { .. })));
}

#[tokio::test]
async fn unknown_field_is_reported() {
    let input = with_fields(|value| {
        value["fields"]["favouriteColour"] = "blue".into();
    });
    let (services, sync) = in_memory(&input).await;

    let err = submit_application(&input, services, &sync).await.unwrap_err();
    assert!(matches!(err, CliError::UnknownField(ref name) if name == "favouriteColour"));
}

/// Verifies sanitizer denials stop the replay before submit.
#[tokio::test]
async fn hostile_field_is_denied() {
    let input = with_fields(|value| {
        value["fields"]["fullName"] = "<script>alert(1)</script>".into();
    });
    let (services, sync) = in_memory(&input).await;

    let err = submit_application(&input, services, &sync).await.unwrap_err();
    assert!(matches!(err, CliError::Denied(FieldName::FullName)));
}

#[tokio::test]
async fn invalid_fields_are_collected() {
    let input = with_fields(|value| {
        value["fields"]["idNumber"] = "8001015009088".into();
    });
    let (services, sync) = in_memory(&input).await;

    let err = submit_application(&input, services, &sync).await.unwrap_err();
    let CliError::Submit(SubmitError::Invalid(errors)) = err else {
        panic!("expected invalid fields, got {err:?}");
    };
    assert!(errors.contains_key(&FieldName::IdNumber));
}

#[tokio::test]
async fn submission_without_documents_is_accepted_by_default() {
    let input = with_fields(|value| {
        value["documents"] = serde_json::json!([]);
    });
    let (services, sync) = in_memory(&input).await;

    let report = submit_application(&input, services, &sync).await.unwrap();
    assert_eq!(report.request.status(), PortingStatus::Submitted);
    assert!(report.documents.is_empty());
}

/// Verifies `[uploads] require_identity_document` gates submission.
#[tokio::test]
async fn missing_identity_document_is_refused_when_required() {
    let input = with_fields(|value| {
        value["documents"] = serde_json::json!([]);
    });
    let mut config = NumportConfig::default();
    config.uploads.require_identity_document = true;
    let (services, sync) = in_memory_with(&config, &input).await;

    let err = submit_application(&input, services, &sync).await.unwrap_err();
    assert!(matches!(err, CliError::Submit(SubmitError::IdentityDocumentMissing)));
}

#[tokio::test]
async fn unsafe_upload_is_rejected() {
    let input = with_fields(|value| {
        value["documents"][0]["name"] = "../../etc/passwd.pdf".into();
    });
    let (services, sync) = in_memory(&input).await;

    let err = submit_application(&input, services, &sync).await.unwrap_err();
    assert!(matches!(err, CliError::Document(_)));
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Verifies `NUMPORT_LOG` wins over `RUST_LOG`.
#[test]
fn log_filter_prefers_numport_log() {
    assert_eq!(env_filter(Some("debug"), Some("warn")).to_string(), "debug");
}

#[test]
fn log_filter_falls_back_to_rust_log() {
    assert_eq!(env_filter(Some("  "), Some("warn")).to_string(), "warn");
}

#[test]
fn log_filter_defaults_to_info() {
    assert_eq!(env_filter(None, None).to_string(), "info");
}
