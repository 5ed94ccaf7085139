//! Config defaults and conversion tests for numport-config.
// crates/numport-config/tests/config_defaults.rs
// =============================================================================
// Module: Config Defaults Tests
// Description: Validate default behavior and runtime conversions.
// Purpose: Ensure an empty config is valid and maps onto engine defaults.
// =============================================================================

use numport_config::AuditSinkKind;
use numport_config::DEFAULT_API_KEY_ENV;
use numport_core::BackoffConfig;
use numport_core::RetryPolicy;
use numport_core::SanitizerConfig;
use numport_core::UploadPolicy;

mod common;

type TestResult = Result<(), String>;

#[test]
fn default_config_validates() -> TestResult {
    let config = common::minimal_config().map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    Ok(())
}

#[test]
fn defaults_match_engine_policies() -> TestResult {
    let config = common::minimal_config().map_err(|err| err.to_string())?;
    if config.recovery.retry_policy() != RetryPolicy::default() {
        return Err("default retry policy should match the engine default".to_string());
    }
    if config.sanitizer.sanitizer_config() != SanitizerConfig::default() {
        return Err("default sanitizer config should match the engine default".to_string());
    }
    if config.uploads.upload_policy() != UploadPolicy::default() {
        return Err("default upload policy should match the engine default".to_string());
    }
    if config.sync.channel_capacity != 64 {
        return Err("default channel capacity should be 64".to_string());
    }
    Ok(())
}

#[test]
fn defaults_select_in_memory_collaborators() -> TestResult {
    let config = common::minimal_config().map_err(|err| err.to_string())?;
    if config.backend.endpoint_url().map_err(|err| err.to_string())?.is_some() {
        return Err("backend endpoint should default to none".to_string());
    }
    if config.verification.endpoint_url().map_err(|err| err.to_string())?.is_some() {
        return Err("verification endpoint should default to none".to_string());
    }
    if config.backend.api_key_env != DEFAULT_API_KEY_ENV {
        return Err("api key env should default to NUMPORT_API_KEY".to_string());
    }
    if config.audit.sink != AuditSinkKind::None {
        return Err("audit sink should default to none".to_string());
    }
    Ok(())
}

#[test]
fn sections_convert_to_runtime_types() -> TestResult {
    let config = common::config_from_toml(
        r#"
[recovery]
max_attempts = 5

[recovery.backoff]
kind = "linear"
initial_ms = 100
step_ms = 50
max_ms = 400

[sanitizer]
max_input_length = 128
audit_clean_inputs = true

[sanitizer.rate_limit]
max_requests = 10
window_ms = 1000

[uploads]
max_file_bytes = 2048
allowed_extensions = ["pdf"]
require_identity_document = true
"#,
    )
    .map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;

    let policy = config.recovery.retry_policy();
    let expected_backoff = BackoffConfig::Linear {
        initial_ms: 100,
        step_ms: 50,
        max_ms: 400,
    };
    if policy.max_attempts != 5 || policy.backoff != expected_backoff {
        return Err(format!("unexpected retry policy {policy:?}"));
    }

    let sanitizer = config.sanitizer.sanitizer_config();
    if sanitizer.max_input_length != 128 || !sanitizer.audit_clean_inputs {
        return Err(format!("unexpected sanitizer config {sanitizer:?}"));
    }
    if sanitizer.rate_limit.max_requests != 10 || sanitizer.rate_limit.window_ms != 1000 {
        return Err(format!("unexpected rate limit {:?}", sanitizer.rate_limit));
    }

    let uploads = config.uploads.upload_policy();
    if uploads.max_file_bytes != 2048
        || uploads.allowed_extensions != vec!["pdf".to_string()]
        || !uploads.require_identity_document
    {
        return Err(format!("unexpected upload policy {uploads:?}"));
    }
    Ok(())
}

#[test]
fn backend_timeout_converts_to_duration() -> TestResult {
    let config = common::config_from_toml(
        r#"
[backend]
endpoint = "https://api.example.test/v1"
timeout_ms = 2500
"#,
    )
    .map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    if config.backend.timeout().as_millis() != 2500 {
        return Err("backend timeout should be 2500ms".to_string());
    }
    let url = config.backend.endpoint_url().map_err(|err| err.to_string())?;
    if url.as_ref().map(url::Url::as_str) != Some("https://api.example.test/v1") {
        return Err(format!("unexpected backend url {url:?}"));
    }
    Ok(())
}

#[test]
fn missing_api_key_variable_yields_none() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.backend.api_key_env = "NUMPORT_TEST_UNSET_API_KEY_VARIABLE".to_string();
    if config.backend.api_key().is_some() {
        return Err("unset api key variable should yield none".to_string());
    }
    Ok(())
}
