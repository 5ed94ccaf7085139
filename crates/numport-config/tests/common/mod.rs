// crates/numport-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for numport-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::path::PathBuf;

use numport_config::ConfigError;
use numport_config::NumportConfig;
use tempfile::TempDir;

/// Parses a TOML string into a `NumportConfig` for tests.
pub fn config_from_toml(toml_str: &str) -> Result<NumportConfig, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Returns a minimal config with all defaults applied.
pub fn minimal_config() -> Result<NumportConfig, toml::de::Error> {
    config_from_toml("")
}

/// Writes `contents` to `numport.toml` inside a fresh temp directory.
pub fn write_config(contents: &str) -> Result<(TempDir, PathBuf), String> {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("numport.toml");
    std::fs::write(&path, contents).map_err(|err| err.to_string())?;
    Ok((dir, path))
}

/// Asserts that a validation result is an error containing `needle`.
pub fn assert_invalid(result: Result<(), ConfigError>, needle: &str) -> Result<(), String> {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(()) => Err("expected invalid config".to_string()),
    }
}
