// crates/numport-config/src/config.rs
// ============================================================================
// Module: Numport Configuration
// Description: Configuration loading and validation for the porting engine.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: numport-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section is optional and defaults to the engine's built-in policy.
//! Missing files, malformed TOML, and out-of-range values fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use numport_core::AuditLog;
use numport_core::BackoffConfig;
use numport_core::FileAuditSink;
use numport_core::RetryPolicy;
use numport_core::SanitizerConfig;
use numport_core::StderrAuditSink;
use numport_core::UploadPolicy;
use numport_core::runtime::audit_log::DEFAULT_AUDIT_CAPACITY;
use numport_core::runtime::recovery::DEFAULT_MAX_ATTEMPTS;
use numport_core::runtime::sanitizer::DEFAULT_MAX_INPUT_LENGTH;
use numport_core::runtime::sanitizer::DEFAULT_RATE_LIMIT_MAX_ENTRIES;
use numport_core::runtime::sanitizer::DEFAULT_RATE_LIMIT_MAX_REQUESTS;
use numport_core::runtime::sanitizer::DEFAULT_RATE_LIMIT_WINDOW_MS;
use numport_core::runtime::sync::DEFAULT_CHANNEL_CAPACITY;
use numport_core::runtime::upload::DEFAULT_ALLOWED_EXTENSIONS;
use numport_core::runtime::upload::DEFAULT_MAX_FILE_BYTES;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "numport.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "NUMPORT_CONFIG";
/// Default environment variable holding the backend bearer token.
pub const DEFAULT_API_KEY_ENV: &str = "NUMPORT_API_KEY";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default HTTP timeout in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 5_000;
/// Minimum HTTP timeout in milliseconds.
const MIN_TIMEOUT_MS: u64 = 100;
/// Maximum HTTP timeout in milliseconds.
const MAX_TIMEOUT_MS: u64 = 60_000;
/// Maximum retry budget.
const MAX_RETRY_ATTEMPTS: u32 = 10;
/// Maximum single backoff delay in milliseconds.
const MAX_BACKOFF_MS: u64 = 60_000;
/// Maximum exponential backoff multiplier.
const MAX_BACKOFF_MULTIPLIER: u32 = 10;
/// Maximum sanitizer input length.
const MAX_INPUT_LENGTH_LIMIT: usize = 4_096;
/// Maximum audit ring capacity.
const MAX_AUDIT_CAPACITY: usize = 100_000;
/// Maximum requests per rate limit window.
const MAX_RATE_LIMIT_REQUESTS: u32 = 100_000;
/// Minimum rate limit window in milliseconds.
const MIN_RATE_LIMIT_WINDOW_MS: u64 = 100;
/// Maximum rate limit window in milliseconds.
const MAX_RATE_LIMIT_WINDOW_MS: u64 = 3_600_000;
/// Maximum tracked rate limit identities.
const MAX_RATE_LIMIT_ENTRIES: usize = 65_536;
/// Hard ceiling on accepted upload size.
const MAX_UPLOAD_BYTES_LIMIT: u64 = 50 * 1024 * 1024;
/// Maximum number of allowed extensions.
const MAX_ALLOWED_EXTENSIONS: usize = 32;
/// Maximum length of one allowed extension.
const MAX_EXTENSION_LENGTH: usize = 10;
/// Maximum change-feed buffer size.
const MAX_CHANNEL_CAPACITY: usize = 4_096;

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Porting engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NumportConfig {
    /// Persistence backend configuration.
    #[serde(default)]
    pub backend: BackendConfig,
    /// Document verification service configuration.
    #[serde(default)]
    pub verification: VerificationConfig,
    /// Retry policy configuration.
    #[serde(default)]
    pub recovery: RecoveryConfig,
    /// Input sanitizer configuration.
    #[serde(default)]
    pub sanitizer: InputSanitizerConfig,
    /// Upload policy configuration.
    #[serde(default)]
    pub uploads: UploadConfig,
    /// Real-time sync configuration.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Audit sink configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl NumportConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config = Self::from_toml_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration, using defaults when no file was requested and the
    /// default file is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a requested file cannot be loaded or fails
    /// validation.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if path.is_none()
            && env::var_os(CONFIG_ENV_VAR).is_none()
            && !Path::new(DEFAULT_CONFIG_NAME).exists()
        {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parses configuration from TOML text without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not valid config TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backend.validate()?;
        self.verification.validate()?;
        self.recovery.validate()?;
        self.sanitizer.validate()?;
        self.uploads.validate()?;
        self.sync.validate()?;
        self.audit.validate()?;
        Ok(())
    }

    /// Builds the audit log with the configured sink attached.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file sink cannot be opened.
    pub fn audit_log(&self) -> Result<AuditLog, ConfigError> {
        let log = AuditLog::new(self.sanitizer.audit_capacity);
        match self.audit.sink {
            AuditSinkKind::None => Ok(log),
            AuditSinkKind::Stderr => Ok(log.with_sink(Arc::new(StderrAuditSink))),
            AuditSinkKind::File => {
                let path = self.audit.path.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("audit.path is required for the file sink".to_string())
                })?;
                let sink = FileAuditSink::new(Path::new(path.trim()))
                    .map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(log.with_sink(Arc::new(sink)))
            }
        }
    }
}

// ============================================================================
// SECTION: Backend
// ============================================================================

/// Persistence backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend; absent selects the in-memory backend.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Environment variable holding the bearer token.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key_env: default_api_key_env(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl BackendConfig {
    /// Validates backend settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(endpoint) = &self.endpoint {
            validate_endpoint("backend.endpoint", endpoint)?;
        }
        let name = self.api_key_env.trim();
        if name.is_empty() || name != self.api_key_env {
            return Err(ConfigError::Invalid(
                "backend.api_key_env must be a non-empty trimmed name".to_string(),
            ));
        }
        if !name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
            return Err(ConfigError::Invalid(
                "backend.api_key_env must contain only letters, digits, and underscores"
                    .to_string(),
            ));
        }
        validate_timeout("backend.timeout_ms", self.timeout_ms)
    }

    /// Parses the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the endpoint is not a valid URL.
    pub fn endpoint_url(&self) -> Result<Option<Url>, ConfigError> {
        self.endpoint.as_deref().map(|value| parse_endpoint("backend.endpoint", value)).transpose()
    }

    /// Reads the bearer token from the configured environment variable.
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        env::var(&self.api_key_env).ok().filter(|value| !value.trim().is_empty())
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// ============================================================================
// SECTION: Verification
// ============================================================================

/// Document verification service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationConfig {
    /// Base URL of the service; absent selects the static verifier.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl VerificationConfig {
    /// Validates verification settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(endpoint) = &self.endpoint {
            validate_endpoint("verification.endpoint", endpoint)?;
        }
        validate_timeout("verification.timeout_ms", self.timeout_ms)
    }

    /// Parses the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the endpoint is not a valid URL.
    pub fn endpoint_url(&self) -> Result<Option<Url>, ConfigError> {
        self.endpoint
            .as_deref()
            .map(|value| parse_endpoint("verification.endpoint", value))
            .transpose()
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// ============================================================================
// SECTION: Recovery
// ============================================================================

/// Retry policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RecoveryConfig {
    /// Maximum tries per operation, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay schedule between tries.
    #[serde(default)]
    pub backoff: BackoffConfig,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff: BackoffConfig::default(),
        }
    }
}

impl RecoveryConfig {
    /// Validates retry settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 || self.max_attempts > MAX_RETRY_ATTEMPTS {
            return Err(ConfigError::Invalid(format!(
                "recovery.max_attempts must be between 1 and {MAX_RETRY_ATTEMPTS}"
            )));
        }
        match self.backoff {
            BackoffConfig::Fixed {
                delay_ms,
            } => validate_delay("recovery.backoff.delay_ms", delay_ms),
            BackoffConfig::Linear {
                initial_ms,
                step_ms,
                max_ms,
            } => {
                validate_delay("recovery.backoff.initial_ms", initial_ms)?;
                validate_delay("recovery.backoff.step_ms", step_ms)?;
                validate_ceiling(initial_ms, max_ms)
            }
            BackoffConfig::Exponential {
                initial_ms,
                multiplier,
                max_ms,
            } => {
                validate_delay("recovery.backoff.initial_ms", initial_ms)?;
                if multiplier == 0 || multiplier > MAX_BACKOFF_MULTIPLIER {
                    return Err(ConfigError::Invalid(format!(
                        "recovery.backoff.multiplier must be between 1 and \
                         {MAX_BACKOFF_MULTIPLIER}"
                    )));
                }
                validate_ceiling(initial_ms, max_ms)
            }
        }
    }

    /// Converts the section into the runtime retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: self.backoff,
        }
    }
}

// ============================================================================
// SECTION: Sanitizer
// ============================================================================

/// Input sanitizer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct InputSanitizerConfig {
    /// Maximum accepted input length in characters.
    #[serde(default = "default_max_input_length")]
    pub max_input_length: usize,
    /// Audit ring capacity.
    #[serde(default = "default_audit_capacity")]
    pub audit_capacity: usize,
    /// Record accepted inputs in the audit log as well as denials.
    #[serde(default)]
    pub audit_clean_inputs: bool,
    /// Per-identity rate limit.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for InputSanitizerConfig {
    fn default() -> Self {
        Self {
            max_input_length: default_max_input_length(),
            audit_capacity: default_audit_capacity(),
            audit_clean_inputs: false,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl InputSanitizerConfig {
    /// Validates sanitizer settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_input_length == 0 || self.max_input_length > MAX_INPUT_LENGTH_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "sanitizer.max_input_length must be between 1 and {MAX_INPUT_LENGTH_LIMIT}"
            )));
        }
        if self.audit_capacity == 0 || self.audit_capacity > MAX_AUDIT_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "sanitizer.audit_capacity must be between 1 and {MAX_AUDIT_CAPACITY}"
            )));
        }
        self.rate_limit.validate()
    }

    /// Converts the section into the runtime sanitizer configuration.
    #[must_use]
    pub const fn sanitizer_config(&self) -> SanitizerConfig {
        SanitizerConfig {
            max_input_length: self.max_input_length,
            audit_clean_inputs: self.audit_clean_inputs,
            rate_limit: numport_core::RateLimitConfig {
                max_requests: self.rate_limit.max_requests,
                window_ms: self.rate_limit.window_ms,
                max_entries: self.rate_limit.max_entries,
            },
        }
    }
}

/// Rate limit configuration for sanitizer calls.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per time window.
    #[serde(default = "default_rate_limit_max_requests")]
    pub max_requests: u32,
    /// Window duration in milliseconds.
    #[serde(default = "default_rate_limit_window_ms")]
    pub window_ms: u64,
    /// Maximum number of distinct rate limit entries.
    #[serde(default = "default_rate_limit_max_entries")]
    pub max_entries: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_rate_limit_max_requests(),
            window_ms: default_rate_limit_window_ms(),
            max_entries: default_rate_limit_max_entries(),
        }
    }
}

impl RateLimitConfig {
    /// Validates rate limit settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_requests == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit max_requests must be greater than zero".to_string(),
            ));
        }
        if self.max_requests > MAX_RATE_LIMIT_REQUESTS {
            return Err(ConfigError::Invalid("rate_limit max_requests too large".to_string()));
        }
        if self.window_ms < MIN_RATE_LIMIT_WINDOW_MS || self.window_ms > MAX_RATE_LIMIT_WINDOW_MS {
            return Err(ConfigError::Invalid(format!(
                "rate_limit window_ms must be between {MIN_RATE_LIMIT_WINDOW_MS} and \
                 {MAX_RATE_LIMIT_WINDOW_MS}",
            )));
        }
        if self.max_entries == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit max_entries must be greater than zero".to_string(),
            ));
        }
        if self.max_entries > MAX_RATE_LIMIT_ENTRIES {
            return Err(ConfigError::Invalid("rate_limit max_entries too large".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Uploads
// ============================================================================

/// Upload policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum accepted file size in bytes.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    /// Allowed lowercase file extensions.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    /// Refuse submissions without an identity document.
    #[serde(default)]
    pub require_identity_document: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            allowed_extensions: default_allowed_extensions(),
            require_identity_document: false,
        }
    }
}

impl UploadConfig {
    /// Validates upload settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_file_bytes == 0 || self.max_file_bytes > MAX_UPLOAD_BYTES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "uploads.max_file_bytes must be between 1 and {MAX_UPLOAD_BYTES_LIMIT}"
            )));
        }
        if self.allowed_extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "uploads.allowed_extensions must not be empty".to_string(),
            ));
        }
        if self.allowed_extensions.len() > MAX_ALLOWED_EXTENSIONS {
            return Err(ConfigError::Invalid("too many uploads.allowed_extensions".to_string()));
        }
        for extension in &self.allowed_extensions {
            let valid = !extension.is_empty()
                && extension.len() <= MAX_EXTENSION_LENGTH
                && extension.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit());
            if !valid {
                return Err(ConfigError::Invalid(format!(
                    "uploads.allowed_extensions entry {extension:?} must be 1-{MAX_EXTENSION_LENGTH} \
                     lowercase letters or digits"
                )));
            }
        }
        Ok(())
    }

    /// Converts the section into the runtime upload policy.
    #[must_use]
    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            max_file_bytes: self.max_file_bytes,
            allowed_extensions: self.allowed_extensions.clone(),
            require_identity_document: self.require_identity_document,
        }
    }
}

// ============================================================================
// SECTION: Sync
// ============================================================================

/// Real-time sync configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Change-feed buffer size.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl SyncConfig {
    /// Validates sync settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 || self.channel_capacity > MAX_CHANNEL_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "sync.channel_capacity must be between 1 and {MAX_CHANNEL_CAPACITY}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// Keep entries in memory only.
    #[default]
    None,
    /// Mirror entries to stderr as JSON lines.
    Stderr,
    /// Append entries to a file as JSON lines.
    File,
}

/// Audit sink configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditConfig {
    /// Sink receiving mirrored entries.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Audit file path for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates audit settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, None) => Err(ConfigError::Invalid(
                "audit.path is required for the file sink".to_string(),
            )),
            (AuditSinkKind::File, Some(path)) => validate_path_string("audit.path", path),
            (_, Some(_)) => Err(ConfigError::Invalid(
                "audit.path is only valid with the file sink".to_string(),
            )),
            (_, None) => Ok(()),
        }
    }
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
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Parses an HTTP(S) endpoint URL.
fn parse_endpoint(field: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|err| ConfigError::Invalid(format!("{field} is not a valid url: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid(format!("{field} must use http or https")));
    }
    if url.host_str().is_none() {
        return Err(ConfigError::Invalid(format!("{field} must include a host")));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(ConfigError::Invalid(format!("{field} must not embed credentials")));
    }
    Ok(url)
}

/// Validates an HTTP(S) endpoint URL.
fn validate_endpoint(field: &str, value: &str) -> Result<(), ConfigError> {
    parse_endpoint(field, value).map(|_| ())
}

/// Validates a timeout bound.
fn validate_timeout(field: &str, timeout_ms: u64) -> Result<(), ConfigError> {
    if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&timeout_ms) {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}"
        )));
    }
    Ok(())
}

/// Validates a single backoff delay.
fn validate_delay(field: &str, delay_ms: u64) -> Result<(), ConfigError> {
    if delay_ms > MAX_BACKOFF_MS {
        return Err(ConfigError::Invalid(format!("{field} must be at most {MAX_BACKOFF_MS}")));
    }
    Ok(())
}

/// Validates a backoff ceiling against its starting delay.
fn validate_ceiling(initial_ms: u64, max_ms: u64) -> Result<(), ConfigError> {
    validate_delay("recovery.backoff.max_ms", max_ms)?;
    if max_ms < initial_ms {
        return Err(ConfigError::Invalid(
            "recovery.backoff.max_ms must be at least initial_ms".to_string(),
        ));
    }
    Ok(())
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default bearer token variable.
fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

/// Default HTTP timeout.
const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Default retry budget.
const fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

/// Default sanitizer input length.
const fn default_max_input_length() -> usize {
    DEFAULT_MAX_INPUT_LENGTH
}

/// Default audit ring capacity.
const fn default_audit_capacity() -> usize {
    DEFAULT_AUDIT_CAPACITY
}

/// Default requests per rate limit window.
const fn default_rate_limit_max_requests() -> u32 {
    DEFAULT_RATE_LIMIT_MAX_REQUESTS
}

/// Default rate limit window.
const fn default_rate_limit_window_ms() -> u64 {
    DEFAULT_RATE_LIMIT_WINDOW_MS
}

/// Default rate limit identity capacity.
const fn default_rate_limit_max_entries() -> usize {
    DEFAULT_RATE_LIMIT_MAX_ENTRIES
}

/// Default upload ceiling.
const fn default_max_file_bytes() -> u64 {
    DEFAULT_MAX_FILE_BYTES
}

/// Default upload extensions.
fn default_allowed_extensions() -> Vec<String> {
    DEFAULT_ALLOWED_EXTENSIONS.iter().map(ToString::to_string).collect()
}

/// Default change-feed buffer size.
const fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}
