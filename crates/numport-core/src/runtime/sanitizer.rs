// crates/numport-core/src/runtime/sanitizer.rs
// ============================================================================
// Module: Numport Input Sanitizer
// Description: Injection screening, risk classification, and per-identity rate limits.
// Purpose: Deny dangerous form input before any validator sees it.
// Dependencies: crate::{core, runtime::audit_log}, regex, tracing
// ============================================================================

//! ## Overview
//! Every raw form value passes through [`InputSanitizer::sanitize`] before it is
//! validated. Values carrying script, SQL-meta, markup, or control-character
//! patterns are denied and audited; the caller must not apply a denied value.
//! Identities that exceed the configured request rate within a fixed window
//! are treated as high risk regardless of content.
//!
//! Security posture: input is untrusted; pattern failures fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::LazyLock;
use std::sync::Mutex;
use std::sync::PoisonError;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::core::AuditAction;
use crate::core::Clock;
use crate::core::FieldName;
use crate::core::RiskLevel;
use crate::core::SecurityAuditEntry;
use crate::core::Timestamp;
use crate::runtime::audit_log::AuditLog;

// ============================================================================
// SECTION: Patterns
// ============================================================================

/// Script injection patterns.
static SCRIPT_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)(<\s*/?\s*script|javascript\s*:|vbscript\s*:|data\s*:\s*text/html|<\s*iframe|\bon[a-z]+\s*=)")
        .ok()
});

/// SQL statement injection patterns.
static SQL_STATEMENT_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\bunion\b\s+(all\s+)?\bselect\b|;\s*(drop|delete|insert|update|alter|truncate|exec)\b|'\s*(or|and)\s+('|\d)|\bxp_\w+)",
    )
    .ok()
});

/// SQL comment sequences.
static SQL_COMMENT_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(--|/\*|\*/)").ok());

/// SQL block comment delimiters only; `--` is legal in email local parts.
static SQL_BLOCK_COMMENT_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(/\*|\*/)").ok());

/// Returns true when `pattern` matches `value`; an unavailable pattern matches.
fn pattern_hit(pattern: &LazyLock<Option<Regex>>, value: &str) -> bool {
    pattern.as_ref().is_none_or(|regex| regex.is_match(value))
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default maximum accepted input length in characters.
pub const DEFAULT_MAX_INPUT_LENGTH: usize = 256;
/// Default sanitizer calls allowed per identity per window.
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 60;
/// Default rate-limit window in milliseconds.
pub const DEFAULT_RATE_LIMIT_WINDOW_MS: u64 = 60_000;
/// Default number of tracked identities.
pub const DEFAULT_RATE_LIMIT_MAX_ENTRIES: usize = 4_096;

/// Per-identity fixed-window rate limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Calls allowed per window.
    pub max_requests: u32,
    /// Window length in milliseconds.
    pub window_ms: u64,
    /// Maximum identities tracked at once.
    pub max_entries: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            window_ms: DEFAULT_RATE_LIMIT_WINDOW_MS,
            max_entries: DEFAULT_RATE_LIMIT_MAX_ENTRIES,
        }
    }
}

/// Sanitizer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizerConfig {
    /// Maximum accepted input length in characters.
    pub max_input_length: usize,
    /// Audit accepted inputs as well as violations.
    pub audit_clean_inputs: bool,
    /// Per-identity rate limit.
    pub rate_limit: RateLimitConfig,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            max_input_length: DEFAULT_MAX_INPUT_LENGTH,
            audit_clean_inputs: false,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Category of a sanitizer violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Script tag, script URL, or inline event handler.
    ScriptInjection,
    /// SQL statement chaining or tautology.
    SqlInjection,
    /// SQL comment sequence.
    SqlComment,
    /// Markup characters outside a script pattern.
    Markup,
    /// ASCII control characters.
    ControlCharacter,
    /// Input longer than the configured maximum.
    TooLong,
    /// Identity exceeded the rate limit.
    RateLimited,
}

impl ViolationKind {
    /// Returns the risk carried by this violation.
    #[must_use]
    pub const fn risk(self) -> RiskLevel {
        match self {
            Self::ScriptInjection | Self::SqlInjection | Self::RateLimited => RiskLevel::High,
            Self::SqlComment | Self::Markup | Self::ControlCharacter => RiskLevel::Medium,
            Self::TooLong => RiskLevel::Low,
        }
    }

    /// Returns a stable label for the violation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ScriptInjection => "script_injection",
            Self::SqlInjection => "sql_injection",
            Self::SqlComment => "sql_comment",
            Self::Markup => "markup",
            Self::ControlCharacter => "control_character",
            Self::TooLong => "too_long",
            Self::RateLimited => "rate_limited",
        }
    }
}

/// Who is submitting a value and where it is going.
#[derive(Debug, Clone, Copy)]
pub struct SanitizeContext<'a> {
    /// Identity the input is attributed to (user id or session key).
    pub identity: &'a str,
    /// Target form field, when known.
    pub field: Option<FieldName>,
}

/// Result of sanitizing one value.
///
/// # Invariants
/// - `is_secure` is true iff `violations` is empty.
/// - `risk` is the maximum risk over `violations`, or `Low` when empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizeOutcome {
    /// Value with control and markup characters removed, trimmed and truncated.
    pub sanitized: String,
    /// Whether the caller may apply the value.
    pub is_secure: bool,
    /// Violations found, in detection order.
    pub violations: Vec<ViolationKind>,
    /// Aggregate risk.
    pub risk: RiskLevel,
}

// ============================================================================
// SECTION: Sanitizer
// ============================================================================

/// Fixed window counter for one identity.
#[derive(Debug, Clone, Copy)]
struct RateWindow {
    /// Window start.
    started: Timestamp,
    /// Calls observed in the window.
    count: u32,
}

/// Screens raw input and records audit entries.
pub struct InputSanitizer {
    /// Sanitizer configuration.
    config: SanitizerConfig,
    /// Time source for rate windows and audit timestamps.
    clock: Arc<dyn Clock>,
    /// Audit log receiving entries.
    audit: Arc<AuditLog>,
    /// Rate windows keyed by identity.
    windows: Mutex<HashMap<String, RateWindow>>,
}

impl InputSanitizer {
    /// Creates a sanitizer.
    #[must_use]
    pub fn new(config: SanitizerConfig, clock: Arc<dyn Clock>, audit: Arc<AuditLog>) -> Self {
        Self {
            config,
            clock,
            audit,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the audit log entries are written to.
    #[must_use]
    pub fn audit_log(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    /// Screens `value` for `context`.
    ///
    /// A denied value is audited; the caller must not apply it.
    pub fn sanitize(&self, value: &str, context: &SanitizeContext<'_>) -> SanitizeOutcome {
        let mut violations = Vec::new();
        if self.exceeds_rate_limit(context.identity) {
            violations.push(ViolationKind::RateLimited);
        }
        violations.extend(scan(value, self.config.max_input_length, context.field));

        let risk = violations.iter().map(|kind| kind.risk()).max().unwrap_or_default();
        let outcome = SanitizeOutcome {
            sanitized: clean(value, self.config.max_input_length),
            is_secure: violations.is_empty(),
            violations,
            risk,
        };
        self.audit_outcome(&outcome, context);
        outcome
    }

    /// Counts a call for `identity` and reports whether it is over the limit.
    fn exceeds_rate_limit(&self, identity: &str) -> bool {
        let limit = self.config.rate_limit;
        let now = self.clock.now();
        let window_ms = i64::try_from(limit.window_ms).unwrap_or(i64::MAX);
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        if !windows.contains_key(identity) && windows.len() >= limit.max_entries {
            windows.retain(|_, window| now.millis_since(window.started) < window_ms);
            if windows.len() >= limit.max_entries {
                let oldest = windows
                    .iter()
                    .min_by_key(|(_, window)| window.started)
                    .map(|(key, _)| key.clone());
                if let Some(key) = oldest {
                    windows.remove(&key);
                }
            }
        }

        let window = windows.entry(identity.to_string()).or_insert(RateWindow {
            started: now,
            count: 0,
        });
        if now.millis_since(window.started) >= window_ms {
            *window = RateWindow {
                started: now,
                count: 0,
            };
        }
        window.count = window.count.saturating_add(1);
        window.count > limit.max_requests
    }

    /// Writes the audit entry for an outcome.
    fn audit_outcome(&self, outcome: &SanitizeOutcome, context: &SanitizeContext<'_>) {
        let field = context.field.map_or("unknown", |field| field.as_str());
        if outcome.is_secure {
            debug!(field, "input accepted");
            if !self.config.audit_clean_inputs {
                return;
            }
        } else {
            warn!(field, risk = outcome.risk.as_str(), "input rejected by sanitizer");
        }
        let action = if outcome.is_secure {
            AuditAction::InputAccepted
        } else if outcome.violations.contains(&ViolationKind::RateLimited) {
            AuditAction::RateLimitExceeded
        } else {
            AuditAction::InputRejected
        };
        let details = if outcome.is_secure {
            "input accepted".to_string()
        } else {
            let labels: Vec<&str> = outcome.violations.iter().map(|kind| kind.as_str()).collect();
            format!("violations: {}", labels.join(", "))
        };
        self.audit.record(SecurityAuditEntry {
            timestamp: self.clock.now(),
            action,
            field_name: context.field,
            identity: Some(context.identity.to_string()),
            details,
            risk_level: outcome.risk,
        });
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the content violations in `value`.
fn scan(value: &str, max_length: usize, field: Option<FieldName>) -> Vec<ViolationKind> {
    let mut violations = Vec::new();
    if pattern_hit(&SCRIPT_PATTERN, value) {
        violations.push(ViolationKind::ScriptInjection);
    }
    if pattern_hit(&SQL_STATEMENT_PATTERN, value) {
        violations.push(ViolationKind::SqlInjection);
    }
    let comment_pattern = if field == Some(FieldName::ContactEmail) {
        &SQL_BLOCK_COMMENT_PATTERN
    } else {
        &SQL_COMMENT_PATTERN
    };
    if pattern_hit(comment_pattern, value) {
        violations.push(ViolationKind::SqlComment);
    }
    if !violations.contains(&ViolationKind::ScriptInjection)
        && value.chars().any(|ch| matches!(ch, '<' | '>'))
    {
        violations.push(ViolationKind::Markup);
    }
    if value.chars().any(char::is_control) {
        violations.push(ViolationKind::ControlCharacter);
    }
    if value.chars().count() > max_length {
        violations.push(ViolationKind::TooLong);
    }
    violations
}

/// Strips control and markup characters, trims, and truncates.
fn clean(value: &str, max_length: usize) -> String {
    let stripped: String =
        value.chars().filter(|ch| !ch.is_control() && !matches!(ch, '<' | '>')).collect();
    stripped.trim().chars().take(max_length).collect()
}
