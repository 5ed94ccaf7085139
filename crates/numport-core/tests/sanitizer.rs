// crates/numport-core/tests/sanitizer.rs
// ============================================================================
// Module: Input Sanitizer Tests
// Description: Verifies injection detection, rate limiting, and auditing.
// ============================================================================

//! ## Overview
//! Ensures hostile inputs are denied and audited with the right risk level,
//! clean inputs pass unchanged, and the per-identity rate limit resets with its
//! window.

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
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;

use numport_core::AdminCapability;
use numport_core::AuditAction;
use numport_core::AuditLog;
use numport_core::FieldName;
use numport_core::FixedClock;
use numport_core::InputSanitizer;
use numport_core::Principal;
use numport_core::RateLimitConfig;
use numport_core::RiskLevel;
use numport_core::Role;
use numport_core::SanitizeContext;
use numport_core::SanitizerConfig;
use numport_core::Timestamp;
use numport_core::UserId;
use numport_core::ViolationKind;

fn admin() -> AdminCapability {
    Principal::new(UserId::new("admin-1"), vec![Role::Admin]).admin_capability().unwrap()
}

fn sanitizer(config: SanitizerConfig) -> (InputSanitizer, Arc<FixedClock>, Arc<AuditLog>) {
    let clock = Arc::new(FixedClock::new(Timestamp::from_unix_millis(1_700_000_000_000)));
    let audit = Arc::new(AuditLog::new(64));
    let sanitizer = InputSanitizer::new(config, clock.clone(), Arc::clone(&audit));
    (sanitizer, clock, audit)
}

fn context(field: FieldName) -> SanitizeContext<'static> {
    SanitizeContext {
        identity: "user-1",
        field: Some(field),
    }
}

#[test]
fn clean_input_passes_without_audit() {
    let (sanitizer, _, audit) = sanitizer(SanitizerConfig::default());
    let outcome = sanitizer.sanitize("  John Doe ", &context(FieldName::FullName));
    assert!(outcome.is_secure);
    assert_eq!(outcome.sanitized, "John Doe");
    assert_eq!(outcome.risk, RiskLevel::Low);
    assert!(audit.is_empty());
}

#[test]
fn clean_input_is_audited_when_enabled() {
    let config = SanitizerConfig {
        audit_clean_inputs: true,
        ..SanitizerConfig::default()
    };
    let (sanitizer, _, audit) = sanitizer(config);
    sanitizer.sanitize("John Doe", &context(FieldName::FullName));
    let entries = audit.entries(&admin());
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::InputAccepted);
}

#[test]
fn script_injection_is_high_risk() {
    let (sanitizer, _, audit) = sanitizer(SanitizerConfig::default());
    let outcome =
        sanitizer.sanitize("<script>alert(1)</script>", &context(FieldName::FullName));
    assert!(!outcome.is_secure);
    assert!(outcome.violations.contains(&ViolationKind::ScriptInjection));
    assert!(!outcome.violations.contains(&ViolationKind::Markup));
    assert_eq!(outcome.risk, RiskLevel::High);

    let entries = audit.entries(&admin());
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::InputRejected);
    assert_eq!(entries[0].field_name, Some(FieldName::FullName));
    assert_eq!(entries[0].identity.as_deref(), Some("user-1"));
    assert!(entries[0].details.starts_with("violations: "));
}

#[test]
fn event_handler_attribute_is_script_injection() {
    let (sanitizer, _, _) = sanitizer(SanitizerConfig::default());
    let outcome = sanitizer.sanitize("x onerror=alert(1)", &context(FieldName::FullName));
    assert!(outcome.violations.contains(&ViolationKind::ScriptInjection));
}

#[test]
fn sql_patterns_are_denied() {
    let (sanitizer, _, _) = sanitizer(SanitizerConfig::default());
    let statement = sanitizer.sanitize("x' OR '1'='1", &context(FieldName::ContactEmail));
    assert!(statement.violations.contains(&ViolationKind::SqlInjection));
    assert_eq!(statement.risk, RiskLevel::High);

    let comment = sanitizer.sanitize("name -- drop", &context(FieldName::FullName));
    assert!(comment.violations.contains(&ViolationKind::SqlComment));
    assert_eq!(comment.risk, RiskLevel::Medium);
}

#[test]
fn double_hyphen_email_is_accepted() {
    let (sanitizer, _, audit) = sanitizer(SanitizerConfig::default());
    let outcome = sanitizer.sanitize("first--last@example.com", &context(FieldName::ContactEmail));
    assert!(outcome.is_secure);
    assert_eq!(outcome.sanitized, "first--last@example.com");
    assert!(audit.is_empty());

    let block = sanitizer.sanitize("a/*b*/@example.com", &context(FieldName::ContactEmail));
    assert!(block.violations.contains(&ViolationKind::SqlComment));
}

#[test]
fn apostrophes_and_hyphens_are_not_injection() {
    let (sanitizer, _, _) = sanitizer(SanitizerConfig::default());
    assert!(sanitizer.sanitize("Mary-Jane O'Neil", &context(FieldName::FullName)).is_secure);
    assert!(sanitizer.sanitize("1980-01-01", &context(FieldName::DateOfBirth)).is_secure);
}

#[test]
fn oversized_input_is_low_risk() {
    let config = SanitizerConfig {
        max_input_length: 8,
        ..SanitizerConfig::default()
    };
    let (sanitizer, _, audit) = sanitizer(config);
    let outcome = sanitizer.sanitize("abcdefghijkl", &context(FieldName::FullName));
    assert_eq!(outcome.violations, vec![ViolationKind::TooLong]);
    assert_eq!(outcome.risk, RiskLevel::Low);
    assert_eq!(outcome.sanitized, "abcdefgh");
    assert_eq!(audit.summary(&admin()).low, 1);
}

#[test]
fn rate_limit_denies_then_resets() {
    let config = SanitizerConfig {
        rate_limit: RateLimitConfig {
            max_requests: 2,
            window_ms: 1_000,
            max_entries: 16,
        },
        ..SanitizerConfig::default()
    };
    let (sanitizer, clock, audit) = sanitizer(config);
    let ctx = context(FieldName::FullName);
    assert!(sanitizer.sanitize("John", &ctx).is_secure);
    assert!(sanitizer.sanitize("John", &ctx).is_secure);
    let limited = sanitizer.sanitize("John", &ctx);
    assert_eq!(limited.violations, vec![ViolationKind::RateLimited]);

    let other = SanitizeContext {
        identity: "user-2",
        field: Some(FieldName::FullName),
    };
    assert!(sanitizer.sanitize("John", &other).is_secure);

    clock.advance_millis(1_000);
    assert!(sanitizer.sanitize("John", &ctx).is_secure);

    let high = audit.entries_at_or_above(&admin(), RiskLevel::High);
    assert_eq!(high.len(), 1);
    assert_eq!(high[0].action, AuditAction::RateLimitExceeded);
}

#[test]
fn audit_log_evicts_oldest_entries() {
    let config = SanitizerConfig::default();
    let clock = Arc::new(FixedClock::new(Timestamp::from_unix_millis(0)));
    let audit = Arc::new(AuditLog::new(2));
    let sanitizer = InputSanitizer::new(config, clock, Arc::clone(&audit));
    for _ in 0 .. 3 {
        sanitizer.sanitize("<b>", &context(FieldName::FullName));
    }
    let summary = audit.summary(&admin());
    assert_eq!(summary.total, 2);
    assert_eq!(summary.evicted, 1);
    assert_eq!(summary.medium, 2);
}
