// crates/numport-core/src/runtime/validators.rs
// ============================================================================
// Module: Numport Field Validators
// Description: Per-field format, checksum, and range rules for the porting form.
// Purpose: Turn raw field text into a normalized value or a field-specific message.
// Dependencies: crate::{core, runtime::compatibility}, regex, time
// ============================================================================

//! ## Overview
//! Validators are total: every input yields a [`ValidationResult`], never a
//! panic or an error. Only the network pair rule looks at two fields at once;
//! every other rule sees its own field alone. Rules that depend on "now" read
//! the injected [`Clock`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use time::Date;
use time::macros::format_description;

use crate::core::Clock;
use crate::core::FieldName;
use crate::core::Network;
use crate::core::Priority;
use crate::core::SimType;
use crate::core::Timestamp;
use crate::core::ValidationResult;
use crate::runtime::compatibility::CompatibilityResolver;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// South African national mobile format after normalization.
static MOBILE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^0[6-8][0-9]{8}$").ok());

/// Address grammar accepted for contact email.
static EMAIL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9](?:[a-z0-9._%+\-]{0,62}[a-z0-9_%+\-])?@(?:[a-z0-9](?:[a-z0-9\-]{0,61}[a-z0-9])?\.)+[a-z]{2,24}$")
        .ok()
});

/// Minimum holder age in years.
pub const MINIMUM_HOLDER_AGE: i32 = 18;
/// Maximum plausible holder age in years.
pub const MAXIMUM_HOLDER_AGE: i32 = 120;
/// Maximum days ahead a cutover may be scheduled.
pub const MAX_CUTOVER_DAYS_AHEAD: i64 = 90;
/// Length of a South African ID number.
const ID_NUMBER_LENGTH: usize = 13;
/// Maximum email length.
const MAX_EMAIL_LENGTH: usize = 254;
/// Full name length bounds in characters.
const FULL_NAME_CHARS: std::ops::RangeInclusive<usize> = 2..=100;
/// Maximum signature length in characters.
const MAX_SIGNATURE_CHARS: usize = 100;
/// Milliseconds per day.
const MILLIS_PER_DAY: i64 = 86_400_000;

// ============================================================================
// SECTION: Validator Set
// ============================================================================

/// Field validators bound to a clock and a compatibility resolver.
#[derive(Clone)]
pub struct FieldValidators {
    /// Time source for age and cutover rules.
    clock: Arc<dyn Clock>,
    /// Resolver used by the network pair rule.
    resolver: CompatibilityResolver,
}

impl FieldValidators {
    /// Creates validators using the standard compatibility matrix.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_resolver(clock, CompatibilityResolver::standard())
    }

    /// Creates validators with an explicit resolver.
    #[must_use]
    pub fn with_resolver(clock: Arc<dyn Clock>, resolver: CompatibilityResolver) -> Self {
        Self {
            clock,
            resolver,
        }
    }

    /// Returns the resolver used by the network pair rule.
    #[must_use]
    pub const fn resolver(&self) -> &CompatibilityResolver {
        &self.resolver
    }

    /// Validates one field's raw value.
    #[must_use]
    pub fn validate(&self, field: FieldName, raw: &str) -> ValidationResult {
        match field {
            FieldName::PhoneNumber | FieldName::ContactMobile => validate_mobile(field, raw),
            FieldName::CurrentNetwork | FieldName::TargetNetwork => validate_network(field, raw),
            FieldName::FullName => validate_full_name(raw),
            FieldName::IdNumber => validate_id_number(raw),
            FieldName::DateOfBirth => validate_date_of_birth(raw, self.clock.today()),
            FieldName::ContactEmail => validate_email(raw),
            FieldName::SimType => validate_sim_type(raw),
            FieldName::Priority => validate_priority(raw),
            FieldName::ScheduledCutover => validate_cutover(raw, self.clock.now()),
            FieldName::DigitalSignature => validate_signature(raw),
        }
    }

    /// Applies the joint network rule: operators must differ and the pair must
    /// support a direct port.
    ///
    /// The verdict is reported against [`FieldName::TargetNetwork`].
    #[must_use]
    pub fn validate_network_pair(&self, current: Network, target: Network) -> ValidationResult {
        if current == target {
            return ValidationResult::invalid(
                FieldName::TargetNetwork,
                "Target network must differ from the current network",
            );
        }
        let entry = self.resolver.resolve(current, target);
        if entry.compatible {
            return ValidationResult::valid(FieldName::TargetNetwork, target.display_name());
        }
        let step = entry.additional_steps.first().map_or("", String::as_str);
        ValidationResult::invalid(
            FieldName::TargetNetwork,
            format!(
                "Direct porting from {} to {} is not supported. {step}",
                current.display_name(),
                target.display_name()
            ),
        )
    }
}

// ============================================================================
// SECTION: Mobile Numbers
// ============================================================================

/// Normalizes a mobile number to the national ten-digit form.
///
/// Whitespace is removed and `+27` / `27` prefixes become a leading `0`.
/// Returns `None` when the result does not match `0[6-8]XXXXXXXX`.
#[must_use]
pub fn normalize_mobile(raw: &str) -> Option<String> {
    let compact: String = raw.chars().filter(|ch| !ch.is_whitespace()).collect();
    let national = if let Some(rest) = compact.strip_prefix("+27") {
        format!("0{rest}")
    } else if compact.len() == 11
        && let Some(rest) = compact.strip_prefix("27")
    {
        format!("0{rest}")
    } else {
        compact
    };
    let pattern = MOBILE_PATTERN.as_ref()?;
    pattern.is_match(&national).then_some(national)
}

/// Formats a national mobile number with canonical spacing (`082 123 4567`).
#[must_use]
pub fn format_mobile(national: &str) -> String {
    match (national.get(..3), national.get(3..6), national.get(6..)) {
        (Some(area), Some(middle), Some(tail)) => format!("{area} {middle} {tail}"),
        _ => national.to_string(),
    }
}

/// Renders a mobile number in E.164 form (`+27821234567`).
#[must_use]
pub fn mobile_e164(raw: &str) -> Option<String> {
    let national = normalize_mobile(raw)?;
    national.get(1..).map(|rest| format!("+27{rest}"))
}

/// Validates a South African mobile number.
#[must_use]
pub fn validate_mobile(field: FieldName, raw: &str) -> ValidationResult {
    normalize_mobile(raw).map_or_else(
        || {
            ValidationResult::invalid(
                field,
                "Enter a South African mobile number such as 082 123 4567",
            )
        },
        |national| ValidationResult::valid(field, format_mobile(&national)),
    )
}

// ============================================================================
// SECTION: Identity
// ============================================================================

/// Returns true when `digits` passes the Luhn checksum.
///
/// Non-digit input fails.
#[must_use]
pub fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0_u32;
    for (index, ch) in digits.chars().rev().enumerate() {
        let Some(mut digit) = ch.to_digit(10) else {
            return false;
        };
        if index % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    !digits.is_empty() && sum % 10 == 0
}

/// Validates a 13-digit South African ID number.
///
/// The value is checked as given; surrounding whitespace is not trimmed.
#[must_use]
pub fn validate_id_number(raw: &str) -> ValidationResult {
    if raw.len() != ID_NUMBER_LENGTH || !raw.chars().all(|ch| ch.is_ascii_digit()) {
        return ValidationResult::invalid(
            FieldName::IdNumber,
            "ID number must be exactly 13 digits",
        );
    }
    if !luhn_valid(raw) {
        return ValidationResult::invalid(FieldName::IdNumber, "ID number checksum is invalid");
    }
    ValidationResult::valid(FieldName::IdNumber, raw)
}

/// Validates a `YYYY-MM-DD` date of birth against `today`.
#[must_use]
pub fn validate_date_of_birth(raw: &str, today: Date) -> ValidationResult {
    let format = format_description!("[year]-[month]-[day]");
    let Ok(born) = Date::parse(raw.trim(), &format) else {
        return ValidationResult::invalid(
            FieldName::DateOfBirth,
            "Date of birth must be a valid date in YYYY-MM-DD form",
        );
    };
    if born > today {
        return ValidationResult::invalid(FieldName::DateOfBirth, "Date of birth is in the future");
    }
    let age = age_on(born, today);
    if age < MINIMUM_HOLDER_AGE {
        return ValidationResult::invalid(
            FieldName::DateOfBirth,
            format!("Holder must be at least {MINIMUM_HOLDER_AGE} years old"),
        );
    }
    if age > MAXIMUM_HOLDER_AGE {
        return ValidationResult::invalid(FieldName::DateOfBirth, "Date of birth is not plausible");
    }
    ValidationResult::valid(FieldName::DateOfBirth, raw.trim())
}

/// Returns whole years elapsed between `born` and `today`.
fn age_on(born: Date, today: Date) -> i32 {
    let mut age = today.year() - born.year();
    if (u8::from(today.month()), today.day()) < (u8::from(born.month()), born.day()) {
        age -= 1;
    }
    age
}

/// Validates the holder's full name and collapses inner whitespace.
#[must_use]
pub fn validate_full_name(raw: &str) -> ValidationResult {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let length = collapsed.chars().count();
    if !FULL_NAME_CHARS.contains(&length) {
        return ValidationResult::invalid(
            FieldName::FullName,
            "Full name must be between 2 and 100 characters",
        );
    }
    let allowed =
        collapsed.chars().all(|ch| ch.is_alphabetic() || matches!(ch, ' ' | '-' | '\'' | '.'));
    if !allowed || !collapsed.chars().any(char::is_alphabetic) {
        return ValidationResult::invalid(
            FieldName::FullName,
            "Full name may contain letters, spaces, hyphens, apostrophes, and periods only",
        );
    }
    ValidationResult::valid(FieldName::FullName, collapsed)
}

/// Validates a contact email and lowercases it.
#[must_use]
pub fn validate_email(raw: &str) -> ValidationResult {
    let lowered = raw.trim().to_lowercase();
    let matches = EMAIL_PATTERN.as_ref().is_some_and(|pattern| pattern.is_match(&lowered));
    if lowered.len() > MAX_EMAIL_LENGTH || lowered.contains("..") || !matches {
        return ValidationResult::invalid(FieldName::ContactEmail, "Enter a valid email address");
    }
    ValidationResult::valid(FieldName::ContactEmail, lowered)
}

// ============================================================================
// SECTION: Selections
// ============================================================================

/// Validates an operator name.
#[must_use]
pub fn validate_network(field: FieldName, raw: &str) -> ValidationResult {
    Network::parse(raw).map_or_else(
        || ValidationResult::invalid(field, "Select a supported network operator"),
        |network| ValidationResult::valid(field, network.display_name()),
    )
}

/// Validates a SIM type; empty input selects the default.
#[must_use]
pub fn validate_sim_type(raw: &str) -> ValidationResult {
    if raw.trim().is_empty() {
        return ValidationResult::valid(FieldName::SimType, "physical");
    }
    match SimType::parse(raw) {
        Some(SimType::Physical) => ValidationResult::valid(FieldName::SimType, "physical"),
        Some(SimType::Esim) => ValidationResult::valid(FieldName::SimType, "esim"),
        None => ValidationResult::invalid(FieldName::SimType, "SIM type must be physical or esim"),
    }
}

/// Validates a priority; empty input selects the default.
#[must_use]
pub fn validate_priority(raw: &str) -> ValidationResult {
    if raw.trim().is_empty() {
        return ValidationResult::valid(FieldName::Priority, "normal");
    }
    match Priority::parse(raw) {
        Some(Priority::Normal) => ValidationResult::valid(FieldName::Priority, "normal"),
        Some(Priority::High) => ValidationResult::valid(FieldName::Priority, "high"),
        Some(Priority::Urgent) => ValidationResult::valid(FieldName::Priority, "urgent"),
        None => ValidationResult::invalid(
            FieldName::Priority,
            "Priority must be normal, high, or urgent",
        ),
    }
}

// ============================================================================
// SECTION: Scheduling and Signature
// ============================================================================

/// Validates an optional RFC 3339 cutover relative to `now`.
///
/// Empty input means "as soon as possible" and normalizes to an empty string.
#[must_use]
pub fn validate_cutover(raw: &str, now: Timestamp) -> ValidationResult {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ValidationResult::valid(FieldName::ScheduledCutover, "");
    }
    let Some(cutover) = Timestamp::parse_rfc3339(trimmed) else {
        return ValidationResult::invalid(
            FieldName::ScheduledCutover,
            "Cutover must be an RFC 3339 timestamp such as 2026-03-01T08:00:00Z",
        );
    };
    if cutover <= now {
        return ValidationResult::invalid(
            FieldName::ScheduledCutover,
            "Cutover must be in the future",
        );
    }
    if cutover.millis_since(now) > MAX_CUTOVER_DAYS_AHEAD * MILLIS_PER_DAY {
        return ValidationResult::invalid(
            FieldName::ScheduledCutover,
            format!("Cutover must be within {MAX_CUTOVER_DAYS_AHEAD} days"),
        );
    }
    ValidationResult::valid(FieldName::ScheduledCutover, cutover.to_string())
}

/// Validates the typed signature.
#[must_use]
pub fn validate_signature(raw: &str) -> ValidationResult {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ValidationResult::invalid(
            FieldName::DigitalSignature,
            "Type your full name to sign the request",
        );
    }
    if trimmed.chars().count() > MAX_SIGNATURE_CHARS {
        return ValidationResult::invalid(FieldName::DigitalSignature, "Signature is too long");
    }
    ValidationResult::valid(FieldName::DigitalSignature, trimmed)
}
