// crates/numport-core/tests/validators.rs
// ============================================================================
// Module: Field Validator Tests
// Description: Verifies per-field validation and normalization rules.
// Purpose: Pin checksum, age, mobile, and network pair behavior.
// ============================================================================

//! ## Overview
//! Exercises each field rule with accepted and rejected values, plus property
//! tests for the ID checksum and mobile normalization.

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

use numport_core::FieldName;
use numport_core::FieldValidators;
use numport_core::FixedClock;
use numport_core::Network;
use numport_core::Timestamp;
use numport_core::runtime::validators::format_mobile;
use numport_core::runtime::validators::mobile_e164;
use numport_core::runtime::validators::normalize_mobile;
use numport_core::runtime::validators::validate_cutover;
use numport_core::runtime::validators::validate_date_of_birth;
use numport_core::runtime::validators::validate_email;
use numport_core::runtime::validators::validate_full_name;
use numport_core::runtime::validators::validate_id_number;
use numport_core::runtime::validators::validate_mobile;
use proptest::prelude::*;
use time::macros::date;

fn validators() -> FieldValidators {
    FieldValidators::new(Arc::new(FixedClock::at_date(date!(2025 - 06 - 15))))
}

/// Computes the ID check digit with the published Home Affairs recipe: sum
/// the odd-position digits, double the number formed by the even-position
/// digits and add its digit sum, then take the distance to the next ten.
fn id_check_digit(first_twelve: &str) -> u32 {
    let digits: Vec<u32> = first_twelve.chars().map(|ch| ch.to_digit(10).unwrap()).collect();
    let odd_sum: u32 = digits.iter().step_by(2).sum();
    let even: String = digits.iter().skip(1).step_by(2).map(ToString::to_string).collect();
    let doubled = even.parse::<u64>().unwrap() * 2;
    let doubled_sum: u32 = doubled.to_string().chars().map(|ch| ch.to_digit(10).unwrap()).sum();
    (10 - (odd_sum + doubled_sum) % 10) % 10
}

// ============================================================================
// SECTION: Identity
// ============================================================================

#[test]
fn id_number_accepts_valid_checksum() {
    let result = validate_id_number("8001015009087");
    assert!(result.is_valid);
    assert_eq!(result.normalized_value.as_deref(), Some("8001015009087"));
}

#[test]
fn check_digit_recipe_matches_known_id() {
    assert_eq!(id_check_digit("800101500908"), 7);
}

#[test]
fn id_number_rejects_bad_checksum_and_shape() {
    assert!(!validate_id_number("8001015009088").is_valid);
    assert!(!validate_id_number("800101500908").is_valid);
    assert!(!validate_id_number("80010150090871").is_valid);
    assert!(!validate_id_number("80010150O9087").is_valid);
    assert!(!validate_id_number(" 8001015009087").is_valid);
}

#[test]
fn date_of_birth_enforces_age_bounds() {
    let today = date!(2025 - 06 - 15);
    assert!(validate_date_of_birth("1980-01-01", today).is_valid);
    assert!(validate_date_of_birth("2007-06-15", today).is_valid);
    assert!(!validate_date_of_birth("2007-06-16", today).is_valid);
    assert!(!validate_date_of_birth("2030-01-01", today).is_valid);
    assert!(!validate_date_of_birth("1900-01-01", today).is_valid);
    assert!(!validate_date_of_birth("1980-13-01", today).is_valid);
    assert!(!validate_date_of_birth("01/01/1980", today).is_valid);
}

#[test]
fn date_of_birth_uses_validator_clock() {
    let result = validators().validate(FieldName::DateOfBirth, "2010-01-01");
    assert!(!result.is_valid);
    assert_eq!(result.message.as_deref(), Some("Holder must be at least 18 years old"));
}

#[test]
fn full_name_collapses_whitespace() {
    let result = validate_full_name("  John   Doe ");
    assert_eq!(result.normalized_value.as_deref(), Some("John Doe"));
    assert!(validate_full_name("Mary-Jane O'Neil Jr.").is_valid);
    assert!(!validate_full_name("J").is_valid);
    assert!(!validate_full_name("John 3").is_valid);
    assert!(!validate_full_name("-- .").is_valid);
}

#[test]
fn email_is_lowercased() {
    let result = validate_email(" John.Doe@Example.COM ");
    assert_eq!(result.normalized_value.as_deref(), Some("john.doe@example.com"));
    assert!(!validate_email("john..doe@example.com").is_valid);
    assert!(!validate_email("john.doe").is_valid);
}

// ============================================================================
// SECTION: Mobile Numbers
// ============================================================================

#[test]
fn mobile_prefixes_normalize_to_national_form() {
    assert_eq!(normalize_mobile("082 123 4567").as_deref(), Some("0821234567"));
    assert_eq!(normalize_mobile("+27 82 123 4567").as_deref(), Some("0821234567"));
    assert_eq!(normalize_mobile("27821234567").as_deref(), Some("0821234567"));
    assert_eq!(normalize_mobile("0521234567"), None);
    assert_eq!(normalize_mobile("082123456"), None);
    assert_eq!(format_mobile("0821234567"), "082 123 4567");
    assert_eq!(mobile_e164("082 123 4567").as_deref(), Some("+27821234567"));
}

#[test]
fn phone_number_field_reports_canonical_spacing() {
    let result = validators().validate(FieldName::PhoneNumber, "0821234567");
    assert!(result.is_valid);
    assert_eq!(result.normalized_value.as_deref(), Some("082 123 4567"));
}

// ============================================================================
// SECTION: Selections and Scheduling
// ============================================================================

#[test]
fn network_and_defaults_normalize() {
    let validators = validators();
    let result = validators.validate(FieldName::CurrentNetwork, "cell c");
    assert_eq!(result.normalized_value.as_deref(), Some("Cell C"));
    assert!(!validators.validate(FieldName::TargetNetwork, "Orange").is_valid);
    assert_eq!(
        validators.validate(FieldName::SimType, "").normalized_value.as_deref(),
        Some("physical")
    );
    assert_eq!(
        validators.validate(FieldName::Priority, "").normalized_value.as_deref(),
        Some("normal")
    );
    assert!(!validators.validate(FieldName::Priority, "asap").is_valid);
}

#[test]
fn network_pair_requires_distinct_compatible_operators() {
    let validators = validators();
    assert!(validators.validate_network_pair(Network::Mtn, Network::Vodacom).is_valid);

    let same = validators.validate_network_pair(Network::Mtn, Network::Mtn);
    assert!(!same.is_valid);
    assert_eq!(same.field_name, FieldName::TargetNetwork);

    let blocked = validators.validate_network_pair(Network::Mtn, Network::MakroCall);
    assert!(!blocked.is_valid);
    let message = blocked.message.unwrap();
    assert!(message.starts_with("Direct porting from MTN to MakroCall is not supported."));
    assert!(message.contains("Port the number to MTN first"));
}

#[test]
fn cutover_must_be_future_and_within_window() {
    let now = Timestamp::parse_rfc3339("2025-06-15T00:00:00Z").unwrap();
    assert!(validate_cutover("", now).is_valid);
    assert!(validate_cutover("2025-06-20T08:00:00Z", now).is_valid);
    assert!(!validate_cutover("2025-06-14T08:00:00Z", now).is_valid);
    assert!(!validate_cutover("2025-12-01T08:00:00Z", now).is_valid);
    assert!(!validate_cutover("next tuesday", now).is_valid);
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    #[test]
    fn id_number_with_computed_check_digit_is_accepted(first_twelve in "[0-9]{12}") {
        let check = id_check_digit(&first_twelve);
        let valid = format!("{first_twelve}{check}");
        prop_assert!(validate_id_number(&valid).is_valid);

        let wrong = (check + 1) % 10;
        let corrupted = format!("{first_twelve}{wrong}");
        prop_assert!(!validate_id_number(&corrupted).is_valid);
    }

    #[test]
    fn id_number_of_other_lengths_is_rejected(digits in "[0-9]{0,12}|[0-9]{14,20}") {
        prop_assert!(!validate_id_number(&digits).is_valid);
    }

    #[test]
    fn mobile_outside_six_to_eight_is_rejected(number in "0[0-59][0-9]{8}") {
        prop_assert!(!validate_mobile(FieldName::PhoneNumber, &number).is_valid);
        prop_assert!(!validate_mobile(FieldName::ContactMobile, &number).is_valid);
    }

    #[test]
    fn mobile_normalization_is_idempotent(rest in "[6-8][0-9]{8}") {
        let national = format!("0{rest}");
        let international = format!("+27{rest}");
        let spaced = format_mobile(&national);
        prop_assert_eq!(normalize_mobile(&international), Some(national.clone()));
        prop_assert_eq!(normalize_mobile(&spaced), Some(national.clone()));
        prop_assert_eq!(normalize_mobile(&national), Some(national));
    }
}
