// crates/numport-core/src/core/validation.rs
// ============================================================================
// Module: Numport Validation Results
// Description: Form field names and per-field validation outcomes.
// Purpose: Carry validator verdicts from the rules to the form orchestrator.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`ValidationResult`] is ephemeral: it is produced on every edit, stored in
//! the form's error map while the field is invalid, and never persisted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Field Names
// ============================================================================

/// Fields of the porting form.
///
/// # Invariants
/// - Wire labels are stable; they key the form's touched and error maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    /// Number being ported.
    PhoneNumber,
    /// Operator currently holding the number.
    CurrentNetwork,
    /// Operator receiving the number.
    TargetNetwork,
    /// Holder's full name.
    FullName,
    /// Holder's South African ID number.
    IdNumber,
    /// Holder's date of birth.
    DateOfBirth,
    /// Holder's contact email.
    ContactEmail,
    /// Holder's alternate contact mobile.
    ContactMobile,
    /// Requested SIM form factor.
    SimType,
    /// Requested priority.
    Priority,
    /// Optional scheduled cutover time.
    ScheduledCutover,
    /// Typed signature.
    DigitalSignature,
}

impl FieldName {
    /// Fields that must be valid before submission.
    pub const MANDATORY: [Self; 8] = [
        Self::PhoneNumber,
        Self::CurrentNetwork,
        Self::TargetNetwork,
        Self::FullName,
        Self::IdNumber,
        Self::DateOfBirth,
        Self::ContactEmail,
        Self::ContactMobile,
    ];

    /// Returns the stable wire label for the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PhoneNumber => "phoneNumber",
            Self::CurrentNetwork => "currentNetwork",
            Self::TargetNetwork => "targetNetwork",
            Self::FullName => "fullName",
            Self::IdNumber => "idNumber",
            Self::DateOfBirth => "dateOfBirth",
            Self::ContactEmail => "contactEmail",
            Self::ContactMobile => "contactMobile",
            Self::SimType => "simType",
            Self::Priority => "priority",
            Self::ScheduledCutover => "scheduledCutover",
            Self::DigitalSignature => "digitalSignature",
        }
    }

    /// Parses a wire label or kebab/snake-case alias.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let folded: String = value
            .chars()
            .filter(|ch| *ch != '-' && *ch != '_')
            .flat_map(char::to_lowercase)
            .collect();
        [
            Self::PhoneNumber,
            Self::CurrentNetwork,
            Self::TargetNetwork,
            Self::FullName,
            Self::IdNumber,
            Self::DateOfBirth,
            Self::ContactEmail,
            Self::ContactMobile,
            Self::SimType,
            Self::Priority,
            Self::ScheduledCutover,
            Self::DigitalSignature,
        ]
        .into_iter()
        .find(|field| field.as_str().to_lowercase() == folded)
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Validation Result
// ============================================================================

/// Outcome of validating a single field.
///
/// # Invariants
/// - `normalized_value` is `Some` iff `is_valid` is true.
/// - `message` is `Some` iff `is_valid` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Field that was validated.
    pub field_name: FieldName,
    /// Whether the value satisfied the field's rule.
    pub is_valid: bool,
    /// Canonical form of the accepted value.
    pub normalized_value: Option<String>,
    /// Field-specific error message for rejected values.
    pub message: Option<String>,
}

impl ValidationResult {
    /// Builds an accepting result.
    #[must_use]
    pub fn valid(field_name: FieldName, normalized: impl Into<String>) -> Self {
        Self {
            field_name,
            is_valid: true,
            normalized_value: Some(normalized.into()),
            message: None,
        }
    }

    /// Builds a rejecting result.
    #[must_use]
    pub fn invalid(field_name: FieldName, message: impl Into<String>) -> Self {
        Self {
            field_name,
            is_valid: false,
            normalized_value: None,
            message: Some(message.into()),
        }
    }
}
