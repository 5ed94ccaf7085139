// crates/numport-core/src/core/network.rs
// ============================================================================
// Module: Numport Operator Catalog
// Description: Fixed operator set, SIM types, and request priorities.
// Purpose: Provide closed enums for the form's selection fields.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The operator set is closed: free-text operator names are parsed into
//! [`Network`] and anything unrecognized is rejected by the validators.
//! Parsing ignores case, spaces, hyphens, and underscores so that "Cell C",
//! "cell-c", and "CELLC" resolve to the same operator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Network Operators
// ============================================================================

/// South African mobile network operators supported by the portal.
///
/// # Invariants
/// - Variants are stable for serialization and compatibility-matrix lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Network {
    /// Vodacom.
    Vodacom,
    /// MTN.
    Mtn,
    /// Cell C.
    CellC,
    /// Telkom Mobile.
    Telkom,
    /// Rain.
    Rain,
    /// MakroCall (MVNO).
    MakroCall,
}

impl Network {
    /// All supported operators in display order.
    pub const ALL: [Self; 6] =
        [Self::Vodacom, Self::Mtn, Self::CellC, Self::Telkom, Self::Rain, Self::MakroCall];

    /// Returns the customer-facing operator name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Vodacom => "Vodacom",
            Self::Mtn => "MTN",
            Self::CellC => "Cell C",
            Self::Telkom => "Telkom",
            Self::Rain => "Rain",
            Self::MakroCall => "MakroCall",
        }
    }

    /// Parses an operator name, ignoring case and separators.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let folded: String = value
            .chars()
            .filter(|ch| !ch.is_whitespace() && *ch != '-' && *ch != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "vodacom" => Some(Self::Vodacom),
            "mtn" => Some(Self::Mtn),
            "cellc" => Some(Self::CellC),
            "telkom" | "telkommobile" => Some(Self::Telkom),
            "rain" => Some(Self::Rain),
            "makrocall" => Some(Self::MakroCall),
            _ => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// SECTION: SIM Type
// ============================================================================

/// SIM form factor requested for the ported number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimType {
    /// Physical SIM card.
    #[default]
    Physical,
    /// Embedded SIM profile.
    Esim,
}

impl SimType {
    /// Parses a SIM type label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "physical" => Some(Self::Physical),
            "esim" | "e-sim" => Some(Self::Esim),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Priority
// ============================================================================

/// Processing priority requested for the port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Standard processing.
    #[default]
    Normal,
    /// Expedited processing.
    High,
    /// Same-day processing where the operators allow it.
    Urgent,
}

impl Priority {
    /// Parses a priority label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "normal" => Some(Self::Normal),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }
}
