// crates/numport-core/src/runtime/compatibility.rs
// ============================================================================
// Module: Numport Network Compatibility Resolver
// Description: Directional operator compatibility matrix and lookups.
// Purpose: Tell the holder whether a direct port is possible and what it takes.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! The matrix is keyed by `(from, to)` and is directional: an entry for A to B
//! says nothing about B to A. Pairs without an entry are incompatible. An
//! incompatible result always carries at least one additional step so the
//! holder is never told "incompatible" without a way forward.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::Network;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Estimated time label used for incompatible pairs.
pub const NOT_APPLICABLE_ETA: &str = "N/A";

/// Step returned for pairs with no matrix entry.
const NO_ROUTE_STEP: &str = "Contact support to arrange a manual port between these operators";

/// Compatibility verdict for one operator pair.
///
/// # Invariants
/// - `compatible == false` implies `additional_steps` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkCompatibilityEntry {
    /// Operator currently holding the number.
    pub from_network: Network,
    /// Operator receiving the number.
    pub to_network: Network,
    /// Whether a direct port is supported.
    pub compatible: bool,
    /// Estimated processing time, or `N/A`.
    pub estimated_time: String,
    /// Extra steps the holder must complete.
    pub additional_steps: Vec<String>,
}

/// One directional matrix row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompatibilityRule {
    /// Source operator.
    pub from: Network,
    /// Destination operator.
    pub to: Network,
    /// Whether a direct port is supported.
    pub compatible: bool,
    /// Estimated processing time.
    pub estimated_time: &'static str,
    /// Extra steps the holder must complete.
    pub additional_steps: &'static [&'static str],
}

// ============================================================================
// SECTION: Matrix
// ============================================================================

/// Builds a compatible rule with no extra steps.
const fn direct(from: Network, to: Network, estimated_time: &'static str) -> CompatibilityRule {
    CompatibilityRule {
        from,
        to,
        compatible: true,
        estimated_time,
        additional_steps: &[],
    }
}

/// Steps for any port into Rain.
const INTO_RAIN_STEPS: &[&str] =
    &["Rain does not accept ported voice numbers; request a new Rain number instead"];
/// Steps for any port out of Rain.
const OUT_OF_RAIN_STEPS: &[&str] =
    &["Request a porting authorisation code from Rain before submitting"];
/// Steps for any port into MakroCall.
const INTO_MAKROCALL_STEPS: &[&str] = &[
    "Port the number to MTN first",
    "Request MakroCall activation once the MTN port completes",
];

/// Builds a rule for a port into Rain.
const fn into_rain(from: Network) -> CompatibilityRule {
    CompatibilityRule {
        from,
        to: Network::Rain,
        compatible: false,
        estimated_time: NOT_APPLICABLE_ETA,
        additional_steps: INTO_RAIN_STEPS,
    }
}

/// Builds a rule for a port out of Rain.
const fn out_of_rain(to: Network) -> CompatibilityRule {
    CompatibilityRule {
        from: Network::Rain,
        to,
        compatible: true,
        estimated_time: "5-7 business days",
        additional_steps: OUT_OF_RAIN_STEPS,
    }
}

/// Builds a rule for a port into MakroCall.
const fn into_makrocall(from: Network) -> CompatibilityRule {
    CompatibilityRule {
        from,
        to: Network::MakroCall,
        compatible: false,
        estimated_time: NOT_APPLICABLE_ETA,
        additional_steps: INTO_MAKROCALL_STEPS,
    }
}

/// Standard operator matrix.
pub const STANDARD_MATRIX: &[CompatibilityRule] = &[
    direct(Network::Mtn, Network::Vodacom, "2-3 business days"),
    direct(Network::Vodacom, Network::Mtn, "2-3 business days"),
    direct(Network::Vodacom, Network::CellC, "3-5 business days"),
    direct(Network::CellC, Network::Vodacom, "3-5 business days"),
    direct(Network::Mtn, Network::CellC, "3-5 business days"),
    direct(Network::CellC, Network::Mtn, "3-5 business days"),
    direct(Network::Vodacom, Network::Telkom, "3-5 business days"),
    direct(Network::Mtn, Network::Telkom, "3-5 business days"),
    direct(Network::CellC, Network::Telkom, "3-5 business days"),
    direct(Network::Telkom, Network::Vodacom, "3-5 business days"),
    direct(Network::Telkom, Network::Mtn, "3-5 business days"),
    direct(Network::Telkom, Network::CellC, "3-5 business days"),
    direct(Network::MakroCall, Network::Mtn, "1-2 business days"),
    out_of_rain(Network::Vodacom),
    out_of_rain(Network::Mtn),
    out_of_rain(Network::CellC),
    out_of_rain(Network::Telkom),
    into_rain(Network::Vodacom),
    into_rain(Network::Mtn),
    into_rain(Network::CellC),
    into_rain(Network::Telkom),
    into_rain(Network::MakroCall),
    into_makrocall(Network::Vodacom),
    into_makrocall(Network::Mtn),
    into_makrocall(Network::CellC),
    into_makrocall(Network::Telkom),
    into_makrocall(Network::Rain),
];

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Resolves operator pairs against a static matrix.
#[derive(Debug, Clone, Copy)]
pub struct CompatibilityResolver {
    /// Matrix rows.
    rules: &'static [CompatibilityRule],
}

impl Default for CompatibilityResolver {
    fn default() -> Self {
        Self::standard()
    }
}

impl CompatibilityResolver {
    /// Creates a resolver over the standard matrix.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            rules: STANDARD_MATRIX,
        }
    }

    /// Creates a resolver over a custom matrix.
    #[must_use]
    pub const fn with_rules(rules: &'static [CompatibilityRule]) -> Self {
        Self {
            rules,
        }
    }

    /// Resolves the `(from, to)` pair.
    #[must_use]
    pub fn resolve(&self, from: Network, to: Network) -> NetworkCompatibilityEntry {
        if from == to {
            return NetworkCompatibilityEntry {
                from_network: from,
                to_network: to,
                compatible: false,
                estimated_time: NOT_APPLICABLE_ETA.to_string(),
                additional_steps: vec![format!(
                    "No port needed: the number is already on {}",
                    from.display_name()
                )],
            };
        }
        let rule = self.rules.iter().find(|rule| rule.from == from && rule.to == to);
        let mut entry = rule.map_or_else(
            || NetworkCompatibilityEntry {
                from_network: from,
                to_network: to,
                compatible: false,
                estimated_time: NOT_APPLICABLE_ETA.to_string(),
                additional_steps: Vec::new(),
            },
            |rule| NetworkCompatibilityEntry {
                from_network: from,
                to_network: to,
                compatible: rule.compatible,
                estimated_time: rule.estimated_time.to_string(),
                additional_steps: rule.additional_steps.iter().map(ToString::to_string).collect(),
            },
        );
        if !entry.compatible && entry.additional_steps.is_empty() {
            entry.additional_steps.push(NO_ROUTE_STEP.to_string());
        }
        entry
    }
}
