// crates/numport-core/src/core/events.rs
// ============================================================================
// Module: Numport Change Events
// Description: Backend change-stream payloads and the tracked-field update view.
// Purpose: Decode real-time row changes into typed remote updates.
// Dependencies: crate::core::{identifiers, request}, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The backend pushes `{eventType, table, old, new}` payloads for rows owned by
//! the subscribed user. Only `UPDATE` events on the porting table are decoded
//! into a [`RemoteUpdate`]; the engine tracks `status`,
//! `progress_percentage`, `npc_reference`, and an optional `sequence`.
//! Security posture: payloads are untrusted and decoding fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::NpcReference;
use crate::core::identifiers::RequestId;
use crate::core::identifiers::UserId;
use crate::core::request::PortingStatus;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Backend table holding porting requests.
pub const PORTING_REQUESTS_TABLE: &str = "porting_requests";

// ============================================================================
// SECTION: Change Events
// ============================================================================

/// Row change kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeEventType {
    /// Row inserted.
    Insert,
    /// Row updated.
    Update,
    /// Row deleted.
    Delete,
}

/// Raw change-stream payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// Change kind.
    pub event_type: ChangeEventType,
    /// Table the row belongs to.
    pub table: String,
    /// Row before the change.
    #[serde(default)]
    pub old: Option<Value>,
    /// Row after the change.
    #[serde(default)]
    pub new: Option<Value>,
}

impl ChangeEvent {
    /// Builds an `UPDATE` event for the porting table.
    #[must_use]
    pub fn update(old: Option<Value>, new: Value) -> Self {
        Self {
            event_type: ChangeEventType::Update,
            table: PORTING_REQUESTS_TABLE.to_string(),
            old,
            new: Some(new),
        }
    }

    /// Returns true when the event targets the porting table.
    #[must_use]
    pub fn is_porting_row(&self) -> bool {
        self.table == PORTING_REQUESTS_TABLE
    }
}

// ============================================================================
// SECTION: Remote Updates
// ============================================================================

/// Tracked-field view of a porting row after an `UPDATE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUpdate {
    /// Request the row belongs to.
    pub request_id: RequestId,
    /// Owner of the row.
    pub user_id: UserId,
    /// New status, when present.
    pub status: Option<PortingStatus>,
    /// New progress, when present (unclamped so regressions and overflow are visible).
    pub progress_percentage: Option<i64>,
    /// Clearinghouse reference, when present.
    pub npc_reference: Option<NpcReference>,
    /// Server-side emission sequence, when the backend provides one.
    pub sequence: Option<u64>,
}

/// Errors raised while decoding a change row.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventDecodeError {
    /// The event carried no `new` row.
    #[error("change event has no new row")]
    MissingRow,
    /// A required column is missing or has the wrong type.
    #[error("change row column {0} is missing or malformed")]
    Column(&'static str),
    /// The status column holds an unknown label.
    #[error("change row has unknown status {0}")]
    UnknownStatus(String),
}

impl RemoteUpdate {
    /// Decodes the tracked fields from an event's `new` row.
    ///
    /// # Errors
    ///
    /// Returns [`EventDecodeError`] when required columns are missing or malformed.
    pub fn from_event(event: &ChangeEvent) -> Result<Self, EventDecodeError> {
        let row = event.new.as_ref().ok_or(EventDecodeError::MissingRow)?;
        Self::from_row(row)
    }

    /// Decodes the tracked fields from a row object.
    ///
    /// # Errors
    ///
    /// Returns [`EventDecodeError`] when required columns are missing or malformed.
    pub fn from_row(row: &Value) -> Result<Self, EventDecodeError> {
        let request_id = required_str(row, "id")?;
        let user_id = required_str(row, "user_id")?;
        let status = match optional(row, "status") {
            None => None,
            Some(value) => {
                let label = value.as_str().ok_or(EventDecodeError::Column("status"))?;
                Some(
                    PortingStatus::parse(label)
                        .ok_or_else(|| EventDecodeError::UnknownStatus(label.to_string()))?,
                )
            }
        };
        let progress_percentage = match optional(row, "progress_percentage") {
            None => None,
            Some(value) => {
                Some(value.as_i64().ok_or(EventDecodeError::Column("progress_percentage"))?)
            }
        };
        let npc_reference = match optional(row, "npc_reference") {
            None => None,
            Some(value) => Some(NpcReference::new(
                value.as_str().ok_or(EventDecodeError::Column("npc_reference"))?,
            )),
        };
        let sequence = match optional(row, "sequence") {
            None => None,
            Some(value) => Some(value.as_u64().ok_or(EventDecodeError::Column("sequence"))?),
        };
        Ok(Self {
            request_id: RequestId::new(request_id),
            user_id: UserId::new(user_id),
            status,
            progress_percentage,
            npc_reference,
            sequence,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns a non-null column value.
fn optional<'a>(row: &'a Value, column: &str) -> Option<&'a Value> {
    row.get(column).filter(|value| !value.is_null())
}

/// Returns a required string column.
fn required_str<'a>(row: &'a Value, column: &'static str) -> Result<&'a str, EventDecodeError> {
    optional(row, column).and_then(Value::as_str).ok_or(EventDecodeError::Column(column))
}
