// crates/numport-core/src/runtime/audit_log.rs
// ============================================================================
// Module: Numport Security Audit Log
// Description: Bounded in-process audit ring buffer and JSON-lines sinks.
// Purpose: Keep sanitizer and upload decisions visible to administrators.
// Dependencies: crate::{core, interfaces}, serde_json
// ============================================================================

//! ## Overview
//! The [`AuditLog`] keeps the most recent security audit entries in a ring
//! buffer. Entries are optionally mirrored to an [`AuditSink`] as JSON lines.
//! Reading the buffer requires an [`AdminCapability`]; writers need nothing.
//!
//! Security posture: entries never contain the raw rejected input, only a
//! redacted description.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use serde::Serialize;

use crate::core::AdminCapability;
use crate::core::RiskLevel;
use crate::core::SecurityAuditEntry;
use crate::interfaces::AuditSink;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default number of entries retained by the ring buffer.
pub const DEFAULT_AUDIT_CAPACITY: usize = 1_000;

// ============================================================================
// SECTION: Audit Log
// ============================================================================

/// Per-risk counts over the retained entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    /// Retained entries.
    pub total: usize,
    /// Entries classified low risk.
    pub low: usize,
    /// Entries classified medium risk.
    pub medium: usize,
    /// Entries classified high risk.
    pub high: usize,
    /// Entries evicted since the log was created.
    pub evicted: u64,
}

/// Ring buffer state guarded by the log mutex.
#[derive(Debug, Default)]
struct AuditRing {
    /// Retained entries, oldest first.
    entries: VecDeque<SecurityAuditEntry>,
    /// Entries dropped to make room.
    evicted: u64,
}

/// Process-local, append-only security audit log.
pub struct AuditLog {
    /// Maximum retained entries.
    capacity: usize,
    /// Ring buffer.
    ring: Mutex<AuditRing>,
    /// Optional mirror sink.
    sink: Option<Arc<dyn AuditSink>>,
}

impl AuditLog {
    /// Creates an audit log retaining at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            ring: Mutex::new(AuditRing::default()),
            sink: None,
        }
    }

    /// Mirrors every recorded entry to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Appends an entry, evicting the oldest when full.
    pub fn record(&self, entry: SecurityAuditEntry) {
        if let Some(sink) = &self.sink {
            sink.record(&entry);
        }
        let mut ring = self.ring.lock().unwrap_or_else(PoisonError::into_inner);
        if ring.entries.len() >= self.capacity {
            ring.entries.pop_front();
            ring.evicted = ring.evicted.saturating_add(1);
        }
        ring.entries.push_back(entry);
    }

    /// Returns the number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner).entries.len()
    }

    /// Returns true when no entries are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the retained entries, oldest first.
    #[must_use]
    pub fn entries(&self, _admin: &AdminCapability) -> Vec<SecurityAuditEntry> {
        let ring = self.ring.lock().unwrap_or_else(PoisonError::into_inner);
        ring.entries.iter().cloned().collect()
    }

    /// Returns retained entries at or above `minimum` risk, oldest first.
    #[must_use]
    pub fn entries_at_or_above(
        &self,
        _admin: &AdminCapability,
        minimum: RiskLevel,
    ) -> Vec<SecurityAuditEntry> {
        let ring = self.ring.lock().unwrap_or_else(PoisonError::into_inner);
        ring.entries.iter().filter(|entry| entry.risk_level >= minimum).cloned().collect()
    }

    /// Summarizes the retained entries by risk.
    #[must_use]
    pub fn summary(&self, _admin: &AdminCapability) -> AuditSummary {
        let ring = self.ring.lock().unwrap_or_else(PoisonError::into_inner);
        let mut summary = AuditSummary {
            total: ring.entries.len(),
            evicted: ring.evicted,
            ..AuditSummary::default()
        };
        for entry in &ring.entries {
            match entry.risk_level {
                RiskLevel::Low => summary.low += 1,
                RiskLevel::Medium => summary.medium += 1,
                RiskLevel::High => summary.high += 1,
            }
        }
        summary
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink that writes JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, entry: &SecurityAuditEntry) {
        if let Ok(payload) = serde_json::to_string(entry) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, entry: &SecurityAuditEntry) {
        if let Ok(payload) = serde_json::to_string(entry)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}
