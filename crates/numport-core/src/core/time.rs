// crates/numport-core/src/core/time.rs
// ============================================================================
// Module: Numport Time Model
// Description: Canonical timestamp representation and clock seam.
// Purpose: Keep validators and audit records deterministic under test.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Numport records explicit timestamps on audit entries, recovery attempts,
//! and signatures. Runtime components never read wall-clock time directly;
//! they ask a [`Clock`], so tests can pin "today" when checking age rules and
//! advance time when exercising rate-limit windows.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use serde::Deserialize;
use serde::Serialize;
use time::Date;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Milliseconds per second.
const MILLIS_PER_SECOND: i64 = 1_000;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Canonical timestamp in unix epoch milliseconds (UTC).
///
/// # Invariants
/// - Values are supplied by a [`Clock`] or parsed from RFC 3339 input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Returns a timestamp shifted forward by `millis`, saturating on overflow.
    #[must_use]
    pub const fn saturating_add_millis(self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Returns the elapsed milliseconds since `earlier` (zero when `earlier` is later).
    #[must_use]
    pub const fn millis_since(self, earlier: Self) -> i64 {
        let delta = self.0.saturating_sub(earlier.0);
        if delta < 0 { 0 } else { delta }
    }

    /// Parses an RFC 3339 timestamp.
    #[must_use]
    pub fn parse_rfc3339(value: &str) -> Option<Self> {
        let parsed = OffsetDateTime::parse(value, &Rfc3339).ok()?;
        Some(Self::from_offset_datetime(parsed))
    }

    /// Converts an [`OffsetDateTime`] into a timestamp.
    #[must_use]
    pub fn from_offset_datetime(value: OffsetDateTime) -> Self {
        let nanos = value.unix_timestamp_nanos() / 1_000_000;
        Self(i64::try_from(nanos).unwrap_or(i64::MAX))
    }

    /// Returns the timestamp as an [`OffsetDateTime`] when it is representable.
    #[must_use]
    pub fn to_offset_datetime(self) -> Option<OffsetDateTime> {
        let nanos = i128::from(self.0) * 1_000_000;
        OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
    }

    /// Returns the UTC calendar date for the timestamp.
    #[must_use]
    pub fn date(self) -> Option<Date> {
        self.to_offset_datetime().map(OffsetDateTime::date)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_offset_datetime().and_then(|value| value.format(&Rfc3339).ok()) {
            Some(text) => f.write_str(&text),
            None => write!(f, "{}ms", self.0),
        }
    }
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Time source used by validators, the sanitizer, and the recovery manager.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> Timestamp;

    /// Returns the current UTC calendar date.
    fn today(&self) -> Date {
        self.now().date().unwrap_or(Date::MIN)
    }
}

/// Wall-clock time source.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_offset_datetime(OffsetDateTime::now_utc())
    }
}

/// Manually advanced clock for tests and replay.
#[derive(Debug, Default)]
pub struct FixedClock {
    /// Current time in unix epoch milliseconds.
    millis: AtomicI64,
}

impl FixedClock {
    /// Creates a clock pinned at `now`.
    #[must_use]
    pub const fn new(now: Timestamp) -> Self {
        Self {
            millis: AtomicI64::new(now.as_unix_millis()),
        }
    }

    /// Creates a clock pinned at midnight UTC of `date`.
    #[must_use]
    pub fn at_date(date: Date) -> Self {
        let seconds = date.midnight().assume_utc().unix_timestamp();
        Self::new(Timestamp::from_unix_millis(seconds.saturating_mul(MILLIS_PER_SECOND)))
    }

    /// Advances the clock by `millis`.
    pub fn advance_millis(&self, millis: i64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    /// Sets the clock to `now`.
    pub fn set(&self, now: Timestamp) {
        self.millis.store(now.as_unix_millis(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_unix_millis(self.millis.load(Ordering::SeqCst))
    }
}
