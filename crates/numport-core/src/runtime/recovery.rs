// crates/numport-core/src/runtime/recovery.rs
// ============================================================================
// Module: Numport Error Recovery Manager
// Description: Bounded retry with backoff and per-operation recovery statistics.
// Purpose: Retry plausibly transient failures uniformly across call sites.
// Dependencies: crate::{core, interfaces}, tokio, tracing, thiserror
// ============================================================================

//! ## Overview
//! [`RecoveryManager::with_recovery`] runs an async operation up to the
//! policy's attempt budget, sleeping between tries according to the backoff
//! schedule. Every try is recorded as a [`RecoveryAttempt`]. Failures the
//! operation classifies as non-transient stop immediately with
//! [`RecoveryError::Fatal`]; exhausting the budget yields
//! [`RecoveryError::Exhausted`] carrying the last error. In-flight retries are
//! not cancellable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::core::AdminCapability;
use crate::core::Clock;
use crate::core::Timestamp;
use crate::interfaces::Recoverable;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default attempt budget.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default first backoff delay in milliseconds.
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 250;
/// Default backoff ceiling in milliseconds.
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 4_000;
/// Default exponential multiplier.
pub const DEFAULT_BACKOFF_MULTIPLIER: u32 = 2;
/// Default number of attempts kept in the history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 500;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackoffConfig {
    /// Constant delay.
    Fixed {
        /// Delay in milliseconds.
        delay_ms: u64,
    },
    /// Delay grows by a fixed step.
    Linear {
        /// First delay in milliseconds.
        initial_ms: u64,
        /// Increment per attempt in milliseconds.
        step_ms: u64,
        /// Ceiling in milliseconds.
        max_ms: u64,
    },
    /// Delay multiplies per attempt.
    Exponential {
        /// First delay in milliseconds.
        initial_ms: u64,
        /// Multiplier per attempt.
        multiplier: u32,
        /// Ceiling in milliseconds.
        max_ms: u64,
    },
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self::Exponential {
            initial_ms: DEFAULT_INITIAL_BACKOFF_MS,
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_ms: DEFAULT_MAX_BACKOFF_MS,
        }
    }
}

impl BackoffConfig {
    /// Returns the delay after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let index = attempt.saturating_sub(1);
        let millis = match *self {
            Self::Fixed {
                delay_ms,
            } => delay_ms,
            Self::Linear {
                initial_ms,
                step_ms,
                max_ms,
            } => initial_ms.saturating_add(step_ms.saturating_mul(u64::from(index))).min(max_ms),
            Self::Exponential {
                initial_ms,
                multiplier,
                max_ms,
            } => {
                let factor = u64::from(multiplier.max(1)).saturating_pow(index);
                initial_ms.saturating_mul(factor).min(max_ms)
            }
        };
        Duration::from_millis(millis)
    }
}

/// Attempt budget plus backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum tries, including the first.
    pub max_attempts: u32,
    /// Delay schedule between tries.
    pub backoff: BackoffConfig,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: BackoffConfig::default(),
        }
    }
}

impl RetryPolicy {
    /// Returns a policy that never retries.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff: BackoffConfig::Fixed {
                delay_ms: 0,
            },
        }
    }
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// One try of a wrapped operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryAttempt {
    /// Operation label.
    pub operation_name: String,
    /// Try number, starting at 1.
    pub attempt_number: u32,
    /// Whether the try succeeded.
    pub succeeded: bool,
    /// Error text for failed tries.
    pub error: Option<String>,
    /// Time the try finished.
    pub timestamp: Timestamp,
}

/// Aggregate counters for one operation label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryStats {
    /// Tries made.
    pub attempts: u64,
    /// Invocations that returned `Ok`.
    pub successes: u64,
    /// Tries that failed.
    pub failures: u64,
    /// Invocations that succeeded after at least one failed try.
    pub recovered: u64,
    /// Invocations that ended in an error.
    pub fatal: u64,
}

/// Snapshot for the operational dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryDashboard {
    /// Counters per operation label.
    pub stats: BTreeMap<String, RecoveryStats>,
    /// Most recent attempts, oldest first.
    pub recent_attempts: Vec<RecoveryAttempt>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Terminal failure of a wrapped operation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecoveryError<E> {
    /// Every try failed with a transient error.
    #[error("{operation} failed after {attempts} attempts: {last}")]
    Exhausted {
        /// Operation label.
        operation: String,
        /// Tries made.
        attempts: u32,
        /// Error from the final try.
        last: E,
    },
    /// A try failed with a non-transient error.
    #[error("{operation} failed permanently on attempt {attempt}: {error}")]
    Fatal {
        /// Operation label.
        operation: String,
        /// Try that failed.
        attempt: u32,
        /// Non-transient error.
        error: E,
    },
}

impl<E> RecoveryError<E> {
    /// Returns the number of tries made.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted {
                attempts, ..
            } => *attempts,
            Self::Fatal {
                attempt, ..
            } => *attempt,
        }
    }

    /// Returns the underlying error.
    #[must_use]
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted {
                last, ..
            } => last,
            Self::Fatal {
                error, ..
            } => error,
        }
    }

    /// Returns the underlying error by reference.
    #[must_use]
    pub const fn inner(&self) -> &E {
        match self {
            Self::Exhausted {
                last, ..
            } => last,
            Self::Fatal {
                error, ..
            } => error,
        }
    }
}

// ============================================================================
// SECTION: Recovery Manager
// ============================================================================

/// History and counters guarded by the manager mutex.
#[derive(Debug, Default)]
struct RecoveryState {
    /// Recent attempts, oldest first.
    history: VecDeque<RecoveryAttempt>,
    /// Counters per operation label.
    stats: BTreeMap<String, RecoveryStats>,
}

/// Centralized retry wrapper.
pub struct RecoveryManager {
    /// Retry policy.
    policy: RetryPolicy,
    /// Time source for attempt records.
    clock: Arc<dyn Clock>,
    /// Maximum attempts kept in the history.
    history_capacity: usize,
    /// History and counters.
    state: Mutex<RecoveryState>,
}

impl RecoveryManager {
    /// Creates a manager with `policy`.
    #[must_use]
    pub fn new(policy: RetryPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            state: Mutex::new(RecoveryState::default()),
        }
    }

    /// Overrides the history capacity.
    #[must_use]
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        self
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `operation` with bounded retries.
    ///
    /// # Errors
    ///
    /// Returns [`RecoveryError::Fatal`] on the first non-transient failure and
    /// [`RecoveryError::Exhausted`] when every try fails transiently.
    pub async fn with_recovery<T, E, F, Fut>(
        &self,
        operation: &str,
        mut run: F,
    ) -> Result<T, RecoveryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Recoverable + fmt::Display,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0_u32;
        loop {
            attempt += 1;
            debug!(operation, attempt, "recovery attempt started");
            match run().await {
                Ok(value) => {
                    self.record(operation, attempt, None);
                    self.finish(operation, true, attempt > 1);
                    if attempt > 1 {
                        info!(operation, attempt, "operation recovered");
                    }
                    return Ok(value);
                }
                Err(error) => {
                    self.record(operation, attempt, Some(error.to_string()));
                    if !error.is_transient() {
                        warn!(operation, attempt, error = %error, "operation failed permanently");
                        self.finish(operation, false, false);
                        return Err(RecoveryError::Fatal {
                            operation: operation.to_string(),
                            attempt,
                            error,
                        });
                    }
                    if attempt >= max_attempts {
                        warn!(operation, attempt, error = %error, "retry budget exhausted");
                        self.finish(operation, false, false);
                        return Err(RecoveryError::Exhausted {
                            operation: operation.to_string(),
                            attempts: attempt,
                            last: error,
                        });
                    }
                    let delay = self.policy.backoff.delay_for_attempt(attempt);
                    warn!(
                        operation,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Records one try.
    fn record(&self, operation: &str, attempt: u32, error: Option<String>) {
        let entry = RecoveryAttempt {
            operation_name: operation.to_string(),
            attempt_number: attempt,
            succeeded: error.is_none(),
            error,
            timestamp: self.clock.now(),
        };
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let stats = state.stats.entry(operation.to_string()).or_default();
        stats.attempts += 1;
        if !entry.succeeded {
            stats.failures += 1;
        }
        if state.history.len() >= self.history_capacity {
            state.history.pop_front();
        }
        state.history.push_back(entry);
    }

    /// Records the end of one invocation.
    fn finish(&self, operation: &str, succeeded: bool, recovered: bool) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let stats = state.stats.entry(operation.to_string()).or_default();
        if succeeded {
            stats.successes += 1;
            if recovered {
                stats.recovered += 1;
            }
        } else {
            stats.fatal += 1;
        }
    }

    /// Returns the counters for `operation`.
    #[must_use]
    pub fn stats(&self, operation: &str) -> RecoveryStats {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.stats.get(operation).copied().unwrap_or_default()
    }

    /// Returns the recorded attempts for `operation`, oldest first.
    #[must_use]
    pub fn attempts_for(&self, operation: &str) -> Vec<RecoveryAttempt> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.history.iter().filter(|entry| entry.operation_name == operation).cloned().collect()
    }

    /// Returns the operational dashboard snapshot.
    #[must_use]
    pub fn dashboard(&self, _admin: &AdminCapability) -> RecoveryDashboard {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        RecoveryDashboard {
            stats: state.stats.clone(),
            recent_attempts: state.history.iter().cloned().collect(),
        }
    }
}
