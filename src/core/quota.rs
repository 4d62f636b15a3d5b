//! Monthly call budget for the metered valuation API.
//!
//! The budget is a single counter persisted through a [`QuotaStore`]. Callers
//! follow a load, consume, call, persist sequence:
//!
//! ```text
//! let state = tracker.load();
//! let (allowed, next) = tracker.try_consume(state);
//! if !allowed { /* stop, do not call the API */ }
//! let outcome = call_the_api().await;
//! tracker.persist(&next)?;   // even when `outcome` failed
//! ```
//!
//! A consumed unit is never refunded when the gated call fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_MAX_QUOTA: u32 = 50;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Quota store I/O failed at {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Quota state could not be encoded: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Quota store backend failed: {0}")]
    Backend(String),
}

/// Remaining calls for one billing period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaState {
    pub remaining: u32,
    /// Billing month as `YYYY-MM` (UTC). Empty for records written before
    /// periods were tracked.
    #[serde(default)]
    pub period: String,
}

impl QuotaState {
    pub fn full(max_quota: u32, period: impl Into<String>) -> Self {
        Self {
            remaining: max_quota,
            period: period.into(),
        }
    }

    /// Returns whether a unit may be spent, and the state after spending it.
    /// An exhausted state is returned unchanged.
    pub fn try_consume(self) -> (bool, Self) {
        if self.remaining == 0 {
            return (false, self);
        }
        let next = Self {
            remaining: self.remaining - 1,
            period: self.period,
        };
        (true, next)
    }
}

/// Durable home of the quota counter.
///
/// Implementations are plain read and overwrite. Two processes sharing one
/// store can lose an update between `read` and `write`; there is no locking.
pub trait QuotaStore: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet.
    fn read(&self) -> Result<Option<QuotaState>, StorageError>;

    fn write(&self, state: &QuotaState) -> Result<(), StorageError>;

    /// Human readable location, used in logs and the `quota` command.
    fn describe(&self) -> String;
}

/// Snapshot of the budget for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaStatus {
    pub remaining: u32,
    pub max_quota: u32,
    pub period: String,
    pub location: String,
}

pub fn period_of(now: DateTime<Utc>) -> String {
    now.format("%Y-%m").to_string()
}

pub struct QuotaTracker {
    store: Box<dyn QuotaStore>,
    max_quota: u32,
}

impl QuotaTracker {
    pub fn new(store: Box<dyn QuotaStore>, max_quota: u32) -> Self {
        Self { store, max_quota }
    }

    pub fn max_quota(&self) -> u32 {
        self.max_quota
    }

    pub fn location(&self) -> String {
        self.store.describe()
    }

    /// Loads the state for the current month. Never fails.
    pub fn load(&self) -> QuotaState {
        self.load_at(Utc::now())
    }

    /// Loads the state as seen at `now`.
    ///
    /// Unreadable or missing state yields a full budget. A stored state from
    /// an earlier month rolls over to a full budget, and a stored count above
    /// `max_quota` is clamped.
    pub fn load_at(&self, now: DateTime<Utc>) -> QuotaState {
        let period = period_of(now);
        let stored = match self.store.read() {
            Ok(Some(state)) => state,
            Ok(None) => {
                debug!("No quota state at {}, starting full", self.store.describe());
                return QuotaState::full(self.max_quota, period);
            }
            Err(e) => {
                debug!("Ignoring unreadable quota state: {}", e);
                return QuotaState::full(self.max_quota, period);
            }
        };

        if stored.period.is_empty() {
            debug!("Adopting legacy quota state into period {}", period);
        } else if stored.period != period {
            info!(
                from = %stored.period,
                to = %period,
                "Quota period rolled over, budget reset"
            );
            return QuotaState::full(self.max_quota, period);
        }

        QuotaState {
            remaining: stored.remaining.min(self.max_quota),
            period,
        }
    }

    pub fn status(&self) -> QuotaStatus {
        self.status_of(self.load())
    }

    fn status_of(&self, state: QuotaState) -> QuotaStatus {
        QuotaStatus {
            remaining: state.remaining,
            max_quota: self.max_quota,
            period: state.period,
            location: self.store.describe(),
        }
    }

    pub fn try_consume(&self, state: QuotaState) -> (bool, QuotaState) {
        let (allowed, next) = state.try_consume();
        debug!(allowed, remaining = next.remaining, "Quota check");
        (allowed, next)
    }

    pub fn persist(&self, state: &QuotaState) -> Result<(), StorageError> {
        self.store.write(state)?;
        debug!(
            "Persisted quota state {:?} to {}",
            state,
            self.store.describe()
        );
        Ok(())
    }

    /// Restores the full budget for the current month and persists it.
    pub fn reset(&self) -> Result<QuotaStatus, StorageError> {
        let state = QuotaState::full(self.max_quota, period_of(Utc::now()));
        self.persist(&state)?;
        Ok(self.status_of(state))
    }
}
