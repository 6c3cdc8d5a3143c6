// Configuration for the reconciliation engine
//
// This module provides tuning options for snapshot cadence and history
// retention, plus the missed-history callback.

use std::fmt;
use std::sync::Arc;

use foldlog_types::Action;

/// Callback fired when a replay cannot reach any usable snapshot.
pub type MissedHistoryHandler = Arc<dyn Fn(&Action) + Send + Sync>;

/// Configuration for an [`EventStore`](crate::store::EventStore).
#[derive(Clone)]
pub struct StoreConfig {
    /// Snapshot cadence: a snapshot is recorded every Nth fold.
    /// `1` snapshots every fold, `0` disables snapshots.
    pub save_state_every: u64,

    /// How many reason-less entries are kept replayable before the
    /// retention coordinator asks the log to reclaim older ones.
    pub reasonless_history: u64,

    /// How many qualifying appends pass between retention checks.
    pub clean_every: u64,

    /// Called when a replay falls back past the garbage-collection horizon.
    pub on_missed_history: Option<MissedHistoryHandler>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            save_state_every: 50,
            reasonless_history: 1000,
            clean_every: 25,
            on_missed_history: None,
        }
    }
}

impl StoreConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the snapshot cadence
    pub fn with_save_state_every(mut self, every: u64) -> Self {
        self.save_state_every = every;
        self
    }

    /// Set the reason-less history horizon
    pub fn with_reasonless_history(mut self, horizon: u64) -> Self {
        self.reasonless_history = horizon;
        self
    }

    /// Set the retention check interval
    pub fn with_clean_every(mut self, every: u64) -> Self {
        self.clean_every = every;
        self
    }

    /// Set the missed-history callback
    pub fn with_on_missed_history(mut self, handler: MissedHistoryHandler) -> Self {
        self.on_missed_history = Some(handler);
        self
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("save_state_every", &self.save_state_every)
            .field("reasonless_history", &self.reasonless_history)
            .field("clean_every", &self.clean_every)
            .field("on_missed_history", &self.on_missed_history.is_some())
            .finish()
    }
}
