// Retention coordinator
//
// Watches the stream of durable appends and periodically asks the log to
// strip implicit retention tags from entries older than the configured
// horizon, so the log's own garbage collector can reclaim them. Once a sweep
// has been requested, the history-truncated flag stays latched: later
// replays may need the missed-history fallback.

use foldlog_types::{Action, Meta};

/// Request to strip implicit retention from old entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionSweep {
    /// Strip tags from entries added at or before this sequence.
    pub max_added: u64,
}

pub struct RetentionCoordinator {
    clean_every: u64,
    horizon: u64,
    add_calls: u64,
    last_added: u64,
    history_truncated: bool,
}

impl RetentionCoordinator {
    pub fn new(clean_every: u64, horizon: u64) -> Self {
        RetentionCoordinator {
            clean_every: clean_every.max(1),
            horizon,
            add_calls: 0,
            last_added: 0,
            history_truncated: false,
        }
    }

    /// Account for one add notification; returns a sweep request when the
    /// reason-less backlog exceeds the horizon.
    pub fn observe(&mut self, action: &Action, meta: &Meta) -> Option<RetentionSweep> {
        if let Some(added) = meta.added {
            if added > self.last_added {
                self.last_added = added;
            }
        }
        if action.is_processed() || meta.no_auto_reason {
            return None;
        }
        self.add_calls += 1;
        if self.add_calls % self.clean_every == 0 && self.last_added > self.horizon {
            self.history_truncated = true;
            Some(RetentionSweep {
                max_added: self.last_added - self.horizon,
            })
        } else {
            None
        }
    }

    pub fn history_truncated(&self) -> bool {
        self.history_truncated
    }
}
