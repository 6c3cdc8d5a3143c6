// Sync promise registry
//
// Correlates locally dispatched sync entries with the confirmation or undo
// notifications that settle them. Each pending id resolves or rejects
// exactly once; dropped tickets are settled into the void.

use std::collections::HashMap;

use thiserror::Error;
use tokio::sync::oneshot;

use foldlog_types::{Action, EntryId};

/// Rejection of a sync dispatch, carrying the undone action and the
/// server-supplied reason.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("server undid action: {reason}")]
pub struct SyncRejected {
    pub action: Action,
    pub reason: String,
}

/// Outcome delivered to the holder of a [`SyncTicket`].
pub type SyncOutcome = Result<(), SyncRejected>;

/// Handle returned by a sync dispatch: the appended metadata plus a
/// receiver settled when the server confirms or undoes the entry.
pub struct SyncTicket {
    pub meta: foldlog_types::Meta,
    pub done: oneshot::Receiver<SyncOutcome>,
}

pub struct SyncRegistry {
    pending: HashMap<EntryId, oneshot::Sender<SyncOutcome>>,
}

impl SyncRegistry {
    pub fn new() -> Self {
        SyncRegistry {
            pending: HashMap::new(),
        }
    }

    pub fn register(&mut self, id: EntryId) -> oneshot::Receiver<SyncOutcome> {
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);
        rx
    }

    /// Resolve a pending request. Returns whether one was registered.
    pub fn resolve(&mut self, id: &EntryId) -> bool {
        match self.pending.remove(id) {
            Some(tx) => {
                let _ = tx.send(Ok(()));
                true
            }
            None => false,
        }
    }

    /// Reject a pending request. Returns whether one was registered.
    pub fn reject(&mut self, id: &EntryId, rejection: SyncRejected) -> bool {
        match self.pending.remove(id) {
            Some(tx) => {
                let _ = tx.send(Err(rejection));
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(time: u64) -> EntryId {
        EntryId::new(time, "n", 0)
    }

    #[test]
    fn resolves_exactly_once() {
        let mut registry = SyncRegistry::new();
        let mut rx = registry.register(id(1));
        assert!(registry.resolve(&id(1)));
        assert_eq!(rx.try_recv().unwrap(), Ok(()));
        assert!(!registry.resolve(&id(1)));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn rejects_with_the_undone_action() {
        let mut registry = SyncRegistry::new();
        let mut rx = registry.register(id(2));
        let rejection = SyncRejected {
            action: Action::bare("ADD"),
            reason: "denied".into(),
        };
        assert!(registry.reject(&id(2), rejection.clone()));
        assert_eq!(rx.try_recv().unwrap(), Err(rejection));
    }

    #[test]
    fn settling_unknown_ids_is_harmless() {
        let mut registry = SyncRegistry::new();
        assert!(!registry.resolve(&id(3)));
        assert!(!registry.reject(
            &id(3),
            SyncRejected {
                action: Action::bare("ADD"),
                reason: "denied".into(),
            }
        ));
    }

    #[test]
    fn settles_into_the_void_when_ticket_dropped() {
        let mut registry = SyncRegistry::new();
        let rx = registry.register(id(4));
        drop(rx);
        assert!(registry.resolve(&id(4)));
    }
}
