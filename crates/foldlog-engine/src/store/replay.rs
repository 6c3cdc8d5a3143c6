// Replay engine
//
// Rebuilds the materialized state when causal order is violated by arrival
// order: walk the log backward gathering kept, non-retracted entries until a
// usable snapshot (or the start of the log), then re-fold forward. At most
// one replay runs at a time; entries observed meanwhile wait their turn.

use std::collections::HashSet;

use tracing::{debug, warn};

use foldlog_error::StoreResult;
use foldlog_types::{Action, EntryId, Meta};

use super::EventStore;

impl<S: Clone + Send + Sync + 'static> EventStore<S> {
    /// Rebuild state so that the entry at `target` is folded in causal
    /// position.
    pub(super) async fn replay(&self, target: &EntryId) -> StoreResult<()> {
        {
            let mut inner = self.inner.lock();
            debug_assert!(!inner.replaying, "nested replay");
            inner.replaying = true;
        }
        let outcome = self.run_replay(target).await;

        // Settle the guard, then re-process entries that arrived mid-replay
        // in causal order. Entries the replay already folded were evicted
        // from the wait set by replace_state.
        let mut parked: Vec<(Action, Meta)> = {
            let mut inner = self.inner.lock();
            inner.replaying = false;
            inner.wait.drain().map(|(_, pending)| pending).collect()
        };
        outcome?;
        parked.sort_by(|a, b| a.1.id.cmp(&b.1.id));
        for (action, meta) in parked {
            self.process(action, meta).await?;
        }
        Ok(())
    }

    async fn run_replay(&self, target: &EntryId) -> StoreResult<()> {
        let mut ignored: HashSet<EntryId> = HashSet::new();
        let mut buffer: Vec<(Action, EntryId)> = Vec::new();
        let mut target_action: Option<Action> = None;
        let mut collecting = true;
        let mut base: Option<(EntryId, S)> = None;

        self.log
            .each(&mut |action, meta| {
                if let Some(entry_tab) = &meta.tab {
                    if *entry_tab != self.tab_id {
                        return true;
                    }
                }
                // Past the target, the first entry with a live snapshot ends
                // the walk.
                let snapshot = if collecting {
                    None
                } else {
                    self.inner.lock().snapshots.get(&meta.id).cloned()
                };
                match snapshot {
                    None => {
                        if action.is_undo() {
                            if let Some(undone) = action.target_id() {
                                ignored.insert(undone);
                            }
                            return true;
                        }
                        if action.is_control() {
                            return true;
                        }
                        if !ignored.contains(&meta.id) {
                            buffer.push((action.clone(), meta.id.clone()));
                        }
                        if meta.id == *target {
                            target_action = Some(action.clone());
                            collecting = false;
                        }
                        true
                    }
                    Some(state) => {
                        base = Some((meta.id.clone(), state));
                        false
                    }
                }
            })
            .await?;

        if let Some((from, state)) = base {
            debug!(target = %target, from = %from, "replaying from snapshot");
            self.replace_state(state, &buffer, None);
            return Ok(());
        }

        if self.inner.lock().retention.history_truncated() {
            warn!(target = %target, "no snapshot reachable below target, history was truncated");
            if let (Some(handler), Some(action)) =
                (self.config.on_missed_history.as_ref(), target_action.as_ref())
            {
                handler(action);
            }
            // Best effort: splice the target's action in directly below the
            // nearest surviving snapshot above it. Correctness prior to the
            // garbage-collection horizon is lost.
            for index in (0..buffer.len()).rev() {
                let id = buffer[index].1.clone();
                let snapshot = self.inner.lock().snapshots.get(&id).cloned();
                if let Some(state) = snapshot {
                    if let Some(action) = target_action.clone() {
                        let mut spliced = buffer[..index].to_vec();
                        spliced.push((action, target.clone()));
                        self.replace_state(state, &spliced, Some(id));
                        return Ok(());
                    }
                    break;
                }
            }
        }

        debug!(target = %target, "replaying from the initial state");
        self.replace_state(self.initial_state.clone(), &buffer, None);
        Ok(())
    }

    /// Fold `entries` (collected newest-first) oldest-first onto `base` and
    /// install the result as the live state. Snapshots keyed by folded
    /// entries are refreshed in place; `rekey` moves the snapshot of a
    /// missed-history splice point onto the newly folded state.
    fn replace_state(&self, base: S, entries: &[(Action, EntryId)], rekey: Option<EntryId>) {
        let mut inner = self.inner.lock();
        let reducer = inner.reducer.clone();
        let last = entries.last().map(|(_, id)| id.clone());
        let mut state = base;
        for (action, id) in entries.iter().rev() {
            inner.wait.remove(id);
            state = reducer(&state, action);
            match (&rekey, &last) {
                (Some(rekey_id), Some(last_id)) if id == last_id => {
                    inner.snapshots.force(rekey_id.clone(), state.clone());
                }
                _ => {
                    if inner.snapshots.contains(id) {
                        inner.snapshots.force(id.clone(), state.clone());
                    }
                }
            }
        }
        inner.frontier.install(state);
    }
}
