// Snapshot table
//
// Sparse mapping from entry id to the state captured right after folding
// that entry, taken every Nth fold to bound replay cost. Invariant: a stored
// snapshot equals the fold of all kept entries up to and including its id.

use std::collections::HashMap;

use foldlog_types::EntryId;

pub struct SnapshotTable<S> {
    states: HashMap<EntryId, S>,
    /// Snapshot cadence; 1 snapshots every fold, 0 never.
    every: u64,
    fold_count: u64,
}

impl<S: Clone> SnapshotTable<S> {
    pub fn new(every: u64) -> Self {
        SnapshotTable {
            states: HashMap::new(),
            every,
            fold_count: 0,
        }
    }

    /// Count one fold and capture a snapshot if the cadence says so.
    pub fn record(&mut self, id: &EntryId, state: &S) {
        self.fold_count += 1;
        let due = match self.every {
            0 => false,
            1 => true,
            every => self.fold_count % every == 1,
        };
        if due {
            self.states.insert(id.clone(), state.clone());
        }
    }

    pub fn get(&self, id: &EntryId) -> Option<&S> {
        self.states.get(id)
    }

    pub fn contains(&self, id: &EntryId) -> bool {
        self.states.contains_key(id)
    }

    pub fn remove(&mut self, id: &EntryId) -> Option<S> {
        self.states.remove(id)
    }

    /// Overwrite a snapshot unconditionally. Replay uses this to refresh
    /// stale snapshots inside the replayed range and to re-key the splice
    /// point of a missed-history fallback.
    pub fn force(&mut self, id: EntryId, state: S) {
        self.states.insert(id, state);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(time: u64) -> EntryId {
        EntryId::new(time, "n", 0)
    }

    #[test]
    fn cadence_two_saves_odd_folds() {
        let mut table = SnapshotTable::new(2);
        for time in 1..=6 {
            table.record(&id(time), &time);
        }
        assert!(table.contains(&id(1)));
        assert!(!table.contains(&id(2)));
        assert!(table.contains(&id(3)));
        assert!(table.contains(&id(5)));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn cadence_one_saves_every_fold() {
        let mut table = SnapshotTable::new(1);
        for time in 1..=4 {
            table.record(&id(time), &time);
        }
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn cadence_zero_never_saves() {
        let mut table = SnapshotTable::new(0);
        for time in 1..=4 {
            table.record(&id(time), &time);
        }
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn force_overwrites() {
        let mut table = SnapshotTable::new(1);
        table.record(&id(1), &10);
        table.force(id(1), 99);
        assert_eq!(table.get(&id(1)), Some(&99));
        assert_eq!(table.remove(&id(1)), Some(99));
        assert!(table.remove(&id(1)).is_none());
    }
}
