// Frontier tracker
//
// Holds the id of the newest entry already folded into the live state and
// the live state itself. The id only moves causally forward; a replay
// rebuilds the state underneath it without moving it.

use foldlog_types::{is_first_older, EntryId};

pub struct Frontier<S> {
    id: Option<EntryId>,
    state: S,
}

impl<S> Frontier<S> {
    pub fn new(state: S) -> Self {
        Frontier { id: None, state }
    }

    pub fn id(&self) -> Option<&EntryId> {
        self.id.as_ref()
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Is `id` causally newer than everything folded so far?
    pub fn is_newer(&self, id: &EntryId) -> bool {
        is_first_older(self.id.as_ref(), id)
    }

    /// Fold result of an in-order entry: advance the frontier.
    pub fn advance(&mut self, id: EntryId, state: S) {
        debug_assert!(self.is_newer(&id));
        self.id = Some(id);
        self.state = state;
    }

    /// Replay result: install a rebuilt state, leaving the id in place.
    pub fn install(&mut self, state: S) {
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_frontier_is_older_than_everything() {
        let frontier: Frontier<u32> = Frontier::new(0);
        assert!(frontier.id().is_none());
        assert!(frontier.is_newer(&EntryId::new(0, "n", 0)));
    }

    #[test]
    fn advance_moves_the_frontier() {
        let mut frontier = Frontier::new(0u32);
        frontier.advance(EntryId::new(2, "n", 0), 1);
        assert_eq!(frontier.id(), Some(&EntryId::new(2, "n", 0)));
        assert_eq!(*frontier.state(), 1);
        assert!(!frontier.is_newer(&EntryId::new(1, "n", 0)));
        assert!(frontier.is_newer(&EntryId::new(3, "n", 0)));
    }

    #[test]
    fn install_keeps_the_id() {
        let mut frontier = Frontier::new(0u32);
        frontier.advance(EntryId::new(2, "n", 0), 1);
        frontier.install(7);
        assert_eq!(*frontier.state(), 7);
        assert_eq!(frontier.id(), Some(&EntryId::new(2, "n", 0)));
    }
}
