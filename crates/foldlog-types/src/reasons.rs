// Retention reason tags
//
// A log entry stays alive for as long as its reason set is non-empty. The
// engine manages a handful of well-known tags; applications are free to add
// their own.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Well-known retention tags used by the engine.
pub mod tag {
    /// Implicit retention keeping ordinary entries replayable.
    pub const TIME_TRAVEL: &str = "time-travel";

    /// Pins an out-of-order entry for the duration of its replay.
    pub const REPLAY: &str = "replay";

    /// Entry awaits a remote confirmation.
    pub const SYNCING: &str = "syncing";

    /// Pins an undo marker until its target has been looked up.
    pub const UNDO_LOADING: &str = "undo-loading";

    /// Tab-scoped retention tag for locally dispatched entries.
    pub fn time_travel_tab(tab: &str) -> String {
        format!("{}-tab:{}", TIME_TRAVEL, tab)
    }
}

/// Set of retention-tag strings attached to an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reasons(BTreeSet<String>);

impl Reasons {
    pub fn new() -> Self {
        Reasons::default()
    }

    /// Single-tag convenience constructor.
    pub fn only(tag: impl Into<String>) -> Self {
        let mut reasons = Reasons::new();
        reasons.add(tag);
        reasons
    }

    pub fn add(&mut self, tag: impl Into<String>) {
        self.0.insert(tag.into());
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        self.0.remove(tag)
    }

    pub fn has(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Copy of this set with one tag removed.
    pub fn without(&self, tag: &str) -> Reasons {
        let mut copy = self.clone();
        copy.remove(tag);
        copy
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<T: Into<String>> FromIterator<T> for Reasons {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Reasons(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_operations() {
        let mut reasons = Reasons::new();
        assert!(reasons.is_empty());
        reasons.add(tag::TIME_TRAVEL);
        reasons.add(tag::SYNCING);
        reasons.add(tag::SYNCING);
        assert_eq!(reasons.len(), 2);
        assert!(reasons.has(tag::SYNCING));
        assert!(reasons.remove(tag::SYNCING));
        assert!(!reasons.remove(tag::SYNCING));
        assert!(!reasons.has(tag::SYNCING));
    }

    #[test]
    fn without_leaves_original_untouched() {
        let reasons: Reasons = [tag::SYNCING, "custom"].into_iter().collect();
        let stripped = reasons.without(tag::SYNCING);
        assert!(!stripped.has(tag::SYNCING));
        assert!(stripped.has("custom"));
        assert!(reasons.has(tag::SYNCING));
    }

    #[test]
    fn tab_scoped_tag() {
        assert_eq!(tag::time_travel_tab("t1"), "time-travel-tab:t1");
    }
}
