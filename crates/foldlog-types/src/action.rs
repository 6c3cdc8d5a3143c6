// Action values
//
// Actions are opaque to the engine except for the reserved `foldlog/` kind
// prefix. Control actions in that namespace drive retraction and sync
// confirmation; everything else is handed to the application reducer
// unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::id::EntryId;

/// Kind prefix reserved for engine control actions.
pub const CONTROL_PREFIX: &str = "foldlog/";

/// Undo marker retracting a previously appended entry.
pub const UNDO_KIND: &str = "foldlog/undo";

/// Server confirmation of a sync-dispatched entry.
pub const PROCESSED_KIND: &str = "foldlog/processed";

/// One action value: a kind string plus an arbitrary JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl Action {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Action {
            kind: kind.into(),
            payload,
        }
    }

    /// Action without a payload.
    pub fn bare(kind: impl Into<String>) -> Self {
        Action::new(kind, Value::Null)
    }

    /// Undo marker for `target`, carrying the server reason and the
    /// retracted action.
    pub fn undo(target: &EntryId, reason: &str, undone: Action) -> Self {
        Action::new(
            UNDO_KIND,
            json!({
                "id": target.to_string(),
                "reason": reason,
                "action": undone,
            }),
        )
    }

    /// Confirmation marker for `target`.
    pub fn processed(target: &EntryId) -> Self {
        Action::new(PROCESSED_KIND, json!({ "id": target.to_string() }))
    }

    pub fn is_control(&self) -> bool {
        self.kind.starts_with(CONTROL_PREFIX)
    }

    pub fn is_undo(&self) -> bool {
        self.kind == UNDO_KIND
    }

    pub fn is_processed(&self) -> bool {
        self.kind == PROCESSED_KIND
    }

    /// Target id carried by undo and processed markers.
    pub fn target_id(&self) -> Option<EntryId> {
        self.payload.get("id")?.as_str()?.parse().ok()
    }

    /// Server-supplied reason string of an undo marker.
    pub fn undo_reason(&self) -> Option<&str> {
        self.payload.get("reason")?.as_str()
    }

    /// The action retracted by an undo marker.
    pub fn undone_action(&self) -> Option<Action> {
        serde_json::from_value(self.payload.get("action")?.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_prefix_detection() {
        assert!(Action::bare("foldlog/subscribe").is_control());
        assert!(!Action::bare("ADD").is_control());
        assert!(!Action::bare("ADD").is_undo());
    }

    #[test]
    fn undo_marker_round_trip() {
        let target = EntryId::new(2, "10:a", 0);
        let undone = Action::new("ADD", json!({ "value": "b" }));
        let undo = Action::undo(&target, "error", undone.clone());
        assert!(undo.is_undo());
        assert!(undo.is_control());
        assert_eq!(undo.target_id(), Some(target));
        assert_eq!(undo.undo_reason(), Some("error"));
        assert_eq!(undo.undone_action(), Some(undone));
    }

    #[test]
    fn processed_marker_carries_target() {
        let target = EntryId::new(3, "10:a", 1);
        let processed = Action::processed(&target);
        assert!(processed.is_processed());
        assert_eq!(processed.target_id(), Some(target));
        assert_eq!(processed.undo_reason(), None);
    }
}
