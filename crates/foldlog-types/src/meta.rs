// Entry metadata
//
// Metadata is created by dispatch calls or arrives with remote entries. Once
// an entry is appended, only its reason set may change (via `MetaPatch`).

use serde::{Deserialize, Serialize};

use crate::id::EntryId;
use crate::reasons::Reasons;

/// Metadata of one log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// Causally comparable, globally unique identifier.
    pub id: EntryId,
    /// Retention tags; the entry is garbage-collected when this empties.
    #[serde(default)]
    pub reasons: Reasons,
    /// Set when the entry belongs to one tab's private timeline.
    #[serde(default)]
    pub tab: Option<String>,
    /// Entry expects a remote confirmation.
    #[serde(default)]
    pub sync: bool,
    /// Suppresses implicit retention tagging.
    #[serde(default)]
    pub no_auto_reason: bool,
    /// Entry was produced by a direct local dispatch.
    #[serde(default)]
    pub dispatch: bool,
    /// Monotonic sequence assigned on durable append.
    #[serde(default)]
    pub added: Option<u64>,
}

impl Meta {
    pub fn new(id: EntryId) -> Self {
        Meta {
            id,
            reasons: Reasons::new(),
            tab: None,
            sync: false,
            no_auto_reason: false,
            dispatch: false,
            added: None,
        }
    }

    pub fn with_reasons(mut self, reasons: Reasons) -> Self {
        self.reasons = reasons;
        self
    }

    pub fn with_tab(mut self, tab: impl Into<String>) -> Self {
        self.tab = Some(tab.into());
        self
    }

    pub fn with_dispatch(mut self) -> Self {
        self.dispatch = true;
        self
    }
}

/// Caller-supplied metadata for the dispatch entry points. Fields left out
/// are filled in by the store (id from the log's generator, tab for local
/// dispatches).
#[derive(Debug, Clone, Default)]
pub struct MetaDraft {
    pub id: Option<EntryId>,
    pub reasons: Reasons,
    pub tab: Option<String>,
    pub sync: bool,
    pub no_auto_reason: bool,
}

impl MetaDraft {
    pub fn new() -> Self {
        MetaDraft::default()
    }

    pub fn with_id(mut self, id: EntryId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_reason(mut self, tag: impl Into<String>) -> Self {
        self.reasons.add(tag);
        self
    }

    pub fn with_no_auto_reason(mut self) -> Self {
        self.no_auto_reason = true;
        self
    }
}

/// Partial metadata accepted by `change_meta`. Entries are immutable except
/// for their reason set.
#[derive(Debug, Clone, Default)]
pub struct MetaPatch {
    pub reasons: Option<Reasons>,
}

impl MetaPatch {
    pub fn reasons(reasons: Reasons) -> Self {
        MetaPatch {
            reasons: Some(reasons),
        }
    }
}
