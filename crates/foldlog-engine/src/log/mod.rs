// Log collaborator interface
//
// The engine never owns the causal log: it appends through this trait,
// traverses it during replay, and adjusts retention reasons. Mutations are
// reported back through an event channel; the pre-add hook is the one
// synchronous extension point because it must edit metadata before the
// append becomes durable.

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use foldlog_error::LogResult;
use foldlog_types::{Action, EntryId, Meta, MetaPatch};

pub mod memory;

pub use memory::MemoryLog;

/// Notification emitted by the log after a mutation.
#[derive(Debug, Clone)]
pub enum LogEvent {
    /// An entry passed the pre-add hooks. `meta.added` is `None` when the
    /// entry ended up with no retention reasons and was not stored.
    Added { action: Action, meta: Meta },
    /// An entry was removed because its last retention reason was dropped.
    Cleaned { action: Action, meta: Meta },
}

/// Criteria restricting [`EventLog::remove_reason`] to part of the log.
#[derive(Debug, Clone, Default)]
pub struct RemoveCriteria {
    /// Only touch entries whose `added` sequence is at or below this value.
    pub max_added: Option<u64>,
    /// Only touch the entry with this id.
    pub id: Option<EntryId>,
}

impl RemoveCriteria {
    pub fn up_to(max_added: u64) -> Self {
        RemoveCriteria {
            max_added: Some(max_added),
            id: None,
        }
    }

    pub fn entry(id: EntryId) -> Self {
        RemoveCriteria {
            max_added: None,
            id: Some(id),
        }
    }
}

/// Hook invoked synchronously before an entry is appended; may edit the
/// entry's metadata (typically its reason set).
pub type PreaddHook = Box<dyn Fn(&Action, &mut Meta) + Send + Sync>;

/// Visitor handed to [`EventLog::each`]; returns whether to keep walking.
pub type Visitor<'a> = dyn FnMut(&Action, &Meta) -> bool + Send + 'a;

/// Interface of the append-only causal log collaborator.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Produce a fresh id that is causally newer than every id this log
    /// has produced or seen.
    fn generate_id(&self) -> EntryId;

    /// Append an entry. Pre-add hooks run first and may change the
    /// metadata. Returns the stored metadata, or `None` when an entry with
    /// the same id already exists.
    async fn add(&self, action: Action, meta: Meta) -> LogResult<Option<Meta>>;

    /// Visit stored entries newest-first in causal order until the visitor
    /// returns `false` or the log is exhausted.
    async fn each(&self, visitor: &mut Visitor<'_>) -> LogResult<()>;

    /// Look up one entry by id.
    async fn by_id(&self, id: &EntryId) -> LogResult<Option<(Action, Meta)>>;

    /// Patch an entry's metadata. Returns `false` when the entry is
    /// unknown. Emptying the reason set removes the entry.
    async fn change_meta(&self, id: &EntryId, patch: MetaPatch) -> LogResult<bool>;

    /// Drop one reason tag from every entry matching the criteria,
    /// removing entries whose reason set empties.
    async fn remove_reason(&self, tag: &str, criteria: RemoveCriteria) -> LogResult<()>;

    /// Register a pre-add hook.
    fn on_preadd(&self, hook: PreaddHook);

    /// Subscribe to add/clean notifications.
    fn events(&self) -> UnboundedReceiver<LogEvent>;
}
