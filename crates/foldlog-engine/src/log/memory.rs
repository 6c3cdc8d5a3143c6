// In-memory log implementation
//
// This module provides an in-memory implementation of the EventLog trait
// for testing and single-process embedding. Entries are keyed by id in a
// BTreeMap, so causal-order traversal falls out of the key order.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use foldlog_error::{LogError, LogResult};
use foldlog_types::{Action, EntryId, Meta, MetaPatch};

use crate::log::{EventLog, LogEvent, PreaddHook, RemoveCriteria, Visitor};

struct Record {
    action: Action,
    meta: Meta,
}

/// In-memory implementation of the EventLog trait
pub struct MemoryLog {
    /// Origin identifier stamped into generated ids
    origin: String,
    /// Logical clock backing id generation
    clock: AtomicU64,
    /// Durable append sequence
    added_seq: AtomicU64,
    /// Entries keyed by causal id
    entries: RwLock<BTreeMap<EntryId, Record>>,
    /// Pre-add hooks, run in registration order
    hooks: RwLock<Vec<PreaddHook>>,
    /// Live event subscribers
    subscribers: Mutex<Vec<UnboundedSender<LogEvent>>>,
}

impl MemoryLog {
    /// Create a new memory log with the default origin
    pub fn new() -> Self {
        Self::with_origin("local")
    }

    /// Create a new memory log generating ids for the given origin
    pub fn with_origin(origin: impl Into<String>) -> Self {
        MemoryLog {
            origin: origin.into(),
            clock: AtomicU64::new(0),
            added_seq: AtomicU64::new(0),
            entries: RwLock::new(BTreeMap::new()),
            hooks: RwLock::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Stored entries in ascending causal order
    pub fn entries(&self) -> Vec<(Action, Meta)> {
        let entries = self.entries.read().expect("entries lock poisoned");
        entries
            .values()
            .map(|r| (r.action.clone(), r.meta.clone()))
            .collect()
    }

    /// Stored actions in ascending causal order
    pub fn actions(&self) -> Vec<Action> {
        self.entries()
            .into_iter()
            .map(|(action, _)| action)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("entries lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn emit(&self, event: LogEvent) {
        let mut subscribers = self.subscribers.lock().expect("subscribers lock poisoned");
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn run_preadd(&self, action: &Action, meta: &mut Meta) -> LogResult<()> {
        let hooks = self
            .hooks
            .read()
            .map_err(|e| LogError::storage(format!("hooks lock poisoned: {}", e)))?;
        for hook in hooks.iter() {
            hook(action, meta);
        }
        Ok(())
    }

    fn write_entries(
        &self,
    ) -> LogResult<std::sync::RwLockWriteGuard<'_, BTreeMap<EntryId, Record>>> {
        self.entries
            .write()
            .map_err(|e| LogError::storage(format!("entries lock poisoned: {}", e)))
    }

    fn read_entries(&self) -> LogResult<std::sync::RwLockReadGuard<'_, BTreeMap<EntryId, Record>>> {
        self.entries
            .read()
            .map_err(|e| LogError::storage(format!("entries lock poisoned: {}", e)))
    }
}

impl Default for MemoryLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventLog for MemoryLog {
    fn generate_id(&self) -> EntryId {
        let time = self.clock.fetch_add(1, Ordering::SeqCst) + 1;
        EntryId::new(time, self.origin.clone(), 0)
    }

    async fn add(&self, action: Action, mut meta: Meta) -> LogResult<Option<Meta>> {
        // Keep generated ids causally newer than every id seen so far.
        self.clock.fetch_max(meta.id.time, Ordering::SeqCst);
        self.run_preadd(&action, &mut meta)?;

        if meta.reasons.is_empty() {
            // Nothing keeps this entry alive: notify subscribers, skip storage.
            meta.added = None;
            self.emit(LogEvent::Added {
                action,
                meta: meta.clone(),
            });
            return Ok(Some(meta));
        }

        {
            let mut entries = self.write_entries()?;
            if entries.contains_key(&meta.id) {
                return Ok(None);
            }
            meta.added = Some(self.added_seq.fetch_add(1, Ordering::SeqCst) + 1);
            entries.insert(
                meta.id.clone(),
                Record {
                    action: action.clone(),
                    meta: meta.clone(),
                },
            );
        }

        self.emit(LogEvent::Added {
            action,
            meta: meta.clone(),
        });
        Ok(Some(meta))
    }

    async fn each(&self, visitor: &mut Visitor<'_>) -> LogResult<()> {
        let snapshot: Vec<(Action, Meta)> = {
            let entries = self.read_entries()?;
            entries
                .values()
                .rev()
                .map(|r| (r.action.clone(), r.meta.clone()))
                .collect()
        };
        for (action, meta) in &snapshot {
            if !visitor(action, meta) {
                break;
            }
        }
        Ok(())
    }

    async fn by_id(&self, id: &EntryId) -> LogResult<Option<(Action, Meta)>> {
        let entries = self.read_entries()?;
        Ok(entries
            .get(id)
            .map(|r| (r.action.clone(), r.meta.clone())))
    }

    async fn change_meta(&self, id: &EntryId, patch: MetaPatch) -> LogResult<bool> {
        let cleaned = {
            let mut entries = self.write_entries()?;
            let Some(record) = entries.get_mut(id) else {
                return Ok(false);
            };
            if let Some(reasons) = patch.reasons {
                record.meta.reasons = reasons;
            }
            if record.meta.reasons.is_empty() {
                entries.remove(id)
            } else {
                None
            }
        };
        if let Some(record) = cleaned {
            self.emit(LogEvent::Cleaned {
                action: record.action,
                meta: record.meta,
            });
        }
        Ok(true)
    }

    async fn remove_reason(&self, tag: &str, criteria: RemoveCriteria) -> LogResult<()> {
        let cleaned = {
            let mut entries = self.write_entries()?;
            let mut emptied = Vec::new();
            for (id, record) in entries.iter_mut() {
                if let Some(only) = &criteria.id {
                    if only != id {
                        continue;
                    }
                }
                if let Some(max_added) = criteria.max_added {
                    match record.meta.added {
                        Some(added) if added <= max_added => {}
                        _ => continue,
                    }
                }
                if record.meta.reasons.remove(tag) && record.meta.reasons.is_empty() {
                    emptied.push(id.clone());
                }
            }
            emptied
                .into_iter()
                .filter_map(|id| entries.remove(&id))
                .collect::<Vec<_>>()
        };
        for record in cleaned {
            self.emit(LogEvent::Cleaned {
                action: record.action,
                meta: record.meta,
            });
        }
        Ok(())
    }

    fn on_preadd(&self, hook: PreaddHook) {
        self.hooks
            .write()
            .expect("hooks lock poisoned")
            .push(hook);
    }

    fn events(&self) -> UnboundedReceiver<LogEvent> {
        let (tx, rx) = unbounded_channel();
        self.subscribers
            .lock()
            .expect("subscribers lock poisoned")
            .push(tx);
        rx
    }
}
