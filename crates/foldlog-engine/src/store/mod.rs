// Event store
//
// The reconciliation core. Owns the frontier, the snapshot table, the wait
// set, the sync promise registry and the retention counters for one store
// instance, and orchestrates when and over what range the reducer runs. The
// causal log itself is an external collaborator reached only through the
// EventLog trait.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

use foldlog_error::StoreResult;
use foldlog_types::{tag, Action, EntryId, Meta, MetaDraft, MetaPatch, Reasons};

use crate::config::StoreConfig;
use crate::log::{EventLog, LogEvent, RemoveCriteria};

pub mod frontier;
pub mod retention;
pub mod snapshot;
pub mod sync;

mod replay;

pub use sync::{SyncOutcome, SyncRejected, SyncTicket};

use frontier::Frontier;
use retention::RetentionCoordinator;
use snapshot::SnapshotTable;
use sync::SyncRegistry;

/// Pure fold step advancing the state by one action.
pub type Reducer<S> = Arc<dyn Fn(&S, &Action) -> S + Send + Sync>;

/// Payload delivered to change listeners after every fold or replay.
#[derive(Debug, Clone)]
pub struct StateChange<S> {
    pub state: S,
    pub prev_state: S,
    pub action: Action,
    pub meta: Meta,
}

type ChangeListener<S> = Box<dyn Fn(&StateChange<S>) + Send + Sync>;

struct StoreInner<S> {
    frontier: Frontier<S>,
    snapshots: SnapshotTable<S>,
    reducer: Reducer<S>,
    /// Entries that arrived while a replay was in flight, keyed by id.
    wait: HashMap<EntryId, (Action, Meta)>,
    /// Single-flight replay guard.
    replaying: bool,
    sync: SyncRegistry,
    retention: RetentionCoordinator,
}

/// Materialized view over a causal action log.
pub struct EventStore<S> {
    log: Arc<dyn EventLog>,
    tab_id: String,
    config: StoreConfig,
    initial_state: S,
    inner: Arc<Mutex<StoreInner<S>>>,
    events: AsyncMutex<UnboundedReceiver<LogEvent>>,
    listeners: Mutex<Vec<ChangeListener<S>>>,
}

impl<S: Clone + Send + Sync + 'static> EventStore<S> {
    /// Connect to a log, recover the surviving history and return a ready
    /// store.
    pub async fn open(
        log: Arc<dyn EventLog>,
        tab_id: impl Into<String>,
        reducer: Reducer<S>,
        initial_state: S,
        config: StoreConfig,
    ) -> StoreResult<Self> {
        let events = log.events();
        let inner = Arc::new(Mutex::new(StoreInner {
            frontier: Frontier::new(initial_state.clone()),
            snapshots: SnapshotTable::new(config.save_state_every),
            reducer,
            wait: HashMap::new(),
            replaying: false,
            sync: SyncRegistry::new(),
            retention: RetentionCoordinator::new(config.clean_every, config.reasonless_history),
        }));
        let store = EventStore {
            log,
            tab_id: tab_id.into(),
            config,
            initial_state,
            inner,
            events: AsyncMutex::new(events),
            listeners: Mutex::new(Vec::new()),
        };
        store.install_preadd_hook();
        store.bootstrap().await?;
        Ok(store)
    }

    /// Current materialized state.
    pub fn state(&self) -> S {
        self.inner.lock().frontier.state().clone()
    }

    /// The log collaborator this store is bound to.
    pub fn log(&self) -> Arc<dyn EventLog> {
        Arc::clone(&self.log)
    }

    /// Register a change listener fired after every fold or replay.
    pub fn on_change(&self, listener: impl Fn(&StateChange<S>) + Send + Sync + 'static) {
        self.listeners.lock().push(Box::new(listener));
    }

    /// Swap the reducer used for all subsequent folds and replays.
    pub fn replace_reducer(&self, reducer: Reducer<S>) {
        self.inner.lock().reducer = reducer;
    }

    /// Fold a local action immediately and append it to the log with a
    /// tab-scoped retention reason.
    pub async fn dispatch(&self, action: Action) -> StoreResult<Meta> {
        let mut meta = Meta::new(self.log.generate_id())
            .with_tab(self.tab_id.clone())
            .with_dispatch();
        meta.reasons.add(tag::time_travel_tab(&self.tab_id));
        let stored = self.log.add(action.clone(), meta.clone()).await?;
        let meta = stored.unwrap_or(meta);

        let prev_state = self.state();
        {
            let mut inner = self.inner.lock();
            let reducer = inner.reducer.clone();
            let next = reducer(inner.frontier.state(), &action);
            inner.frontier.advance(meta.id.clone(), next.clone());
            inner.snapshots.record(&meta.id, &next);
        }
        self.emit_change(prev_state, action, meta.clone());
        self.pump().await?;
        Ok(meta)
    }

    /// Append an action visible only to this tab.
    pub async fn dispatch_local(
        &self,
        action: Action,
        mut draft: MetaDraft,
    ) -> StoreResult<Option<Meta>> {
        draft.tab = Some(self.tab_id.clone());
        self.append(action, draft).await
    }

    /// Append an action visible to every tab sharing the log.
    pub async fn dispatch_cross_tab(
        &self,
        action: Action,
        draft: MetaDraft,
    ) -> StoreResult<Option<Meta>> {
        self.append(action, draft).await
    }

    /// Append an action that expects a remote confirmation. The returned
    /// ticket settles when a confirmation or undo for the entry arrives.
    pub async fn dispatch_sync(&self, action: Action, draft: MetaDraft) -> StoreResult<SyncTicket> {
        let mut meta = self.realize(draft);
        meta.sync = true;
        meta.reasons.add(tag::SYNCING);
        let done = self.inner.lock().sync.register(meta.id.clone());
        let stored = self.log.add(action, meta.clone()).await?;
        self.pump().await?;
        Ok(SyncTicket {
            meta: stored.unwrap_or(meta),
            done,
        })
    }

    /// Drain pending log notifications. Dispatch entry points do this on
    /// their own; call it when a collaborator appends to the log directly.
    pub async fn catch_up(&self) -> StoreResult<()> {
        self.pump().await
    }

    fn install_preadd_hook(&self) {
        let inner = Arc::clone(&self.inner);
        self.log.on_preadd(Box::new(move |action, meta| {
            if action.is_undo() {
                meta.reasons.add(tag::UNDO_LOADING);
            }
            if action.is_control() {
                return;
            }
            if !inner.lock().frontier.is_newer(&meta.id) {
                meta.reasons.add(tag::REPLAY);
            }
            if !meta.no_auto_reason && !meta.dispatch {
                meta.reasons.add(tag::TIME_TRAVEL);
            }
        }));
    }

    /// Recover state from entries already in the log: every cross-tab entry
    /// minus those retracted by an undo marker.
    async fn bootstrap(&self) -> StoreResult<()> {
        let mut undone: HashSet<EntryId> = HashSet::new();
        let mut previous: Vec<(Action, Meta)> = Vec::new();
        self.log
            .each(&mut |action, meta| {
                if meta.tab.is_none() {
                    if action.is_undo() {
                        if let Some(target) = action.target_id() {
                            undone.insert(target);
                        }
                    } else if !undone.contains(&meta.id) {
                        previous.push((action.clone(), meta.clone()));
                    }
                }
                true
            })
            .await?;
        if !previous.is_empty() {
            debug!(entries = previous.len(), "recovering state from existing log");
        }
        for (action, meta) in previous {
            self.process(action, meta).await?;
        }
        self.pump().await
    }

    async fn pump(&self) -> StoreResult<()> {
        let mut events = self.events.lock().await;
        while let Ok(event) = events.try_recv() {
            match event {
                LogEvent::Added { action, meta } => self.handle_added(action, meta).await?,
                LogEvent::Cleaned { meta, .. } => self.handle_cleaned(&meta),
            }
        }
        Ok(())
    }

    async fn handle_added(&self, action: Action, meta: Meta) -> StoreResult<()> {
        if let Some(entry_tab) = &meta.tab {
            // Another tab's private timeline.
            if *entry_tab != self.tab_id {
                return Ok(());
            }
        }

        if action.is_processed() {
            if let Some(target) = action.target_id() {
                if self.inner.lock().sync.resolve(&target) {
                    debug!(target = %target, "sync dispatch confirmed");
                }
                self.log
                    .remove_reason(tag::SYNCING, RemoveCriteria::entry(target))
                    .await?;
            }
        }

        let sweep = self.inner.lock().retention.observe(&action, &meta);
        if let Some(sweep) = sweep {
            debug!(max_added = sweep.max_added, "stripping implicit retention below horizon");
            self.log
                .remove_reason(tag::TIME_TRAVEL, RemoveCriteria::up_to(sweep.max_added))
                .await?;
            self.log
                .remove_reason(
                    &tag::time_travel_tab(&self.tab_id),
                    RemoveCriteria::up_to(sweep.max_added),
                )
                .await?;
        }

        if meta.dispatch {
            // Already folded by dispatch() itself.
            return Ok(());
        }

        let prev_state = self.state();
        self.process(action.clone(), meta.clone()).await?;
        self.emit_change(prev_state, action, meta);
        Ok(())
    }

    fn handle_cleaned(&self, meta: &Meta) {
        let mut inner = self.inner.lock();
        inner.wait.remove(&meta.id);
        inner.snapshots.remove(&meta.id);
    }

    /// Incorporate one observed entry: fold it in place when it is causally
    /// newer than the frontier, otherwise hand it to the replay engine.
    /// While a replay is in flight the entry is parked instead.
    fn process<'a>(&'a self, action: Action, meta: Meta) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            {
                let mut inner = self.inner.lock();
                if inner.replaying {
                    debug!(id = %meta.id, "replay in flight, parking entry");
                    inner.wait.insert(meta.id.clone(), (action, meta));
                    return Ok(());
                }
            }

            if action.is_undo() {
                return self.process_undo(action, meta).await;
            }
            if action.is_control() {
                return Ok(());
            }

            let folded = {
                let mut inner = self.inner.lock();
                if inner.frontier.is_newer(&meta.id) {
                    let reducer = inner.reducer.clone();
                    let next = reducer(inner.frontier.state(), &action);
                    inner.frontier.advance(meta.id.clone(), next.clone());
                    if meta.added.is_some() {
                        inner.snapshots.record(&meta.id, &next);
                    }
                    true
                } else {
                    false
                }
            };
            if folded {
                return Ok(());
            }

            debug!(id = %meta.id, "out-of-order entry, replaying");
            self.replay(&meta.id).await?;
            if meta.reasons.has(tag::REPLAY) {
                // The entry was pinned for the duration of its replay.
                self.log
                    .change_meta(&meta.id, MetaPatch::reasons(meta.reasons.without(tag::REPLAY)))
                    .await?;
            }
            Ok(())
        })
    }

    async fn process_undo(&self, action: Action, meta: Meta) -> StoreResult<()> {
        let Some(target) = action.target_id() else {
            warn!(id = %meta.id, "undo marker without a target id");
            return Ok(());
        };
        match self.log.by_id(&target).await? {
            Some((_, target_meta)) => {
                // The causal record of why the target existed survives its
                // retraction on the marker itself.
                self.log
                    .change_meta(
                        &meta.id,
                        MetaPatch::reasons(target_meta.reasons.without(tag::SYNCING)),
                    )
                    .await?;
                self.inner.lock().snapshots.remove(&target);
                self.replay(&target).await?;
                self.log
                    .remove_reason(tag::SYNCING, RemoveCriteria::entry(target.clone()))
                    .await?;
            }
            None => {
                warn!(target = %target, "undo of unknown entry, nothing to replay");
                self.log
                    .change_meta(&meta.id, MetaPatch::reasons(Reasons::new()))
                    .await?;
            }
        }

        let rejection = SyncRejected {
            action: action.undone_action().unwrap_or_else(|| action.clone()),
            reason: action.undo_reason().unwrap_or("undo").to_string(),
        };
        if self.inner.lock().sync.reject(&target, rejection) {
            debug!(target = %target, "sync dispatch rejected by undo");
        }
        Ok(())
    }

    async fn append(&self, action: Action, draft: MetaDraft) -> StoreResult<Option<Meta>> {
        let meta = self.realize(draft);
        let stored = self.log.add(action, meta).await?;
        self.pump().await?;
        Ok(stored)
    }

    /// Fill in the caller-supplied metadata: id from the log's generator,
    /// and explicit reasons suppress implicit tagging.
    fn realize(&self, draft: MetaDraft) -> Meta {
        let explicit = !draft.reasons.is_empty();
        let mut meta = Meta::new(draft.id.unwrap_or_else(|| self.log.generate_id()));
        meta.reasons = draft.reasons;
        meta.tab = draft.tab;
        meta.sync = draft.sync;
        meta.no_auto_reason = draft.no_auto_reason || explicit;
        meta
    }

    fn emit_change(&self, prev_state: S, action: Action, meta: Meta) {
        let change = StateChange {
            state: self.state(),
            prev_state,
            action,
            meta,
        };
        let listeners = self.listeners.lock();
        for listener in listeners.iter() {
            listener(&change);
        }
    }
}
