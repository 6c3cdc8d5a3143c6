// Shared fixtures for the engine integration tests
//
// The reducer is the string-append history reducer: state starts at "0" and
// every ADD action appends its value, so the final string spells out the
// causal order in which entries were folded.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::json;

use foldlog_engine::{EventLog, EventStore, MemoryLog, Reducer, StoreConfig};
use foldlog_types::{Action, EntryId};

#[derive(Debug, Clone, PartialEq)]
pub struct TextState {
    pub value: String,
}

impl TextState {
    pub fn initial() -> Self {
        TextState { value: "0".into() }
    }
}

pub fn history_reducer() -> Reducer<TextState> {
    Arc::new(|state: &TextState, action: &Action| {
        if action.kind == "ADD" {
            let suffix = action
                .payload
                .get("value")
                .and_then(|value| value.as_str())
                .unwrap_or("");
            TextState {
                value: format!("{}{}", state.value, suffix),
            }
        } else {
            state.clone()
        }
    })
}

pub fn add(value: &str) -> Action {
    Action::new("ADD", json!({ "value": value }))
}

/// Id stamped with a remote origin sorting after the local log's origin
/// within one clock tick.
pub fn remote_id(time: u64, counter: u64) -> EntryId {
    EntryId::new(time, "10:test1", counter)
}

pub fn new_log() -> Arc<MemoryLog> {
    Arc::new(MemoryLog::with_origin("10:tab1"))
}

pub async fn open_store(log: Arc<MemoryLog>, config: StoreConfig) -> EventStore<TextState> {
    open_store_with(log, history_reducer(), config).await
}

pub async fn open_store_with(
    log: Arc<MemoryLog>,
    reducer: Reducer<TextState>,
    config: StoreConfig,
) -> EventStore<TextState> {
    let log: Arc<dyn EventLog> = log;
    EventStore::open(log, "tab1", reducer, TextState::initial(), config)
        .await
        .expect("store open")
}
