// Log reconciliation engine for the Foldlog system
//
// Keeps a materialized application state equal to folding a reducer over a
// causally ordered action log, even when entries arrive out of causal order
// or are retracted later.

pub mod config;
pub mod log;
pub mod store;

pub use config::StoreConfig;
pub use log::{EventLog, LogEvent, MemoryLog, RemoveCriteria};
pub use store::{EventStore, Reducer, StateChange, SyncRejected, SyncTicket};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
