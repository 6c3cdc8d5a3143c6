// Core type definitions shared across the Foldlog workspace
//
// Entry identifiers, causal ordering, action values, retention reasons and
// entry metadata. Everything here is a plain value type: the engine crate
// owns all behavior.

mod action;
mod id;
mod meta;
mod reasons;

pub use action::{Action, CONTROL_PREFIX, PROCESSED_KIND, UNDO_KIND};
pub use id::{is_first_older, EntryId, ParseEntryIdError};
pub use meta::{Meta, MetaDraft, MetaPatch};
pub use reasons::{tag, Reasons};
