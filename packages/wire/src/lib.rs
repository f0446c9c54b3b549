//! Wire types for the remirror object mirroring protocol.
//!
//! This crate holds the data exchanged between a local session and the
//! remote, model-owning runtime: marshaled values, type descriptors,
//! requests and responses, push events with their structural diffs, and the
//! envelope used on correlated channels. It has no I/O and no notion of a
//! proxy; see `remirror-core` for that.

mod descriptor;
mod envelope;
mod error;
mod event;
mod identifier;
mod request;
mod value;

pub use descriptor::{DictInfo, InstanceInfo, ListInfo, TypeInfo};
pub use envelope::{Envelope, UNSOLICITED};
pub use error::WireError;
pub use event::{
    CollectionDiff, DictDiff, ItemsChange, ListDiff, PushEvent, CONTEXT_UPDATED, FUTURE_DONE,
    FUTURE_ERROR, NEW_TYPE, OBJECT_CHANGED,
};
pub use identifier::{Identifier, Key};
pub use request::{Request, Response};
pub use value::{ProxyKind, Reference, WireValue};
