//! Push events and the structural diffs they carry.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{DictInfo, Identifier, Key, ListInfo, ProxyKind, TypeInfo, WireError, WireValue};

/// Name of the session-level event carrying a new context snapshot.
pub const CONTEXT_UPDATED: &str = "context_updated";
/// Name of the session-level event announcing a full type descriptor.
pub const NEW_TYPE: &str = "new_type";
/// Name of the event sent when any mirrored object changed.
pub const OBJECT_CHANGED: &str = "object_changed";
/// Completion event of a remote future.
pub const FUTURE_DONE: &str = "done";
/// Failure event of a remote future.
pub const FUTURE_ERROR: &str = "error";

/// An unsolicited notification from the remote runtime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PushEvent {
    /// The object the event is about (or the session root target).
    pub obj: Identifier,

    /// The attribute or event name.
    pub name: String,

    /// True when the *contents* of a list or dict attribute changed.
    #[serde(default)]
    pub items_event: bool,

    #[serde(default)]
    pub data: Value,
}

impl PushEvent {
    pub fn new(obj: impl Into<Identifier>, name: impl Into<String>, data: Value) -> Self {
        Self {
            obj: obj.into(),
            name: name.into(),
            items_event: false,
            data,
        }
    }

    /// An `object_changed` event for attribute `name`, carrying its new value.
    pub fn attribute_changed(
        obj: impl Into<Identifier>,
        name: impl Into<String>,
        value: &WireValue,
    ) -> Self {
        Self::new(obj, name, value.to_json())
    }

    /// An items event for the collection attribute `name`.
    pub fn items_changed(
        obj: impl Into<Identifier>,
        name: impl Into<String>,
        change: &ItemsChange,
    ) -> Self {
        Self {
            obj: obj.into(),
            name: name.into(),
            items_event: true,
            data: change.to_json(),
        }
    }

    /// Decode `data` as a marshaled value, if one is present.
    pub fn value(&self) -> Result<Option<WireValue>, WireError> {
        if self.data.is_null() {
            return Ok(None);
        }
        WireValue::from_json(&self.data).map(Some)
    }

    /// Decode `data` as a structural change of a collection.
    pub fn items_change(&self) -> Result<ItemsChange, WireError> {
        ItemsChange::from_json(&self.data)
    }
}

/// A structural change to a list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListDiff {
    /// Remove `removed` items at `index` and insert `added` in their place.
    Splice {
        index: usize,
        removed: usize,
        #[serde(default, deserialize_with = "added_items")]
        added: Vec<WireValue>,
    },

    /// A strided slice assignment over `start..stop` with stride `step`.
    /// It can replace or delete items but never grow the list.
    Strided {
        start: usize,
        stop: usize,
        step: usize,
        removed: usize,
        #[serde(default, deserialize_with = "added_items")]
        added: Vec<WireValue>,
    },
}

impl ListDiff {
    pub fn added(&self) -> &[WireValue] {
        match self {
            ListDiff::Splice { added, .. } | ListDiff::Strided { added, .. } => added,
        }
    }
}

/// A structural change to a dict. Changed keys are listed as added.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DictDiff {
    #[serde(default)]
    pub removed: Vec<Key>,

    #[serde(default)]
    pub added: DictInfo,
}

/// A structural diff of either collection kind.
#[derive(Clone, Debug, PartialEq)]
pub enum CollectionDiff {
    List(ListDiff),
    Dict(DictDiff),

    /// The whole contents, sent by peers that do not compute diffs.
    Reset(TypeInfo),
}

/// The payload of an items event: which collection changed and how.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemsChange {
    pub id: Identifier,
    pub diff: CollectionDiff,
}

impl ItemsChange {
    pub fn list(id: impl Into<Identifier>, diff: ListDiff) -> Self {
        Self {
            id: id.into(),
            diff: CollectionDiff::List(diff),
        }
    }

    pub fn dict(id: impl Into<Identifier>, diff: DictDiff) -> Self {
        Self {
            id: id.into(),
            diff: CollectionDiff::Dict(diff),
        }
    }

    pub fn kind(&self) -> ProxyKind {
        match &self.diff {
            CollectionDiff::List(_) | CollectionDiff::Reset(TypeInfo::List(_)) => ProxyKind::List,
            CollectionDiff::Dict(_) | CollectionDiff::Reset(TypeInfo::Dict(_)) => ProxyKind::Dict,
            CollectionDiff::Reset(TypeInfo::Instance(_)) => ProxyKind::Instance,
        }
    }

    /// Decode from `{"type": "list"|"dict", "value": id, "info": diff}`.
    ///
    /// `info` may also be a full list or dict descriptor, which decodes as
    /// [`CollectionDiff::Reset`].
    pub fn from_json(json: &Value) -> Result<Self, WireError> {
        let kind = json
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| WireError::malformed("items event has no 'type'"))?;
        let id = Identifier::from_json(json.get("value").unwrap_or(&Value::Null))?;
        let info = json.get("info").cloned().unwrap_or(Value::Null);

        let is_snapshot = info.get("length").is_some() || info.get("keys").is_some();
        let diff = match ProxyKind::parse(kind)? {
            ProxyKind::List if is_snapshot => {
                CollectionDiff::Reset(TypeInfo::List(serde_json::from_value(info)?))
            }
            ProxyKind::Dict if is_snapshot => {
                CollectionDiff::Reset(TypeInfo::Dict(serde_json::from_value(info)?))
            }
            ProxyKind::List => CollectionDiff::List(serde_json::from_value(info)?),
            ProxyKind::Dict => CollectionDiff::Dict(serde_json::from_value(info)?),
            ProxyKind::Instance => {
                return Err(WireError::malformed("items event on an instance"));
            }
        };
        Ok(Self { id, diff })
    }

    pub fn to_json(&self) -> Value {
        let info = match &self.diff {
            CollectionDiff::List(diff) => serde_json::to_value(diff),
            CollectionDiff::Dict(diff) => serde_json::to_value(diff),
            CollectionDiff::Reset(info) => Ok(info.to_json()),
        }
        .unwrap_or(Value::Null);

        serde_json::json!({
            "type": self.kind().as_str(),
            "value": self.id.as_str(),
            "info": info,
        })
    }
}

/// `added` is either a plain array of wire values or a list descriptor
/// `{length, data}`.
fn added_items<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<WireValue>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Added {
        Items(Vec<WireValue>),
        Info(ListInfo),
    }

    Ok(match Added::deserialize(deserializer)? {
        Added::Items(items) => items,
        Added::Info(info) => info.data.unwrap_or_default(),
    })
}
