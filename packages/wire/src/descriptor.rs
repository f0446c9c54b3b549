//! Type and shape descriptors sent by the remote runtime.

use serde::{Deserialize, Serialize};

use crate::{Key, WireValue};

/// Description of a remote instance's type.
///
/// The remote sends the full descriptor the first time it exposes a type and
/// only `type_name` afterwards; a descriptor without `attribute_names` is a
/// reference to the earlier full one.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceInfo {
    pub type_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_names: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_names: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_names: Option<Vec<String>>,

    /// Placeholder values, parallel to `attribute_names`, that a reader may
    /// show before the real value has been fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_values: Option<Vec<WireValue>>,
}

impl InstanceInfo {
    /// A descriptor carrying only the type name.
    pub fn named(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    /// Whether this descriptor lists the type's members.
    pub fn is_complete(&self) -> bool {
        self.attribute_names.is_some()
    }

    pub fn with_attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attribute_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_methods<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.method_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_events<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.event_names = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

/// Shape of a remote list, optionally with its marshaled items.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListInfo {
    pub length: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<WireValue>>,
}

impl ListInfo {
    pub fn with_length(length: usize) -> Self {
        Self { length, data: None }
    }

    /// A list descriptor carrying its items.
    pub fn with_data(data: Vec<WireValue>) -> Self {
        Self {
            length: data.len(),
            data: Some(data),
        }
    }

    /// The carried items, or nothing if the remote sent only the length.
    pub fn items(&self) -> &[WireValue] {
        self.data.as_deref().unwrap_or(&[])
    }
}

/// Shape of a remote dict, optionally with its marshaled values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DictInfo {
    #[serde(default)]
    pub keys: Vec<Key>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<ListInfo>,
}

impl DictInfo {
    pub fn with_keys(keys: Vec<Key>) -> Self {
        Self { keys, values: None }
    }

    pub fn with_entries(entries: Vec<(Key, WireValue)>) -> Self {
        let (keys, data): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
        Self {
            keys,
            values: Some(ListInfo::with_data(data)),
        }
    }

    /// Pair each key with its carried value, if the remote sent one.
    pub fn entries(&self) -> impl Iterator<Item = (&Key, Option<&WireValue>)> {
        let values = self.values.as_ref().map(ListInfo::items).unwrap_or(&[]);
        self.keys
            .iter()
            .enumerate()
            .map(move |(i, key)| (key, values.get(i)))
    }
}

/// A descriptor of any proxy kind.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeInfo {
    Instance(InstanceInfo),
    List(ListInfo),
    Dict(DictInfo),
}

impl TypeInfo {
    pub fn to_json(&self) -> serde_json::Value {
        let encoded = match self {
            TypeInfo::Instance(info) => serde_json::to_value(info),
            TypeInfo::List(info) => serde_json::to_value(info),
            TypeInfo::Dict(info) => serde_json::to_value(info),
        };
        encoded.unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_instance_info_is_incomplete() {
        let info: InstanceInfo =
            serde_json::from_value(json!({"type_name": "model.Person"})).unwrap();
        assert!(!info.is_complete());
        assert_eq!(info.type_name, "model.Person");
    }

    #[test]
    fn full_instance_info() {
        let info: InstanceInfo = serde_json::from_value(json!({
            "type_name": "model.Person",
            "attribute_names": ["name", "age"],
            "method_names": ["greet"],
            "event_names": ["clicked"],
            "attribute_values": [
                {"type": "primitive", "value": ""},
                {"type": "primitive", "value": 0}
            ]
        }))
        .unwrap();
        assert!(info.is_complete());
        assert_eq!(info.method_names.as_deref(), Some(&["greet".to_string()][..]));
        assert_eq!(info.attribute_values.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn list_info_without_data() {
        let info: ListInfo = serde_json::from_value(json!({"length": 3})).unwrap();
        assert_eq!(info.length, 3);
        assert!(info.items().is_empty());
    }

    #[test]
    fn dict_entries_pair_keys_with_values() {
        let info: DictInfo = serde_json::from_value(json!({
            "keys": ["a", "b"],
            "values": {"length": 2, "data": [
                {"type": "primitive", "value": 1},
                {"type": "primitive", "value": 2}
            ]}
        }))
        .unwrap();
        let entries: Vec<_> = info.entries().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, &Key::from("a"));
        assert_eq!(
            entries[1].1,
            Some(&WireValue::Primitive(json!(2)))
        );
    }

    #[test]
    fn dict_entries_without_values() {
        let info = DictInfo::with_keys(vec![Key::from("x")]);
        let entries: Vec<_> = info.entries().collect();
        assert_eq!(entries, vec![(&Key::from("x"), None)]);
    }
}
