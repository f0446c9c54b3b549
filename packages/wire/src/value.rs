//! Marshaled values: primitives and object references.
//!
//! On the wire every value is an object `{"type": ..., "value": ..., "info": ...}`.
//! `type` is `primitive` for plain JSON values; for `instance`, `list` and
//! `dict` the `value` is the remote object's [`Identifier`] and `info` an
//! optional descriptor of its shape.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{DictInfo, Identifier, InstanceInfo, ListInfo, TypeInfo, WireError};

/// The kind of object a proxy mirrors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyKind {
    Instance,
    List,
    Dict,
}

impl ProxyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyKind::Instance => "instance",
            ProxyKind::List => "list",
            ProxyKind::Dict => "dict",
        }
    }

    pub fn parse(kind: &str) -> Result<Self, WireError> {
        match kind {
            "instance" => Ok(ProxyKind::Instance),
            "list" => Ok(ProxyKind::List),
            "dict" => Ok(ProxyKind::Dict),
            other => Err(WireError::UnsupportedKind {
                kind: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ProxyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to a remote object, as carried by a [`WireValue`].
#[derive(Clone, Debug, PartialEq)]
pub struct Reference {
    pub kind: ProxyKind,
    pub id: Identifier,
    pub info: Option<TypeInfo>,
}

impl Reference {
    pub fn new(kind: ProxyKind, id: impl Into<Identifier>) -> Self {
        Self {
            kind,
            id: id.into(),
            info: None,
        }
    }

    pub fn instance(id: impl Into<Identifier>, info: InstanceInfo) -> Self {
        Self {
            kind: ProxyKind::Instance,
            id: id.into(),
            info: Some(TypeInfo::Instance(info)),
        }
    }

    pub fn list(id: impl Into<Identifier>, info: ListInfo) -> Self {
        Self {
            kind: ProxyKind::List,
            id: id.into(),
            info: Some(TypeInfo::List(info)),
        }
    }

    pub fn dict(id: impl Into<Identifier>, info: DictInfo) -> Self {
        Self {
            kind: ProxyKind::Dict,
            id: id.into(),
            info: Some(TypeInfo::Dict(info)),
        }
    }
}

/// A value in marshaled form.
#[derive(Clone, Debug, PartialEq)]
pub enum WireValue {
    Primitive(Value),
    Reference(Reference),
}

impl WireValue {
    pub fn primitive(value: impl Into<Value>) -> Self {
        WireValue::Primitive(value.into())
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, WireValue::Reference(_))
    }

    /// Decode a wire value from its JSON form.
    pub fn from_json(json: &Value) -> Result<Self, WireError> {
        let object = json
            .as_object()
            .ok_or_else(|| WireError::malformed(format!("expected a wire value, found {}", json)))?;
        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| WireError::malformed("wire value has no 'type'"))?;

        if kind == "primitive" {
            let value = object.get("value").cloned().unwrap_or(Value::Null);
            return Ok(WireValue::Primitive(value));
        }

        let kind = ProxyKind::parse(kind)?;
        let id = Identifier::from_json(object.get("value").unwrap_or(&Value::Null))?;
        let info = match object.get("info") {
            None | Some(Value::Null) => None,
            Some(info) => Some(decode_info(kind, info)?),
        };

        Ok(WireValue::Reference(Reference { kind, id, info }))
    }

    /// Decode one entry of a context snapshot.
    ///
    /// Context entries are usually full wire values; entries without a
    /// `type` are instances described by `{value, info}`.
    pub fn from_context_entry(json: &Value) -> Result<Self, WireError> {
        let has_type = json.get("type").is_some();
        if has_type {
            return Self::from_json(json);
        }

        let id = Identifier::from_json(json.get("value").unwrap_or(&Value::Null))?;
        let info = match json.get("info") {
            None | Some(Value::Null) => None,
            Some(info) => Some(decode_info(ProxyKind::Instance, info)?),
        };
        Ok(WireValue::Reference(Reference {
            kind: ProxyKind::Instance,
            id,
            info,
        }))
    }

    /// Encode to the JSON form.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        match self {
            WireValue::Primitive(value) => {
                object.insert("type".to_string(), Value::from("primitive"));
                object.insert("value".to_string(), value.clone());
            }
            WireValue::Reference(reference) => {
                object.insert("type".to_string(), Value::from(reference.kind.as_str()));
                object.insert("value".to_string(), Value::from(reference.id.as_str()));
                if let Some(info) = &reference.info {
                    object.insert("info".to_string(), info.to_json());
                }
            }
        }
        Value::Object(object)
    }
}

fn decode_info(kind: ProxyKind, info: &Value) -> Result<TypeInfo, WireError> {
    let info = match kind {
        ProxyKind::Instance => TypeInfo::Instance(serde_json::from_value(info.clone())?),
        ProxyKind::List => TypeInfo::List(serde_json::from_value(info.clone())?),
        ProxyKind::Dict => TypeInfo::Dict(serde_json::from_value(info.clone())?),
    };
    Ok(info)
}

impl From<Reference> for WireValue {
    fn from(reference: Reference) -> Self {
        WireValue::Reference(reference)
    }
}

impl Serialize for WireValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for WireValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = Value::deserialize(deserializer)?;
        WireValue::from_json(&json).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_primitive() {
        let value = WireValue::from_json(&json!({"type": "primitive", "value": 42})).unwrap();
        assert_eq!(value, WireValue::primitive(42));
    }

    #[test]
    fn decode_null_primitive() {
        let value = WireValue::from_json(&json!({"type": "primitive", "value": null})).unwrap();
        assert_eq!(value, WireValue::Primitive(Value::Null));
    }

    #[test]
    fn decode_instance_reference_with_info() {
        let value = WireValue::from_json(&json!({
            "type": "instance",
            "value": "1001",
            "info": {"type_name": "model.Person", "attribute_names": ["name"]}
        }))
        .unwrap();

        let WireValue::Reference(reference) = value else {
            panic!("expected a reference");
        };
        assert_eq!(reference.kind, ProxyKind::Instance);
        assert_eq!(reference.id.as_str(), "1001");
        let Some(TypeInfo::Instance(info)) = reference.info else {
            panic!("expected instance info");
        };
        assert!(info.is_complete());
    }

    #[test]
    fn decode_list_reference_with_integer_id() {
        let value = WireValue::from_json(&json!({
            "type": "list",
            "value": 77,
            "info": {"length": 2}
        }))
        .unwrap();
        let WireValue::Reference(reference) = value else {
            panic!("expected a reference");
        };
        assert_eq!(reference.id, Identifier::from("77"));
        assert_eq!(reference.info, Some(TypeInfo::List(ListInfo::with_length(2))));
    }

    #[test]
    fn unknown_kind_is_unsupported() {
        let result = WireValue::from_json(&json!({"type": "tuple", "value": "1"}));
        assert!(matches!(
            result,
            Err(WireError::UnsupportedKind { kind }) if kind == "tuple"
        ));
    }

    #[test]
    fn missing_type_is_malformed() {
        let result = WireValue::from_json(&json!({"value": 1}));
        assert!(matches!(result, Err(WireError::Malformed { .. })));
    }

    #[test]
    fn encode_reference_omits_missing_info() {
        let value = WireValue::from(Reference::new(ProxyKind::Dict, "9"));
        assert_eq!(value.to_json(), json!({"type": "dict", "value": "9"}));
    }

    #[test]
    fn context_entry_without_type_is_instance() {
        let value = WireValue::from_context_entry(&json!({
            "value": "5",
            "info": {"type_name": "app.Model"}
        }))
        .unwrap();
        let WireValue::Reference(reference) = value else {
            panic!("expected a reference");
        };
        assert_eq!(reference.kind, ProxyKind::Instance);
        assert_eq!(
            reference.info,
            Some(TypeInfo::Instance(InstanceInfo::named("app.Model")))
        );
    }

    #[test]
    fn serde_uses_json_form() {
        let values: Vec<WireValue> = serde_json::from_value(json!([
            {"type": "primitive", "value": "hi"},
            {"type": "instance", "value": "3"}
        ]))
        .unwrap();
        assert_eq!(values[0], WireValue::primitive("hi"));
        assert!(values[1].is_reference());
        assert_eq!(
            serde_json::to_value(&values[1]).unwrap(),
            json!({"type": "instance", "value": "3"})
        );
    }
}
