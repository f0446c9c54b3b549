//! Object identifiers and field keys.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::WireError;

/// Opaque name of a remote object, stable for the lifetime of a session.
///
/// Peers send identifiers either as JSON strings or as integers. Both forms
/// are normalized to the string form, so `7` and `"7"` name the same object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(id: impl Into<String>) -> Self {
        Identifier(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read an identifier from a JSON string or integer.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, WireError> {
        match value {
            serde_json::Value::String(s) => Ok(Identifier(s.clone())),
            serde_json::Value::Number(n) => Ok(Identifier(n.to_string())),
            other => Err(WireError::malformed(format!(
                "expected an identifier, found {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(id: &str) -> Self {
        Identifier(id.to_string())
    }
}

impl From<String> for Identifier {
    fn from(id: String) -> Self {
        Identifier(id)
    }
}

impl From<u64> for Identifier {
    fn from(id: u64) -> Self {
        Identifier(id.to_string())
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Identifier::from_json(&value).map_err(serde::de::Error::custom)
    }
}

/// A field key on a proxy.
///
/// Instance attributes are named, list items are indexed, and dict items use
/// whichever form the remote dict key had.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Index(i64),
    Name(String),
}

impl Key {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Name(name) => Some(name),
            Key::Index(_) => None,
        }
    }

    /// The key as a list position, if it is a non-negative index.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(i) => usize::try_from(*i).ok(),
            Key::Name(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{}", i),
            Key::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index as i64)
    }
}

impl From<i64> for Key {
    fn from(index: i64) -> Self {
        Key::Index(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_and_string_ids_are_equal() {
        let a: Identifier = serde_json::from_value(json!(140234)).unwrap();
        let b: Identifier = serde_json::from_value(json!("140234")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "140234");
    }

    #[test]
    fn identifier_serializes_as_string() {
        let id = Identifier::from(42u64);
        assert_eq!(serde_json::to_value(&id).unwrap(), json!("42"));
    }

    #[test]
    fn identifier_rejects_objects() {
        let result = Identifier::from_json(&json!({"id": 1}));
        assert!(matches!(result, Err(WireError::Malformed { .. })));
    }

    #[test]
    fn key_deserializes_both_forms() {
        let keys: Vec<Key> = serde_json::from_value(json!([3, "name"])).unwrap();
        assert_eq!(keys, vec![Key::Index(3), Key::Name("name".to_string())]);
    }

    #[test]
    fn key_as_index() {
        assert_eq!(Key::Index(2).as_index(), Some(2));
        assert_eq!(Key::Index(-1).as_index(), None);
        assert_eq!(Key::from("x").as_index(), None);
    }

    #[test]
    fn key_display() {
        assert_eq!(Key::from(5usize).to_string(), "5");
        assert_eq!(Key::from("color").to_string(), "color");
    }
}
