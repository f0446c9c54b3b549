//! Local values: plain JSON data or live proxies.

use remirror_wire::Identifier;

use crate::Proxy;

/// An unmarshaled value.
///
/// Equality compares primitives by value and proxies by identity.
#[derive(Clone, Debug)]
pub enum Value {
    Primitive(serde_json::Value),
    Proxy(Proxy),
}

impl Value {
    pub fn null() -> Self {
        Value::Primitive(serde_json::Value::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Primitive(serde_json::Value::Null))
    }

    pub fn as_proxy(&self) -> Option<&Proxy> {
        match self {
            Value::Proxy(proxy) => Some(proxy),
            Value::Primitive(_) => None,
        }
    }

    pub fn as_primitive(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Primitive(value) => Some(value),
            Value::Proxy(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_primitive().and_then(serde_json::Value::as_i64)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_primitive().and_then(serde_json::Value::as_str)
    }

    /// The identifier of the referenced object, for proxies.
    pub fn id(&self) -> Option<&Identifier> {
        self.as_proxy().map(Proxy::id)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Primitive(a), Value::Primitive(b)) => a == b,
            (Value::Proxy(a), Value::Proxy(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::Primitive(value)
    }
}

impl From<Proxy> for Value {
    fn from(proxy: Proxy) -> Self {
        Value::Proxy(proxy)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Primitive(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Primitive(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Primitive(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Primitive(value.into())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Primitive(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remirror_wire::ProxyKind;
    use serde_json::json;

    #[test]
    fn primitives_compare_by_value() {
        assert_eq!(Value::from(3i64), Value::Primitive(json!(3)));
        assert_ne!(Value::from("a"), Value::from("b"));
        assert!(Value::null().is_null());
    }

    #[test]
    fn proxies_compare_by_identity() {
        let a = Proxy::detached(ProxyKind::Instance, Identifier::from("1"));
        let b = Proxy::detached(ProxyKind::Instance, Identifier::from("1"));
        assert_eq!(Value::from(a.clone()), Value::from(a.clone()));
        assert_ne!(Value::from(a), Value::from(b));
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert_eq!(Value::from(5i64).as_i64(), Some(5));
        assert!(Value::from(true).as_proxy().is_none());
    }
}
