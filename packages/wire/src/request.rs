//! Requests sent to the remote runtime and the responses it returns.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Identifier, Key, WireValue};

/// A request to the remote runtime, tagged on the wire by `kind`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Request {
    /// Fetch the mapping of top-level model names to marshaled objects.
    GetContext,

    /// Ask the remote to push a `context_updated` event.
    UpdateContext,

    GetInstanceInfo {
        id: Identifier,
    },

    GetListInfo {
        id: Identifier,
    },

    GetDictInfo {
        id: Identifier,
    },

    GetInstanceAttribute {
        id: Identifier,
        attribute_name: String,
    },

    GetItem {
        id: Identifier,
        index: Key,
    },

    SetInstanceAttribute {
        id: Identifier,
        attribute_name: String,
        value: WireValue,
    },

    SetItem {
        id: Identifier,
        index: Key,
        value: WireValue,
    },

    CallInstanceMethod {
        id: Identifier,
        method_name: String,
        args: Vec<WireValue>,
    },

    /// Run a method on a remote worker; the reply names a future object
    /// whose `done`/`error` events report completion.
    CallInstanceMethodThread {
        id: Identifier,
        method_name: String,
        args: Vec<WireValue>,
    },
}

impl Request {
    /// The `kind` tag of this request.
    pub fn kind(&self) -> &'static str {
        match self {
            Request::GetContext => "get_context",
            Request::UpdateContext => "update_context",
            Request::GetInstanceInfo { .. } => "get_instance_info",
            Request::GetListInfo { .. } => "get_list_info",
            Request::GetDictInfo { .. } => "get_dict_info",
            Request::GetInstanceAttribute { .. } => "get_instance_attribute",
            Request::GetItem { .. } => "get_item",
            Request::SetInstanceAttribute { .. } => "set_instance_attribute",
            Request::SetItem { .. } => "set_item",
            Request::CallInstanceMethod { .. } => "call_instance_method",
            Request::CallInstanceMethodThread { .. } => "call_instance_method_thread",
        }
    }

    /// The object this request addresses, if any.
    pub fn target(&self) -> Option<&Identifier> {
        match self {
            Request::GetContext | Request::UpdateContext => None,
            Request::GetInstanceInfo { id }
            | Request::GetListInfo { id }
            | Request::GetDictInfo { id }
            | Request::GetInstanceAttribute { id, .. }
            | Request::GetItem { id, .. }
            | Request::SetInstanceAttribute { id, .. }
            | Request::SetItem { id, .. }
            | Request::CallInstanceMethod { id, .. }
            | Request::CallInstanceMethodThread { id, .. } => Some(id),
        }
    }

    /// A short description used for logging and request matching,
    /// e.g. `get_instance_attribute/12/name`.
    pub fn route(&self) -> String {
        let member = match self {
            Request::GetInstanceAttribute { attribute_name, .. }
            | Request::SetInstanceAttribute { attribute_name, .. } => Some(attribute_name.clone()),
            Request::GetItem { index, .. } | Request::SetItem { index, .. } => {
                Some(index.to_string())
            }
            Request::CallInstanceMethod { method_name, .. }
            | Request::CallInstanceMethodThread { method_name, .. } => Some(method_name.clone()),
            _ => None,
        };

        let mut route = self.kind().to_string();
        if let Some(id) = self.target() {
            route.push('/');
            route.push_str(id.as_str());
        }
        if let Some(member) = member {
            route.push('/');
            route.push_str(&member);
        }
        route
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// The remote's answer to a [`Request`].
///
/// A non-null `exception` means the request failed; `result` is then
/// meaningless.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub result: Value,

    #[serde(default)]
    pub exception: Option<String>,
}

impl Response {
    pub fn ok(result: impl Into<Value>) -> Self {
        Self {
            result: result.into(),
            exception: None,
        }
    }

    /// A successful response carrying a marshaled value.
    pub fn value(value: WireValue) -> Self {
        Self::ok(value.to_json())
    }

    pub fn failure(exception: impl Into<String>) -> Self {
        Self {
            result: Value::Null,
            exception: Some(exception.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.exception.is_some()
    }

    /// Split into the result or the remote exception message.
    pub fn into_result(self) -> Result<Value, String> {
        match self.exception {
            Some(exception) => Err(exception),
            None => Ok(self.result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requests_serialize_with_kind_tag() {
        let request = Request::GetInstanceAttribute {
            id: Identifier::from("12"),
            attribute_name: "name".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"kind": "get_instance_attribute", "id": "12", "attribute_name": "name"})
        );
    }

    #[test]
    fn unit_requests_serialize_kind_only() {
        assert_eq!(
            serde_json::to_value(Request::UpdateContext).unwrap(),
            json!({"kind": "update_context"})
        );
    }

    #[test]
    fn set_item_carries_marshaled_value() {
        let request = Request::SetItem {
            id: Identifier::from("4"),
            index: Key::from(2usize),
            value: WireValue::primitive(99),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "kind": "set_item",
                "id": "4",
                "index": 2,
                "value": {"type": "primitive", "value": 99}
            })
        );
    }

    #[test]
    fn requests_deserialize() {
        let request: Request = serde_json::from_value(json!({
            "kind": "call_instance_method",
            "id": 8,
            "method_name": "add",
            "args": [{"type": "primitive", "value": 1}]
        }))
        .unwrap();
        assert_eq!(
            request,
            Request::CallInstanceMethod {
                id: Identifier::from("8"),
                method_name: "add".to_string(),
                args: vec![WireValue::primitive(1)],
            }
        );
    }

    #[test]
    fn kind_matches_serialized_tag() {
        let request = Request::CallInstanceMethodThread {
            id: Identifier::from("1"),
            method_name: "run".to_string(),
            args: vec![],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["kind"], json!(request.kind()));
    }

    #[test]
    fn routes() {
        assert_eq!(Request::GetContext.route(), "get_context");
        assert_eq!(
            Request::GetItem {
                id: Identifier::from("3"),
                index: Key::from(0usize)
            }
            .route(),
            "get_item/3/0"
        );
        assert_eq!(
            Request::CallInstanceMethod {
                id: Identifier::from("3"),
                method_name: "go".to_string(),
                args: vec![]
            }
            .route(),
            "call_instance_method/3/go"
        );
    }

    #[test]
    fn response_into_result() {
        assert_eq!(Response::ok(json!(1)).into_result(), Ok(json!(1)));
        assert_eq!(
            Response::failure("Boom").into_result(),
            Err("Boom".to_string())
        );
    }

    #[test]
    fn empty_response_is_null_success() {
        let response: Response = serde_json::from_str("{}").unwrap();
        assert!(!response.is_failure());
        assert_eq!(response.result, Value::Null);
    }
}
