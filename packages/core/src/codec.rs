//! Conversion between local values and their marshaled form.

use remirror_wire::{Reference, WireValue};

use crate::client::Client;
use crate::{Result, Value};

/// Marshal a local value. Proxies travel as bare references; the remote
/// already knows their shape.
pub fn marshal(value: &Value) -> WireValue {
    match value {
        Value::Primitive(value) => WireValue::Primitive(value.clone()),
        Value::Proxy(proxy) => {
            WireValue::Reference(Reference::new(proxy.kind(), proxy.id().clone()))
        }
    }
}

/// Unmarshal a wire value.
///
/// References resolve to the registered proxy for their identifier; the
/// first sighting of an identifier creates and registers it.
pub(crate) fn unmarshal(client: &Client, wire: &WireValue) -> Result<Value> {
    let reference = match wire {
        WireValue::Primitive(value) => return Ok(Value::Primitive(value.clone())),
        WireValue::Reference(reference) => reference,
    };

    if let Some(proxy) = client.lookup(&reference.id) {
        return Ok(Value::Proxy(proxy));
    }

    let proxy = client.register(reference);
    if !proxy.is_described() {
        client.describe(&proxy)?;
    }
    Ok(Value::Proxy(proxy))
}
