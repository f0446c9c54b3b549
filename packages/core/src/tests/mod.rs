//! Session-level tests against a scripted remote.


use std::cell::{Cell, RefCell};
use std::rc::Rc;

use remirror_wire::{InstanceInfo, Reference, Response, WireValue};
use serde_json::json;

use crate::testing::MockRemote;
use crate::{BindingAdapter, ClientConfig, Proxy, Session, Value};

/// Counts refresh requests and records model bindings.
#[derive(Default)]
pub(crate) struct CountingAdapter {
    refreshes: Cell<usize>,
    bound: RefCell<Vec<String>>,
}

impl CountingAdapter {
    pub(crate) fn refreshes(&self) -> usize {
        self.refreshes.get()
    }

    pub(crate) fn bound(&self) -> Vec<String> {
        self.bound.borrow().clone()
    }
}

impl BindingAdapter for CountingAdapter {
    fn schedule_refresh(&self) {
        self.refreshes.set(self.refreshes.get() + 1);
    }

    fn bind_model(&self, name: &str, _value: &Value) {
        self.bound.borrow_mut().push(name.to_string());
    }
}

pub(crate) fn person_info() -> InstanceInfo {
    InstanceInfo::named("app.Person")
        .with_attributes(["name", "age", "friend", "tags", "scores"])
        .with_methods(["greet", "work"])
        .with_events(["poked"])
}

/// A reference to a person, carrying the full descriptor.
pub(crate) fn person_ref(id: &str) -> WireValue {
    Reference::instance(id, person_info()).into()
}

/// A reference to a person, carrying only the type name.
pub(crate) fn known_person_ref(id: &str) -> WireValue {
    Reference::instance(id, InstanceInfo::named("app.Person")).into()
}

pub(crate) fn blocking_session(remote: &MockRemote) -> Session {
    Session::blocking(remote.transport(), ClientConfig::default())
}

pub(crate) fn with_adapter(session: &Session) -> Rc<CountingAdapter> {
    let adapter = Rc::new(CountingAdapter::default());
    session.add_adapter(adapter.clone());
    adapter
}

pub(crate) fn proxy_for(session: &Session, wire: &WireValue) -> Proxy {
    match session.client().unmarshal(wire).unwrap() {
        Value::Proxy(proxy) => proxy,
        other => panic!("expected a proxy, got {:?}", other),
    }
}

pub(crate) fn context_response(name: &str, wire: &WireValue) -> Response {
    Response::ok(json!({ name: wire.to_json() }))
}
