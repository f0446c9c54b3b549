//! Local mirrors of remote objects.
//!
//! A [`Proxy`] is a handle to the one mirror of a remote object within a
//! session. Fields are fetched lazily and cached; writes go to the cache
//! first and are then forwarded to the remote. The cache is kept fresh by
//! push events handled in [`Client`](crate::Client).

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use remirror_wire::{CollectionDiff, Identifier, Key, ProxyKind, Request, TypeInfo, WireValue};
use tracing::warn;

use crate::client::Client;
use crate::codec::marshal;
use crate::factory::{apply_dict_diff, apply_list_diff, Fields, Slot};
use crate::{Deferred, Error, Result, Value};

struct ProxyState {
    fields: Fields,
    /// False until the shape of the remote object is known. Field names and
    /// indices are not checked on an undescribed proxy.
    described: bool,
    /// Keys with a fetch in flight.
    pending: HashSet<Key>,
}

struct ProxyInner {
    kind: ProxyKind,
    id: Identifier,
    owner: Weak<Client>,
    state: RefCell<ProxyState>,
}

/// A live mirror of a remote instance, list or dict.
///
/// Clones are handles to the same mirror.
#[derive(Clone)]
pub struct Proxy(Rc<ProxyInner>);

pub(crate) struct WeakProxy(Weak<ProxyInner>);

impl WeakProxy {
    pub(crate) fn upgrade(&self) -> Option<Proxy> {
        self.0.upgrade().map(Proxy)
    }
}

enum Peek {
    Ready(Value),
    Saved(WireValue),
    Empty,
}

impl Proxy {
    pub(crate) fn new(
        kind: ProxyKind,
        id: Identifier,
        owner: Weak<Client>,
        fields: Fields,
        described: bool,
    ) -> Self {
        Proxy(Rc::new(ProxyInner {
            kind,
            id,
            owner,
            state: RefCell::new(ProxyState {
                fields,
                described,
                pending: HashSet::new(),
            }),
        }))
    }

    /// A proxy belonging to no session.
    #[cfg(test)]
    pub(crate) fn detached(kind: ProxyKind, id: Identifier) -> Self {
        Proxy::new(kind, id, Weak::new(), Fields::empty(kind), false)
    }

    pub fn kind(&self) -> ProxyKind {
        self.0.kind
    }

    pub fn id(&self) -> &Identifier {
        &self.0.id
    }

    /// The remote type name of an instance.
    pub fn type_name(&self) -> Option<String> {
        match &self.0.state.borrow().fields {
            Fields::Instance { schema, .. } => Some(schema.type_name.clone()),
            _ => None,
        }
    }

    pub fn is_described(&self) -> bool {
        self.0.state.borrow().described
    }

    /// Whether both handles refer to the same mirror.
    pub fn ptr_eq(&self, other: &Proxy) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn downgrade(&self) -> WeakProxy {
        WeakProxy(Rc::downgrade(&self.0))
    }

    fn client(&self) -> Result<Rc<Client>> {
        self.0.owner.upgrade().ok_or(Error::SessionClosed)
    }

    fn unknown_field(&self, key: &Key) -> Error {
        Error::UnknownField {
            id: self.0.id.clone(),
            key: key.clone(),
        }
    }

    /// The field names of an instance, the indices of a list or the keys of
    /// a dict.
    pub fn keys(&self) -> Vec<Key> {
        match &self.0.state.borrow().fields {
            Fields::Instance { schema, .. } => {
                schema.attributes.iter().cloned().map(Key::from).collect()
            }
            Fields::List(items) => (0..items.len()).map(Key::from).collect(),
            Fields::Dict(items) => items.keys().cloned().collect(),
        }
    }

    /// Number of items of a list or dict.
    pub fn item_count(&self) -> Option<usize> {
        match &self.0.state.borrow().fields {
            Fields::Instance { .. } => None,
            Fields::List(items) => Some(items.len()),
            Fields::Dict(items) => Some(items.len()),
        }
    }

    /// Method names of an instance.
    pub fn methods(&self) -> Vec<String> {
        match &self.0.state.borrow().fields {
            Fields::Instance { schema, .. } => schema.methods.clone(),
            _ => Vec::new(),
        }
    }

    /// Event names of an instance.
    pub fn events(&self) -> Vec<String> {
        match &self.0.state.borrow().fields {
            Fields::Instance { schema, .. } => schema.events.clone(),
            _ => Vec::new(),
        }
    }

    fn is_event(&self, key: &Key) -> bool {
        match (&self.0.state.borrow().fields, key) {
            (Fields::Instance { schema, .. }, Key::Name(name)) => schema.is_event(name),
            _ => false,
        }
    }

    /// Whether `key` names a field this proxy can hold.
    fn check_field(&self, key: &Key) -> Result<()> {
        let state = self.0.state.borrow();
        let known = match &state.fields {
            Fields::Instance { schema, .. } => match key {
                Key::Name(name) => !state.described || schema.is_attribute(name),
                Key::Index(_) => false,
            },
            Fields::List(items) => match key.as_index() {
                Some(index) => !state.described || index < items.len(),
                None => false,
            },
            Fields::Dict(items) => !state.described || items.contains_key(key),
        };
        if known {
            Ok(())
        } else {
            Err(self.unknown_field(key))
        }
    }

    fn peek(&self, key: &Key) -> Peek {
        let state = self.0.state.borrow();
        let slot = match &state.fields {
            Fields::Instance { cache, .. } => key.as_name().and_then(|name| cache.get(name)),
            Fields::List(items) => key
                .as_index()
                .and_then(|index| items.get(index))
                .and_then(Option::as_ref),
            Fields::Dict(items) => items.get(key).and_then(Option::as_ref),
        };
        match slot {
            Some(Slot::Ready(value)) => Peek::Ready(value.clone()),
            Some(Slot::Saved(wire)) => Peek::Saved(wire.clone()),
            None => Peek::Empty,
        }
    }

    pub(crate) fn store(&self, key: &Key, slot: Slot) {
        let mut state = self.0.state.borrow_mut();
        let described = state.described;
        match &mut state.fields {
            Fields::Instance { cache, .. } => {
                if let Some(name) = key.as_name() {
                    cache.insert(name.to_string(), slot);
                }
            }
            Fields::List(items) => {
                if let Some(index) = key.as_index() {
                    if index >= items.len() && !described {
                        items.resize_with(index + 1, || None);
                    }
                    if let Some(item) = items.get_mut(index) {
                        *item = Some(slot);
                    }
                }
            }
            Fields::Dict(items) => {
                items.insert(key.clone(), Some(slot));
            }
        }
    }

    /// Whether `key` has a cached (or seeded) value.
    pub fn is_cached(&self, key: &Key) -> bool {
        !matches!(self.peek(key), Peek::Empty)
    }

    /// Whether a fetch of `key` is in flight.
    pub fn is_pending(&self, key: &Key) -> bool {
        self.0.state.borrow().pending.contains(key)
    }

    /// The cached value of `key`, without fetching. Seeded values that have
    /// not been read yet are not returned.
    pub fn cached(&self, key: &Key) -> Option<Value> {
        match self.peek(key) {
            Peek::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Drop the cached value of `key`; the next read fetches it.
    pub fn invalidate(&self, key: &Key) {
        let mut state = self.0.state.borrow_mut();
        match &mut state.fields {
            Fields::Instance { cache, .. } => {
                if let Some(name) = key.as_name() {
                    cache.remove(name);
                }
            }
            Fields::List(items) => {
                if let Some(item) = key.as_index().and_then(|index| items.get_mut(index)) {
                    *item = None;
                }
            }
            Fields::Dict(items) => {
                if let Some(item) = items.get_mut(key) {
                    *item = None;
                }
            }
        }
    }

    /// Drop every cached value.
    pub fn invalidate_all(&self) {
        let mut state = self.0.state.borrow_mut();
        match &mut state.fields {
            Fields::Instance { cache, .. } => cache.clear(),
            Fields::List(items) => items.iter_mut().for_each(|item| *item = None),
            Fields::Dict(items) => items.values_mut().for_each(|item| *item = None),
        }
    }

    fn fetch_request(&self, key: &Key) -> Request {
        match self.0.kind {
            ProxyKind::Instance => Request::GetInstanceAttribute {
                id: self.0.id.clone(),
                attribute_name: key.to_string(),
            },
            ProxyKind::List | ProxyKind::Dict => Request::GetItem {
                id: self.0.id.clone(),
                index: key.clone(),
            },
        }
    }

    /// Read a field: an instance attribute, a list index or a dict key.
    ///
    /// A cached value is returned without contacting the remote. Otherwise
    /// the value is fetched; on a blocking transport it is returned at once.
    /// On a correlated transport the first read returns the attribute's
    /// placeholder (or `None`), and the session's adapters are asked to
    /// refresh once the value has arrived. Reads while that fetch is in
    /// flight send no further requests.
    pub fn get_field(&self, key: impl Into<Key>) -> Result<Option<Value>> {
        let key = key.into();
        if self.is_event(&key) {
            return Err(Error::WriteOnly {
                name: key.to_string(),
            });
        }
        self.check_field(&key)?;
        let client = self.client()?;

        match self.peek(&key) {
            Peek::Ready(value) => return Ok(Some(value)),
            Peek::Saved(wire) => {
                let value = client.unmarshal(&wire)?;
                self.store(&key, Slot::Ready(value.clone()));
                return Ok(Some(value));
            }
            Peek::Empty => {}
        }

        if self.is_pending(&key) {
            return self.placeholder(&client, &key);
        }

        let reply = client.send_request(&self.fetch_request(&key))?;
        if let Some(result) = reply.try_take() {
            let value = client.unmarshal_json(&result?)?;
            self.store(&key, Slot::Ready(value.clone()));
            return Ok(Some(value));
        }

        self.0.state.borrow_mut().pending.insert(key.clone());
        let proxy = self.downgrade();
        let fetched = key.clone();
        reply.on_settle(move |result| {
            if let Some(proxy) = proxy.upgrade() {
                proxy.complete_fetch(fetched, result);
            }
        });
        self.placeholder(&client, &key)
    }

    fn complete_fetch(&self, key: Key, result: Result<serde_json::Value>) {
        // A local write since the fetch was sent wins over the fetched value.
        if !self.0.state.borrow_mut().pending.remove(&key) {
            return;
        }
        let Ok(client) = self.client() else {
            return;
        };
        match result.and_then(|json| client.unmarshal_json(&json)) {
            Ok(value) => {
                self.store(&key, Slot::Ready(value));
                client.request_refresh();
            }
            Err(error) => {
                warn!(id = %self.0.id, key = %key, %error, "fetch failed");
            }
        }
    }

    fn placeholder(&self, client: &Client, key: &Key) -> Result<Option<Value>> {
        let default = match (&self.0.state.borrow().fields, key) {
            (Fields::Instance { schema, .. }, Key::Name(name)) => schema.defaults.get(name).cloned(),
            _ => None,
        };
        default.map(|wire| client.unmarshal(&wire)).transpose()
    }

    /// Write a field.
    ///
    /// The cache is updated first and the write is then sent to the remote.
    /// Writing an event field fires the event. A failure reported by the
    /// remote drops the optimistic value from the cache; on a blocking
    /// transport it is also returned.
    pub fn set_field(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        let value = value.into();
        if self.is_event(&key) {
            return self.fire_event(&key.to_string(), value);
        }
        // Dicts accept new keys; the remote answers with an items event.
        if self.0.kind != ProxyKind::Dict {
            self.check_field(&key)?;
        }
        let client = self.client()?;

        let request = match self.0.kind {
            ProxyKind::Instance => Request::SetInstanceAttribute {
                id: self.0.id.clone(),
                attribute_name: key.to_string(),
                value: marshal(&value),
            },
            ProxyKind::List | ProxyKind::Dict => Request::SetItem {
                id: self.0.id.clone(),
                index: key.clone(),
                value: marshal(&value),
            },
        };

        self.store(&key, Slot::Ready(value));
        self.0.state.borrow_mut().pending.remove(&key);

        let reply = match client.send_request(&request) {
            Ok(reply) => reply,
            Err(error) => {
                self.invalidate(&key);
                return Err(error);
            }
        };
        match reply.try_take() {
            Some(Ok(_)) => Ok(()),
            Some(Err(error)) => {
                self.invalidate(&key);
                Err(error)
            }
            None => {
                let proxy = self.downgrade();
                reply.on_settle(move |result| {
                    let Err(error) = result else {
                        return;
                    };
                    if let Some(proxy) = proxy.upgrade() {
                        warn!(id = %proxy.id(), key = %key, %error, "remote rejected write");
                        proxy.invalidate(&key);
                        if let Ok(client) = proxy.client() {
                            client.request_refresh();
                        }
                    }
                });
                Ok(())
            }
        }
    }

    /// Fire the event `name` on a remote instance.
    pub fn fire_event(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let undescribed = !self.is_described();
        match &self.0.state.borrow().fields {
            Fields::Instance { schema, .. } if undescribed || schema.is_event(name) => {}
            Fields::Instance { .. } => return Err(self.unknown_field(&Key::from(name))),
            _ => {
                return Err(Error::WrongKind {
                    kind: self.0.kind,
                    operation: "fire_event",
                })
            }
        }
        let client = self.client()?;
        let request = Request::SetInstanceAttribute {
            id: self.0.id.clone(),
            attribute_name: name.to_string(),
            value: marshal(&value.into()),
        };
        let reply = client.send_request(&request)?;
        match reply.try_take() {
            Some(result) => result.map(|_| ()),
            None => {
                let id = self.0.id.clone();
                let name = name.to_string();
                reply.on_settle(move |result| {
                    if let Err(error) = result {
                        warn!(%id, event = %name, %error, "remote rejected event");
                    }
                });
                Ok(())
            }
        }
    }

    fn method_request(&self, name: &str, args: &[Value], thread: bool) -> Result<Request> {
        let undescribed = !self.is_described();
        match &self.0.state.borrow().fields {
            Fields::Instance { schema, .. } if undescribed || schema.is_method(name) => {}
            Fields::Instance { .. } => {
                return Err(Error::UnknownMethod {
                    id: self.0.id.clone(),
                    name: name.to_string(),
                })
            }
            _ => {
                return Err(Error::WrongKind {
                    kind: self.0.kind,
                    operation: "call_method",
                })
            }
        }

        let id = self.0.id.clone();
        let method_name = name.to_string();
        let args = args.iter().map(marshal).collect();
        Ok(if thread {
            Request::CallInstanceMethodThread {
                id,
                method_name,
                args,
            }
        } else {
            Request::CallInstanceMethod {
                id,
                method_name,
                args,
            }
        })
    }

    /// Call a method of a remote instance.
    pub fn call_method(&self, name: &str, args: &[Value]) -> Result<Deferred<Value>> {
        let request = self.method_request(name, args, false)?;
        let client = self.client()?;
        let reply = client.send_request(&request)?;
        Ok(client.unmarshal_later(&reply))
    }

    /// Call a method on a remote worker thread.
    ///
    /// The returned deferred settles when the remote reports that the call
    /// finished, which may be long after this returns.
    pub fn call_method_thread(&self, name: &str, args: &[Value]) -> Result<Deferred<Value>> {
        let request = self.method_request(name, args, true)?;
        let client = self.client()?;
        client.call_thread(&request)
    }

    /// Apply a structural change to a list or dict.
    pub fn update(&self, diff: &CollectionDiff) -> Result<()> {
        let wrong_kind = || Error::WrongKind {
            kind: self.0.kind,
            operation: "update",
        };
        let mut guard = self.0.state.borrow_mut();
        let state = &mut *guard;
        match diff {
            CollectionDiff::List(diff) => match &mut state.fields {
                Fields::List(items) => apply_list_diff(items, diff)?,
                _ => return Err(wrong_kind()),
            },
            CollectionDiff::Dict(diff) => match &mut state.fields {
                Fields::Dict(items) => apply_dict_diff(items, diff),
                _ => return Err(wrong_kind()),
            },
            CollectionDiff::Reset(info) => {
                state.fields = match (self.0.kind, info) {
                    (ProxyKind::List, TypeInfo::List(info)) => Fields::from_list(info),
                    (ProxyKind::Dict, TypeInfo::Dict(info)) => Fields::from_dict(info),
                    _ => return Err(wrong_kind()),
                };
                state.described = true;
                state.pending.clear();
            }
        }
        Ok(())
    }

    /// Install the shape of the remote object once it is known. Cached
    /// instance attributes survive; collection contents are replaced.
    pub(crate) fn describe(&self, fields: Fields) {
        let mut state = self.0.state.borrow_mut();
        match (&mut state.fields, fields) {
            (Fields::Instance { schema, .. }, Fields::Instance { schema: known, .. }) => {
                *schema = known;
            }
            (current, fields) => *current = fields,
        }
        state.described = true;
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("kind", &self.0.kind)
            .field("id", &self.0.id)
            .finish()
    }
}
