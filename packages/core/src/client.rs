//! The client: sends requests for proxies and applies push events.
//!
//! ## Request path
//!
//! Every remote operation goes through [`Client::send_request`], which
//! returns a [`Deferred`] holding the JSON `result` of the response. On a
//! blocking transport the deferred is settled before `send_request` returns.
//! On a correlated transport it settles when [`Client::handle_frame`] (or
//! [`Client::pump`]) sees the matching reply.
//!
//! ## Push path
//!
//! Push events invalidate cached fields, apply structural diffs to list and
//! dict proxies, settle thread futures and rebind the context. All refresh
//! requests made while one event, frame or pump batch is handled reach each
//! [`BindingAdapter`] as a single `schedule_refresh` call.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::{Rc, Weak};

use remirror_wire::{
    DictInfo, Envelope, Identifier, InstanceInfo, Key, ListInfo, ProxyKind, PushEvent, Reference,
    Request, Response, WireError, WireValue, CONTEXT_UPDATED, FUTURE_DONE, FUTURE_ERROR,
    NEW_TYPE, OBJECT_CHANGED,
};
use serde::de::DeserializeOwned;
use tracing::{debug, error, trace, warn};

use crate::codec;
use crate::factory::{Fields, ProxyFactory, Slot};
use crate::registry::Registry;
use crate::request_ids::RequestIdPool;
use crate::transport::{BlockingTransport, CorrelatedTransport, TransportError};
use crate::{BindingAdapter, ClientConfig, Deferred, Error, Proxy, Result, Value};

type Json = serde_json::Value;

enum Link {
    Blocking(Box<dyn BlockingTransport>),
    Correlated {
        transport: Box<dyn CorrelatedTransport>,
        ids: RefCell<RequestIdPool>,
        pending: RefCell<HashMap<i64, Deferred<Json>>>,
    },
}

#[derive(Default)]
struct RefreshGate {
    depth: Cell<usize>,
    dirty: Cell<bool>,
}

/// The broker between proxies and the remote runtime.
pub struct Client {
    this: Weak<Client>,
    config: ClientConfig,
    link: Link,
    registry: RefCell<Registry>,
    factory: RefCell<ProxyFactory>,
    /// Thread futures awaiting their `done`/`error` event.
    futures: RefCell<HashMap<Identifier, Deferred<Json>>>,
    /// Future outcomes that arrived before the call's reply. Only kept
    /// while some thread call is still waiting for its reply.
    orphans: RefCell<HashMap<Identifier, Result<Json>>>,
    /// Thread calls whose reply naming the future has not arrived.
    unnamed_futures: Cell<usize>,
    models: RefCell<BTreeMap<String, Value>>,
    adapters: RefCell<Vec<Rc<dyn BindingAdapter>>>,
    refresh: RefreshGate,
    closed: Cell<bool>,
}

impl Client {
    /// A client over a transport that answers each request synchronously.
    pub fn blocking(transport: Box<dyn BlockingTransport>, config: ClientConfig) -> Rc<Self> {
        Self::with_link(Link::Blocking(transport), config)
    }

    /// A client over a full-duplex transport carrying request envelopes.
    pub fn correlated(transport: Box<dyn CorrelatedTransport>, config: ClientConfig) -> Rc<Self> {
        let link = Link::Correlated {
            transport,
            ids: RefCell::new(RequestIdPool::new(config.request_id_capacity)),
            pending: RefCell::new(HashMap::new()),
        };
        Self::with_link(link, config)
    }

    fn with_link(link: Link, config: ClientConfig) -> Rc<Self> {
        Rc::new_cyclic(|this| Client {
            this: this.clone(),
            factory: RefCell::new(ProxyFactory::new(config.descriptor_policy)),
            config,
            link,
            registry: RefCell::new(Registry::new()),
            futures: RefCell::new(HashMap::new()),
            orphans: RefCell::new(HashMap::new()),
            unnamed_futures: Cell::new(0),
            models: RefCell::new(BTreeMap::new()),
            adapters: RefCell::new(Vec::new()),
            refresh: RefreshGate::default(),
            closed: Cell::new(false),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether a transport failure has ended the session.
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Number of requests awaiting a reply on a correlated transport.
    pub fn in_flight(&self) -> usize {
        match &self.link {
            Link::Blocking(_) => 0,
            Link::Correlated { pending, .. } => pending.borrow().len(),
        }
    }

    // Request path ////////////////////////////////////////////////////////

    /// Send `request` and return the deferred `result` of its response.
    ///
    /// A response carrying an exception settles the deferred with
    /// [`Error::Remote`]. A transport failure closes the session.
    pub fn send_request(&self, request: &Request) -> Result<Deferred<Json>> {
        if self.closed.get() {
            return Err(Error::SessionClosed);
        }
        let payload = serde_json::to_string(request)?;
        debug!(route = %request.route(), "sending request");

        match &self.link {
            Link::Blocking(transport) => {
                let reply = transport
                    .send_request(&payload)
                    .map_err(|error| self.close(error))?;
                let response: Response = serde_json::from_str(&reply)?;
                Ok(Deferred::settled(
                    response.into_result().map_err(Error::remote),
                ))
            }
            Link::Correlated {
                transport,
                ids,
                pending,
            } => {
                let request_id = ids.borrow_mut().acquire()?;
                let frame = Envelope::new(request_id, payload).encode()?;
                if let Err(error) = transport.send_envelope(&frame) {
                    ids.borrow_mut().release(request_id);
                    return Err(self.close(error));
                }
                let reply = Deferred::pending();
                pending.borrow_mut().insert(request_id, reply.clone());
                Ok(reply)
            }
        }
    }

    fn close(&self, error: TransportError) -> Error {
        error!(%error, "transport failed; closing session");
        self.closed.set(true);
        if let Link::Correlated { ids, pending, .. } = &self.link {
            let abandoned: Vec<_> = pending.borrow_mut().drain().collect();
            for (request_id, reply) in abandoned {
                ids.borrow_mut().release(request_id);
                reply.reject(Error::SessionClosed);
            }
        }
        Error::Transport(error)
    }

    fn decode_later<T: DeserializeOwned + 'static>(reply: &Deferred<Json>) -> Deferred<T> {
        reply.then(|result| Ok(serde_json::from_value(result?)?))
    }

    /// Fetch the context: the top-level models by name.
    pub fn get_context(&self) -> Result<Deferred<BTreeMap<String, Value>>> {
        let reply = self.send_request(&Request::GetContext)?;
        let client = self.this.clone();
        Ok(reply.then(move |result| {
            let client = client.upgrade().ok_or(Error::SessionClosed)?;
            client.bind_context(&result?)
        }))
    }

    /// Ask the remote to push a fresh `context_updated` event.
    pub fn update_context(&self) -> Result<Deferred<()>> {
        Ok(self.send_request(&Request::UpdateContext)?.map(|_| ()))
    }

    pub fn get_instance_info(&self, id: &Identifier) -> Result<Deferred<InstanceInfo>> {
        let reply = self.send_request(&Request::GetInstanceInfo { id: id.clone() })?;
        Ok(Self::decode_later(&reply))
    }

    pub fn get_list_info(&self, id: &Identifier) -> Result<Deferred<ListInfo>> {
        let reply = self.send_request(&Request::GetListInfo { id: id.clone() })?;
        Ok(Self::decode_later(&reply))
    }

    pub fn get_dict_info(&self, id: &Identifier) -> Result<Deferred<DictInfo>> {
        let reply = self.send_request(&Request::GetDictInfo { id: id.clone() })?;
        Ok(Self::decode_later(&reply))
    }

    /// Send a thread call and settle the result once the remote future
    /// named by the reply reports `done` or `error`.
    pub(crate) fn call_thread(&self, request: &Request) -> Result<Deferred<Value>> {
        let reply = self.send_request(request)?;
        let outcome = Deferred::pending();
        let target = outcome.clone();
        let client = self.this.clone();
        self.unnamed_futures.set(self.unnamed_futures.get() + 1);
        reply.on_settle(move |result| {
            let Some(client) = client.upgrade() else {
                return;
            };
            match result.and_then(|json| future_id(&json)) {
                Ok(id) => client.watch_future(id, target),
                Err(error) => {
                    target.reject(error);
                }
            }
            client.future_named();
        });

        let client = self.this.clone();
        Ok(outcome.then(move |result| {
            let client = client.upgrade().ok_or(Error::SessionClosed)?;
            client.unmarshal_outcome(&result?)
        }))
    }

    fn future_named(&self) {
        let remaining = self.unnamed_futures.get().saturating_sub(1);
        self.unnamed_futures.set(remaining);
        if remaining == 0 {
            self.orphans.borrow_mut().clear();
        }
    }

    /// A future's `done` payload is usually the raw result; only tagged
    /// objects are wire values.
    fn unmarshal_outcome(&self, data: &Json) -> Result<Value> {
        match data {
            Json::Object(object) if object.contains_key("type") => self.unmarshal_json(data),
            other => Ok(Value::Primitive(other.clone())),
        }
    }

    fn watch_future(&self, id: Identifier, outcome: Deferred<Json>) {
        let early = self.orphans.borrow_mut().remove(&id);
        match early {
            Some(result) => {
                outcome.settle(result);
            }
            None => {
                self.futures.borrow_mut().insert(id, outcome);
            }
        }
    }

    // Proxies /////////////////////////////////////////////////////////////

    pub fn unmarshal(&self, wire: &WireValue) -> Result<Value> {
        codec::unmarshal(self, wire)
    }

    pub fn unmarshal_json(&self, json: &Json) -> Result<Value> {
        self.unmarshal(&WireValue::from_json(json)?)
    }

    /// Unmarshal the reply once it arrives.
    pub fn unmarshal_later(&self, reply: &Deferred<Json>) -> Deferred<Value> {
        let client = self.this.clone();
        reply.then(move |result| {
            let client = client.upgrade().ok_or(Error::SessionClosed)?;
            client.unmarshal_json(&result?)
        })
    }

    pub fn lookup(&self, id: &Identifier) -> Option<Proxy> {
        self.registry.borrow().lookup(id)
    }

    /// Forget the proxy for `id`; its next sighting builds a fresh one.
    pub fn evict(&self, id: &Identifier) -> Option<Proxy> {
        self.registry.borrow_mut().evict(id)
    }

    pub fn proxy_count(&self) -> usize {
        self.registry.borrow().len()
    }

    pub(crate) fn register(&self, reference: &Reference) -> Proxy {
        self.registry
            .borrow_mut()
            .get_or_create(reference.id.clone(), || {
                self.factory
                    .borrow_mut()
                    .create_proxy(self.this.clone(), reference)
            })
    }

    /// Look up the shape of an undescribed proxy from the remote.
    pub(crate) fn describe(&self, proxy: &Proxy) -> Result<()> {
        let id = proxy.id().clone();
        let request = match proxy.kind() {
            ProxyKind::Instance => Request::GetInstanceInfo { id },
            ProxyKind::List => Request::GetListInfo { id },
            ProxyKind::Dict => Request::GetDictInfo { id },
        };
        let reply = self.send_request(&request)?;
        if let Some(result) = reply.try_take() {
            return self.install_descriptor(proxy, result?);
        }

        let client = self.this.clone();
        let target = proxy.downgrade();
        reply.on_settle(move |result| {
            let (Some(client), Some(proxy)) = (client.upgrade(), target.upgrade()) else {
                return;
            };
            match result.and_then(|json| client.install_descriptor(&proxy, json)) {
                Ok(()) => client.request_refresh(),
                Err(error) => warn!(id = %proxy.id(), %error, "descriptor lookup failed"),
            }
        });
        Ok(())
    }

    fn install_descriptor(&self, proxy: &Proxy, json: Json) -> Result<()> {
        let fields = match proxy.kind() {
            ProxyKind::Instance => {
                let info: InstanceInfo = serde_json::from_value(json)?;
                let schema = self.factory.borrow_mut().resolve(Some(&info));
                match schema {
                    Some(schema) => Fields::instance(schema),
                    None => {
                        // Described later by the type's `new_type` event.
                        debug!(type_name = %info.type_name, "type not known yet");
                        return Ok(());
                    }
                }
            }
            ProxyKind::List => Fields::from_list(&serde_json::from_value(json)?),
            ProxyKind::Dict => Fields::from_dict(&serde_json::from_value(json)?),
        };
        proxy.describe(fields);
        Ok(())
    }

    fn learn_type(&self, info: &InstanceInfo) {
        let Some(schema) = self.factory.borrow_mut().remember(info) else {
            return;
        };
        let waiting: Vec<Proxy> = self
            .registry
            .borrow()
            .proxies()
            .filter(|proxy| !proxy.is_described())
            .filter(|proxy| proxy.type_name().as_deref() == Some(info.type_name.as_str()))
            .cloned()
            .collect();
        for proxy in waiting {
            proxy.describe(Fields::instance(Rc::clone(&schema)));
        }
    }

    // Models and adapters /////////////////////////////////////////////////

    /// The models bound by the last context snapshot.
    pub fn models(&self) -> BTreeMap<String, Value> {
        self.models.borrow().clone()
    }

    pub fn model(&self, name: &str) -> Option<Value> {
        self.models.borrow().get(name).cloned()
    }

    pub fn add_adapter(&self, adapter: Rc<dyn BindingAdapter>) {
        self.adapters.borrow_mut().push(adapter);
    }

    fn bind_context(&self, data: &Json) -> Result<BTreeMap<String, Value>> {
        let entries = data.as_object().ok_or_else(|| {
            Error::Wire(WireError::Malformed {
                message: format!("expected a context object, found {}", data),
            })
        })?;

        let mut context = BTreeMap::new();
        for (name, entry) in entries {
            let value = self.unmarshal(&WireValue::from_context_entry(entry)?)?;
            context.insert(name.clone(), value);
        }
        *self.models.borrow_mut() = context.clone();

        let adapters = self.adapters.borrow().clone();
        for (name, value) in &context {
            for adapter in &adapters {
                adapter.bind_model(name, value);
            }
        }
        Ok(context)
    }

    /// Ask the adapters to refresh, once per batch.
    pub fn request_refresh(&self) {
        if self.refresh.depth.get() > 0 {
            self.refresh.dirty.set(true);
        } else {
            self.notify_refresh();
        }
    }

    fn notify_refresh(&self) {
        let adapters = self.adapters.borrow().clone();
        for adapter in adapters {
            adapter.schedule_refresh();
        }
    }

    /// Run `body` with refresh requests coalesced into one notification.
    pub fn batch<R>(&self, body: impl FnOnce() -> R) -> R {
        self.refresh.depth.set(self.refresh.depth.get() + 1);
        let result = body();
        let depth = self.refresh.depth.get() - 1;
        self.refresh.depth.set(depth);
        if depth == 0 && self.refresh.dirty.replace(false) {
            self.notify_refresh();
        }
        result
    }

    // Push path ///////////////////////////////////////////////////////////

    /// Handle one inbound envelope of a correlated transport.
    pub fn handle_frame(&self, frame: &str) -> Result<()> {
        self.batch(|| self.apply_frame(frame))
    }

    /// Handle one JSON-encoded push event.
    pub fn handle_event(&self, event: &str) -> Result<()> {
        self.batch(|| self.apply_event_json(event))
    }

    pub fn handle_push_event(&self, event: PushEvent) -> Result<()> {
        self.batch(|| self.apply_event(event))
    }

    /// Drain everything the transport has queued. Returns the number of
    /// frames or events handled.
    pub fn pump(&self) -> Result<usize> {
        self.batch(|| {
            let mut handled = 0;
            loop {
                if self.closed.get() {
                    return Err(Error::SessionClosed);
                }
                let next = match &self.link {
                    Link::Blocking(transport) => transport.try_recv_event(),
                    Link::Correlated { transport, .. } => transport.try_recv(),
                };
                let Some(inbound) = next.map_err(|error| self.close(error))? else {
                    return Ok(handled);
                };
                match &self.link {
                    Link::Blocking(_) => self.apply_event_json(&inbound)?,
                    Link::Correlated { .. } => self.apply_frame(&inbound)?,
                }
                handled += 1;
            }
        })
    }

    fn apply_frame(&self, frame: &str) -> Result<()> {
        let envelope = Envelope::decode(frame)?;
        if envelope.is_unsolicited() {
            return self.apply_event_json(envelope.payload());
        }

        let request_id = envelope.request_id();
        let Link::Correlated { ids, pending, .. } = &self.link else {
            warn!(request_id, "reply frame on a blocking transport");
            return Ok(());
        };
        let reply = pending.borrow_mut().remove(&request_id);
        let Some(reply) = reply else {
            warn!(request_id, "reply to unknown request");
            return Ok(());
        };
        ids.borrow_mut().release(request_id);

        let outcome = serde_json::from_str::<Response>(envelope.payload())
            .map_err(Error::from)
            .and_then(|response| response.into_result().map_err(Error::remote));
        reply.settle(outcome);
        Ok(())
    }

    fn apply_event_json(&self, event: &str) -> Result<()> {
        let event: PushEvent = serde_json::from_str(event)?;
        self.apply_event(event)
    }

    fn apply_event(&self, event: PushEvent) -> Result<()> {
        trace!(obj = %event.obj, name = %event.name, items = event.items_event, "push event");

        if event.obj.as_str() == self.config.root_target {
            return self.apply_root_event(&event);
        }

        let settles_future = event.name == FUTURE_DONE || event.name == FUTURE_ERROR;
        if settles_future {
            let future = self.futures.borrow_mut().remove(&event.obj);
            if let Some(future) = future {
                future.settle(future_outcome(&event));
                return Ok(());
            }
        }

        let Some(proxy) = self.lookup(&event.obj) else {
            if settles_future && self.unnamed_futures.get() > 0 {
                self.orphans
                    .borrow_mut()
                    .insert(event.obj.clone(), future_outcome(&event));
            } else {
                trace!(obj = %event.obj, "event for unknown object ignored");
            }
            return Ok(());
        };

        if event.items_event {
            self.apply_items_event(&proxy, &event)
        } else {
            self.apply_object_changed(&proxy, &event)
        }
    }

    fn apply_root_event(&self, event: &PushEvent) -> Result<()> {
        match event.name.as_str() {
            CONTEXT_UPDATED => {
                self.bind_context(&event.data)?;
            }
            NEW_TYPE => {
                let info: InstanceInfo = serde_json::from_value(event.data.clone())?;
                self.learn_type(&info);
            }
            OBJECT_CHANGED => {}
            other => trace!(name = other, "unhandled session event"),
        }
        self.request_refresh();
        Ok(())
    }

    fn apply_object_changed(&self, proxy: &Proxy, event: &PushEvent) -> Result<()> {
        let key = Key::from(event.name.as_str());
        proxy.invalidate(&key);

        if let Some(wire) = event.value()? {
            if self.config.seed_changed_values {
                proxy.store(&key, Slot::Saved(wire));
            } else if wire.is_reference() {
                // Registers (and describes) the new object ahead of the read.
                self.unmarshal(&wire)?;
            }
        }
        self.request_refresh();
        Ok(())
    }

    fn apply_items_event(&self, owner: &Proxy, event: &PushEvent) -> Result<()> {
        let change = event.items_change()?;
        match self.lookup(&change.id) {
            Some(collection) => collection.update(&change.diff)?,
            None => {
                // The remote replaced the collection with an equal one, so no
                // change event named the new id; refetch the attribute.
                debug!(id = %change.id, owner = %owner.id(), "items event for unknown collection");
                owner.invalidate(&Key::from(event.name.as_str()));
            }
        }
        self.request_refresh();
        Ok(())
    }
}

/// The remote future named by the reply to a thread call.
fn future_id(reply: &Json) -> Result<Identifier> {
    match WireValue::from_json(reply)? {
        WireValue::Reference(reference) => Ok(reference.id),
        WireValue::Primitive(value) => Ok(Identifier::from_json(&value)?),
    }
}

fn future_outcome(event: &PushEvent) -> Result<Json> {
    if event.name == FUTURE_DONE {
        return Ok(event.data.clone());
    }
    let message = match &event.data {
        Json::String(message) => message.clone(),
        Json::Object(object) => match object.get("value") {
            Some(Json::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => event.data.to_string(),
        },
        other => other.to_string(),
    };
    Err(Error::remote(message))
}
