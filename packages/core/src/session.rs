//! Sessions: one client, its registry and its transport.

use std::collections::BTreeMap;
use std::rc::Rc;

use remirror_wire::{Identifier, PushEvent};
use tracing::{info, info_span, Span};
use uuid::Uuid;

use crate::transport::{BlockingTransport, CorrelatedTransport};
use crate::{BindingAdapter, Client, ClientConfig, Deferred, Proxy, Result, Value};

/// A mirroring session with one remote runtime.
///
/// Everything a session knows lives here; nothing is shared between
/// sessions.
pub struct Session {
    id: Uuid,
    span: Span,
    client: Rc<Client>,
}

impl Session {
    /// A session over a transport that answers each request synchronously.
    pub fn blocking(transport: impl BlockingTransport + 'static, config: ClientConfig) -> Self {
        Self::start(Client::blocking(Box::new(transport), config), "blocking")
    }

    /// A session over a full-duplex transport.
    pub fn correlated(transport: impl CorrelatedTransport + 'static, config: ClientConfig) -> Self {
        Self::start(Client::correlated(Box::new(transport), config), "correlated")
    }

    fn start(client: Rc<Client>, transport: &str) -> Self {
        let id = Uuid::new_v4();
        let span = info_span!("session", %id);
        span.in_scope(|| info!(transport, "session started"));
        Self { id, span, client }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn client(&self) -> &Rc<Client> {
        &self.client
    }

    /// Fetch the context and bind its models.
    pub fn get_context(&self) -> Result<Deferred<BTreeMap<String, Value>>> {
        let _entered = self.span.enter();
        self.client.get_context()
    }

    pub fn update_context(&self) -> Result<Deferred<()>> {
        let _entered = self.span.enter();
        self.client.update_context()
    }

    /// The models bound by the last context snapshot.
    pub fn context(&self) -> BTreeMap<String, Value> {
        self.client.models()
    }

    pub fn model(&self, name: &str) -> Option<Value> {
        self.client.model(name)
    }

    /// Handle everything the transport has queued.
    pub fn pump(&self) -> Result<usize> {
        let _entered = self.span.enter();
        self.client.pump()
    }

    /// Deliver a JSON push event from the host.
    pub fn handle_event(&self, event: &str) -> Result<()> {
        let _entered = self.span.enter();
        self.client.handle_event(event)
    }

    pub fn handle_push_event(&self, event: PushEvent) -> Result<()> {
        let _entered = self.span.enter();
        self.client.handle_push_event(event)
    }

    /// Deliver a raw envelope of a correlated channel.
    pub fn handle_frame(&self, frame: &str) -> Result<()> {
        let _entered = self.span.enter();
        self.client.handle_frame(frame)
    }

    pub fn add_adapter(&self, adapter: Rc<dyn BindingAdapter>) {
        self.client.add_adapter(adapter);
    }

    pub fn lookup(&self, id: &Identifier) -> Option<Proxy> {
        self.client.lookup(id)
    }

    /// Drop the registry entry for `id`. Handles to the old proxy keep
    /// working but no longer receive updates.
    pub fn evict(&self, id: &Identifier) -> Option<Proxy> {
        self.client.evict(id)
    }

    pub fn is_closed(&self) -> bool {
        self.client.is_closed()
    }
}
