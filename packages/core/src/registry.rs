//! The identity registry: one proxy per remote identifier.

use std::collections::HashMap;

use remirror_wire::Identifier;

use crate::Proxy;

#[derive(Default)]
pub struct Registry {
    proxies: HashMap<Identifier, Proxy>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the proxy registered for `id`, creating it with `create` if
    /// there is none. An existing entry is never replaced.
    pub fn get_or_create(&mut self, id: Identifier, create: impl FnOnce() -> Proxy) -> Proxy {
        self.proxies.entry(id).or_insert_with(create).clone()
    }

    pub fn lookup(&self, id: &Identifier) -> Option<Proxy> {
        self.proxies.get(id).cloned()
    }

    /// Forget the proxy for `id`. The next sighting of `id` creates a new one.
    pub fn evict(&mut self, id: &Identifier) -> Option<Proxy> {
        self.proxies.remove(id)
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub fn proxies(&self) -> impl Iterator<Item = &Proxy> {
        self.proxies.values()
    }
}
