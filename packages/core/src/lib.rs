//! Live local proxies of objects owned by a remote runtime.
//!
//! A [`Session`] mirrors the objects a remote runtime exposes. Each remote
//! instance, list or dict appears locally as exactly one [`Proxy`], whose
//! fields are fetched on first read and cached until the remote reports a
//! change. Writes update the cache and are forwarded to the remote.
//!
//! ## Transports
//!
//! - [`BlockingTransport`]: each request is answered before the call
//!   returns; reads see values at once. [`EmbeddedTransport`] calls into a
//!   runtime in the same process.
//! - [`CorrelatedTransport`]: requests and replies travel as envelopes on a
//!   duplex channel; reads return placeholders until the value arrives and
//!   the [`BindingAdapter`]s are asked to refresh. [`ChannelTransport`]
//!   provides the local half.
//!
//! ## Example
//!
//! ```ignore
//! use remirror_core::{ClientConfig, EmbeddedTransport, Session};
//!
//! let session = Session::blocking(EmbeddedTransport::new(handler), ClientConfig::default());
//! let models = session.get_context()?.into_ready()?;
//! let person = models["person"].as_proxy().unwrap();
//! let name = person.get_field("name")?;
//! person.set_field("age", 31i64)?;
//! ```

mod adapter;
mod channel;
mod client;
pub mod codec;
mod config;
mod deferred;
mod error;
mod factory;
mod proxy;
mod registry;
pub mod request_ids;
mod session;
pub mod transport;
mod value;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

#[cfg(test)]
mod tests;

pub use adapter::BindingAdapter;
pub use channel::{ChannelPeer, ChannelTransport};
pub use client::Client;
pub use codec::marshal;
pub use config::{ClientConfig, DescriptorPolicy};
pub use deferred::Deferred;
pub use error::{Error, Result};
pub use factory::{InstanceSchema, ProxyFactory};
pub use proxy::Proxy;
pub use registry::Registry;
pub use request_ids::RequestIdPool;
pub use session::Session;
pub use transport::{
    BlockingTransport, CorrelatedTransport, EmbeddedTransport, RequestHandler, TransportError,
};
pub use value::Value;

pub use remirror_wire as wire;
