//! # remirror-http
//!
//! A blocking HTTP transport for remirror sessions.
//!
//! Each request is encoded as JSON and sent as the `data` query parameter of
//! a GET to the remote's endpoint (`/_jigna` by default); the response body is
//! the JSON response.
//!
//! ```ignore
//! use remirror_core::{ClientConfig, Session};
//! use remirror_http::{HttpTransport, HttpTransportConfig};
//!
//! let config = HttpTransportConfig::new("http://localhost:8888");
//! let session = Session::blocking(HttpTransport::new(&config)?, ClientConfig::default());
//!
//! let context = session.get_context()?.into_ready()?;
//! let name = context["person"].as_proxy().unwrap().get_field("name")?;
//! ```

pub mod config;
pub mod error;
pub mod executor;

mod transport;

pub use config::HttpTransportConfig;
pub use error::Error;
pub use executor::{ReqwestExecutor, RequestExecutor};
pub use transport::HttpTransport;
