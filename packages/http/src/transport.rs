use std::cell::RefCell;

use remirror_core::{BlockingTransport, TransportError};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, trace};
use url::Url;

use crate::config::HttpTransportConfig;
use crate::error::Error;
use crate::executor::{ReqwestExecutor, RequestExecutor};

/// A blocking transport that sends each request as `GET {url}?data=<json>`.
///
/// HTTP has no push channel. Push events can be supplied from elsewhere
/// (a websocket task, a polling thread) through [`HttpTransport::with_event_feed`]
/// and are drained by `Session::pump`.
pub struct HttpTransport {
    url: Url,
    executor: Box<dyn RequestExecutor>,
    events: Option<RefCell<UnboundedReceiver<String>>>,
}

impl HttpTransport {
    pub fn new(config: &HttpTransportConfig) -> Result<Self, Error> {
        let executor = ReqwestExecutor::new(config.timeout(), &config.headers)?;
        Self::with_executor(config, executor)
    }

    pub fn with_executor(
        config: &HttpTransportConfig,
        executor: impl RequestExecutor + 'static,
    ) -> Result<Self, Error> {
        Ok(Self {
            url: config.request_url()?,
            executor: Box::new(executor),
            events: None,
        })
    }

    /// Deliver push events received on `feed`.
    pub fn with_event_feed(mut self, feed: UnboundedReceiver<String>) -> Self {
        self.events = Some(RefCell::new(feed));
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl BlockingTransport for HttpTransport {
    fn send_request(&self, request: &str) -> Result<String, TransportError> {
        debug!(url = %self.url, "GET");
        Ok(self.executor.get(&self.url, request)?)
    }

    fn try_recv_event(&self) -> Result<Option<String>, TransportError> {
        let Some(events) = &self.events else {
            return Ok(None);
        };
        match events.borrow_mut().try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            // The feed is an optional side channel; requests still work
            // without it.
            Err(TryRecvError::Disconnected) => {
                trace!("event feed closed");
                Ok(None)
            }
        }
    }
}
