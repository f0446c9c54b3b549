//! The transport contract between a session and the remote runtime.
//!
//! Two shapes of transport exist. A [`BlockingTransport`] answers each request
//! before returning, the way an embedded interpreter or a plain HTTP endpoint
//! does. A [`CorrelatedTransport`] carries envelopes over a full-duplex
//! channel; replies are matched to requests by id and push events share the
//! same inbound stream.

use tracing::trace;

/// Errors raised by a transport. Any of these ends the session.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport disconnected")]
    Disconnected,

    #[error("transport failed: {message}")]
    Failed { message: String },
}

impl TransportError {
    pub fn failed(message: impl Into<String>) -> Self {
        TransportError::Failed {
            message: message.into(),
        }
    }
}

/// A transport that answers every request synchronously.
pub trait BlockingTransport {
    /// Send a JSON-encoded request and wait for the JSON-encoded response.
    fn send_request(&self, request: &str) -> Result<String, TransportError>;

    /// Poll for a queued push event.
    ///
    /// Transports without an event feed never have one; their host delivers
    /// events through `Session::handle_event` instead.
    fn try_recv_event(&self) -> Result<Option<String>, TransportError> {
        Ok(None)
    }
}

/// A full-duplex transport exchanging `[request_id, payload]` envelopes.
pub trait CorrelatedTransport {
    /// Queue an encoded envelope for the remote.
    fn send_envelope(&self, envelope: &str) -> Result<(), TransportError>;

    /// Take the next inbound envelope (reply or event), if one is queued.
    fn try_recv(&self) -> Result<Option<String>, TransportError>;
}

/// The remote half of an in-process transport.
pub trait RequestHandler {
    fn handle_request(&self, request: &str) -> String;
}

impl<F> RequestHandler for F
where
    F: Fn(&str) -> String,
{
    fn handle_request(&self, request: &str) -> String {
        self(request)
    }
}

/// A blocking transport that calls into a runtime embedded in this process.
pub struct EmbeddedTransport<H> {
    handler: H,
}

impl<H: RequestHandler> EmbeddedTransport<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }
}

impl<H: RequestHandler> BlockingTransport for EmbeddedTransport<H> {
    fn send_request(&self, request: &str) -> Result<String, TransportError> {
        trace!(request, "embedded call");
        Ok(self.handler.handle_request(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_request_handlers() {
        let transport = EmbeddedTransport::new(|request: &str| format!("echo:{}", request));
        assert_eq!(transport.send_request("ping").unwrap(), "echo:ping");
    }

    #[test]
    fn blocking_transports_have_no_events_by_default() {
        let transport = EmbeddedTransport::new(|_: &str| String::new());
        assert_eq!(transport.try_recv_event().unwrap(), None);
    }

    #[test]
    fn transport_error_display() {
        assert_eq!(
            TransportError::failed("socket reset").to_string(),
            "transport failed: socket reset"
        );
    }
}
