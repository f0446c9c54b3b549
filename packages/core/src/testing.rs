//! A scripted remote for tests.
//!
//! [`MockRemote`] answers requests from a table of canned responses keyed by
//! [`Request::route`] and records every request it sees. It can sit behind an
//! [`EmbeddedTransport`] or answer the requests queued on a [`ChannelPeer`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use remirror_wire::{Request, Response, WireValue};

use crate::transport::{EmbeddedTransport, RequestHandler};
use crate::{ChannelPeer, Result};

#[derive(Clone, Default)]
pub struct MockRemote {
    /// Responses keyed by route, or by request kind alone.
    responses: Arc<Mutex<HashMap<String, Response>>>,
    /// Recorded requests for verification.
    recorded_requests: Arc<Mutex<Vec<Request>>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests on `route` with `response`.
    pub fn with_response(self, route: impl Into<String>, response: Response) -> Self {
        self.set_response(route, response);
        self
    }

    /// Answer requests on `route` with a marshaled value.
    pub fn with_value(self, route: impl Into<String>, value: WireValue) -> Self {
        self.with_response(route, Response::value(value))
    }

    /// Fail requests on `route` with a remote exception.
    pub fn with_failure(self, route: impl Into<String>, exception: impl Into<String>) -> Self {
        self.with_response(route, Response::failure(exception))
    }

    pub fn set_response(&self, route: impl Into<String>, response: Response) {
        self.responses
            .lock()
            .unwrap()
            .insert(route.into(), response);
    }

    pub fn recorded_requests(&self) -> Vec<Request> {
        self.recorded_requests.lock().unwrap().clone()
    }

    /// Number of recorded requests on exactly `route`.
    pub fn count(&self, route: &str) -> usize {
        self.recorded_requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.route() == route)
            .count()
    }

    pub fn clear_recorded(&self) {
        self.recorded_requests.lock().unwrap().clear();
    }

    /// Record `request` and look up its response. Unscripted requests
    /// succeed with a null result.
    pub fn respond(&self, request: &Request) -> Response {
        self.recorded_requests.lock().unwrap().push(request.clone());
        let responses = self.responses.lock().unwrap();
        responses
            .get(&request.route())
            .or_else(|| responses.get(request.kind()))
            .cloned()
            .unwrap_or_else(|| Response::ok(serde_json::Value::Null))
    }

    pub fn transport(&self) -> EmbeddedTransport<MockRemote> {
        EmbeddedTransport::new(self.clone())
    }

    /// Answer every request queued on `peer`. Returns how many were answered.
    pub fn serve(&self, peer: &mut ChannelPeer) -> Result<usize> {
        let mut served = 0;
        while let Some((request_id, request)) = peer.try_next_request()? {
            peer.reply(request_id, &self.respond(&request))?;
            served += 1;
        }
        Ok(served)
    }
}

impl RequestHandler for MockRemote {
    fn handle_request(&self, request: &str) -> String {
        let response = match serde_json::from_str::<Request>(request) {
            Ok(request) => self.respond(&request),
            Err(error) => Response::failure(format!("bad request: {}", error)),
        };
        serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
    }
}
