//! Framing for correlated channels.
//!
//! Every frame on a correlated channel is a two-element JSON array
//! `[request_id, payload]`, where `payload` is itself a JSON document encoded
//! as a string. Replies echo the id of their request; unsolicited events use
//! [`UNSOLICITED`].

use serde::{Deserialize, Serialize};

use crate::{PushEvent, Request, Response, WireError};

/// Request id marking a frame that answers no request.
pub const UNSOLICITED: i64 = -1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope(pub i64, pub String);

impl Envelope {
    pub fn new(request_id: i64, payload: impl Into<String>) -> Self {
        Envelope(request_id, payload.into())
    }

    pub fn request(request_id: i64, request: &Request) -> Result<Self, WireError> {
        Ok(Envelope(request_id, serde_json::to_string(request)?))
    }

    pub fn reply(request_id: i64, response: &Response) -> Result<Self, WireError> {
        Ok(Envelope(request_id, serde_json::to_string(response)?))
    }

    pub fn event(event: &PushEvent) -> Result<Self, WireError> {
        Ok(Envelope(UNSOLICITED, serde_json::to_string(event)?))
    }

    pub fn request_id(&self) -> i64 {
        self.0
    }

    pub fn payload(&self) -> &str {
        &self.1
    }

    pub fn is_unsolicited(&self) -> bool {
        self.0 == UNSOLICITED
    }

    pub fn decode(frame: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(frame)?)
    }

    pub fn encode(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }
}
