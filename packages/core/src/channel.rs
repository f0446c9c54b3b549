//! An in-process correlated transport built on tokio channels.
//!
//! [`ChannelTransport::pair`] returns the session's end and a [`ChannelPeer`]
//! for the remote end. The peer is `Send`; a socket task (or a test) owns it
//! and moves frames between the channel and the remote runtime.

use std::cell::RefCell;

use remirror_wire::{Envelope, PushEvent, Request, Response};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

use crate::transport::{CorrelatedTransport, TransportError};
use crate::Result;

pub struct ChannelTransport {
    outbound: UnboundedSender<String>,
    inbound: RefCell<UnboundedReceiver<String>>,
}

impl ChannelTransport {
    pub fn pair() -> (ChannelTransport, ChannelPeer) {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let transport = ChannelTransport {
            outbound: request_tx,
            inbound: RefCell::new(frame_rx),
        };
        let peer = ChannelPeer {
            requests: request_rx,
            frames: frame_tx,
        };
        (transport, peer)
    }
}

impl CorrelatedTransport for ChannelTransport {
    fn send_envelope(&self, envelope: &str) -> std::result::Result<(), TransportError> {
        self.outbound
            .send(envelope.to_string())
            .map_err(|_| TransportError::Disconnected)
    }

    fn try_recv(&self) -> std::result::Result<Option<String>, TransportError> {
        match self.inbound.borrow_mut().try_recv() {
            Ok(frame) => Ok(Some(frame)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TransportError::Disconnected),
        }
    }
}

/// The remote end of a [`ChannelTransport`].
pub struct ChannelPeer {
    requests: UnboundedReceiver<String>,
    frames: UnboundedSender<String>,
}

fn decode_request(frame: &str) -> Result<(i64, Request)> {
    let envelope = Envelope::decode(frame)?;
    let request = serde_json::from_str(envelope.payload())?;
    Ok((envelope.request_id(), request))
}

impl ChannelPeer {
    /// Wait for the next raw request envelope. `None` once the session end
    /// has been dropped.
    pub async fn next_frame(&mut self) -> Option<String> {
        self.requests.recv().await
    }

    /// Wait for the next request.
    pub async fn next_request(&mut self) -> Option<Result<(i64, Request)>> {
        let frame = self.requests.recv().await?;
        Some(decode_request(&frame))
    }

    /// Take a queued request without waiting.
    pub fn try_next_request(&mut self) -> Result<Option<(i64, Request)>> {
        match self.requests.try_recv() {
            Ok(frame) => decode_request(&frame).map(Some),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TransportError::Disconnected.into()),
        }
    }

    /// Forward a raw envelope to the session.
    pub fn send_frame(&self, frame: impl Into<String>) -> Result<()> {
        self.frames
            .send(frame.into())
            .map_err(|_| TransportError::Disconnected.into())
    }

    pub fn reply(&self, request_id: i64, response: &Response) -> Result<()> {
        self.send_frame(Envelope::reply(request_id, response)?.encode()?)
    }

    pub fn push_event(&self, event: &PushEvent) -> Result<()> {
        self.send_frame(Envelope::event(event)?.encode()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;

    #[test]
    fn requests_reach_the_peer() {
        let (transport, mut peer) = ChannelTransport::pair();
        let frame = Envelope::request(4, &Request::GetContext)
            .unwrap()
            .encode()
            .unwrap();
        transport.send_envelope(&frame).unwrap();

        let (request_id, request) = peer.try_next_request().unwrap().unwrap();
        assert_eq!(request_id, 4);
        assert_eq!(request, Request::GetContext);
        assert!(peer.try_next_request().unwrap().is_none());
    }

    #[test]
    fn replies_and_events_reach_the_transport_in_order() {
        let (transport, peer) = ChannelTransport::pair();
        peer.reply(0, &Response::ok(json!(1))).unwrap();
        peer.push_event(&PushEvent::new("1", "x", json!(null)))
            .unwrap();

        let first = Envelope::decode(&transport.try_recv().unwrap().unwrap()).unwrap();
        let second = Envelope::decode(&transport.try_recv().unwrap().unwrap()).unwrap();
        assert_eq!(first.request_id(), 0);
        assert!(second.is_unsolicited());
        assert_eq!(transport.try_recv().unwrap(), None);
    }

    #[test]
    fn dropped_peer_disconnects() {
        let (transport, peer) = ChannelTransport::pair();
        drop(peer);
        assert_eq!(transport.try_recv(), Err(TransportError::Disconnected));
        assert_eq!(
            transport.send_envelope("[0, \"{}\"]"),
            Err(TransportError::Disconnected)
        );
    }

    #[test]
    fn dropped_transport_disconnects_peer() {
        let (transport, peer) = ChannelTransport::pair();
        drop(transport);
        assert!(matches!(
            peer.push_event(&PushEvent::new("1", "x", json!(null))),
            Err(Error::Transport(TransportError::Disconnected))
        ));
    }

    #[tokio::test]
    async fn peer_awaits_requests_from_another_thread() {
        let (transport, mut peer) = ChannelTransport::pair();
        let frame = Envelope::request(9, &Request::UpdateContext)
            .unwrap()
            .encode()
            .unwrap();
        // The session end is not Send; the peer is.
        let server = tokio::spawn(async move { peer.next_request().await });
        transport.send_envelope(&frame).unwrap();

        let (request_id, request) = server.await.unwrap().unwrap().unwrap();
        assert_eq!(request_id, 9);
        assert_eq!(request, Request::UpdateContext);
    }
}
