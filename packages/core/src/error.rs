//! Error types for the mirroring client.

use remirror_wire::{Identifier, Key, ProxyKind, WireError};

use crate::transport::TransportError;

/// Errors that can occur while mirroring remote objects.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The remote runtime raised an exception while handling a request.
    #[error("remote error: {message}")]
    Remote { message: String },

    #[error("unsupported proxy kind: {kind}")]
    UnsupportedProxyKind { kind: String },

    /// Every request id of the pool is attached to an in-flight request.
    #[error("all {capacity} request ids are in use")]
    IdentifierExhausted { capacity: usize },

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("wire error: {0}")]
    Wire(WireError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("object {id} has no field '{key}'")]
    UnknownField { id: Identifier, key: Key },

    #[error("object {id} has no method '{name}'")]
    UnknownMethod { id: Identifier, name: String },

    /// Event fields can be fired but not read.
    #[error("'{name}' is an event and cannot be read")]
    WriteOnly { name: String },

    #[error("{operation} is not supported on a {kind} proxy")]
    WrongKind {
        kind: ProxyKind,
        operation: &'static str,
    },

    #[error("malformed diff: {message}")]
    MalformedDiff { message: String },

    /// The deferred result has not been settled yet.
    #[error("result not ready")]
    NotReady,

    /// A transport failure ended the session.
    #[error("session closed")]
    SessionClosed,
}

impl Error {
    pub fn remote(message: impl Into<String>) -> Self {
        Error::Remote {
            message: message.into(),
        }
    }

    pub fn malformed_diff(message: impl Into<String>) -> Self {
        Error::MalformedDiff {
            message: message.into(),
        }
    }
}

impl From<WireError> for Error {
    fn from(error: WireError) -> Self {
        match error {
            WireError::UnsupportedKind { kind } => Error::UnsupportedProxyKind { kind },
            other => Error::Wire(other),
        }
    }
}

/// Result type for mirroring operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let cases: Vec<(Error, &str)> = vec![
            (Error::remote("Boom"), "remote error: Boom"),
            (
                Error::IdentifierExhausted { capacity: 1024 },
                "all 1024 request ids are in use",
            ),
            (
                Error::UnknownField {
                    id: Identifier::from("3"),
                    key: Key::from("colour"),
                },
                "object 3 has no field 'colour'",
            ),
            (
                Error::UnknownMethod {
                    id: Identifier::from("3"),
                    name: "fly".to_string(),
                },
                "object 3 has no method 'fly'",
            ),
            (
                Error::WriteOnly {
                    name: "clicked".to_string(),
                },
                "'clicked' is an event and cannot be read",
            ),
            (
                Error::WrongKind {
                    kind: ProxyKind::List,
                    operation: "call_method",
                },
                "call_method is not supported on a list proxy",
            ),
            (Error::NotReady, "result not ready"),
            (Error::SessionClosed, "session closed"),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn unsupported_wire_kind_maps_to_proxy_kind_error() {
        let error: Error = WireError::UnsupportedKind {
            kind: "set".to_string(),
        }
        .into();
        assert!(matches!(error, Error::UnsupportedProxyKind { kind } if kind == "set"));
    }

    #[test]
    fn transport_error_conversion() {
        let error: Error = TransportError::Disconnected.into();
        assert!(matches!(error, Error::Transport(TransportError::Disconnected)));
    }
}
