//! Error types for decoding protocol messages.

/// Errors raised while decoding wire messages.
#[derive(thiserror::Error, Debug)]
pub enum WireError {
    /// A wire value or descriptor named a kind this peer does not know.
    #[error("unsupported proxy kind: {kind}")]
    UnsupportedKind { kind: String },

    /// The message was valid JSON but did not have the expected shape.
    #[error("malformed message: {message}")]
    Malformed { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WireError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        WireError::Malformed {
            message: message.into(),
        }
    }
}
