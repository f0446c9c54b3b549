use remirror_core::TransportError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid URL: {message}")]
    InvalidUrl { message: String },

    #[error("Invalid header {name}: {message}")]
    InvalidHeader { name: String, message: String },

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },
}

impl From<Error> for TransportError {
    fn from(error: Error) -> Self {
        TransportError::Failed {
            message: error.to_string(),
        }
    }
}
