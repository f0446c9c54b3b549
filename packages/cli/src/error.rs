#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("HTTP transport: {0}")]
    Http(#[from] remirror_http::Error),

    #[error(transparent)]
    Session(#[from] remirror_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
