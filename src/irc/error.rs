use thiserror::Error;

/// Errors returned by the connection and client layers.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not connected")]
    NotConnected,

    #[error("already connected")]
    AlreadyConnected,

    /// The line would smuggle a second command onto the wire.
    #[error("refusing to send line containing CR or LF: {0:?}")]
    InvalidLine(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
