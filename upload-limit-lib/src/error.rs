use thiserror::Error;

/// Errors that can occur in the proxy
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid URI: {0}")]
    InvalidUri(#[from] http::uri::InvalidUri),

    #[error("No backends configured")]
    NoBackends,
}

pub type Result<T> = std::result::Result<T, ProxyError>;

/// Errors raised by the upload throttle while pausing or resuming a stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThrottleError {
    #[error("failed to arm write timer: {0}")]
    ArmTimer(String),

    #[error("failed to register read interest: {0}")]
    ReadEvent(String),

    #[error("failed to register write interest: {0}")]
    WriteEvent(String),

    #[error("invalid size \"{0}\"")]
    InvalidSize(String),
}

impl ThrottleError {
    /// Fatal errors abort the request with an internal server error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ThrottleError::InvalidSize(_))
    }
}
