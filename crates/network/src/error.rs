use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("probe timed out after {0:?}")]
    ProbeTimeout(Duration),

    #[error("all candidate servers exhausted")]
    ProbeExhausted,

    #[error("failed to resolve server '{0}'")]
    ServerResolution(String),

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, NetworkError>;
