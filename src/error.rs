use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("key size mismatch: {left} vs {right} bits")]
    SizeMismatch { left: usize, right: usize },

    #[error("invalid key size: {0} bits")]
    InvalidKeySize(usize),

    #[error("call timed out")]
    CallTimeout,

    #[error("no endpoint registered at {0}")]
    UnknownEndpoint(SocketAddr),
}
