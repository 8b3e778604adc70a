//! Discovery error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DiscoveryError>;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("mDNS error: {0}")]
    Mdns(String),

    #[error("responder error: {0}")]
    Responder(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
