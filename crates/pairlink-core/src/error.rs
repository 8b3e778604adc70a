//! Error types for PairLink

use thiserror::Error;

/// Result type alias for PairLink core operations
pub type Result<T> = std::result::Result<T, Error>;

/// PairLink core error types
#[derive(Error, Debug)]
pub enum Error {
    /// JSON encoding error
    #[error("encode error: {0}")]
    Encode(String),

    /// JSON decoding error
    #[error("decode error: {0}")]
    Decode(String),

    /// Connection channel error
    #[error("channel error: {0}")]
    Channel(#[from] crate::channel::ChannelError),
}
