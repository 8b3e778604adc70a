//! Connection channel boundary
//!
//! The transport layer owns connection lifecycle; the rest of the system only
//! sees channels through [`ChannelSender`]. Holding a sender never implies
//! authority to destroy the underlying connection.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Result type alias for channel operations
pub type ChannelResult<T> = std::result::Result<T, ChannelError>;

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("channel is not open")]
    NotOpen,

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("channel closed: {0}")]
    Closed(String),
}

/// One bidirectional message channel to a connected device.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    /// Send a serialized message on this channel
    async fn send(&self, data: Bytes) -> ChannelResult<()>;

    /// Check if the channel is still open
    fn is_open(&self) -> bool;

    /// Close the sender side
    async fn close(&self) -> ChannelResult<()>;
}
