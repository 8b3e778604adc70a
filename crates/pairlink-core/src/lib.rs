//! PairLink Core
//!
//! Core types and protocol primitives for PairLink.
//!
//! This crate provides:
//! - Wire message models ([`Request`], [`Response`]) and JSON codec ([`messages`])
//! - The connection channel boundary ([`ChannelSender`])
//! - Host-supplied configuration ([`ServerConfig`])

pub mod channel;
pub mod config;
pub mod error;
pub mod messages;

pub use channel::{ChannelError, ChannelResult, ChannelSender};
pub use config::ServerConfig;
pub use error::{Error, Result};
pub use messages::{decode, encode, DeviceId, OutputProfile, Request, Response};

/// Default listening port for the pairing server
pub const DEFAULT_PORT: u16 = 57891;

/// Default UDP port for the fallback discovery responder
pub const DEFAULT_DISCOVERY_PORT: u16 = 57892;

/// mDNS service type browsed by companion clients
pub const MDNS_SERVICE_TYPE: &str = "_http._tcp.local.";
