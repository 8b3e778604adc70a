//! Host-supplied configuration
//!
//! The hosting process decides the display name, ports, and version string;
//! nothing in here is computed or persisted by the core.

use crate::{DEFAULT_DISCOVERY_PORT, DEFAULT_PORT};

/// Configuration for the pairing server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Application display name, as shown to discovering clients
    pub app_name: String,
    /// Listening port the transport accepts connections on
    pub port: u16,
    /// UDP port for the fallback discovery responder
    pub discovery_port: u16,
    /// Application version string
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            app_name: "PairLink Server".to_string(),
            port: DEFAULT_PORT,
            discovery_port: DEFAULT_DISCOVERY_PORT,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
