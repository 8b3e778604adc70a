//! Userspace fallback discovery
//!
//! When the mDNS daemon is unusable, a plain UDP responder answers discovery
//! probes from companion clients scanning the local network. The advertised
//! name carries a suffix derived from the host name so that two instances of
//! the same application on one segment stay distinguishable.

use pairlink_core::ServerConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::error::{DiscoveryError, Result};

/// Length of the host-derived name suffix
const SUFFIX_LEN: usize = 10;

/// Probe sent by clients scanning for servers
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
enum Probe {
    Discover,
    #[serde(other)]
    Other,
}

/// Reply to a discovery probe
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advertisement {
    pub name: String,
    pub port: u16,
    pub version: String,
}

/// Answers discovery probes over UDP
pub struct ProbeResponder {
    socket: UdpSocket,
    advert: Advertisement,
}

impl ProbeResponder {
    /// Bind the responder socket
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let addr = format!("0.0.0.0:{}", config.discovery_port);
        let socket = UdpSocket::bind(&addr)
            .await
            .map_err(|e| DiscoveryError::Responder(format!("bind {}: {}", addr, e)))?;

        info!("fallback responder listening on {}", addr);

        Ok(Self {
            socket,
            advert: Advertisement {
                name: fallback_service_name(&config.app_name),
                port: config.port,
                version: config.version.clone(),
            },
        })
    }

    /// The service name this responder advertises
    pub fn advertised_name(&self) -> &str {
        &self.advert.name
    }

    /// Local socket address (useful when bound to port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(DiscoveryError::Io)
    }

    /// Answer probes until the socket fails or the task is aborted
    pub async fn run(&self) -> Result<()> {
        let reply = serde_json::to_vec(&self.advert)
            .map_err(|e| DiscoveryError::Responder(e.to_string()))?;
        let mut buf = vec![0u8; 1024];

        loop {
            let (len, from) = self
                .socket
                .recv_from(&mut buf)
                .await
                .map_err(|e| DiscoveryError::Responder(e.to_string()))?;

            match serde_json::from_slice::<Probe>(&buf[..len]) {
                Ok(Probe::Discover) => {
                    debug!("discovery probe from {}", from);
                    if let Err(e) = self.socket.send_to(&reply, from).await {
                        warn!("failed to answer probe from {}: {}", from, e);
                    }
                }
                Ok(Probe::Other) | Err(_) => {
                    debug!("ignoring datagram from {}", from);
                }
            }
        }
    }
}

/// Map a host network name to a stable digit string of at most
/// `SUFFIX_LEN` characters: each character's code point in decimal,
/// concatenated, truncated. Collisions are possible and acceptable.
pub fn instance_suffix(host: &str) -> String {
    let mut digits = String::with_capacity(SUFFIX_LEN);
    for ch in host.chars() {
        digits.push_str(&(ch as u32).to_string());
        if digits.len() >= SUFFIX_LEN {
            break;
        }
    }
    digits.truncate(SUFFIX_LEN);
    digits
}

/// Service name advertised by the fallback responder for this host
pub fn fallback_service_name(app_name: &str) -> String {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}-{}", app_name, instance_suffix(&host))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_is_deterministic() {
        assert_eq!(instance_suffix("office-pc"), instance_suffix("office-pc"));
    }

    #[test]
    fn suffix_is_code_points_truncated() {
        // 'a' = 97, 'b' = 98, 'c' = 99
        assert_eq!(instance_suffix("abc"), "979899");
        assert_eq!(instance_suffix("abcdefgh"), "9798991001");
    }

    #[test]
    fn suffix_never_exceeds_limit() {
        for host in ["", "x", "a-very-long-host-name.local", "δοκιμή"] {
            assert!(instance_suffix(host).len() <= SUFFIX_LEN, "host {:?}", host);
        }
    }

    #[test]
    fn suffix_of_empty_host_is_empty() {
        assert_eq!(instance_suffix(""), "");
    }

    #[test]
    fn fallback_name_ends_with_suffix() {
        let name = fallback_service_name("PairLink Server");
        assert!(name.starts_with("PairLink Server-"));
        let suffix = &name["PairLink Server-".len()..];
        assert!(suffix.len() <= SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }
}
