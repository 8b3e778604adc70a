//! Device session registry

use dashmap::DashMap;
use pairlink_core::{
    messages, ChannelError, ChannelSender, DeviceId, OutputProfile, Request, Response,
    ServerConfig,
};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Notification to the owning collaborator about registry changes
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryEvent {
    /// A registered device's connection went away
    DeviceDisconnected {
        device_id: DeviceId,
        /// Error text when the connection terminated with an error
        error: Option<String>,
    },
}

/// Live mapping from device identity to connection channel.
///
/// Entries are handshake-gated: a connection appears here only once its
/// `helo` identified it, and last writer wins when two connections claim the
/// same identity. The registry never closes a channel; the transport layer
/// keeps lifecycle authority over every handle it produced.
pub struct DeviceRegistry {
    version: String,
    output_profiles: RwLock<Vec<OutputProfile>>,
    clients: DashMap<DeviceId, Arc<dyn ChannelSender>>,
    events: mpsc::Sender<RegistryEvent>,
}

impl DeviceRegistry {
    pub fn new(config: &ServerConfig, events: mpsc::Sender<RegistryEvent>) -> Self {
        Self {
            version: config.version.clone(),
            output_profiles: RwLock::new(Vec::new()),
            clients: DashMap::new(),
            events,
        }
    }

    /// Bind `id` to `handle`, replacing any previous binding.
    ///
    /// The replaced channel is not closed here; if it is still open the
    /// transport will eventually report its close and the reverse lookup in
    /// [`handle_closed`](Self::handle_closed) will simply find no entry.
    pub fn register(&self, id: DeviceId, handle: Arc<dyn ChannelSender>) {
        if self.clients.insert(id.clone(), handle).is_some() {
            debug!("device {} re-identified, previous channel replaced", id);
        } else {
            info!("device {} registered", id);
        }
    }

    /// Send `msg` to the device registered under `id`, if any.
    ///
    /// Unknown or stale identities are a steady-state condition, not an
    /// error: the message is dropped.
    pub async fn route(&self, id: &str, msg: &Response) {
        let handle = match self.clients.get(id) {
            Some(entry) => Arc::clone(entry.value()),
            None => {
                debug!("no channel for device {}, dropping message", id);
                return;
            }
        };

        if !handle.is_open() {
            debug!("channel for device {} is not open, dropping message", id);
            return;
        }

        self.send_on(&handle, msg).await;
    }

    /// Send `msg` to every registered device whose channel is open.
    ///
    /// Best effort: a failure on one recipient never stops the fan-out, and
    /// there is no delivery-order guarantee across recipients.
    pub async fn broadcast(&self, msg: &Response) {
        let data = match messages::encode(msg) {
            Ok(data) => data,
            Err(e) => {
                error!("failed to encode broadcast: {}", e);
                return;
            }
        };

        // Snapshot the recipients so no map guard is held across awaits.
        let targets: Vec<(DeviceId, Arc<dyn ChannelSender>)> = self
            .clients
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        for (id, handle) in targets {
            if !handle.is_open() {
                debug!("skipping closed channel for device {}", id);
                continue;
            }
            if let Err(e) = handle.send(data.clone()).await {
                warn!("broadcast to device {} failed: {}", id, e);
            }
        }
    }

    /// The transport accepted a new connection.
    ///
    /// Nothing to record: a connection only enters the map once its `helo`
    /// carries a device identity.
    pub fn handle_opened(&self, _handle: &Arc<dyn ChannelSender>) {
        debug!("connection opened, awaiting identification");
    }

    /// Dispatch one inbound message from the transport.
    ///
    /// Unrecognized actions and undecodable payloads are ignored so that
    /// newer clients never break older servers.
    pub async fn handle_inbound(&self, handle: &Arc<dyn ChannelSender>, raw: &[u8]) {
        let request = match messages::decode(raw) {
            Ok(request) => request,
            Err(e) => {
                debug!("ignoring undecodable message: {}", e);
                return;
            }
        };

        match request {
            Request::Ping => {
                self.send_on(handle, &Response::Pong).await;
            }
            Request::Helo { device_id, .. } => {
                match device_id {
                    Some(id) => self.register(id, Arc::clone(handle)),
                    // The connection stays unregistered until a helo carries
                    // an identity; the transport alone tracks it meanwhile.
                    None => debug!("helo without device identity"),
                }
                let ack = Response::Helo {
                    version: self.version.clone(),
                    output_profiles: self.output_profiles.read().clone(),
                    quantity_enabled: false,
                };
                self.send_on(handle, &ack).await;
            }
            Request::Unknown => {
                debug!("ignoring unknown action");
            }
        }
    }

    /// The transport reported `handle` closed; drop its binding, if any.
    pub fn handle_closed(&self, handle: &Arc<dyn ChannelSender>) {
        self.remove_channel(handle, None);
    }

    /// The transport reported an error on `handle`; drop its binding, if any.
    pub fn handle_error(&self, handle: &Arc<dyn ChannelSender>, err: &ChannelError) {
        warn!("channel error: {}", err);
        self.remove_channel(handle, Some(err.to_string()));
    }

    /// Replace the advertised output profiles (settings collaborator).
    pub fn set_output_profiles(&self, profiles: Vec<OutputProfile>) {
        *self.output_profiles.write() = profiles;
    }

    /// Currently advertised output profiles
    pub fn output_profiles(&self) -> Vec<OutputProfile> {
        self.output_profiles.read().clone()
    }

    /// Number of registered devices
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Whether `id` currently maps to a channel
    pub fn contains(&self, id: &str) -> bool {
        self.clients.contains_key(id)
    }

    async fn send_on(&self, handle: &Arc<dyn ChannelSender>, msg: &Response) {
        let data = match messages::encode(msg) {
            Ok(data) => data,
            Err(e) => {
                error!("failed to encode response: {}", e);
                return;
            }
        };
        if let Err(e) = handle.send(data).await {
            warn!("send failed: {}", e);
        }
    }

    /// Reverse lookup by channel identity. O(registry size), which is bounded
    /// by concurrently connected devices.
    fn remove_channel(&self, handle: &Arc<dyn ChannelSender>, error: Option<String>) {
        let mut removed = Vec::new();
        self.clients.retain(|id, h| {
            if Arc::ptr_eq(h, handle) {
                removed.push(id.clone());
                false
            } else {
                true
            }
        });

        for device_id in removed {
            info!("device {} disconnected", device_id);
            let event = RegistryEvent::DeviceDisconnected {
                device_id,
                error: error.clone(),
            };
            if self.events.try_send(event).is_err() {
                debug!("registry event receiver unavailable, dropping event");
            }
        }
    }
}
