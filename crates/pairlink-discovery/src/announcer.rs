//! Announce / stop-announcing lifecycle
//!
//! One announcer instance per server process. Start attempts the primary
//! mDNS advertisement and degrades to the userspace responder when it fails;
//! stop unwinds whichever mechanism is live.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use pairlink_core::ServerConfig;

use crate::error::Result;
use crate::mdns::PrimaryAd;
use crate::responder::ProbeResponder;

/// Non-blocking notification surface owned by the UI shell collaborator
pub trait AlertSink: Send + Sync {
    fn warning(&self, title: &str, body: &str);
    fn error(&self, title: &str, body: &str);
}

enum AnnounceState {
    Inactive,
    Primary(PrimaryAd),
    Fallback(JoinHandle<()>),
    Stopped,
}

/// Manages the discoverability lifecycle of the server
pub struct Announcer {
    config: ServerConfig,
    alerts: Arc<dyn AlertSink>,
    state: Mutex<AnnounceState>,
}

impl Announcer {
    pub fn new(config: ServerConfig, alerts: Arc<dyn AlertSink>) -> Self {
        Self {
            config,
            alerts,
            state: Mutex::new(AnnounceState::Inactive),
        }
    }

    /// Start advertising the server.
    ///
    /// Never propagates a failure to the caller: every failure path ends in
    /// a user-visible alert and a state transition. Worst case, discovery is
    /// degraded and the server stays reachable by manual address entry.
    pub fn start(&self) {
        let primary = PrimaryAd::start(&self.config);
        self.complete_start(primary);
    }

    fn complete_start(&self, primary: Result<PrimaryAd>) {
        let mut state = self.state.lock();
        if !matches!(*state, AnnounceState::Inactive) {
            warn!("announcer already started, ignoring");
            return;
        }

        match primary {
            Ok(ad) => {
                info!("primary mDNS advertisement active");
                *state = AnnounceState::Primary(ad);
            }
            Err(e) => {
                warn!("primary discovery unavailable, falling back: {}", e);
                self.alerts
                    .warning("Discovery degraded", &degraded_discovery_message(&self.config.app_name));
                // The transition reflects "fallback attempted"; the spawned
                // task reports its own failure through the alert sink.
                *state = AnnounceState::Fallback(self.spawn_fallback());
            }
        }
    }

    fn spawn_fallback(&self) -> JoinHandle<()> {
        let config = self.config.clone();
        let alerts = Arc::clone(&self.alerts);
        tokio::spawn(async move {
            let responder = match ProbeResponder::bind(&config).await {
                Ok(responder) => responder,
                Err(e) => {
                    error!("fallback responder failed to start: {}", e);
                    alerts.error(
                        "Announcement error",
                        "An error occurred while announcing the server.",
                    );
                    return;
                }
            };

            info!(
                "fallback responder advertising as {}",
                responder.advertised_name()
            );

            if let Err(e) = responder.run().await {
                error!("fallback responder stopped: {}", e);
                alerts.error(
                    "Announcement error",
                    "An error occurred while announcing the server.",
                );
            }
        })
    }

    /// Stop advertising. Idempotent; tolerates never-started announcers.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, AnnounceState::Stopped) {
            AnnounceState::Primary(mut ad) => {
                if let Err(e) = ad.stop() {
                    warn!("failed to unregister mDNS advertisement: {}", e);
                }
                info!("primary advertisement stopped");
            }
            AnnounceState::Fallback(task) => {
                task.abort();
                info!("fallback responder stopped");
            }
            // A stop before any start leaves the announcer startable.
            AnnounceState::Inactive => {
                *state = AnnounceState::Inactive;
            }
            AnnounceState::Stopped => {}
        }
    }

    /// Whether either mechanism is currently live
    pub fn is_announcing(&self) -> bool {
        matches!(
            *self.state.lock(),
            AnnounceState::Primary(_) | AnnounceState::Fallback(_)
        )
    }

    /// Whether the fallback branch is the live one
    pub fn is_fallback(&self) -> bool {
        matches!(*self.state.lock(), AnnounceState::Fallback(_))
    }
}

/// Remediation text shown when the platform mDNS mechanism is unusable
fn degraded_discovery_message(app_name: &str) -> String {
    if cfg!(any(target_os = "macos", target_os = "windows")) {
        format!(
            "Multicast discovery is unavailable.\n\
             The app may fail to detect the server automatically; if it still \
             does, you can ignore this message.\n\n\
             To remove this alert, reinstall {} with an administrator account \
             and reboot your system.",
            app_name
        )
    } else {
        "Multicast discovery is unavailable.\n\
         The app may fail to detect the server automatically.\n\
         To remove this alert, install these packages: avahi-daemon \
         avahi-discover libnss-mdns libavahi-compat-libdnssd1"
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiscoveryError;
    use pairlink_test_utils::{wait_for, DEFAULT_CHECK_INTERVAL};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingAlerts {
        warnings: AtomicUsize,
        errors: AtomicUsize,
    }

    impl AlertSink for CountingAlerts {
        fn warning(&self, _title: &str, _body: &str) {
            self.warnings.fetch_add(1, Ordering::SeqCst);
        }
        fn error(&self, _title: &str, _body: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn test_config() -> ServerConfig {
        ServerConfig {
            app_name: "Announcer Test".to_string(),
            port: 57891,
            // Ephemeral port so parallel tests never collide
            discovery_port: 0,
            version: "0.5.0".to_string(),
        }
    }

    #[tokio::test]
    async fn primary_failure_transitions_to_fallback_with_one_warning() {
        let alerts = Arc::new(CountingAlerts::default());
        let announcer = Announcer::new(test_config(), alerts.clone());

        announcer.complete_start(Err(DiscoveryError::Mdns("daemon unavailable".to_string())));

        assert!(announcer.is_announcing());
        assert!(announcer.is_fallback());
        assert_eq!(alerts.warnings.load(Ordering::SeqCst), 1);
        assert_eq!(alerts.errors.load(Ordering::SeqCst), 0);

        announcer.stop();
        assert!(!announcer.is_announcing());
    }

    #[tokio::test]
    async fn fallback_bind_failure_surfaces_error_alert() {
        // Occupy a port so the responder's bind fails
        let blocker = std::net::UdpSocket::bind("0.0.0.0:0").unwrap();
        let port = blocker.local_addr().unwrap().port();

        let mut config = test_config();
        config.discovery_port = port;

        let alerts = Arc::new(CountingAlerts::default());
        let announcer = Announcer::new(config, alerts.clone());

        announcer.complete_start(Err(DiscoveryError::Mdns("daemon unavailable".to_string())));

        // Still fallback-active: the transition reflects the attempt
        assert!(announcer.is_fallback());
        assert_eq!(alerts.warnings.load(Ordering::SeqCst), 1);

        let errored = wait_for(
            || async { alerts.errors.load(Ordering::SeqCst) == 1 },
            DEFAULT_CHECK_INTERVAL,
            Duration::from_secs(5),
        )
        .await;
        assert!(errored, "expected exactly one error alert");

        announcer.stop();
    }

    #[tokio::test]
    async fn healthy_fallback_raises_no_error_alert() {
        let alerts = Arc::new(CountingAlerts::default());
        let announcer = Announcer::new(test_config(), alerts.clone());

        announcer.complete_start(Err(DiscoveryError::Mdns("daemon unavailable".to_string())));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(alerts.warnings.load(Ordering::SeqCst), 1);
        assert_eq!(alerts.errors.load(Ordering::SeqCst), 0);

        announcer.stop();
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_safe_when_never_started() {
        let alerts = Arc::new(CountingAlerts::default());
        let announcer = Announcer::new(test_config(), alerts.clone());

        // Never started: repeated stops are no-ops
        announcer.stop();
        announcer.stop();
        assert!(!announcer.is_announcing());

        // A stop before start leaves the announcer startable
        announcer.complete_start(Err(DiscoveryError::Mdns("x".to_string())));
        assert!(announcer.is_announcing());

        announcer.stop();
        announcer.stop();
        assert!(!announcer.is_announcing());
        assert_eq!(alerts.errors.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn double_start_keeps_first_state() {
        let alerts = Arc::new(CountingAlerts::default());
        let announcer = Announcer::new(test_config(), alerts.clone());

        announcer.complete_start(Err(DiscoveryError::Mdns("x".to_string())));
        assert_eq!(alerts.warnings.load(Ordering::SeqCst), 1);

        // Second start is ignored, no second warning
        announcer.complete_start(Err(DiscoveryError::Mdns("x".to_string())));
        assert_eq!(alerts.warnings.load(Ordering::SeqCst), 1);
        assert!(announcer.is_fallback());

        announcer.stop();
    }
}
