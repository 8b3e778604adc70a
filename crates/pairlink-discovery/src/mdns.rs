//! mDNS/Bonjour advertisement

use mdns_sd::{ServiceDaemon, ServiceInfo};
use pairlink_core::{ServerConfig, MDNS_SERVICE_TYPE};
use tracing::info;

use crate::error::{DiscoveryError, Result};

/// A live mDNS advertisement of the pairing server
pub struct PrimaryAd {
    mdns: ServiceDaemon,
    fullname: Option<String>,
}

impl PrimaryAd {
    /// Register the advertisement with the mDNS daemon
    pub fn start(config: &ServerConfig) -> Result<Self> {
        let mdns = ServiceDaemon::new().map_err(|e| DiscoveryError::Mdns(e.to_string()))?;

        let host = hostname::get()
            .map_err(DiscoveryError::Io)?
            .to_string_lossy()
            .into_owned();

        let properties: &[(&str, &str)] = &[("version", &config.version)];
        let service_info = ServiceInfo::new(
            MDNS_SERVICE_TYPE,
            &config.app_name,
            &format!("{}.local.", host),
            "",
            config.port,
            properties,
        )
        .map_err(|e| DiscoveryError::Mdns(e.to_string()))?;

        let fullname = service_info.get_fullname().to_string();

        mdns.register(service_info)
            .map_err(|e| DiscoveryError::Mdns(e.to_string()))?;

        info!("advertising {} on port {}", fullname, config.port);

        Ok(Self {
            mdns,
            fullname: Some(fullname),
        })
    }

    /// Unregister the advertisement
    pub fn stop(&mut self) -> Result<()> {
        if let Some(fullname) = self.fullname.take() {
            self.mdns
                .unregister(&fullname)
                .map_err(|e| DiscoveryError::Mdns(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for PrimaryAd {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
