//! Network configuration context for the relay server.
//!
//! Bundles the server's own bind address so the packager supervisor can
//! hand the packager process a base URL to PUT back to
//! (`-utc_timing_url`, output manifest URL).

use std::net::IpAddr;
#[cfg(test)]
use std::net::Ipv4Addr;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Notify;

/// Network configuration shared across services.
#[derive(Clone)]
pub struct NetworkContext {
    /// Server port (0 if not yet bound, set once the listener is up).
    pub port: Arc<RwLock<u16>>,
    /// Notifier signaled when the port is assigned.
    pub port_notify: Arc<Notify>,
    /// IP address the packager and players can reach this server at.
    pub advertise_ip: Arc<RwLock<String>>,
}

impl NetworkContext {
    /// Creates a `NetworkContext` with an explicit advertise IP.
    #[must_use]
    pub fn explicit(bind_port: u16, advertise_ip: IpAddr) -> Self {
        Self {
            port: Arc::new(RwLock::new(bind_port)),
            port_notify: Arc::new(Notify::new()),
            advertise_ip: Arc::new(RwLock::new(advertise_ip.to_string())),
        }
    }

    /// Creates a `NetworkContext` using local IP auto-detection.
    ///
    /// # Errors
    ///
    /// Returns an error if local IP detection fails.
    pub fn auto_detect(preferred_port: u16) -> Result<Self, NetworkError> {
        let ip = local_ip_address::local_ip()
            .map(|ip| ip.to_string())
            .map_err(|e| NetworkError::Detection(e.to_string()))?;
        Ok(Self {
            port: Arc::new(RwLock::new(preferred_port)),
            port_notify: Arc::new(Notify::new()),
            advertise_ip: Arc::new(RwLock::new(ip)),
        })
    }

    /// Creates a `NetworkContext` for testing with a fixed loopback IP.
    #[cfg(test)]
    pub fn for_test() -> Self {
        Self::explicit(0, IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)))
    }

    /// Returns the current port value.
    #[must_use]
    pub fn get_port(&self) -> u16 {
        *self.port.read()
    }

    /// Returns the current advertise IP.
    #[must_use]
    pub fn get_advertise_ip(&self) -> String {
        self.advertise_ip.read().clone()
    }

    /// Sets the port and notifies waiters.
    pub fn set_port(&self, port: u16) {
        *self.port.write() = port;
        self.port_notify.notify_waiters();
    }

    /// Returns a `UrlBuilder` for the current network configuration.
    #[must_use]
    pub fn url_builder(&self) -> UrlBuilder {
        UrlBuilder::new(self.get_advertise_ip(), self.get_port())
    }

    /// Returns this server's own HTTP base URL, handed to the packager.
    #[must_use]
    pub fn base_url(&self) -> String {
        self.url_builder().base_url()
    }
}

/// Errors that can occur during network operations.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// Could not detect local IP address.
    #[error("failed to detect local IP: {0}")]
    Detection(String),
}

/// Builder for constructing URLs rooted at this server.
pub struct UrlBuilder {
    ip: String,
    port: u16,
}

impl UrlBuilder {
    /// Creates a new `UrlBuilder` for the given server address.
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self {
            ip: ip.into(),
            port,
        }
    }

    /// Returns the base URL for the server (e.g., `http://192.168.1.100:8080`).
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.ip, self.port)
    }

    /// Returns the `/isotime` URL handed to the packager as `-utc_timing_url`.
    #[must_use]
    pub fn isotime_url(&self) -> String {
        format!("{}/isotime", self.base_url())
    }

    /// Returns the output manifest URL the packager PUTs to for `stream_id`.
    #[must_use]
    pub fn manifest_url(&self, stream_id: &str) -> String {
        format!("{}/{}/manifest.mpd", self.base_url(), stream_id)
    }
}
