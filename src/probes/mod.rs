// Slow probes: public IP, gateway, ping, DNS and wireless signal, cached off the fast tick

mod cache;
pub mod dns;
pub mod gateway;
pub mod ping;
pub mod public_ip;
mod scheduler;
pub mod wireless;

pub use cache::ProbeCache;
pub use scheduler::{
    GATEWAY_DISCOVERY_TIMEOUT, InFlightGuard, ProbeHandles, ProbeSchedule, ProbeSlot, spawn,
};

use std::future::Future;
use std::net::Ipv4Addr;
use std::time::Duration;

use tracing::instrument;

use crate::config::ProbesConfig;
use crate::error::ProbeError;
use crate::models::{PublicInfo, WifiSignal};

/// External facts that are too slow to gather on the fast tick.
///
/// Implementations bound their own latency; the scheduler additionally wraps every call in
/// its configured timeout.
pub trait NetworkProbes: Send + Sync + 'static {
    fn public_info(&self) -> impl Future<Output = Result<PublicInfo, ProbeError>> + Send;

    fn default_gateway(&self) -> impl Future<Output = Result<Ipv4Addr, ProbeError>> + Send;

    /// Round-trip time to `host` in milliseconds.
    fn ping(&self, host: Ipv4Addr) -> impl Future<Output = Result<f64, ProbeError>> + Send;

    fn dns_check(&self) -> impl Future<Output = Result<(), ProbeError>> + Send;

    /// Inactive when the host has no wireless interface.
    fn wifi(&self) -> impl Future<Output = WifiSignal> + Send;
}

/// Probes against the real host and network.
pub struct SystemProbes {
    client: reqwest::Client,
    config: ProbesConfig,
}

impl SystemProbes {
    pub fn new(config: ProbesConfig) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.public_ip_timeout_ms))
            .user_agent(crate::version::user_agent())
            .build()?;
        Ok(Self { client, config })
    }
}

impl NetworkProbes for SystemProbes {
    #[instrument(skip(self), fields(probe = "public_info"))]
    async fn public_info(&self) -> Result<PublicInfo, ProbeError> {
        public_ip::lookup(&self.client, &self.config.geo_url, &self.config.ip_url).await
    }

    #[instrument(skip(self), fields(probe = "default_gateway"))]
    async fn default_gateway(&self) -> Result<Ipv4Addr, ProbeError> {
        tokio::task::spawn_blocking(gateway::default_gateway)
            .await
            .map_err(|e| ProbeError::Parse(format!("gateway task join: {}", e)))?
    }

    async fn ping(&self, host: Ipv4Addr) -> Result<f64, ProbeError> {
        ping::ping_once(host, Duration::from_millis(self.config.ping_timeout_ms)).await
    }

    async fn dns_check(&self) -> Result<(), ProbeError> {
        dns::resolve(
            &self.config.dns_host,
            Duration::from_millis(self.config.dns_timeout_ms),
        )
        .await
    }

    async fn wifi(&self) -> WifiSignal {
        match tokio::fs::read_to_string(wireless::WIRELESS_PATH).await {
            Ok(content) => wireless::parse_wireless(&content),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!(error = %e, probe = "wifi", "wireless stats unreadable");
                }
                WifiSignal::inactive()
            }
        }
    }
}

/// Runs `fut` with a deadline, mapping expiry to `ProbeError::Timeout`.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, ProbeError>
where
    F: Future<Output = Result<T, ProbeError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| ProbeError::Timeout(limit))?
}
