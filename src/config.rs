use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sampling: SamplingConfig,
    pub connections: ConnectionsConfig,
    pub probes: ProbesConfig,
    pub publishing: PublishingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Fast tick period.
    pub refresh_interval_ms: u64,
    /// Samples kept per history buffer (sparkline width).
    pub history_length: usize,
    /// Hide loopback from the interface list; it is still part of the global counters.
    pub skip_loopback: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 1000,
            history_length: 60,
            skip_loopback: true,
        }
    }
}

/// Bounds on the connection list carried by each snapshot.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionsConfig {
    pub max_listen: usize,
    pub max_established: usize,
}

impl Default for ConnectionsConfig {
    fn default() -> Self {
        Self {
            max_listen: 3,
            max_established: 7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbesConfig {
    pub gateway_ping_interval_ms: u64,
    pub ping_timeout_ms: u64,
    pub dns_interval_ms: u64,
    pub dns_timeout_ms: u64,
    /// Hostname resolved by the DNS health check.
    pub dns_host: String,
    pub wifi_interval_ms: u64,
    pub public_ip_timeout_ms: u64,
    /// Geolocation service returning {status, query, isp, city, countryCode}.
    pub geo_url: String,
    /// Plain-text IP lookup used when the geolocation request fails.
    pub ip_url: String,
}

impl Default for ProbesConfig {
    fn default() -> Self {
        Self {
            gateway_ping_interval_ms: 1000,
            ping_timeout_ms: 1000,
            dns_interval_ms: 5000,
            dns_timeout_ms: 1000,
            dns_host: "google.com".into(),
            wifi_interval_ms: 2000,
            public_ip_timeout_ms: 3000,
            geo_url: "http://ip-api.com/json/?fields=status,query,isp,city,countryCode".into(),
            ip_url: "https://icanhazip.com".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One log line per snapshot.
    #[default]
    Summary,
    /// One JSON document per snapshot on stdout.
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublishingConfig {
    /// Max number of snapshots buffered for slow consumers.
    pub broadcast_capacity: usize,
    /// How often to log app stats (ticks, probe failures) at INFO level.
    pub stats_log_interval_secs: u64,
    pub format: OutputFormat,
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            stats_log_interval_secs: 60,
            format: OutputFormat::Summary,
        }
    }
}

impl AppConfig {
    /// Loads `CONFIG_FILE` (default `config.toml`). A missing default file means built-in
    /// defaults; a missing file named explicitly is an error.
    pub fn load() -> anyhow::Result<Self> {
        let explicit = std::env::var("CONFIG_FILE").ok();
        let path = explicit.as_deref().unwrap_or(DEFAULT_CONFIG_FILE);
        match std::fs::read_to_string(path) {
            Ok(s) => Self::load_from_str(&s),
            Err(e) if explicit.is_none() && e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path, "no config file; using defaults");
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
            Err(e) => Err(anyhow::anyhow!("reading {}: {}", path, e)),
        }
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            (100..=60_000).contains(&self.sampling.refresh_interval_ms),
            "sampling.refresh_interval_ms must be between 100 and 60000, got {}",
            self.sampling.refresh_interval_ms
        );
        anyhow::ensure!(
            self.sampling.history_length > 0,
            "sampling.history_length must be > 0, got {}",
            self.sampling.history_length
        );
        anyhow::ensure!(
            self.probes.gateway_ping_interval_ms > 0,
            "probes.gateway_ping_interval_ms must be > 0, got {}",
            self.probes.gateway_ping_interval_ms
        );
        anyhow::ensure!(
            self.probes.ping_timeout_ms > 0,
            "probes.ping_timeout_ms must be > 0, got {}",
            self.probes.ping_timeout_ms
        );
        anyhow::ensure!(
            self.probes.dns_interval_ms > 0,
            "probes.dns_interval_ms must be > 0, got {}",
            self.probes.dns_interval_ms
        );
        anyhow::ensure!(
            self.probes.dns_timeout_ms > 0,
            "probes.dns_timeout_ms must be > 0, got {}",
            self.probes.dns_timeout_ms
        );
        anyhow::ensure!(
            !self.probes.dns_host.trim().is_empty(),
            "probes.dns_host must be non-empty"
        );
        anyhow::ensure!(
            self.probes.wifi_interval_ms > 0,
            "probes.wifi_interval_ms must be > 0, got {}",
            self.probes.wifi_interval_ms
        );
        anyhow::ensure!(
            self.probes.public_ip_timeout_ms > 0,
            "probes.public_ip_timeout_ms must be > 0, got {}",
            self.probes.public_ip_timeout_ms
        );
        anyhow::ensure!(
            !self.probes.geo_url.trim().is_empty(),
            "probes.geo_url must be non-empty"
        );
        anyhow::ensure!(
            !self.probes.ip_url.trim().is_empty(),
            "probes.ip_url must be non-empty"
        );
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        anyhow::ensure!(
            self.publishing.stats_log_interval_secs > 0,
            "publishing.stats_log_interval_secs must be > 0, got {}",
            self.publishing.stats_log_interval_secs
        );
        Ok(())
    }
}
