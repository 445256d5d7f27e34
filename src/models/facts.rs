// Facts refreshed by slow probes on their own schedule

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicInfo {
    pub public_ip: String,
    pub isp: String,
    pub city: String,
    pub country_code: String,
}

impl PublicInfo {
    /// Sentinel used before the lookup completes and after it fails.
    pub fn offline() -> Self {
        Self {
            public_ip: "Offline".into(),
            isp: "Unknown".into(),
            city: "-".into(),
            country_code: "-".into(),
        }
    }

    /// Address-only result from the plain IP lookup service.
    pub fn ip_only(public_ip: impl Into<String>) -> Self {
        Self {
            public_ip: public_ip.into(),
            ..Self::offline()
        }
    }
}

impl Default for PublicInfo {
    fn default() -> Self {
        Self::offline()
    }
}

/// Wireless link state from /proc/net/wireless.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WifiSignal {
    pub active: bool,
    pub interface: Option<String>,
    pub signal_dbm: f64,
    /// Raw link-quality column (driver specific scale, often 0-70).
    pub link_quality: f64,
    pub quality_percent: f64,
}

impl WifiSignal {
    pub fn inactive() -> Self {
        Self::default()
    }
}

/// Latest known value of every slow probe. Each field is refreshed independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlowFacts {
    pub public: PublicInfo,
    pub gateway_ip: Option<Ipv4Addr>,
    /// Round-trip time to the gateway; absent means unreachable or not probed yet.
    pub gateway_ping_ms: Option<f64>,
    pub dns_ok: bool,
    pub wifi: WifiSignal,
}

impl Default for SlowFacts {
    fn default() -> Self {
        Self {
            public: PublicInfo::offline(),
            gateway_ip: None,
            gateway_ping_ms: None,
            dns_ok: false,
            wifi: WifiSignal::inactive(),
        }
    }
}
