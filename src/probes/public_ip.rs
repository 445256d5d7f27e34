// Public IP, ISP and location lookup over HTTP.

use serde::Deserialize;

use crate::error::ProbeError;
use crate::models::PublicInfo;

/// Body returned by the geolocation service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoResponse {
    pub status: String,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub isp: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country_code: String,
}

impl TryFrom<GeoResponse> for PublicInfo {
    type Error = ProbeError;

    fn try_from(r: GeoResponse) -> Result<Self, Self::Error> {
        if r.status != "success" {
            return Err(ProbeError::LookupStatus(r.status));
        }
        let or_dash = |s: String| if s.is_empty() { "-".to_string() } else { s };
        Ok(PublicInfo {
            public_ip: r.query,
            isp: if r.isp.is_empty() { "Unknown".into() } else { r.isp },
            city: or_dash(r.city),
            country_code: or_dash(r.country_code),
        })
    }
}

/// Geolocation lookup; falls back to the plain IP service for the address alone.
pub async fn lookup(
    client: &reqwest::Client,
    geo_url: &str,
    ip_url: &str,
) -> Result<PublicInfo, ProbeError> {
    match lookup_geo(client, geo_url).await {
        Ok(info) => Ok(info),
        Err(e) => {
            tracing::debug!(error = %e, operation = "lookup_geo", "geolocation failed; trying plain IP lookup");
            lookup_ip(client, ip_url).await
        }
    }
}

async fn lookup_geo(client: &reqwest::Client, url: &str) -> Result<PublicInfo, ProbeError> {
    let body: GeoResponse = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    body.try_into()
}

async fn lookup_ip(client: &reqwest::Client, url: &str) -> Result<PublicInfo, ProbeError> {
    let text = client.get(url).send().await?.error_for_status()?.text().await?;
    let ip = text.trim();
    if ip.parse::<std::net::IpAddr>().is_err() {
        return Err(ProbeError::Parse(ip.to_string()));
    }
    Ok(PublicInfo::ip_only(ip))
}
