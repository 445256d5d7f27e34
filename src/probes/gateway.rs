// Default gateway from the kernel routing table.

use std::net::Ipv4Addr;

use crate::error::ProbeError;

/// Gateway of the lowest-metric default route among `(destination, gateway, metric)` rows.
pub fn pick_default_gateway<I>(routes: I) -> Option<Ipv4Addr>
where
    I: IntoIterator<Item = (Ipv4Addr, Ipv4Addr, u32)>,
{
    routes
        .into_iter()
        .filter(|(destination, gateway, _)| destination.is_unspecified() && !gateway.is_unspecified())
        .min_by_key(|(_, _, metric)| *metric)
        .map(|(_, gateway, _)| gateway)
}

/// Reads /proc/net/route and returns the default gateway.
pub fn default_gateway() -> Result<Ipv4Addr, ProbeError> {
    let routes = procfs::net::route().map_err(|e| ProbeError::Parse(e.to_string()))?;
    pick_default_gateway(
        routes
            .into_iter()
            .map(|r| (r.destination, r.gateway, r.metrics)),
    )
    .ok_or(ProbeError::NoGateway)
}
