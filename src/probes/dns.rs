// DNS health check: does a well-known hostname resolve?

use std::time::Duration;

use crate::error::ProbeError;

/// Resolves `host`; Ok when at least one address comes back within `timeout`.
pub async fn resolve(host: &str, timeout: Duration) -> Result<(), ProbeError> {
    let lookup = tokio::net::lookup_host((host, 80));
    let mut addrs = tokio::time::timeout(timeout, lookup)
        .await
        .map_err(|_| ProbeError::Timeout(timeout))?
        .map_err(ProbeError::Resolve)?;
    match addrs.next() {
        Some(_) => Ok(()),
        None => Err(ProbeError::Resolve(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} has no addresses", host),
        ))),
    }
}
