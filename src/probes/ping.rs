// Single echo probe via the system `ping` binary.

use std::net::Ipv4Addr;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::ProbeError;

/// Round-trip time in milliseconds from `ping` output (`time=12.3 ms` or `time<1 ms`).
pub fn parse_ping_rtt(output: &str) -> Option<f64> {
    let start = output
        .find("time=")
        .or_else(|| output.find("time<"))
        .map(|i| i + 5)?;
    let rest = &output[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

/// Sends one echo request to `host`, waiting at most `timeout` for the reply.
pub async fn ping_once(host: Ipv4Addr, timeout: Duration) -> Result<f64, ProbeError> {
    let wait_secs = timeout.as_secs().max(1).to_string();
    let host = host.to_string();
    let child = Command::new("ping")
        .args(["-n", "-c", "1", "-W", wait_secs.as_str(), host.as_str()])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output();
    let output = tokio::time::timeout(timeout + Duration::from_millis(500), child)
        .await
        .map_err(|_| ProbeError::Timeout(timeout))?
        .map_err(|source| ProbeError::Spawn {
            command: "ping",
            source,
        })?;
    if !output.status.success() {
        return Err(ProbeError::CommandFailed { command: "ping" });
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_ping_rtt(&stdout).ok_or_else(|| ProbeError::Parse(stdout.trim().to_string()))
}
