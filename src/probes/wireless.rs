// Wireless signal from /proc/net/wireless.

use crate::models::WifiSignal;

pub const WIRELESS_PATH: &str = "/proc/net/wireless";

/// Rough signal-to-quality heuristic: -100 dBm is 0%, -50 dBm and above is 100%.
pub fn dbm_to_quality_percent(signal_dbm: f64) -> f64 {
    (2.0 * (signal_dbm + 100.0)).clamp(0.0, 100.0)
}

fn parse_column(value: &str) -> Option<f64> {
    value.trim_end_matches('.').parse().ok()
}

/// First interface line `name: status link level noise ...` that parses.
///
/// Header lines have no colon. Returns an inactive signal when no interface line parses.
pub fn parse_wireless(content: &str) -> WifiSignal {
    content
        .lines()
        .filter_map(|line| {
            let (name, rest) = line.split_once(':')?;
            let mut columns = rest.split_whitespace().skip(1);
            let link_quality = parse_column(columns.next()?)?;
            let signal_dbm = parse_column(columns.next()?)?;
            Some(WifiSignal {
                active: true,
                interface: Some(name.trim().to_string()),
                signal_dbm,
                link_quality,
                quality_percent: dbm_to_quality_percent(signal_dbm),
            })
        })
        .next()
        .unwrap_or_else(WifiSignal::inactive)
}
