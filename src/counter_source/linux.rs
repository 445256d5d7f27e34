// Linux-specific helpers: /sys/class/net attributes and /proc/net/snmp.

const IFF_UP: u32 = 0x1;

/// Read a numeric attribute from /sys/class/net/<interface>/<attr> (Linux).
fn read_net_attr(interface_name: &str, attr: &str) -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        let path = format!("/sys/class/net/{}/{}", interface_name, attr);
        let content = std::fs::read_to_string(&path).ok()?;
        let content = content.trim();
        if let Some(hex) = content.strip_prefix("0x") {
            return u64::from_str_radix(hex, 16).ok();
        }
        content.parse::<u64>().ok()
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = (interface_name, attr);
        None
    }
}

/// Receive/transmit drop counters for an interface, (0, 0) if unavailable.
pub(super) fn read_interface_drops(interface_name: &str) -> (u64, u64) {
    (
        read_net_attr(interface_name, "statistics/rx_dropped").unwrap_or(0),
        read_net_attr(interface_name, "statistics/tx_dropped").unwrap_or(0),
    )
}

/// Administrative up flag (IFF_UP) from /sys/class/net/<interface>/flags.
pub(super) fn read_interface_up(interface_name: &str) -> Option<bool> {
    read_net_attr(interface_name, "flags").map(|flags| (flags as u32 & IFF_UP) != 0)
}

/// MTU from /sys/class/net/<interface>/mtu, used when sysinfo reports 0.
pub(super) fn read_interface_mtu(interface_name: &str) -> Option<u64> {
    read_net_attr(interface_name, "mtu")
}

/// Column of `InSegs` on the line following the `Tcp:` header.
const TCP_IN_SEGS_COLUMN: usize = 10;
/// Column of `InDatagrams` on the line following the `Udp:` header.
const UDP_IN_DATAGRAMS_COLUMN: usize = 1;

/// Value at `column` of the line after the first line starting with `prefix`.
///
/// /proc/net/snmp has a header line and a values line per protocol, both starting with
/// the same prefix. Returns None if the section, the values line or the column is missing.
pub fn parse_snmp_field(content: &str, prefix: &str, column: usize) -> Option<u64> {
    let mut lines = content.lines();
    lines.find(|line| line.starts_with(prefix))?;
    let values = lines.next()?;
    if !values.starts_with(prefix) {
        return None;
    }
    values.split_whitespace().nth(column)?.parse().ok()
}

/// Parses TCP segments-in and UDP datagrams-in from /proc/net/snmp content.
pub fn parse_snmp(content: &str) -> Option<crate::models::ProtocolCounters> {
    Some(crate::models::ProtocolCounters {
        tcp_in_segs: parse_snmp_field(content, "Tcp:", TCP_IN_SEGS_COLUMN)?,
        udp_in_datagrams: parse_snmp_field(content, "Udp:", UDP_IN_DATAGRAMS_COLUMN)?,
    })
}

pub(super) fn read_snmp() -> Option<crate::models::ProtocolCounters> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/net/snmp").ok()?;
        parse_snmp(&content)
    }
    #[cfg(not(target_os = "linux"))]
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNMP: &str = "\
Ip: Forwarding DefaultTTL InReceives InHdrErrors
Ip: 1 64 123456 0
Tcp: RtoAlgorithm RtoMin RtoMax MaxConn ActiveOpens PassiveOpens AttemptFails EstabResets CurrEstab InSegs OutSegs RetransSegs InErrs OutRsts InCsumErrors
Tcp: 1 200 120000 -1 4521 310 12 40 9 987654 876543 321 0 77 0
Udp: InDatagrams NoPorts InErrors OutDatagrams RcvbufErrors SndbufErrors InCsumErrors IgnoredMulti MemErrors
Udp: 55555 12 0 54321 0 0 0 3 0
UdpLite: InDatagrams NoPorts InErrors OutDatagrams RcvbufErrors SndbufErrors InCsumErrors IgnoredMulti MemErrors
UdpLite: 0 0 0 0 0 0 0 0 0
";

    #[test]
    fn parse_snmp_reads_fixed_columns() {
        let counters = parse_snmp(SNMP).unwrap();
        assert_eq!(counters.tcp_in_segs, 987654);
        assert_eq!(counters.udp_in_datagrams, 55555);
    }

    #[test]
    fn parse_snmp_field_missing_section_is_none() {
        assert_eq!(parse_snmp_field("Ip: a b\nIp: 1 2\n", "Tcp:", 1), None);
    }

    #[test]
    fn parse_snmp_field_missing_values_line_is_none() {
        assert_eq!(parse_snmp_field("Tcp: InSegs\n", "Tcp:", 1), None);
        assert_eq!(parse_snmp_field("Tcp: InSegs\nUdp: 1 2\n", "Tcp:", 1), None);
    }

    #[test]
    fn parse_snmp_field_short_line_is_none() {
        assert_eq!(parse_snmp_field("Tcp: a b\nTcp: 1 2\n", "Tcp:", 10), None);
    }

    #[test]
    fn parse_snmp_field_non_numeric_is_none() {
        assert_eq!(parse_snmp_field("Udp: a b\nUdp: x 2\n", "Udp:", 1), None);
    }
}
