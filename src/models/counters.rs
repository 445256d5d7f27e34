// Raw OS network counters and interface metadata

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Cumulative counters for one interface (or the sum over all of them) at `timestamp_ms`.
///
/// Values only grow while the OS counter is not reset; they are compared pairwise against
/// the previous snapshot for the same key and nothing else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterSnapshot {
    /// Wall-clock milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
    pub err_in: u64,
    pub err_out: u64,
    pub drop_in: u64,
    pub drop_out: u64,
}

impl CounterSnapshot {
    /// Sums per-interface counters into one global snapshot stamped with `timestamp_ms`.
    pub fn aggregate<'a, I>(timestamp_ms: u64, counters: I) -> Self
    where
        I: IntoIterator<Item = &'a CounterSnapshot>,
    {
        counters.into_iter().fold(
            CounterSnapshot {
                timestamp_ms,
                ..Default::default()
            },
            |acc, c| CounterSnapshot {
                timestamp_ms,
                bytes_sent: acc.bytes_sent.wrapping_add(c.bytes_sent),
                bytes_recv: acc.bytes_recv.wrapping_add(c.bytes_recv),
                packets_sent: acc.packets_sent.wrapping_add(c.packets_sent),
                packets_recv: acc.packets_recv.wrapping_add(c.packets_recv),
                err_in: acc.err_in.wrapping_add(c.err_in),
                err_out: acc.err_out.wrapping_add(c.err_out),
                drop_in: acc.drop_in.wrapping_add(c.drop_in),
                drop_out: acc.drop_out.wrapping_add(c.drop_out),
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceInfo {
    pub name: String,
    pub mac_address: String,
    /// First IPv4 address assigned to the interface, if any.
    pub ipv4_address: Option<Ipv4Addr>,
    pub is_up: bool,
    pub mtu: u64,
}

impl InterfaceInfo {
    pub fn is_loopback(&self) -> bool {
        self.name == "lo" || self.ipv4_address.is_some_and(|ip| ip.is_loopback())
    }
}

/// Cumulative protocol counters from /proc/net/snmp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolCounters {
    pub tcp_in_segs: u64,
    pub udp_in_datagrams: u64,
}
