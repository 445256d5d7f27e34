// Raw network counters, interface metadata and socket tables via sysinfo and /proc

mod connections;
mod linux;

pub use linux::{parse_snmp, parse_snmp_field};

use crate::error::SourceError;
use crate::models::*;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Mutex;
use sysinfo::Networks;
use tracing::instrument;

/// Wall-clock milliseconds since the Unix epoch, 0 if the clock is before the epoch.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, operation = "get_timestamp", "system time error");
            0
        })
}

/// Global and per-interface counters from the same OS read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterReading {
    pub global: CounterSnapshot,
    pub interfaces: BTreeMap<String, CounterSnapshot>,
}

impl CounterReading {
    /// Sums `interfaces` into the global snapshot, stamped with the newest interface timestamp.
    pub fn from_interfaces(interfaces: BTreeMap<String, CounterSnapshot>) -> Self {
        let timestamp_ms = interfaces
            .values()
            .map(|c| c.timestamp_ms)
            .max()
            .unwrap_or_else(now_ms);
        Self {
            global: CounterSnapshot::aggregate(timestamp_ms, interfaces.values()),
            interfaces,
        }
    }
}

/// Synchronous reads of current OS network state. No caching between calls.
pub trait CounterSource: Send + Sync {
    /// One sample of every interface plus their sum, so global and per-interface rates describe
    /// the same instant.
    fn read_counters(&self) -> Result<CounterReading, SourceError> {
        self.read_interface_counters()
            .map(CounterReading::from_interfaces)
    }

    /// Counters summed over every interface.
    fn read_global_counters(&self) -> Result<CounterSnapshot, SourceError> {
        self.read_counters().map(|reading| reading.global)
    }

    fn read_interface_counters(&self) -> Result<BTreeMap<String, CounterSnapshot>, SourceError>;

    /// Interface metadata. May reuse the interface list of the latest counter read.
    fn read_interface_info(&self) -> Result<BTreeMap<String, InterfaceInfo>, SourceError>;

    /// Open sockets in enumeration order. Entries that cannot be read are skipped.
    fn read_connections(&self) -> Result<Vec<ConnectionRecord>, SourceError>;

    /// TCP/UDP receive counters; None where the platform does not expose them.
    fn read_protocol_counters(&self) -> Option<ProtocolCounters> {
        None
    }

    /// Name of the process `pid`; None when the lookup fails for any reason.
    fn process_name(&self, pid: i32) -> Option<String>;
}

/// Counter source backed by sysinfo's network list plus Linux /sys and /proc files.
pub struct SystemCounterSource {
    networks: Mutex<Networks>,
}

impl SystemCounterSource {
    pub fn new() -> Result<Self, SourceError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(SourceError::Unavailable(format!(
                "platform {} is not supported",
                std::env::consts::OS
            )));
        }
        Ok(Self {
            networks: Mutex::new(Networks::new_with_refreshed_list()),
        })
    }

    /// Runs `f` over the interface list, refreshing it first when `refresh` is set.
    fn with_networks<T>(
        &self,
        refresh: bool,
        f: impl FnOnce(&Networks) -> T,
    ) -> Result<T, SourceError> {
        let mut networks = self.networks.lock().map_err(|_| SourceError::Poisoned)?;
        if refresh {
            networks.refresh(true);
        }
        if networks.list().is_empty() {
            return Err(SourceError::NoInterfaces);
        }
        Ok(f(&*networks))
    }
}

impl CounterSource for SystemCounterSource {
    #[instrument(skip(self), fields(source = "sysinfo", operation = "read_interface_counters"))]
    fn read_interface_counters(&self) -> Result<BTreeMap<String, CounterSnapshot>, SourceError> {
        let timestamp_ms = now_ms();
        self.with_networks(true, |networks| {
            networks
                .list()
                .iter()
                .map(|(name, data)| {
                    let (drop_in, drop_out) = linux::read_interface_drops(name);
                    (
                        name.clone(),
                        CounterSnapshot {
                            timestamp_ms,
                            bytes_sent: data.total_transmitted(),
                            bytes_recv: data.total_received(),
                            packets_sent: data.total_packets_transmitted(),
                            packets_recv: data.total_packets_received(),
                            err_in: data.total_errors_on_received(),
                            err_out: data.total_errors_on_transmitted(),
                            drop_in,
                            drop_out,
                        },
                    )
                })
                .collect()
        })
    }

    /// Uses the list as of the latest counter read; no extra refresh.
    #[instrument(skip(self), fields(source = "sysinfo", operation = "read_interface_info"))]
    fn read_interface_info(&self) -> Result<BTreeMap<String, InterfaceInfo>, SourceError> {
        self.with_networks(false, |networks| {
            networks
                .list()
                .iter()
                .map(|(name, data)| {
                    let ipv4_address = data.ip_networks().iter().find_map(|n| match n.addr {
                        IpAddr::V4(v4) => Some(v4),
                        IpAddr::V6(_) => None,
                    });
                    let mtu = match data.mtu() {
                        0 => linux::read_interface_mtu(name).unwrap_or(0),
                        mtu => mtu,
                    };
                    (
                        name.clone(),
                        InterfaceInfo {
                            name: name.clone(),
                            mac_address: data.mac_address().to_string(),
                            ipv4_address,
                            is_up: linux::read_interface_up(name).unwrap_or(true),
                            mtu,
                        },
                    )
                })
                .collect()
        })
    }

    #[instrument(skip(self), fields(source = "procfs", operation = "read_connections"))]
    fn read_connections(&self) -> Result<Vec<ConnectionRecord>, SourceError> {
        connections::read_connections()
    }

    fn read_protocol_counters(&self) -> Option<ProtocolCounters> {
        linux::read_snmp()
    }

    fn process_name(&self, pid: i32) -> Option<String> {
        connections::process_name(pid)
    }
}
