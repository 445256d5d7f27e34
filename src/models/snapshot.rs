// Derived rates and the per-tick snapshot handed to the renderer

use serde::{Deserialize, Serialize};

use super::{ConnectionRecord, InterfaceInfo, ProtocolCounters, SlowFacts};

/// Rates and per-tick deltas derived from two successive counter snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSample {
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub error_delta: u64,
    pub drop_delta: u64,
}

/// Bytes moved since the engine was started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficTotals {
    pub total_bytes_sent: u64,
    pub total_bytes_recv: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceView {
    pub info: InterfaceInfo,
    /// Absent on the first tick an interface is seen.
    pub rate: Option<RateSample>,
    /// Cumulative error/drop counts (in + out).
    pub errors_total: u64,
    pub drops_total: u64,
    pub download_history: Vec<f64>,
}

/// Immutable composite produced once per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub timestamp: u64,
    pub rate: RateSample,
    pub down_history: Vec<f64>,
    pub up_history: Vec<f64>,
    pub totals: TrafficTotals,
    pub interfaces: Vec<InterfaceView>,
    pub connections: Vec<ConnectionRecord>,
    pub connection_total: usize,
    pub protocol_counters: Option<ProtocolCounters>,
    pub facts: SlowFacts,
}
