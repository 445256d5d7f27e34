// Snapshot composition: pure aggregation of one tick's derived data with the cached facts.

use crate::history::HistoryBuffer;
use crate::models::*;

/// How many LISTEN and ESTABLISHED entries a snapshot carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionLimits {
    pub max_listen: usize,
    pub max_established: usize,
}

impl Default for ConnectionLimits {
    fn default() -> Self {
        Self {
            max_listen: 3,
            max_established: 7,
        }
    }
}

/// Up to `max_listen` listeners in enumeration order, then the `max_established` most
/// recently enumerated established connections, newest first. Other states are dropped.
pub fn select_connections(
    records: &[ConnectionRecord],
    limits: ConnectionLimits,
) -> Vec<ConnectionRecord> {
    let listen = records
        .iter()
        .filter(|c| c.state == SocketState::Listen)
        .take(limits.max_listen);
    let established = records
        .iter()
        .rev()
        .filter(|c| c.state == SocketState::Established)
        .take(limits.max_established);
    listen.chain(established).cloned().collect()
}

/// Bytes moved since `baseline` (the start-of-run counters). A reset below the baseline
/// reads as 0 rather than wrapping.
pub fn traffic_totals(baseline: &CounterSnapshot, current: &CounterSnapshot) -> TrafficTotals {
    TrafficTotals {
        total_bytes_sent: current.bytes_sent.saturating_sub(baseline.bytes_sent),
        total_bytes_recv: current.bytes_recv.saturating_sub(baseline.bytes_recv),
    }
}

/// Everything one tick produced, borrowed from the engine.
#[derive(Debug)]
pub struct TickOutput<'a> {
    pub timestamp: u64,
    pub rate: RateSample,
    pub down_history: &'a HistoryBuffer<f64>,
    pub up_history: &'a HistoryBuffer<f64>,
    pub baseline: &'a CounterSnapshot,
    pub current: &'a CounterSnapshot,
    pub interfaces: Vec<InterfaceView>,
    /// Already bounded by `select_connections`.
    pub connections: Vec<ConnectionRecord>,
    pub connection_total: usize,
    pub protocol_counters: Option<ProtocolCounters>,
}

/// Builds the immutable per-tick snapshot. No I/O.
pub fn compose(tick: TickOutput<'_>, facts: SlowFacts) -> Snapshot {
    Snapshot {
        timestamp: tick.timestamp,
        rate: tick.rate,
        down_history: tick.down_history.values(),
        up_history: tick.up_history.values(),
        totals: traffic_totals(tick.baseline, tick.current),
        interfaces: tick.interfaces,
        connections: tick.connections,
        connection_total: tick.connection_total,
        protocol_counters: tick.protocol_counters,
        facts,
    }
}
