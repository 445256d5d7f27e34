// Domain models: raw counters, connections, slow facts and the per-tick snapshot

mod connection;
mod counters;
mod facts;
mod snapshot;

pub use connection::{ConnectionRecord, Protocol, SocketState, UNKNOWN_PROCESS};
pub use counters::{CounterSnapshot, InterfaceInfo, ProtocolCounters};
pub use facts::{PublicInfo, SlowFacts, WifiSignal};
pub use snapshot::{InterfaceView, RateSample, Snapshot, TrafficTotals};
