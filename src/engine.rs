// Sampling engine: owns the last-seen counters, the start-of-run baseline and every history
// buffer; turns one round of OS reads plus the cached slow facts into a Snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::composer::{self, ConnectionLimits, TickOutput};
use crate::config::AppConfig;
use crate::counter_source::{CounterReading, CounterSource, now_ms};
use crate::error::SourceError;
use crate::history::HistoryBuffer;
use crate::models::*;
use crate::rate;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub history_length: usize,
    pub skip_loopback: bool,
    pub limits: ConnectionLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_length: 60,
            skip_loopback: true,
            limits: ConnectionLimits::default(),
        }
    }
}

impl From<&AppConfig> for EngineConfig {
    fn from(c: &AppConfig) -> Self {
        Self {
            history_length: c.sampling.history_length,
            skip_loopback: c.sampling.skip_loopback,
            limits: ConnectionLimits {
                max_listen: c.connections.max_listen,
                max_established: c.connections.max_established,
            },
        }
    }
}

pub struct Engine {
    source: Arc<dyn CounterSource>,
    config: EngineConfig,
    baseline: CounterSnapshot,
    last_global: CounterSnapshot,
    last_interfaces: BTreeMap<String, CounterSnapshot>,
    down_history: HistoryBuffer<f64>,
    up_history: HistoryBuffer<f64>,
    interface_history: BTreeMap<String, HistoryBuffer<f64>>,
    ticks: u64,
}

impl Engine {
    /// Captures the start-of-run counters. Failing here means the platform cannot provide
    /// counters at all, which is fatal.
    pub fn new(source: Arc<dyn CounterSource>, config: EngineConfig) -> Result<Self, SourceError> {
        let CounterReading {
            global: baseline,
            interfaces: last_interfaces,
        } = source.read_counters()?;
        let history_length = config.history_length;
        Ok(Self {
            source,
            config,
            baseline,
            last_global: baseline,
            last_interfaces,
            down_history: HistoryBuffer::filled(history_length, 0.0),
            up_history: HistoryBuffer::filled(history_length, 0.0),
            interface_history: BTreeMap::new(),
            ticks: 0,
        })
    }

    pub fn baseline(&self) -> &CounterSnapshot {
        &self.baseline
    }

    /// Ticks completed since start.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn down_history(&self) -> &HistoryBuffer<f64> {
        &self.down_history
    }

    pub fn up_history(&self) -> &HistoryBuffer<f64> {
        &self.up_history
    }

    /// One fast-path iteration. Never fails: every read that errors degrades its own part of
    /// the snapshot and the rest is still produced.
    pub fn tick(&mut self, facts: SlowFacts) -> Snapshot {
        self.ticks += 1;

        let (current, rate, timestamp, interface_counters) = match self.source.read_counters() {
            Ok(reading) => {
                let current = reading.global;
                let elapsed = rate::elapsed_between(&self.last_global, &current);
                let sample = rate::estimate(&self.last_global, &current, elapsed);
                self.last_global = current;
                let timestamp = if current.timestamp_ms > 0 {
                    current.timestamp_ms
                } else {
                    now_ms()
                };
                (current, sample, timestamp, Some(reading.interfaces))
            }
            Err(e) => {
                warn!(error = %e, operation = "read_counters", "counters unavailable this tick");
                (self.last_global, RateSample::default(), now_ms(), None)
            }
        };
        self.down_history.push(rate.download_mbps);
        self.up_history.push(rate.upload_mbps);

        let interface_rates = match interface_counters {
            Some(counters) => self.sample_interfaces(counters),
            None => BTreeMap::new(),
        };
        let interfaces = self.interface_views(interface_rates);

        let all_connections = self.source.read_connections().unwrap_or_else(|e| {
            warn!(error = %e, operation = "read_connections", "connections unavailable this tick");
            Vec::new()
        });
        let connection_total = all_connections.len();
        let connections = self.resolve_owners(composer::select_connections(
            &all_connections,
            self.config.limits,
        ));

        let protocol_counters = self.source.read_protocol_counters();

        composer::compose(
            TickOutput {
                timestamp,
                rate,
                down_history: &self.down_history,
                up_history: &self.up_history,
                baseline: &self.baseline,
                current: &current,
                interfaces,
                connections,
                connection_total,
                protocol_counters,
            },
            facts,
        )
    }

    /// Per-interface rates against the previous tick; appends to (and prunes) the
    /// per-interface histories.
    fn sample_interfaces(
        &mut self,
        counters: BTreeMap<String, CounterSnapshot>,
    ) -> BTreeMap<String, (CounterSnapshot, Option<RateSample>)> {
        let mut out = BTreeMap::new();
        for (name, curr) in &counters {
            let sample = self
                .last_interfaces
                .get(name)
                .map(|prev| rate::estimate(prev, curr, rate::elapsed_between(prev, curr)));
            let history_length = self.config.history_length;
            self.interface_history
                .entry(name.clone())
                .or_insert_with(|| {
                    debug!(interface = %name, "tracking new interface");
                    HistoryBuffer::filled(history_length, 0.0)
                })
                .push(sample.map_or(0.0, |s| s.download_mbps));
            out.insert(name.clone(), (*curr, sample));
        }
        self.interface_history
            .retain(|name, _| counters.contains_key(name));
        self.last_interfaces = counters;
        out
    }

    fn interface_views(
        &self,
        mut rates: BTreeMap<String, (CounterSnapshot, Option<RateSample>)>,
    ) -> Vec<InterfaceView> {
        let infos = self.source.read_interface_info().unwrap_or_else(|e| {
            warn!(error = %e, operation = "read_interface_info", "interface metadata unavailable this tick");
            BTreeMap::new()
        });
        infos
            .into_values()
            .filter(|info| !(self.config.skip_loopback && info.is_loopback()))
            .map(|info| {
                let (counters, rate) = rates
                    .remove(&info.name)
                    .unwrap_or_default();
                let download_history = self
                    .interface_history
                    .get(&info.name)
                    .map(HistoryBuffer::values)
                    .unwrap_or_default();
                InterfaceView {
                    rate,
                    errors_total: counters.err_in.saturating_add(counters.err_out),
                    drops_total: counters.drop_in.saturating_add(counters.drop_out),
                    download_history,
                    info,
                }
            })
            .collect()
    }

    /// Looks up owner names for the connections that made it into the snapshot.
    fn resolve_owners(&self, mut connections: Vec<ConnectionRecord>) -> Vec<ConnectionRecord> {
        for conn in &mut connections {
            let name = conn
                .owner_pid
                .and_then(|pid| self.source.process_name(pid))
                .unwrap_or_else(|| UNKNOWN_PROCESS.to_string());
            conn.owner_process_name = Some(name);
        }
        connections
    }
}
