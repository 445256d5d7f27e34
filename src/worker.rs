// Fast tick loop: sample, derive, compose and broadcast one snapshot per period.
// Slow probes run elsewhere and are only read here through the cache.

use crate::engine::Engine;
use crate::models::Snapshot;
use crate::probes::ProbeCache;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::time::{Duration, Instant, interval};
use tracing::Instrument;

/// Rate limit for "no receivers" message (avoid logging every tick when nothing consumes snapshots)
const NO_RECEIVERS_WARN_INTERVAL: Duration = Duration::from_secs(60);

/// Engine, probe cache, output channel and shutdown for the worker.
pub struct WorkerDeps {
    pub engine: Engine,
    pub cache: ProbeCache,
    pub tx: broadcast::Sender<Snapshot>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

/// Worker timing and logging config.
pub struct WorkerConfig {
    pub refresh_interval_ms: u64,
    /// How often to log app stats (real seconds).
    pub stats_log_interval_secs: u64,
}

pub fn spawn(deps: WorkerDeps, config: WorkerConfig) -> tokio::task::JoinHandle<()> {
    let WorkerDeps {
        engine,
        cache,
        tx,
        mut shutdown_rx,
    } = deps;
    let WorkerConfig {
        refresh_interval_ms,
        stats_log_interval_secs,
    } = config;

    let engine = Arc::new(Mutex::new(engine));
    let stats_log_interval = Duration::from_secs(stats_log_interval_secs);

    let worker_span = tracing::span!(tracing::Level::DEBUG, "worker", refresh_interval_ms);

    tokio::spawn(async move {
        let mut tick = interval(Duration::from_millis(refresh_interval_ms));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(stats_log_interval);
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut last_no_receivers_warn: Option<Instant> = None;
        let mut slow_ticks: u64 = 0;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let facts = cache.snapshot();
                    let engine = engine.clone();
                    let started = Instant::now();
                    let result = tokio::task::spawn_blocking(move || {
                        let mut engine = engine
                            .lock()
                            .map_err(|e| anyhow::anyhow!("engine lock poisoned: {}", e))?;
                        anyhow::Ok(engine.tick(facts))
                    })
                    .await
                    .map_err(|e| anyhow::anyhow!("engine task join: {}", e))
                    .and_then(|r| r);
                    let snapshot = match result {
                        Ok(s) => s,
                        Err(e) => {
                            tracing::error!(error = %e, operation = "engine_tick", "tick failed; stopping worker");
                            break;
                        }
                    };
                    if started.elapsed() >= Duration::from_millis(refresh_interval_ms) {
                        slow_ticks += 1;
                        tracing::debug!(
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "tick took longer than the refresh interval"
                        );
                    }

                    if tx.send(snapshot).is_err() {
                        let should_warn = last_no_receivers_warn
                            .is_none_or(|t| t.elapsed() >= NO_RECEIVERS_WARN_INTERVAL);
                        if should_warn {
                            tracing::debug!(
                                operation = "broadcast_snapshot",
                                "No active consumers; broadcast channel has no receivers"
                            );
                            last_no_receivers_warn = Some(Instant::now());
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Worker shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    let ticks = engine.lock().map(|e| e.ticks()).unwrap_or(0);
                    tracing::info!(
                        ticks,
                        slow_ticks,
                        probe_failures = cache.failures(),
                        consumers = tx.receiver_count(),
                        "app stats"
                    );
                }
            }
        }
    }
    .instrument(worker_span))
}
