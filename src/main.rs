use anyhow::{Context, Result};
use netdash::config::OutputFormat;
use netdash::*;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

/// Stand-in consumer: one summary log line or one JSON line per snapshot.
fn spawn_consumer(
    mut rx: broadcast::Receiver<models::Snapshot>,
    format: OutputFormat,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let snapshot = match rx.recv().await {
                Ok(s) => s,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "consumer lagging; snapshots dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            match format {
                OutputFormat::Json => match serde_json::to_string(&snapshot) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::warn!(error = %e, "snapshot serialization failed"),
                },
                OutputFormat::Summary => {
                    let facts = &snapshot.facts;
                    tracing::info!(
                        down_mbps = %format_args!("{:.2}", snapshot.rate.download_mbps),
                        up_mbps = %format_args!("{:.2}", snapshot.rate.upload_mbps),
                        total_recv = snapshot.totals.total_bytes_recv,
                        total_sent = snapshot.totals.total_bytes_sent,
                        interfaces = snapshot.interfaces.len(),
                        connections = snapshot.connection_total,
                        gateway_ping_ms = ?facts.gateway_ping_ms,
                        dns_ok = facts.dns_ok,
                        wifi_quality = ?facts.wifi.active.then_some(facts.wifi.quality_percent),
                        public_ip = %facts.public.public_ip,
                        "tick"
                    );
                }
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::info!(
        name = version::NAME,
        version = version::VERSION,
        refresh_interval_ms = app_config.sampling.refresh_interval_ms,
        history_length = app_config.sampling.history_length,
        "starting"
    );

    // Counters that cannot be read at all are fatal before any loop starts.
    let source = Arc::new(
        counter_source::SystemCounterSource::new().context("network counters unavailable")?,
    );
    let engine = engine::Engine::new(source, engine::EngineConfig::from(&app_config))
        .context("cannot read initial network counters")?;

    let cache = probes::ProbeCache::new();
    let system_probes = Arc::new(
        probes::SystemProbes::new(app_config.probes.clone()).context("http client setup")?,
    );
    let mut probe_handles = probes::spawn(
        system_probes,
        cache.clone(),
        probes::ProbeSchedule::from(&app_config.probes),
    );

    let (tx, rx) = broadcast::channel::<models::Snapshot>(app_config.publishing.broadcast_capacity);
    let consumer_handle = spawn_consumer(rx, app_config.publishing.format);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let worker_handle = worker::spawn(
        worker::WorkerDeps {
            engine,
            cache,
            tx,
            shutdown_rx,
        },
        worker::WorkerConfig {
            refresh_interval_ms: app_config.sampling.refresh_interval_ms,
            stats_log_interval_secs: app_config.publishing.stats_log_interval_secs,
        },
    );

    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    tracing::info!("Received shutdown signal");
    probe_handles.abort_all();
    let _ = shutdown_tx.send(());
    let _ = worker_handle.await;
    let _ = consumer_handle.await;
    Ok(())
}
