// Background scheduling for slow probes: one task per probe kind, at most one run in flight.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use super::{NetworkProbes, ProbeCache, with_timeout};
use crate::config::ProbesConfig;
use crate::models::PublicInfo;

/// Upper bound on reading the routing table once at start.
pub const GATEWAY_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Slack on top of a probe's own deadline before the scheduler gives up on it.
const DEADLINE_MARGIN: Duration = Duration::from_millis(500);

/// Cadences and deadlines for each probe kind.
#[derive(Debug, Clone)]
pub struct ProbeSchedule {
    pub gateway_ping_interval: Duration,
    pub ping_timeout: Duration,
    pub dns_interval: Duration,
    pub dns_timeout: Duration,
    pub wifi_interval: Duration,
    /// Per-request HTTP timeout of the public address lookup.
    pub public_ip_timeout: Duration,
    pub gateway_discovery_timeout: Duration,
}

impl ProbeSchedule {
    /// The public lookup makes up to two requests (geolocation, then plain IP), each bounded
    /// by `public_ip_timeout`.
    pub fn public_info_limit(&self) -> Duration {
        self.public_ip_timeout * 2 + DEADLINE_MARGIN
    }

    /// The ping subprocess waits `ping_timeout` for a reply; the margin covers process start.
    pub fn ping_limit(&self) -> Duration {
        self.ping_timeout + DEADLINE_MARGIN
    }
}

impl From<&ProbesConfig> for ProbeSchedule {
    fn from(c: &ProbesConfig) -> Self {
        Self {
            gateway_ping_interval: Duration::from_millis(c.gateway_ping_interval_ms),
            ping_timeout: Duration::from_millis(c.ping_timeout_ms),
            dns_interval: Duration::from_millis(c.dns_interval_ms),
            dns_timeout: Duration::from_millis(c.dns_timeout_ms),
            wifi_interval: Duration::from_millis(c.wifi_interval_ms),
            public_ip_timeout: Duration::from_millis(c.public_ip_timeout_ms),
            gateway_discovery_timeout: GATEWAY_DISCOVERY_TIMEOUT,
        }
    }
}

/// In-flight marker for one probe kind.
#[derive(Debug, Clone, Default)]
pub struct ProbeSlot {
    busy: Arc<AtomicBool>,
}

/// Clears the slot when the run finishes (or is dropped).
#[derive(Debug)]
pub struct InFlightGuard {
    busy: Arc<AtomicBool>,
}

impl ProbeSlot {
    /// Claims the slot; None while a previous run is still outstanding.
    pub fn try_begin(&self) -> Option<InFlightGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard {
                busy: self.busy.clone(),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Scheduler tasks; aborted on drop.
#[derive(Debug, Default)]
pub struct ProbeHandles {
    handles: Vec<JoinHandle<()>>,
}

impl ProbeHandles {
    pub fn abort_all(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Drop for ProbeHandles {
    fn drop(&mut self) {
        self.abort_all();
    }
}

/// Runs `run` every `period` on its own task. A tick that finds the previous run still in
/// flight is skipped. Runs are owned by the returned task, so aborting it cancels them too.
fn spawn_periodic<F, Fut>(probe: &'static str, period: Duration, run: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let slot = ProbeSlot::default();
        let mut runs = JoinSet::new();
        let mut tick = interval(period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tick.tick().await;
            while runs.try_join_next().is_some() {}
            match slot.try_begin() {
                Some(guard) => {
                    let fut = run();
                    runs.spawn(async move {
                        fut.await;
                        drop(guard);
                    });
                }
                None => debug!(probe, "previous run still in flight; skipping"),
            }
        }
    })
}

/// Starts every probe. Results land in `cache`; failures become sentinels there and are
/// never propagated.
///
/// Public IP and gateway discovery run once; ping, DNS and wireless repeat on their own
/// cadence.
pub fn spawn<P: NetworkProbes>(
    probes: Arc<P>,
    cache: ProbeCache,
    schedule: ProbeSchedule,
) -> ProbeHandles {
    let mut handles = Vec::with_capacity(4);

    handles.push({
        let probes = probes.clone();
        let cache = cache.clone();
        let limit = schedule.public_info_limit();
        tokio::spawn(async move {
            match with_timeout(limit, probes.public_info()).await {
                Ok(public) => {
                    info!(public_ip = %public.public_ip, isp = %public.isp, "public address resolved");
                    cache.set_public(public);
                }
                Err(e) => {
                    debug!(error = %e, probe = "public_info", "public lookup failed; staying offline");
                    cache.record_failure();
                    cache.set_public(PublicInfo::offline());
                }
            }
        })
    });

    handles.push({
        let probes = probes.clone();
        let cache = cache.clone();
        let schedule = schedule.clone();
        tokio::spawn(async move {
            let discovery = with_timeout(
                schedule.gateway_discovery_timeout,
                probes.default_gateway(),
            );
            let gateway = match discovery.await {
                Ok(gw) => Some(gw),
                Err(e) => {
                    debug!(error = %e, probe = "default_gateway", "no default gateway");
                    cache.record_failure();
                    None
                }
            };
            cache.set_gateway(gateway);
            let Some(gateway) = gateway else {
                cache.set_gateway_ping(None);
                return;
            };
            let limit = schedule.ping_limit();
            let ping_loop = spawn_periodic("gateway_ping", schedule.gateway_ping_interval, move || {
                let probes = probes.clone();
                let cache = cache.clone();
                async move {
                    match with_timeout(limit, probes.ping(gateway)).await {
                        Ok(ms) => cache.set_gateway_ping(Some(ms)),
                        Err(e) => {
                            debug!(error = %e, probe = "gateway_ping", %gateway, "gateway unreachable");
                            cache.record_failure();
                            cache.set_gateway_ping(None);
                        }
                    }
                }
            });
            // Keep the ping loop tied to this task so aborting one stops both.
            let _abort_on_drop = AbortOnDrop(ping_loop);
            std::future::pending::<()>().await;
        })
    });

    handles.push({
        let probes = probes.clone();
        let cache = cache.clone();
        let limit = schedule.dns_timeout;
        spawn_periodic("dns", schedule.dns_interval, move || {
            let probes = probes.clone();
            let cache = cache.clone();
            async move {
                match with_timeout(limit, probes.dns_check()).await {
                    Ok(()) => cache.set_dns_ok(true),
                    Err(e) => {
                        debug!(error = %e, probe = "dns", "DNS check failed");
                        cache.record_failure();
                        cache.set_dns_ok(false);
                    }
                }
            }
        })
    });

    handles.push({
        let probes = probes.clone();
        let cache = cache.clone();
        spawn_periodic("wifi", schedule.wifi_interval, move || {
            let probes = probes.clone();
            let cache = cache.clone();
            async move {
                cache.set_wifi(probes.wifi().await);
            }
        })
    });

    ProbeHandles { handles }
}

struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}
