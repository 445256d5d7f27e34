// Last-known slow facts, written by probe tasks and read by the tick loop.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::models::{PublicInfo, SlowFacts, WifiSignal};

/// Shared cache of slow-probe results. Each setter replaces one field (last write wins);
/// readers always get a complete copy and never wait for a probe.
#[derive(Debug, Clone, Default)]
pub struct ProbeCache {
    facts: Arc<RwLock<SlowFacts>>,
    failures: Arc<AtomicU64>,
}

impl ProbeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SlowFacts {
        self.facts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, f: impl FnOnce(&mut SlowFacts)) {
        let mut facts = self.facts.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut facts);
    }

    pub fn set_public(&self, public: PublicInfo) {
        self.update(|facts| facts.public = public);
    }

    pub fn set_gateway(&self, gateway_ip: Option<Ipv4Addr>) {
        self.update(|facts| facts.gateway_ip = gateway_ip);
    }

    pub fn set_gateway_ping(&self, ping_ms: Option<f64>) {
        self.update(|facts| facts.gateway_ping_ms = ping_ms);
    }

    pub fn set_dns_ok(&self, ok: bool) {
        self.update(|facts| facts.dns_ok = ok);
    }

    pub fn set_wifi(&self, wifi: WifiSignal) {
        self.update(|facts| facts.wifi = wifi);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Probe failures since start.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}
