// Shared test helpers: scripted counter source and probe fakes

#![allow(dead_code)]

use netdash::counter_source::{CounterReading, CounterSource};
use netdash::error::{ProbeError, SourceError};
use netdash::models::*;
use netdash::probes::NetworkProbes;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub fn counters(timestamp_ms: u64, bytes_recv: u64, bytes_sent: u64) -> CounterSnapshot {
    CounterSnapshot {
        timestamp_ms,
        bytes_recv,
        bytes_sent,
        ..Default::default()
    }
}

pub fn interface(name: &str, ip: Option<Ipv4Addr>) -> InterfaceInfo {
    InterfaceInfo {
        name: name.into(),
        mac_address: "00:11:22:33:44:55".into(),
        ipv4_address: ip,
        is_up: true,
        mtu: 1500,
    }
}

pub fn connection(state: SocketState, local_port: u16, pid: Option<i32>) -> ConnectionRecord {
    let remote = match state {
        SocketState::Listen => None,
        _ => Some(SocketAddr::from(([93, 184, 216, 34], 443))),
    };
    ConnectionRecord {
        local_address: SocketAddr::from(([0, 0, 0, 0], local_port)),
        remote_address: remote,
        protocol: Protocol::Tcp,
        state,
        owner_pid: pid,
        owner_process_name: None,
    }
}

/// Counter source replaying scripted reads. Each queue repeats its last entry once drained.
#[derive(Default)]
pub struct FakeSource {
    global: Mutex<VecDeque<Result<CounterSnapshot, ()>>>,
    per_interface: Mutex<VecDeque<BTreeMap<String, CounterSnapshot>>>,
    pub interfaces: Vec<InterfaceInfo>,
    pub connections: Option<Vec<ConnectionRecord>>,
    pub process_names: HashMap<i32, String>,
    pub protocol_counters: Option<ProtocolCounters>,
    pub process_lookups: AtomicUsize,
    pub counter_reads: AtomicUsize,
}

impl FakeSource {
    pub fn new(global: Vec<CounterSnapshot>) -> Self {
        Self {
            global: Mutex::new(global.into_iter().map(Ok).collect()),
            connections: Some(Vec::new()),
            ..Default::default()
        }
    }

    /// Makes the n-th (0-based) global read fail.
    pub fn with_global_failure_at(self, index: usize) -> Self {
        if let Some(slot) = self.global.lock().unwrap().get_mut(index) {
            *slot = Err(());
        }
        self
    }

    pub fn with_interface_counters(self, reads: Vec<Vec<(&str, CounterSnapshot)>>) -> Self {
        *self.per_interface.lock().unwrap() = reads
            .into_iter()
            .map(|read| {
                read.into_iter()
                    .map(|(name, c)| (name.to_string(), c))
                    .collect()
            })
            .collect();
        self
    }

    fn next<T: Clone>(queue: &Mutex<VecDeque<T>>) -> Option<T> {
        let mut queue = queue.lock().unwrap();
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl CounterSource for FakeSource {
    fn read_counters(&self) -> Result<CounterReading, SourceError> {
        self.counter_reads.fetch_add(1, Ordering::Relaxed);
        let global = match Self::next(&self.global) {
            Some(Ok(c)) => c,
            Some(Err(())) => return Err(SourceError::Unavailable("scripted failure".into())),
            None => return Err(SourceError::NoInterfaces),
        };
        Ok(CounterReading {
            global,
            interfaces: Self::next(&self.per_interface).unwrap_or_default(),
        })
    }

    fn read_interface_counters(&self) -> Result<BTreeMap<String, CounterSnapshot>, SourceError> {
        Ok(Self::next(&self.per_interface).unwrap_or_default())
    }

    fn read_interface_info(&self) -> Result<BTreeMap<String, InterfaceInfo>, SourceError> {
        Ok(self
            .interfaces
            .iter()
            .map(|i| (i.name.clone(), i.clone()))
            .collect())
    }

    fn read_connections(&self) -> Result<Vec<ConnectionRecord>, SourceError> {
        self.connections
            .clone()
            .ok_or_else(|| SourceError::Unavailable("socket tables".into()))
    }

    fn read_protocol_counters(&self) -> Option<ProtocolCounters> {
        self.protocol_counters
    }

    fn process_name(&self, pid: i32) -> Option<String> {
        self.process_lookups.fetch_add(1, Ordering::Relaxed);
        self.process_names.get(&pid).cloned()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Succeed,
    Fail,
    Hang,
}

/// Probe fake with per-probe behavior and call counters.
pub struct FakeProbes {
    pub public: Behavior,
    pub gateway: Option<Ipv4Addr>,
    /// Time the routing-table read takes.
    pub gateway_delay: Duration,
    pub ping: Behavior,
    pub ping_ms: f64,
    pub dns: Behavior,
    pub wifi: WifiSignal,
    pub public_calls: AtomicUsize,
    pub ping_calls: AtomicUsize,
    pub dns_calls: AtomicUsize,
    /// DNS runs started and not yet finished or cancelled.
    pub dns_in_flight: AtomicUsize,
}

impl Default for FakeProbes {
    fn default() -> Self {
        Self {
            public: Behavior::Succeed,
            gateway: Some(Ipv4Addr::new(192, 168, 1, 1)),
            gateway_delay: Duration::ZERO,
            ping: Behavior::Succeed,
            ping_ms: 3.5,
            dns: Behavior::Succeed,
            wifi: WifiSignal::inactive(),
            public_calls: AtomicUsize::new(0),
            ping_calls: AtomicUsize::new(0),
            dns_calls: AtomicUsize::new(0),
            dns_in_flight: AtomicUsize::new(0),
        }
    }
}

/// Decrements the counter when the run ends, including by cancellation.
struct Running<'a>(&'a AtomicUsize);

impl<'a> Running<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn act<T>(behavior: Behavior, ok: T) -> Result<T, ProbeError> {
    match behavior {
        Behavior::Succeed => Ok(ok),
        Behavior::Fail => Err(ProbeError::Parse("scripted failure".into())),
        Behavior::Hang => std::future::pending().await,
    }
}

impl NetworkProbes for FakeProbes {
    async fn public_info(&self) -> Result<PublicInfo, ProbeError> {
        self.public_calls.fetch_add(1, Ordering::SeqCst);
        act(
            self.public,
            PublicInfo {
                public_ip: "203.0.113.9".into(),
                isp: "Example ISP".into(),
                city: "Tallinn".into(),
                country_code: "EE".into(),
            },
        )
        .await
    }

    async fn default_gateway(&self) -> Result<Ipv4Addr, ProbeError> {
        tokio::time::sleep(self.gateway_delay).await;
        self.gateway.ok_or(ProbeError::NoGateway)
    }

    async fn ping(&self, _host: Ipv4Addr) -> Result<f64, ProbeError> {
        self.ping_calls.fetch_add(1, Ordering::SeqCst);
        act(self.ping, self.ping_ms).await
    }

    async fn dns_check(&self) -> Result<(), ProbeError> {
        self.dns_calls.fetch_add(1, Ordering::SeqCst);
        let _running = Running::start(&self.dns_in_flight);
        act(self.dns, ()).await
    }

    async fn wifi(&self) -> WifiSignal {
        self.wifi.clone()
    }
}

pub fn fast_schedule() -> netdash::probes::ProbeSchedule {
    netdash::probes::ProbeSchedule {
        gateway_ping_interval: Duration::from_millis(100),
        ping_timeout: Duration::from_millis(200),
        dns_interval: Duration::from_millis(100),
        dns_timeout: Duration::from_millis(200),
        wifi_interval: Duration::from_millis(100),
        public_ip_timeout: Duration::from_millis(300),
        gateway_discovery_timeout: Duration::from_millis(200),
    }
}

/// HTTP endpoint on 127.0.0.1 answering every request with `status` and `body`.
pub async fn http_endpoint(status: u16, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = [0u8; 2048];
                let _ = stream.read(&mut request).await;
                let response = format!(
                    "HTTP/1.1 {} Scripted\r\ncontent-type: text/plain\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    format!("http://{}/", addr)
}

/// Endpoint that accepts connections and never answers.
pub async fn silent_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    format!("http://{}/", addr)
}
