#![allow(dead_code)]
use async_trait::async_trait;
use dnsieve_application::ports::{IpsetManager, SourceFetcher};
use dnsieve_domain::DomainError;
use dnsieve_infrastructure::dns::bootstrap::{Dialer, Network, UpstreamConn};
use dnsieve_infrastructure::ipset::{SetBackend, SetFamily};
use std::collections::{HashMap, HashSet};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::net::UdpSocket;

// ============================================================================
// Dialer
// ============================================================================

/// Dialer that fails for a fixed set of addresses and records every attempt.
#[derive(Default)]
pub struct FakeDialer {
    failing: HashSet<SocketAddr>,
    hanging: HashSet<SocketAddr>,
    attempts: Mutex<Vec<(Network, SocketAddr)>>,
}

impl FakeDialer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, addr: SocketAddr) -> Self {
        self.failing.insert(addr);
        self
    }

    /// Never completes, to exercise the per-attempt timeout.
    pub fn hanging(mut self, addr: SocketAddr) -> Self {
        self.hanging.insert(addr);
        self
    }

    pub fn attempts(&self) -> Vec<SocketAddr> {
        self.attempts.lock().unwrap().iter().map(|(_, a)| *a).collect()
    }
}

#[async_trait]
impl Dialer for FakeDialer {
    async fn dial(&self, network: Network, addr: SocketAddr) -> io::Result<UpstreamConn> {
        self.attempts.lock().unwrap().push((network, addr));
        if self.hanging.contains(&addr) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.failing.contains(&addr) {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("refused by {}", addr),
            ));
        }
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        Ok(UpstreamConn::Udp(socket))
    }
}

// ============================================================================
// ipset backend and manager
// ============================================================================

/// In-memory sets with fixed families.
#[derive(Default)]
pub struct FakeSetBackend {
    families: HashMap<String, SetFamily>,
    fail_adds: bool,
    hanging: HashSet<String>,
    added: Mutex<Vec<(String, IpAddr)>>,
    add_calls: AtomicUsize,
}

impl FakeSetBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_set(mut self, name: &str, family: SetFamily) -> Self {
        self.families.insert(name.to_string(), family);
        self
    }

    pub fn failing_adds(mut self) -> Self {
        self.fail_adds = true;
        self
    }

    /// Adds to `name` never complete.
    pub fn with_hanging_set(mut self, name: &str, family: SetFamily) -> Self {
        self.families.insert(name.to_string(), family);
        self.hanging.insert(name.to_string());
        self
    }

    pub fn entries(&self) -> Vec<(String, IpAddr)> {
        self.added.lock().unwrap().clone()
    }

    pub fn add_calls(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SetBackend for FakeSetBackend {
    async fn family(&self, set: &str) -> Result<SetFamily, DomainError> {
        self.families
            .get(set)
            .copied()
            .ok_or_else(|| DomainError::Ipset(format!("set {} does not exist", set)))
    }

    async fn add_entries(&self, set: &str, ips: &[IpAddr]) -> Result<(), DomainError> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        if self.hanging.contains(set) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.fail_adds {
            return Err(DomainError::Ipset("kernel said no".into()));
        }
        let mut added = self.added.lock().unwrap();
        for ip in ips {
            added.push((set.to_string(), *ip));
        }
        Ok(())
    }
}

/// Records what the ipset stage hands to its manager.
#[derive(Default)]
pub struct RecordingManager {
    fail: bool,
    calls: Mutex<Vec<(String, Vec<Ipv4Addr>, Vec<Ipv6Addr>)>>,
    closes: AtomicUsize,
}

impl RecordingManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<Ipv4Addr>, Vec<Ipv6Addr>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IpsetManager for RecordingManager {
    async fn add(
        &self,
        host: &str,
        ip4s: &[Ipv4Addr],
        ip6s: &[Ipv6Addr],
    ) -> Result<usize, DomainError> {
        self.calls
            .lock()
            .unwrap()
            .push((host.to_string(), ip4s.to_vec(), ip6s.to_vec()));
        if self.fail {
            return Err(DomainError::Ipset("netlink failure".into()));
        }
        Ok(ip4s.len() + ip6s.len())
    }

    async fn close(&self) -> Result<(), DomainError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Source fetcher
// ============================================================================

/// Serves rule list bodies from memory, optionally after a delay.
#[derive(Default)]
pub struct FakeFetcher {
    bodies: HashMap<String, Vec<u8>>,
    delay: Option<Duration>,
    fetches: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, body: &str) -> Self {
        self.bodies.insert(url.to_string(), body.as_bytes().to_vec());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceFetcher for FakeFetcher {
    async fn fetch(
        &self,
        url: &str,
        _timeout: Duration,
        max_size: u64,
        buf: &mut Vec<u8>,
    ) -> Result<(), DomainError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        buf.clear();
        let body = self.bodies.get(url).ok_or_else(|| DomainError::FilterFetch {
            filter: url.to_string(),
            reason: "HTTP 404".to_string(),
        })?;
        if body.len() as u64 > max_size {
            return Err(DomainError::FilterTooLarge {
                filter: url.to_string(),
                max_size,
            });
        }
        buf.extend_from_slice(body);
        Ok(())
    }
}
