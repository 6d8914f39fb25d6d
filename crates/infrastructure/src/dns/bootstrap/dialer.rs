use async_trait::async_trait;
use dnsieve_domain::{DialErrors, DomainError};
use std::fmt;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{TcpStream, UdpSocket};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Tcp,
    Udp,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Network::Tcp => "tcp",
            Network::Udp => "udp",
        })
    }
}

/// An established connection to an upstream.
#[derive(Debug)]
pub enum UpstreamConn {
    Tcp(TcpStream),
    /// A UDP socket connected to the upstream address.
    Udp(UdpSocket),
}

/// Opens one connection to one address.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, network: Network, addr: SocketAddr) -> io::Result<UpstreamConn>;
}

/// [`Dialer`] backed by tokio sockets.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetDialer;

#[async_trait]
impl Dialer for NetDialer {
    async fn dial(&self, network: Network, addr: SocketAddr) -> io::Result<UpstreamConn> {
        match network {
            Network::Tcp => Ok(UpstreamConn::Tcp(TcpStream::connect(addr).await?)),
            Network::Udp => {
                let local: SocketAddr = match addr {
                    SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
                    SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
                };
                let socket = UdpSocket::bind(local).await?;
                socket.connect(addr).await?;
                Ok(UpstreamConn::Udp(socket))
            }
        }
    }
}

/// Dials a fixed, pre-resolved list of candidates in order and returns the
/// first connection that succeeds. Never re-resolves.
#[derive(Clone)]
pub struct DialHandler {
    host: Arc<str>,
    addrs: Arc<[SocketAddr]>,
    timeout: Duration,
    dialer: Arc<dyn Dialer>,
}

impl DialHandler {
    /// A zero `timeout` means attempts are not bounded.
    pub fn new(
        host: impl Into<Arc<str>>,
        addrs: Vec<SocketAddr>,
        timeout: Duration,
        dialer: Arc<dyn Dialer>,
    ) -> Self {
        Self {
            host: host.into(),
            addrs: addrs.into(),
            timeout,
            dialer,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// The candidates, in dial order.
    pub fn addrs(&self) -> &[SocketAddr] {
        &self.addrs
    }

    /// Connect over `network`. `_addr` is ignored: the candidates fixed at
    /// construction are used instead.
    pub async fn dial(&self, network: Network, _addr: &str) -> Result<UpstreamConn, DomainError> {
        let total = self.addrs.len();
        if total == 0 {
            debug!(host = %self.host, "No addresses to dial");
            return Err(DomainError::NoAddresses);
        }

        let mut errs = DialErrors::new();
        for (idx, addr) in self.addrs.iter().enumerate() {
            debug!(%addr, %network, idx = idx + 1, total, "Dialing");

            let start = Instant::now();
            match self.attempt(network, *addr).await {
                Ok(conn) => {
                    debug!(%addr, elapsed = ?start.elapsed(), "Connection succeeded");
                    return Ok(conn);
                }
                Err(e) => {
                    debug!(%addr, elapsed = ?start.elapsed(), error = %e, "Connection failed");
                    errs.push(*addr, e);
                }
            }
        }

        Err(DomainError::DialFailed(errs))
    }

    async fn attempt(&self, network: Network, addr: SocketAddr) -> io::Result<UpstreamConn> {
        if self.timeout.is_zero() {
            return self.dialer.dial(network, addr).await;
        }
        tokio::time::timeout(self.timeout, self.dialer.dial(network, addr))
            .await
            .unwrap_or_else(|_| {
                Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("dial {} timed out after {:?}", addr, self.timeout),
                ))
            })
    }
}

impl fmt::Debug for DialHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialHandler")
            .field("host", &self.host)
            .field("addrs", &self.addrs)
            .field("timeout", &self.timeout)
            .finish()
    }
}
