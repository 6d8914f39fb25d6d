use async_trait::async_trait;
use std::io;
use std::net::IpAddr;

/// Turns an upstream hostname into addresses before any connection is made.
///
/// Implementations own their caching, if any.
#[async_trait]
pub trait BootstrapResolver: Send + Sync {
    /// Addresses of both families, in the order the resolver returned them.
    async fn lookup_ip(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}
