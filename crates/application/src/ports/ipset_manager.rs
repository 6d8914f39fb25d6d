use async_trait::async_trait;
use dnsieve_domain::DomainError;
use std::net::{Ipv4Addr, Ipv6Addr};

/// OS address-set integration.
///
/// `add` is called from many request tasks at once and must be safe for
/// concurrent use. `close` is called exactly once at teardown.
#[async_trait]
pub trait IpsetManager: Send + Sync {
    /// Add the addresses resolved for `host` to the sets mapped to it.
    /// Returns how many entries were newly added.
    async fn add(
        &self,
        host: &str,
        ip4s: &[Ipv4Addr],
        ip6s: &[Ipv6Addr],
    ) -> Result<usize, DomainError>;

    async fn close(&self) -> Result<(), DomainError>;
}
