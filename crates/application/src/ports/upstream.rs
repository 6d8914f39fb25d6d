use async_trait::async_trait;
use dnsieve_domain::{DnsQuery, DnsResponse, DomainError};

/// Forwards a question to an upstream server and returns the decoded answer.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn exchange(&self, query: &DnsQuery) -> Result<DnsResponse, DomainError>;

    /// Human-readable identity for logs, e.g. `udp://dns.example:53`.
    fn address(&self) -> &str;
}
