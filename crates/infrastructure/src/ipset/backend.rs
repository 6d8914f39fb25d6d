use async_trait::async_trait;
use dnsieve_domain::DomainError;
use std::fmt;
use std::net::IpAddr;

/// Address family of an OS address set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetFamily {
    Inet,
    Inet6,
}

impl SetFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetFamily::Inet => "inet",
            SetFamily::Inet6 => "inet6",
        }
    }
}

impl fmt::Display for SetFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The narrow slice of the netfilter facility the manager needs.
#[async_trait]
pub trait SetBackend: Send + Sync {
    /// Family of an existing set. Sets must exist before startup.
    async fn family(&self, set: &str) -> Result<SetFamily, DomainError>;

    /// Add `ips` to `set`. Entries already present are not an error.
    async fn add_entries(&self, set: &str, ips: &[IpAddr]) -> Result<(), DomainError>;
}
