use chrono::{DateTime, Utc};
use std::net::IpAddr;
use std::sync::Arc;

/// A DHCP lease as seen by the resolver. Lease storage lives elsewhere; this
/// core only ever reads these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpLease {
    pub hostname: Arc<str>,
    /// Colon-separated lower-case hex, e.g. `aa:bb:cc:dd:ee:ff`.
    pub mac: Arc<str>,
    pub ip: IpAddr,
    /// `None` for static leases.
    pub expiry: Option<DateTime<Utc>>,
}

impl DhcpLease {
    pub fn is_static(&self) -> bool {
        self.expiry.is_none()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_some_and(|exp| exp <= now)
    }
}
