use dnsieve_domain::DhcpLease;
use std::net::IpAddr;
use std::sync::Arc;

/// Read-only view of the DHCP server's leases, used to put names on clients.
pub trait DhcpReader: Send + Sync {
    /// Whether DHCP provides information about clients at all.
    fn enabled(&self) -> bool;

    fn host_by_ip(&self, ip: IpAddr) -> Option<Arc<str>>;

    fn mac_by_ip(&self, ip: IpAddr) -> Option<Arc<str>>;

    fn ip_by_host(&self, host: &str) -> Option<IpAddr>;

    /// A snapshot of all active leases.
    fn leases(&self) -> Vec<DhcpLease>;
}

/// DHCP disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyDhcp;

impl DhcpReader for EmptyDhcp {
    fn enabled(&self) -> bool {
        false
    }

    fn host_by_ip(&self, _ip: IpAddr) -> Option<Arc<str>> {
        None
    }

    fn mac_by_ip(&self, _ip: IpAddr) -> Option<Arc<str>> {
        None
    }

    fn ip_by_host(&self, _host: &str) -> Option<IpAddr> {
        None
    }

    fn leases(&self) -> Vec<DhcpLease> {
        Vec::new()
    }
}

/// Fixed lease table, useful for static deployments and tests.
#[derive(Debug, Default, Clone)]
pub struct StaticLeases {
    leases: Vec<DhcpLease>,
}

impl StaticLeases {
    pub fn new(leases: Vec<DhcpLease>) -> Self {
        Self { leases }
    }
}

impl DhcpReader for StaticLeases {
    fn enabled(&self) -> bool {
        !self.leases.is_empty()
    }

    fn host_by_ip(&self, ip: IpAddr) -> Option<Arc<str>> {
        self.leases
            .iter()
            .find(|l| l.ip == ip)
            .map(|l| Arc::clone(&l.hostname))
    }

    fn mac_by_ip(&self, ip: IpAddr) -> Option<Arc<str>> {
        self.leases
            .iter()
            .find(|l| l.ip == ip)
            .map(|l| Arc::clone(&l.mac))
    }

    fn ip_by_host(&self, host: &str) -> Option<IpAddr> {
        self.leases
            .iter()
            .find(|l| l.hostname.eq_ignore_ascii_case(host))
            .map(|l| l.ip)
    }

    fn leases(&self) -> Vec<DhcpLease> {
        self.leases.clone()
    }
}
