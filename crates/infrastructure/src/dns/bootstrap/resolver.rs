use async_trait::async_trait;
use dnsieve_application::ports::{BootstrapResolver, Upstream};
use dnsieve_domain::{DnsQuery, RecordType};
use rustc_hash::FxHashMap;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;

/// Resolves through the operating system (`getaddrinfo` via tokio).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

#[async_trait]
impl BootstrapResolver for SystemResolver {
    async fn lookup_ip(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, 0)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// Fixed host → addresses table. Unknown hosts fail with `NotFound`.
#[derive(Debug, Default, Clone)]
pub struct StaticResolver {
    hosts: FxHashMap<Arc<str>, Vec<IpAddr>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: &str, ips: Vec<IpAddr>) -> Self {
        self.hosts.insert(Arc::from(host.to_ascii_lowercase()), ips);
        self
    }
}

#[async_trait]
impl BootstrapResolver for StaticResolver {
    async fn lookup_ip(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        self.hosts
            .get(host.to_ascii_lowercase().as_str())
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no such host {}", host)))
    }
}

/// Resolves by asking plain-IP DNS servers for A and AAAA records.
///
/// Servers are tried in order; the first one that returns any address wins.
pub struct ForwardingResolver {
    servers: Vec<Arc<dyn Upstream>>,
}

impl ForwardingResolver {
    pub fn new(servers: Vec<Arc<dyn Upstream>>) -> Self {
        Self { servers }
    }

    async fn lookup_with(&self, server: &dyn Upstream, host: &str) -> io::Result<Vec<IpAddr>> {
        let mut ips = Vec::new();
        let mut last_err = None;

        for record_type in [RecordType::A, RecordType::AAAA] {
            match server.exchange(&DnsQuery::new(host, record_type)).await {
                Ok(response) => ips.extend(response.answers.iter().filter_map(|r| r.ip())),
                Err(e) => last_err = Some(e),
            }
        }

        match (ips.is_empty(), last_err) {
            (false, _) => Ok(ips),
            (true, Some(e)) => Err(io::Error::other(format!("{}: {}", server.address(), e))),
            (true, None) => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses for {} from {}", host, server.address()),
            )),
        }
    }
}

#[async_trait]
impl BootstrapResolver for ForwardingResolver {
    async fn lookup_ip(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let mut last_err =
            io::Error::new(io::ErrorKind::NotFound, "no bootstrap servers configured");

        for server in &self.servers {
            match self.lookup_with(server.as_ref(), host).await {
                Ok(ips) => return Ok(ips),
                Err(e) => last_err = e,
            }
        }

        Err(last_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnsieve_domain::{DnsRecord, DnsResponse, DomainError, RecordData, ResponseCode};

    #[tokio::test]
    async fn test_static_resolver() {
        let resolver = StaticResolver::new()
            .with_host("dns.example", vec!["192.0.2.1".parse().unwrap()]);

        let ips = resolver.lookup_ip("DNS.example").await.unwrap();
        assert_eq!(ips, vec!["192.0.2.1".parse::<IpAddr>().unwrap()]);

        let err = resolver.lookup_ip("missing.example").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    struct FixedUpstream {
        answers: Vec<DnsRecord>,
        fail: bool,
    }

    #[async_trait]
    impl Upstream for FixedUpstream {
        async fn exchange(&self, query: &DnsQuery) -> Result<DnsResponse, DomainError> {
            if self.fail {
                return Err(DomainError::QueryTimeout);
            }
            let answers = self
                .answers
                .iter()
                .filter(|r| r.record_type() == query.record_type)
                .cloned()
                .collect();
            Ok(DnsResponse::new(ResponseCode::NoError, answers))
        }

        fn address(&self) -> &str {
            "udp://192.0.2.53:53"
        }
    }

    #[tokio::test]
    async fn test_forwarding_resolver_collects_both_families() {
        let server = FixedUpstream {
            answers: vec![
                DnsRecord::new("dns.example.", 60, RecordData::A("192.0.2.1".parse().unwrap())),
                DnsRecord::new("dns.example.", 60, RecordData::Aaaa("2001:db8::1".parse().unwrap())),
            ],
            fail: false,
        };
        let resolver = ForwardingResolver::new(vec![Arc::new(server)]);

        let ips = resolver.lookup_ip("dns.example").await.unwrap();
        assert_eq!(
            ips,
            vec![
                "192.0.2.1".parse::<IpAddr>().unwrap(),
                "2001:db8::1".parse::<IpAddr>().unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn test_forwarding_resolver_falls_back_to_next_server() {
        let broken = FixedUpstream { answers: vec![], fail: true };
        let working = FixedUpstream {
            answers: vec![DnsRecord::new("dns.example.", 60, RecordData::A("192.0.2.7".parse().unwrap()))],
            fail: false,
        };
        let resolver = ForwardingResolver::new(vec![Arc::new(broken), Arc::new(working)]);

        let ips = resolver.lookup_ip("dns.example").await.unwrap();
        assert_eq!(ips, vec!["192.0.2.7".parse::<IpAddr>().unwrap()]);
    }

    #[tokio::test]
    async fn test_forwarding_resolver_empty_answer_is_not_found() {
        let resolver = ForwardingResolver::new(vec![Arc::new(FixedUpstream {
            answers: vec![],
            fail: false,
        })]);

        let err = resolver.lookup_ip("dns.example").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_system_resolver_literal() {
        let ips = SystemResolver.lookup_ip("127.0.0.1").await.unwrap();
        assert_eq!(ips, vec!["127.0.0.1".parse::<IpAddr>().unwrap()]);
    }
}
