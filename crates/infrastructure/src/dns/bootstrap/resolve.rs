use super::dialer::{DialHandler, Dialer};
use super::upstream_url::UpstreamUrl;
use dnsieve_application::ports::BootstrapResolver;
use dnsieve_domain::DomainError;
use rustc_hash::FxHashSet;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Resolve the host of `target_url` and return a handler that dials the
/// resulting addresses in family-preference order.
///
/// Failures after the URL has been parsed are annotated with the host.
pub async fn resolve_dial(
    target_url: &str,
    timeout: Duration,
    resolver: Option<Arc<dyn BootstrapResolver>>,
    prefer_ipv6: bool,
    dialer: Arc<dyn Dialer>,
) -> Result<DialHandler, DomainError> {
    let url = UpstreamUrl::parse(target_url)?;

    resolve_addrs(&url, timeout, resolver, prefer_ipv6)
        .await
        .map(|addrs| DialHandler::new(url.host.as_str(), addrs, timeout, dialer))
        .map_err(|e| DomainError::Dial {
            host: url.host.clone(),
            source: Box::new(e),
        })
}

async fn resolve_addrs(
    url: &UpstreamUrl,
    timeout: Duration,
    resolver: Option<Arc<dyn BootstrapResolver>>,
    prefer_ipv6: bool,
) -> Result<Vec<SocketAddr>, DomainError> {
    let resolver = resolver.ok_or(DomainError::NoResolver)?;

    let mut ips = match url.ip() {
        Some(ip) => vec![ip],
        None => lookup(resolver.as_ref(), &url.host, timeout).await?,
    };

    sort_by_preference(&mut ips, prefer_ipv6);
    dedup(&mut ips);

    debug!(host = %url.host, candidates = ips.len(), prefer_ipv6, "Resolved upstream host");

    Ok(ips
        .into_iter()
        .map(|ip| SocketAddr::new(ip, url.port))
        .collect())
}

async fn lookup(
    resolver: &dyn BootstrapResolver,
    host: &str,
    timeout: Duration,
) -> Result<Vec<IpAddr>, DomainError> {
    let result = if timeout.is_zero() {
        resolver.lookup_ip(host).await
    } else {
        tokio::time::timeout(timeout, resolver.lookup_ip(host))
            .await
            .unwrap_or_else(|_| {
                Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "bootstrap lookup timed out",
                ))
            })
    };

    result.map_err(|source| DomainError::Resolution {
        host: host.to_string(),
        source,
    })
}

/// Stable: addresses of the same family keep the resolver's order.
pub fn sort_by_preference(ips: &mut [IpAddr], prefer_ipv6: bool) {
    ips.sort_by_key(|ip| ip.is_ipv6() != prefer_ipv6);
}

/// Drop repeated addresses, keeping the first occurrence.
fn dedup(ips: &mut Vec<IpAddr>) {
    let mut seen = FxHashSet::with_capacity_and_hasher(ips.len(), Default::default());
    ips.retain(|ip| seen.insert(*ip));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ips(list: &[&str]) -> Vec<IpAddr> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn test_sort_prefer_ipv4_is_stable() {
        let mut list = ips(&["2001:db8::1", "192.0.2.1", "2001:db8::2", "192.0.2.2"]);
        sort_by_preference(&mut list, false);
        assert_eq!(
            list,
            ips(&["192.0.2.1", "192.0.2.2", "2001:db8::1", "2001:db8::2"])
        );
    }

    #[test]
    fn test_sort_prefer_ipv6_is_stable() {
        let mut list = ips(&["192.0.2.1", "2001:db8::1", "192.0.2.2", "2001:db8::2"]);
        sort_by_preference(&mut list, true);
        assert_eq!(
            list,
            ips(&["2001:db8::1", "2001:db8::2", "192.0.2.1", "192.0.2.2"])
        );
    }

    #[test]
    fn test_dedup_keeps_first() {
        let mut list = ips(&["192.0.2.1", "192.0.2.2", "192.0.2.1"]);
        dedup(&mut list);
        assert_eq!(list, ips(&["192.0.2.1", "192.0.2.2"]));
    }

    #[test]
    fn test_dedup_large_answer_keeps_order() {
        let mut list: Vec<IpAddr> = (0..2000u32)
            .map(|i| IpAddr::from(std::net::Ipv4Addr::from(0xc000_0200 + i % 500)))
            .collect();
        dedup(&mut list);
        assert_eq!(list.len(), 500);
        assert_eq!(list[0], "192.0.2.0".parse::<IpAddr>().unwrap());
        assert_eq!(list[499], "192.0.3.243".parse::<IpAddr>().unwrap());
    }
}
