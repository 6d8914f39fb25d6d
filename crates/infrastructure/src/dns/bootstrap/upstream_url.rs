use dnsieve_domain::DomainError;
use std::fmt;
use std::net::IpAddr;
use url::{Host, Url};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamScheme {
    Udp,
    Tcp,
    Tls,
    Https,
}

impl UpstreamScheme {
    pub fn default_port(&self) -> u16 {
        match self {
            UpstreamScheme::Udp | UpstreamScheme::Tcp => 53,
            UpstreamScheme::Tls => 853,
            UpstreamScheme::Https => 443,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamScheme::Udp => "udp",
            UpstreamScheme::Tcp => "tcp",
            UpstreamScheme::Tls => "tls",
            UpstreamScheme::Https => "https",
        }
    }
}

/// Where an upstream lives: scheme, host (name or IP literal) and port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamUrl {
    pub scheme: UpstreamScheme,
    pub host: String,
    pub port: u16,
}

impl UpstreamUrl {
    /// Parse `udp://`, `tcp://`, `tls://`, `https://` URLs or a bare
    /// `host[:port]`, which means plain UDP.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let raw = raw.trim();
        let invalid = || DomainError::InvalidUpstream(raw.to_string());

        let url = if raw.contains("://") {
            Url::parse(raw)
        } else {
            Url::parse(&format!("udp://{}", raw))
        }
        .map_err(|_| invalid())?;

        let scheme = match url.scheme() {
            "udp" => UpstreamScheme::Udp,
            "tcp" => UpstreamScheme::Tcp,
            "tls" => UpstreamScheme::Tls,
            "https" => UpstreamScheme::Https,
            _ => return Err(invalid()),
        };

        let host = match url.host().ok_or_else(invalid)? {
            Host::Domain(name) if !name.is_empty() => name.to_string(),
            Host::Domain(_) => return Err(invalid()),
            Host::Ipv4(ip) => ip.to_string(),
            Host::Ipv6(ip) => ip.to_string(),
        };

        Ok(Self {
            scheme,
            host,
            port: url.port().unwrap_or_else(|| scheme.default_port()),
        })
    }

    /// The host as an address if it is an IP literal.
    pub fn ip(&self) -> Option<IpAddr> {
        self.host.parse().ok()
    }
}

impl fmt::Display for UpstreamUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip() {
            Some(IpAddr::V6(ip)) => write!(f, "{}://[{}]:{}", self.scheme.as_str(), ip, self.port),
            _ => write!(f, "{}://{}:{}", self.scheme.as_str(), self.host, self.port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ports() {
        assert_eq!(UpstreamUrl::parse("udp://dns.example").unwrap().port, 53);
        assert_eq!(UpstreamUrl::parse("tcp://dns.example").unwrap().port, 53);
        assert_eq!(UpstreamUrl::parse("tls://dns.example").unwrap().port, 853);
        assert_eq!(UpstreamUrl::parse("https://dns.example/dns-query").unwrap().port, 443);
    }

    #[test]
    fn test_bare_host_is_udp() {
        let url = UpstreamUrl::parse("9.9.9.9:5353").unwrap();
        assert_eq!(url.scheme, UpstreamScheme::Udp);
        assert_eq!(url.host, "9.9.9.9");
        assert_eq!(url.port, 5353);
        assert!(url.ip().is_some());
    }

    #[test]
    fn test_ipv6_literal() {
        let url = UpstreamUrl::parse("tcp://[2001:db8::1]:5353").unwrap();
        assert_eq!(url.host, "2001:db8::1");
        assert_eq!(url.to_string(), "tcp://[2001:db8::1]:5353");
    }

    #[test]
    fn test_rejects_unknown_scheme() {
        assert!(matches!(
            UpstreamUrl::parse("quic://dns.example"),
            Err(DomainError::InvalidUpstream(_))
        ));
        assert!(UpstreamUrl::parse("udp://").is_err());
    }
}
