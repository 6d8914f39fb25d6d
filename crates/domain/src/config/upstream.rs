use serde::{Deserialize, Serialize};

/// Upstream forwarding configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Upstream servers, e.g. `udp://dns.example:53`, `tcp://9.9.9.9` or
    /// `dns.example`. Hostnames are resolved through the bootstrap resolver.
    #[serde(default = "default_servers")]
    pub servers: Vec<String>,

    /// Plain IP resolvers used to resolve upstream hostnames.
    /// Empty means the operating system resolver.
    #[serde(default)]
    pub bootstrap: Vec<String>,

    /// Try IPv6 candidates before IPv4 ones (default: false)
    #[serde(default)]
    pub prefer_ipv6: bool,

    /// Per-dial and per-exchange timeout in milliseconds (default: 2000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_servers() -> Vec<String> {
    vec!["udp://9.9.9.9:53".to_string()]
}

fn default_timeout_ms() -> u64 {
    2000
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            servers: default_servers(),
            bootstrap: vec![],
            prefer_ipv6: false,
            timeout_ms: default_timeout_ms(),
        }
    }
}
