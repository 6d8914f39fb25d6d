use super::RecordType;
use std::sync::Arc;

/// DNS query (domain + record type).
/// Uses `Arc<str>` for zero-cost cloning across pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuery {
    pub domain: Arc<str>,
    pub record_type: RecordType,
}

impl DnsQuery {
    pub fn new(domain: impl Into<Arc<str>>, record_type: RecordType) -> Self {
        Self {
            domain: domain.into(),
            record_type,
        }
    }

    /// The queried name lower-cased and without the root-zone dot.
    pub fn normalized_domain(&self) -> String {
        normalize_hostname(&self.domain)
    }
}

/// Lower-case `host` and strip one trailing root-zone separator.
pub fn normalize_hostname(host: &str) -> String {
    host.strip_suffix('.').unwrap_or(host).to_ascii_lowercase()
}
