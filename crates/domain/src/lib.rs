//! dnsieve domain layer
pub mod config;
pub mod dhcp;
pub mod dns_query;
pub mod dns_record;
pub mod errors;
pub mod filter;
pub mod ipset_mapping;

pub use config::{CliOverrides, Config, ConfigError};
pub use dhcp::DhcpLease;
pub use dns_query::{normalize_hostname, DnsQuery};
pub use dns_record::{DnsRecord, DnsResponse, RecordData, RecordType, ResponseCode};
pub use errors::{DialErrors, DomainError};
pub use filter::{
    Filter, FilterAction, FilterId, FilterRequest, FilterSource, MatchResult, SourceStats,
};
pub use ipset_mapping::IpsetMapping;
