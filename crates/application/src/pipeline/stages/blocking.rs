use dnsieve_domain::config::BlockingMode;
use dnsieve_domain::{DnsQuery, DnsRecord, DnsResponse, RecordData, RecordType, ResponseCode};
use std::net::{Ipv4Addr, Ipv6Addr};

/// TTL of synthesized block answers, in seconds.
pub const BLOCKED_TTL: u32 = 10;

/// Build the local answer for a blocked question.
pub fn blocked_response(query: &DnsQuery, mode: BlockingMode) -> DnsResponse {
    match mode {
        BlockingMode::NxDomain => DnsResponse::new(ResponseCode::NxDomain, Vec::new()),
        BlockingMode::NullIp => {
            let data = match query.record_type {
                RecordType::A => Some(RecordData::A(Ipv4Addr::UNSPECIFIED)),
                RecordType::AAAA => Some(RecordData::Aaaa(Ipv6Addr::UNSPECIFIED)),
                _ => None,
            };
            let answers = data
                .map(|d| vec![DnsRecord::new(query.domain.clone(), BLOCKED_TTL, d)])
                .unwrap_or_default();
            DnsResponse::new(ResponseCode::NoError, answers)
        }
    }
}
