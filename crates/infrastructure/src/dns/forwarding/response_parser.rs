use super::record_type_map::RecordTypeMapper;
use bytes::Bytes;
use dnsieve_domain::{DnsRecord, DnsResponse, DomainError, RecordData, ResponseCode};
use hickory_proto::op::{Message, ResponseCode as HickoryResponseCode};
use hickory_proto::rr::{RData, Record};
use std::sync::Arc;
use tracing::debug;

/// A parsed upstream response together with its message ID.
#[derive(Debug, Clone)]
pub struct ParsedResponse {
    pub id: u16,
    pub response: DnsResponse,
}

pub struct ResponseParser;

impl ResponseParser {
    /// Parses a DNS response from owned bytes. The bytes are kept on the
    /// result for relaying.
    pub fn parse_bytes(response_bytes: Bytes) -> Result<ParsedResponse, DomainError> {
        let message = Message::from_vec(&response_bytes).map_err(|e| {
            DomainError::InvalidDnsResponse(format!("Failed to parse DNS response: {}", e))
        })?;

        let rcode = Self::rcode_from_hickory(message.response_code());
        let truncated = message.truncated();
        let answers: Vec<DnsRecord> = message.answers().iter().map(Self::record).collect();

        debug!(
            rcode = rcode.as_str(),
            answers = answers.len(),
            truncated,
            "DNS response parsed"
        );

        let mut response = DnsResponse::new(rcode, answers);
        response.truncated = truncated;
        response.wire = Some(response_bytes);

        Ok(ParsedResponse {
            id: message.id(),
            response,
        })
    }

    pub fn parse(response_bytes: &[u8]) -> Result<ParsedResponse, DomainError> {
        Self::parse_bytes(Bytes::copy_from_slice(response_bytes))
    }

    fn record(record: &Record) -> DnsRecord {
        let name = record.name().to_utf8();
        let data = match record.data() {
            Some(RData::A(a)) => RecordData::A(a.0),
            Some(RData::AAAA(aaaa)) => RecordData::Aaaa(aaaa.0),
            Some(RData::CNAME(canonical)) => {
                RecordData::Cname(Arc::from(canonical.0.to_utf8().as_str()))
            }
            _ => RecordData::Other(RecordTypeMapper::from_hickory(record.record_type())),
        };
        DnsRecord::new(name.as_str(), record.ttl(), data)
    }

    pub fn rcode_from_hickory(rcode: HickoryResponseCode) -> ResponseCode {
        match rcode {
            HickoryResponseCode::NoError => ResponseCode::NoError,
            HickoryResponseCode::FormErr => ResponseCode::FormErr,
            HickoryResponseCode::ServFail => ResponseCode::ServFail,
            HickoryResponseCode::NXDomain => ResponseCode::NxDomain,
            HickoryResponseCode::NotImp => ResponseCode::NotImp,
            HickoryResponseCode::Refused => ResponseCode::Refused,
            other => ResponseCode::Other(u16::from(other)),
        }
    }

    pub fn rcode_to_hickory(rcode: ResponseCode) -> HickoryResponseCode {
        match rcode {
            ResponseCode::NoError => HickoryResponseCode::NoError,
            ResponseCode::FormErr => HickoryResponseCode::FormErr,
            ResponseCode::ServFail => HickoryResponseCode::ServFail,
            ResponseCode::NxDomain => HickoryResponseCode::NXDomain,
            ResponseCode::NotImp => HickoryResponseCode::NotImp,
            ResponseCode::Refused => HickoryResponseCode::Refused,
            ResponseCode::Other(code) => HickoryResponseCode::Unknown(code),
        }
    }
}
