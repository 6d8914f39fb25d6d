use bytes::Bytes;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    AAAA,
    CNAME,
    MX,
    TXT,
    PTR,
    SRV,
    SOA,
    NS,
    SVCB,
    HTTPS,
    CAA,
    /// QTYPE 255, "any address".
    ANY,
    /// Anything this core does not inspect, kept by wire number.
    Other(u16),
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::AAAA => "AAAA",
            RecordType::CNAME => "CNAME",
            RecordType::MX => "MX",
            RecordType::TXT => "TXT",
            RecordType::PTR => "PTR",
            RecordType::SRV => "SRV",
            RecordType::SOA => "SOA",
            RecordType::NS => "NS",
            RecordType::SVCB => "SVCB",
            RecordType::HTTPS => "HTTPS",
            RecordType::CAA => "CAA",
            RecordType::ANY => "ANY",
            RecordType::Other(_) => "OTHER",
        }
    }

    /// Convert from wire format number (RFC 1035).
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => RecordType::A,
            2 => RecordType::NS,
            5 => RecordType::CNAME,
            6 => RecordType::SOA,
            12 => RecordType::PTR,
            15 => RecordType::MX,
            16 => RecordType::TXT,
            28 => RecordType::AAAA,
            33 => RecordType::SRV,
            64 => RecordType::SVCB,
            65 => RecordType::HTTPS,
            255 => RecordType::ANY,
            257 => RecordType::CAA,
            other => RecordType::Other(other),
        }
    }

    /// Convert to wire format number.
    pub fn to_u16(&self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::NS => 2,
            RecordType::CNAME => 5,
            RecordType::SOA => 6,
            RecordType::PTR => 12,
            RecordType::MX => 15,
            RecordType::TXT => 16,
            RecordType::AAAA => 28,
            RecordType::SRV => 33,
            RecordType::SVCB => 64,
            RecordType::HTTPS => 65,
            RecordType::ANY => 255,
            RecordType::CAA => 257,
            RecordType::Other(value) => *value,
        }
    }

    /// A, AAAA and ANY are the question types whose answers carry addresses.
    pub fn is_address_query(&self) -> bool {
        matches!(self, RecordType::A | RecordType::AAAA | RecordType::ANY)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::Other(value) => write!(f, "TYPE{}", value),
            _ => f.write_str(self.as_str()),
        }
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        let parsed = match upper.as_str() {
            "A" => RecordType::A,
            "AAAA" => RecordType::AAAA,
            "CNAME" => RecordType::CNAME,
            "MX" => RecordType::MX,
            "TXT" => RecordType::TXT,
            "PTR" => RecordType::PTR,
            "SRV" => RecordType::SRV,
            "SOA" => RecordType::SOA,
            "NS" => RecordType::NS,
            "SVCB" => RecordType::SVCB,
            "HTTPS" => RecordType::HTTPS,
            "CAA" => RecordType::CAA,
            "ANY" => RecordType::ANY,
            other => match other.strip_prefix("TYPE").map(str::parse::<u16>) {
                Some(Ok(value)) => RecordType::from_u16(value),
                _ => return Err(format!("Unknown record type: {}", s)),
            },
        };
        Ok(parsed)
    }
}

/// Typed answer data. Only the shapes this core acts on are decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Cname(Arc<str>),
    Other(RecordType),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    pub name: Arc<str>,
    pub ttl: u32,
    pub data: RecordData,
}

impl DnsRecord {
    pub fn new(name: impl Into<Arc<str>>, ttl: u32, data: RecordData) -> Self {
        Self {
            name: name.into(),
            ttl,
            data,
        }
    }

    pub fn record_type(&self) -> RecordType {
        match &self.data {
            RecordData::A(_) => RecordType::A,
            RecordData::Aaaa(_) => RecordType::AAAA,
            RecordData::Cname(_) => RecordType::CNAME,
            RecordData::Other(rtype) => *rtype,
        }
    }

    pub fn ip(&self) -> Option<IpAddr> {
        match &self.data {
            RecordData::A(v4) => Some(IpAddr::V4(*v4)),
            RecordData::Aaaa(v6) => Some(IpAddr::V6(*v6)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    NoError,
    FormErr,
    ServFail,
    NxDomain,
    NotImp,
    Refused,
    Other(u16),
}

impl ResponseCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCode::NoError => "NOERROR",
            ResponseCode::FormErr => "FORMERR",
            ResponseCode::ServFail => "SERVFAIL",
            ResponseCode::NxDomain => "NXDOMAIN",
            ResponseCode::NotImp => "NOTIMP",
            ResponseCode::Refused => "REFUSED",
            ResponseCode::Other(_) => "UNKNOWN",
        }
    }
}

/// A decoded DNS response.
///
/// `wire` keeps the upstream bytes when the answer was relayed unchanged, so
/// the listener can forward it without re-encoding records it never decoded.
#[derive(Debug, Clone)]
pub struct DnsResponse {
    pub rcode: ResponseCode,
    pub answers: Vec<DnsRecord>,
    pub truncated: bool,
    pub wire: Option<Bytes>,
}

impl DnsResponse {
    pub fn new(rcode: ResponseCode, answers: Vec<DnsRecord>) -> Self {
        Self {
            rcode,
            answers,
            truncated: false,
            wire: None,
        }
    }

    pub fn servfail() -> Self {
        Self::new(ResponseCode::ServFail, Vec::new())
    }

    /// Split the address records of the answer section by family.
    /// Records of any other type are ignored.
    pub fn ips_by_family(&self) -> (Vec<Ipv4Addr>, Vec<Ipv6Addr>) {
        let mut v4 = Vec::new();
        let mut v6 = Vec::new();
        for record in &self.answers {
            match record.data {
                RecordData::A(ip) => v4.push(ip),
                RecordData::Aaaa(ip) => v6.push(ip),
                _ => {}
            }
        }
        (v4, v6)
    }

    pub fn cname_targets(&self) -> impl Iterator<Item = &str> {
        self.answers.iter().filter_map(|r| match &r.data {
            RecordData::Cname(target) => Some(target.as_ref()),
            _ => None,
        })
    }
}
