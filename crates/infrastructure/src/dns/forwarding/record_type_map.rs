use dnsieve_domain::RecordType;
use hickory_proto::rr::RecordType as HickoryRecordType;

/// Converts between the domain record type and hickory's.
pub struct RecordTypeMapper;

impl RecordTypeMapper {
    /// Convert domain RecordType → hickory RecordType (for building queries)
    pub fn to_hickory(record_type: &RecordType) -> HickoryRecordType {
        match record_type {
            RecordType::A => HickoryRecordType::A,
            RecordType::AAAA => HickoryRecordType::AAAA,
            RecordType::CNAME => HickoryRecordType::CNAME,
            RecordType::MX => HickoryRecordType::MX,
            RecordType::TXT => HickoryRecordType::TXT,
            RecordType::PTR => HickoryRecordType::PTR,
            RecordType::SRV => HickoryRecordType::SRV,
            RecordType::SOA => HickoryRecordType::SOA,
            RecordType::NS => HickoryRecordType::NS,
            RecordType::SVCB => HickoryRecordType::SVCB,
            RecordType::HTTPS => HickoryRecordType::HTTPS,
            RecordType::CAA => HickoryRecordType::CAA,
            RecordType::ANY => HickoryRecordType::ANY,
            RecordType::Other(code) => HickoryRecordType::from(*code),
        }
    }

    /// Convert hickory RecordType → domain RecordType (for incoming queries).
    /// Types this core does not inspect are kept by wire number.
    pub fn from_hickory(hickory_type: HickoryRecordType) -> RecordType {
        RecordType::from_u16(u16::from(hickory_type))
    }
}
