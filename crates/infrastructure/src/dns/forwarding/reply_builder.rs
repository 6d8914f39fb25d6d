use super::record_type_map::RecordTypeMapper;
use super::response_parser::ResponseParser;
use dnsieve_domain::{DnsQuery, DnsRecord, DnsResponse, DomainError, RecordData};
use hickory_proto::op::{Message, MessageType};
use hickory_proto::rr::rdata::{A, AAAA, CNAME};
use hickory_proto::rr::{Name, RData, Record};
use std::str::FromStr;

/// A client request decoded from the wire.
#[derive(Debug, Clone)]
pub struct DecodedRequest {
    pub message: Message,
    /// The first question, if the message has one.
    pub query: Option<DnsQuery>,
}

/// Decode a client's query message.
pub fn decode_request(bytes: &[u8]) -> Result<DecodedRequest, DomainError> {
    let message = Message::from_vec(bytes)
        .map_err(|e| DomainError::InvalidDnsResponse(format!("Malformed request: {}", e)))?;

    let query = message.queries().first().map(|q| {
        DnsQuery::new(
            q.name().to_utf8(),
            RecordTypeMapper::from_hickory(q.query_type()),
        )
    });

    Ok(DecodedRequest { message, query })
}

/// Encode the answer for `request`.
///
/// Relayed upstream bytes are reused with the client's message ID; anything
/// synthesized locally is encoded from the typed records.
pub fn encode_reply(request: &Message, response: &DnsResponse) -> Result<Vec<u8>, DomainError> {
    if let Some(wire) = response.wire.as_ref().filter(|w| w.len() >= 2) {
        let mut bytes = wire.to_vec();
        bytes[..2].copy_from_slice(&request.id().to_be_bytes());
        return Ok(bytes);
    }

    let mut reply = Message::new();
    reply
        .set_id(request.id())
        .set_message_type(MessageType::Response)
        .set_op_code(request.op_code())
        .set_recursion_desired(request.recursion_desired())
        .set_recursion_available(true)
        .set_response_code(ResponseParser::rcode_to_hickory(response.rcode))
        .add_queries(request.queries().to_vec());

    for record in &response.answers {
        if let Some(record) = to_hickory_record(record)? {
            reply.add_answer(record);
        }
    }

    reply
        .to_vec()
        .map_err(|e| DomainError::InvalidDnsResponse(format!("Failed to encode reply: {}", e)))
}

/// SERVFAIL for `request`, used when nothing better can be produced.
pub fn encode_servfail(request: &Message) -> Result<Vec<u8>, DomainError> {
    encode_reply(request, &DnsResponse::servfail())
}

fn to_hickory_record(record: &DnsRecord) -> Result<Option<Record>, DomainError> {
    let name = Name::from_str(&record.name)
        .map_err(|e| DomainError::InvalidDomainName(format!("{}: {}", record.name, e)))?;

    let rdata = match &record.data {
        RecordData::A(ip) => RData::A(A(*ip)),
        RecordData::Aaaa(ip) => RData::AAAA(AAAA(*ip)),
        RecordData::Cname(target) => {
            let target = Name::from_str(target)
                .map_err(|e| DomainError::InvalidDomainName(format!("{}: {}", target, e)))?;
            RData::CNAME(CNAME(target))
        }
        // Only relayed answers carry other types, and those go out as bytes.
        RecordData::Other(_) => return Ok(None),
    };

    Ok(Some(Record::from_rdata(name, record.ttl, rdata)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::forwarding::MessageBuilder;
    use bytes::Bytes;
    use dnsieve_domain::{RecordType, ResponseCode};
    use std::net::Ipv4Addr;

    fn request() -> Message {
        let (_, bytes) = MessageBuilder::build_query_with_id("ads.example", &RecordType::A).unwrap();
        Message::from_vec(&bytes).unwrap()
    }

    #[test]
    fn test_decode_request() {
        let (_, bytes) = MessageBuilder::build_query_with_id("Ads.Example", &RecordType::AAAA).unwrap();
        let decoded = decode_request(&bytes).unwrap();
        let query = decoded.query.unwrap();
        assert_eq!(query.record_type, RecordType::AAAA);
        assert_eq!(query.normalized_domain(), "ads.example");
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_request(&[0x01, 0x02, 0x03]).is_err());
    }

    #[test]
    fn test_encode_synthesized_reply() {
        let req = request();
        let response = DnsResponse::new(
            ResponseCode::NoError,
            vec![DnsRecord::new("ads.example.", 10, RecordData::A(Ipv4Addr::UNSPECIFIED))],
        );

        let bytes = encode_reply(&req, &response).unwrap();
        let parsed = ResponseParser::parse(&bytes).unwrap();

        assert_eq!(parsed.id, req.id());
        assert_eq!(parsed.response.rcode, ResponseCode::NoError);
        assert_eq!(parsed.response.answers[0].data, RecordData::A(Ipv4Addr::UNSPECIFIED));
    }

    #[test]
    fn test_encode_nxdomain() {
        let req = request();
        let bytes = encode_reply(&req, &DnsResponse::new(ResponseCode::NxDomain, vec![])).unwrap();
        let parsed = ResponseParser::parse(&bytes).unwrap();
        assert_eq!(parsed.response.rcode, ResponseCode::NxDomain);
    }

    #[test]
    fn test_relayed_wire_gets_client_id() {
        let req = request();
        let mut upstream = Message::new();
        upstream
            .set_id(req.id().wrapping_add(1))
            .set_message_type(MessageType::Response);
        let mut response = DnsResponse::new(ResponseCode::NoError, vec![]);
        response.wire = Some(Bytes::from(upstream.to_vec().unwrap()));

        let bytes = encode_reply(&req, &response).unwrap();
        assert_eq!(Message::from_vec(&bytes).unwrap().id(), req.id());
    }
}
