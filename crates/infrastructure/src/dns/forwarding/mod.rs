pub mod message_builder;
pub mod plain_upstream;
pub mod record_type_map;
pub mod reply_builder;
pub mod response_parser;

pub use message_builder::MessageBuilder;
pub use plain_upstream::PlainUpstream;
pub use record_type_map::RecordTypeMapper;
pub use reply_builder::{decode_request, encode_reply, encode_servfail, DecodedRequest};
pub use response_parser::{ParsedResponse, ResponseParser};
