//! dnsieve application layer: capability ports and the request pipeline.
pub mod pipeline;
pub mod ports;

pub use pipeline::{DnsContext, RequestPipeline, ResultCode, Stage};
