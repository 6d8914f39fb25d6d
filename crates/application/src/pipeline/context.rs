use super::ResultCode;
use dnsieve_domain::{DnsQuery, DnsResponse, MatchResult};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Per-query state threaded through the pipeline stages.
///
/// Owned by exactly one pipeline invocation and dropped when the answer has
/// been written.
#[derive(Debug, Clone)]
pub struct DnsContext {
    pub client_ip: IpAddr,
    /// Name of the client according to DHCP, if known.
    pub client_name: Option<Arc<str>>,
    pub question: Option<DnsQuery>,
    /// The rule that matched the question or the answer, if any.
    pub filter_result: Option<MatchResult>,
    pub response: Option<DnsResponse>,
    /// True only when `response` was received from an upstream, as opposed to
    /// synthesized locally.
    pub response_from_upstream: bool,
    pub upstream: Option<Arc<str>>,
    pub result: ResultCode,
    started_at: Instant,
}

impl DnsContext {
    pub fn new(client_ip: IpAddr, question: DnsQuery) -> Self {
        Self {
            client_ip,
            client_name: None,
            question: Some(question),
            filter_result: None,
            response: None,
            response_from_upstream: false,
            upstream: None,
            result: ResultCode::Success,
            started_at: Instant::now(),
        }
    }

    /// A context without a question, as produced for malformed requests.
    pub fn empty(client_ip: IpAddr) -> Self {
        Self {
            client_ip,
            client_name: None,
            question: None,
            filter_result: None,
            response: None,
            response_from_upstream: false,
            upstream: None,
            result: ResultCode::Success,
            started_at: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn is_blocked(&self) -> bool {
        self.filter_result
            .as_ref()
            .is_some_and(MatchResult::is_blocked)
    }
}
