#![allow(dead_code)]

use async_trait::async_trait;
use dnsieve_application::ports::{FilterEnginePort, SourceFetcher, Upstream};
use dnsieve_application::{DnsContext, ResultCode, Stage};
use dnsieve_domain::{
    DnsQuery, DnsRecord, DnsResponse, DomainError, FilterAction, FilterId, FilterRequest,
    MatchResult, RecordData, ResponseCode, SourceStats,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Mock FilterEnginePort
// ============================================================================

/// Matches hostnames from a fixed table and records every request it sees.
pub struct MockEngine {
    rules: HashMap<String, FilterAction>,
    requests: Mutex<Vec<FilterRequest>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn block(mut self, host: &str) -> Self {
        self.rules.insert(host.to_string(), FilterAction::Block);
        self
    }

    pub fn allow(mut self, host: &str) -> Self {
        self.rules.insert(host.to_string(), FilterAction::Allow);
        self
    }

    pub fn requests(&self) -> Vec<FilterRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl FilterEnginePort for MockEngine {
    fn filter_request(&self, request: &FilterRequest) -> Option<MatchResult> {
        self.requests.lock().unwrap().push(request.clone());
        self.rules
            .get(request.hostname.as_ref())
            .map(|action| MatchResult {
                action: *action,
                rule: Arc::from(request.hostname.as_ref()),
                filter_id: FilterId(1),
            })
    }

    async fn refresh(
        &self,
        _deadline: Duration,
        _buf: &mut Vec<u8>,
        _fetcher: &dyn SourceFetcher,
        _cache_dir: &Path,
        _max_size: u64,
    ) -> Result<(), DomainError> {
        Ok(())
    }

    fn rules_count(&self) -> usize {
        self.rules.len()
    }

    fn source_stats(&self) -> Vec<SourceStats> {
        Vec::new()
    }

    fn close(&self) {}
}

// ============================================================================
// Mock Upstream
// ============================================================================

pub struct MockUpstream {
    name: String,
    answers: Vec<DnsRecord>,
    fail: bool,
    calls: AtomicUsize,
}

impl MockUpstream {
    pub fn answering(name: &str, answers: Vec<DnsRecord>) -> Self {
        Self {
            name: name.to_string(),
            answers,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            answers: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn exchange(&self, _query: &DnsQuery) -> Result<DnsResponse, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DomainError::Transport(format!("{} unreachable", self.name)));
        }
        Ok(DnsResponse::new(ResponseCode::NoError, self.answers.clone()))
    }

    fn address(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Recording stage
// ============================================================================

/// Post-processor that counts invocations and returns a fixed code.
pub struct RecordingStage {
    code: ResultCode,
    calls: AtomicUsize,
}

impl RecordingStage {
    pub fn new(code: ResultCode) -> Self {
        Self {
            code,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Stage for RecordingStage {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn process(&self, _ctx: &mut DnsContext) -> ResultCode {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.code
    }
}

pub fn a_record(name: &str, ip: &str) -> DnsRecord {
    DnsRecord::new(name, 300, RecordData::A(ip.parse().unwrap()))
}

pub fn cname_record(name: &str, target: &str) -> DnsRecord {
    DnsRecord::new(name, 300, RecordData::Cname(Arc::from(target)))
}
