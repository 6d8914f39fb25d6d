use async_trait::async_trait;
use dnsieve_application::ports::{FilterEnginePort, SourceFetcher};
use dnsieve_domain::{DomainError, FilterRequest, MatchResult, SourceStats};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshCall {
    pub deadline: Duration,
    pub cache_dir: PathBuf,
    pub max_size: u64,
}

/// Engine that records refresh calls and optionally fails them.
pub struct MockEngine {
    calls: Mutex<Vec<RefreshCall>>,
    fail: bool,
    refreshes: AtomicUsize,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: false,
            refreshes: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<RefreshCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FilterEnginePort for MockEngine {
    fn filter_request(&self, _request: &FilterRequest) -> Option<MatchResult> {
        None
    }

    async fn refresh(
        &self,
        deadline: Duration,
        buf: &mut Vec<u8>,
        fetcher: &dyn SourceFetcher,
        cache_dir: &Path,
        max_size: u64,
    ) -> Result<(), DomainError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(RefreshCall {
            deadline,
            cache_dir: cache_dir.to_path_buf(),
            max_size,
        });
        fetcher
            .fetch("https://lists.example/hosts.txt", deadline, max_size, buf)
            .await?;
        if self.fail {
            return Err(DomainError::RefreshDeadline);
        }
        Ok(())
    }

    fn rules_count(&self) -> usize {
        0
    }

    fn source_stats(&self) -> Vec<SourceStats> {
        Vec::new()
    }

    fn close(&self) {}
}

/// Fetcher that appends a fixed body and counts how often it ran.
pub struct MockFetcher {
    fetches: AtomicUsize,
    max_capacity_seen: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            fetches: AtomicUsize::new(0),
            max_capacity_seen: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Buffer capacity observed at the start of the latest fetch.
    pub fn capacity_seen(&self) -> usize {
        self.max_capacity_seen.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceFetcher for MockFetcher {
    async fn fetch(
        &self,
        _url: &str,
        _timeout: Duration,
        _max_size: u64,
        buf: &mut Vec<u8>,
    ) -> Result<(), DomainError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.max_capacity_seen
            .store(buf.capacity(), Ordering::SeqCst);
        buf.clear();
        buf.extend_from_slice(b"||ads.example^\n");
        Ok(())
    }
}
