use async_trait::async_trait;
use dnsieve_domain::{DomainError, FilterRequest, MatchResult, SourceStats};
use std::path::Path;
use std::time::Duration;

use super::SourceFetcher;

/// Application-layer port for the rule list engine.
///
/// The hot path (`filter_request`) is synchronous: the compiled rules live in
/// memory behind an atomically swapped reference. `refresh` is async because
/// it reads files and talks to the network.
#[async_trait]
pub trait FilterEnginePort: Send + Sync {
    /// Match `request` against the active rules. `Some` means a rule matched,
    /// whether it blocks or allows.
    fn filter_request(&self, request: &FilterRequest) -> Option<MatchResult>;

    /// Fetch every enabled source, compile them together and swap the result
    /// in. On any failure the previously active rules stay in place.
    ///
    /// `buf` is scratch space reused across sources and calls. Each source is
    /// capped at `max_size` bytes; the whole call at `deadline`.
    async fn refresh(
        &self,
        deadline: Duration,
        buf: &mut Vec<u8>,
        fetcher: &dyn SourceFetcher,
        cache_dir: &Path,
        max_size: u64,
    ) -> Result<(), DomainError>;

    /// Number of rules in the active matcher.
    fn rules_count(&self) -> usize;

    fn source_stats(&self) -> Vec<SourceStats>;

    /// Drop the compiled rules. Refreshes after this fail.
    fn close(&self);
}
