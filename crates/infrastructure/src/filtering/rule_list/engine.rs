use super::compiler::compile_source;
use super::rule_index::CompiledRules;
use super::source;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use chrono::Utc;
use dnsieve_application::ports::{FilterEnginePort, SourceFetcher};
use dnsieve_domain::{
    normalize_hostname, DomainError, Filter, FilterRequest, FilterSource, MatchResult,
    SourceStats,
};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Upper bound for fetching a single source.
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(30);

/// The Rule List Engine.
///
/// All rules live in memory. The compiled `CompiledRules` is swapped
/// atomically via `ArcSwap` during `refresh()`, so readers never wait and
/// never see a half-built matcher.
pub struct RuleListEngine {
    name: Arc<str>,
    filters: Vec<Filter>,

    /// Current compiled rules. Swapped atomically on refresh.
    rules: ArcSwap<CompiledRules>,

    /// Serializes refreshes of this engine.
    refresh_lock: Mutex<()>,

    closed: AtomicBool,

    source_timeout: Duration,
}

impl RuleListEngine {
    /// An engine that matches nothing until the first successful refresh.
    pub fn new(name: impl Into<Arc<str>>, filters: Vec<Filter>) -> Self {
        Self {
            name: name.into(),
            filters,
            rules: ArcSwap::from_pointee(CompiledRules::empty()),
            refresh_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }

    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Fetch one filter's content into `buf`.
    async fn load_source(
        &self,
        filter: &Filter,
        buf: &mut Vec<u8>,
        fetcher: &dyn SourceFetcher,
        cache_dir: &Path,
        max_size: u64,
        remaining: Duration,
    ) -> Result<(), DomainError> {
        let timeout = self.source_timeout.min(remaining);
        match &filter.source {
            FilterSource::File(path) => {
                tokio::time::timeout(timeout, source::read_file(&filter.name, path, max_size, buf))
                    .await
                    .map_err(|_| DomainError::FilterFetch {
                        filter: filter.name.to_string(),
                        reason: "timed out".to_string(),
                    })?
            }
            FilterSource::Url(url) => {
                fetcher
                    .fetch(url, timeout, max_size, buf)
                    .await
                    .map_err(|e| label_error(e, &filter.name))?;

                if let Err(e) = source::write_cache(cache_dir, filter.id.0, buf).await {
                    warn!(
                        filter = %filter.name,
                        cache_dir = %cache_dir.display(),
                        error = %e,
                        "Failed to cache downloaded filter"
                    );
                }
                Ok(())
            }
        }
    }

    /// Load and parse every enabled source, then build the new matcher.
    async fn compile_all(
        &self,
        started: Instant,
        deadline: Duration,
        buf: &mut Vec<u8>,
        fetcher: &dyn SourceFetcher,
        cache_dir: &Path,
        max_size: u64,
    ) -> Result<CompiledRules, DomainError> {
        let mut sources = Vec::with_capacity(self.filters.len());
        let mut stats = Vec::with_capacity(self.filters.len());

        for filter in self.filters.iter().filter(|f| f.enabled) {
            let remaining = deadline.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return Err(DomainError::RefreshDeadline);
            }

            self.load_source(filter, buf, fetcher, cache_dir, max_size, remaining)
                .await?;

            let compiled = compile_source(filter, buf)?;
            debug!(
                filter = %filter.name,
                rules = compiled.rules.len(),
                invalid = compiled.invalid_lines,
                bytes = buf.len(),
                "Filter source compiled"
            );

            stats.push(SourceStats {
                filter_id: filter.id,
                name: Arc::clone(&filter.name),
                rules_count: compiled.rules.len(),
                invalid_lines: compiled.invalid_lines,
                size: buf.len() as u64,
                checksum: source::checksum(buf),
                updated_at: Utc::now(),
            });
            sources.push(compiled);
        }

        CompiledRules::build(sources, stats)
    }
}

/// Attach the filter name to fetch errors reported by URL.
fn label_error(err: DomainError, name: &str) -> DomainError {
    match err {
        DomainError::FilterFetch { reason, .. } => DomainError::FilterFetch {
            filter: name.to_string(),
            reason,
        },
        DomainError::FilterTooLarge { max_size, .. } => DomainError::FilterTooLarge {
            filter: name.to_string(),
            max_size,
        },
        DomainError::QueryTimeout => DomainError::FilterFetch {
            filter: name.to_string(),
            reason: "timed out".to_string(),
        },
        other => other,
    }
}

#[async_trait]
impl FilterEnginePort for RuleListEngine {
    #[inline]
    fn filter_request(&self, request: &FilterRequest) -> Option<MatchResult> {
        let host = normalize_hostname(&request.hostname);
        self.rules.load().lookup(&host, request)
    }

    async fn refresh(
        &self,
        deadline: Duration,
        buf: &mut Vec<u8>,
        fetcher: &dyn SourceFetcher,
        cache_dir: &Path,
        max_size: u64,
    ) -> Result<(), DomainError> {
        if self.is_closed() {
            return Err(DomainError::EngineClosed(self.name.to_string()));
        }
        let _guard = self.refresh_lock.lock().await;
        if self.is_closed() {
            return Err(DomainError::EngineClosed(self.name.to_string()));
        }

        info!(engine = %self.name, filters = self.filters.len(), "Filter refresh started");
        let started = Instant::now();

        let compiled = match tokio::time::timeout(
            deadline,
            self.compile_all(started, deadline, buf, fetcher, cache_dir, max_size),
        )
        .await
        {
            Ok(Ok(compiled)) => compiled,
            Ok(Err(e)) => {
                error!(engine = %self.name, error = %e, "Filter refresh failed");
                return Err(e);
            }
            Err(_) => {
                error!(engine = %self.name, ?deadline, "Filter refresh exceeded its deadline");
                return Err(DomainError::RefreshDeadline);
            }
        };

        let rules = compiled.rules_count();
        self.rules.store(Arc::new(compiled));

        // close() may have run while we were compiling.
        if self.is_closed() {
            self.rules.store(Arc::new(CompiledRules::empty()));
            return Err(DomainError::EngineClosed(self.name.to_string()));
        }

        info!(
            engine = %self.name,
            rules,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Filter refresh completed"
        );
        Ok(())
    }

    fn rules_count(&self) -> usize {
        self.rules.load().rules_count()
    }

    fn source_stats(&self) -> Vec<SourceStats> {
        self.rules.load().stats().to_vec()
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.rules.store(Arc::new(CompiledRules::empty()));
        info!(engine = %self.name, "Rule list engine closed");
    }
}
