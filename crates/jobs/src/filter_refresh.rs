use dnsieve_application::ports::{FilterEnginePort, SourceFetcher};
use dnsieve_domain::DomainError;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Periodically refreshes the rule list engine from its sources.
pub struct FilterRefreshJob {
    engine: Arc<dyn FilterEnginePort>,
    fetcher: Arc<dyn SourceFetcher>,
    cache_dir: PathBuf,
    interval_secs: u64,
    deadline: Duration,
    max_size: u64,
    refresh_on_start: bool,
    shutdown: CancellationToken,
}

impl FilterRefreshJob {
    pub fn new(
        engine: Arc<dyn FilterEnginePort>,
        fetcher: Arc<dyn SourceFetcher>,
        cache_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            engine,
            fetcher,
            cache_dir: cache_dir.into(),
            interval_secs: 86400,
            deadline: Duration::from_secs(60),
            max_size: 64 * 1024 * 1024,
            refresh_on_start: true,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_interval(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs.max(1);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Skip the refresh that otherwise runs as soon as the job starts.
    pub fn without_initial_refresh(mut self) -> Self {
        self.refresh_on_start = false;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Run one refresh with a caller-owned scratch buffer.
    pub async fn refresh_once(&self, buf: &mut Vec<u8>) -> Result<(), DomainError> {
        self.engine
            .refresh(
                self.deadline,
                buf,
                self.fetcher.as_ref(),
                &self.cache_dir,
                self.max_size,
            )
            .await
    }

    pub async fn start(self: Arc<Self>) {
        info!(
            interval_secs = self.interval_secs,
            deadline_secs = self.deadline.as_secs(),
            "Starting filter refresh job"
        );

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
            if !self.refresh_on_start {
                interval.tick().await;
            }
            let mut buf = Vec::new();

            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("FilterRefreshJob: shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        info!("FilterRefreshJob: refreshing filter sources");
                        match self.refresh_once(&mut buf).await {
                            Ok(()) => info!(
                                rules = self.engine.rules_count(),
                                "FilterRefreshJob: refresh completed successfully"
                            ),
                            Err(e) => error!(error = %e, "FilterRefreshJob: refresh failed, keeping previous rules"),
                        }
                    }
                }
            }
        });
    }
}
