use crate::FilterRefreshJob;
use std::sync::Arc;
use tracing::info;

/// Central orchestrator for all background jobs.
///
/// Use the builder pattern to register jobs, then call `.start()` once.
///
/// # Example
///
/// ```rust,ignore
/// JobRunner::new()
///     .with_filter_refresh(FilterRefreshJob::new(engine, fetcher, "data/filters"))
///     .start()
///     .await;
/// ```
pub struct JobRunner {
    filter_refresh: Option<FilterRefreshJob>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self {
            filter_refresh: None,
        }
    }

    pub fn with_filter_refresh(mut self, job: FilterRefreshJob) -> Self {
        self.filter_refresh = Some(job);
        self
    }

    /// Start all registered background jobs.
    pub async fn start(self) {
        info!("Starting background job runner");

        if let Some(job) = self.filter_refresh {
            Arc::new(job).start().await;
        }

        info!("All background jobs started");
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}
