use super::stages::{AnswerFilterStage, ClientInfoStage, QuestionFilterStage, UpstreamStage};
use super::{DnsContext, ResultCode, Stage};
use crate::ports::{DhcpReader, FilterEnginePort, Upstream};
use dnsieve_domain::config::BlockingMode;
use dnsieve_domain::{DnsQuery, DnsResponse};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info};

/// Runs every request through the stages in their fixed order.
pub struct RequestPipeline {
    stages: Vec<Arc<dyn Stage>>,
}

impl RequestPipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Process one question from `client_ip` and return the finished context.
    pub async fn handle(&self, client_ip: IpAddr, query: DnsQuery) -> DnsContext {
        let mut ctx = DnsContext::new(client_ip, query);
        self.run(&mut ctx).await;
        ctx
    }

    /// Run the stages on an existing context. Stops at the first stage that
    /// does not return `Success`.
    pub async fn run(&self, ctx: &mut DnsContext) -> ResultCode {
        for stage in &self.stages {
            let rc = stage.process(ctx).await;
            ctx.result = rc;
            if !rc.is_success() {
                debug!(stage = stage.name(), result = ?rc, "Pipeline stopped early");
                break;
            }
        }

        if ctx.result == ResultCode::Error && ctx.response.is_none() {
            ctx.response = Some(DnsResponse::servfail());
        }

        ctx.result
    }
}

/// Assembles a [`RequestPipeline`]. Stage order is fixed regardless of the
/// order the builder methods are called in.
pub struct PipelineBuilder {
    dhcp: Option<Arc<dyn DhcpReader>>,
    engine: Option<Arc<dyn FilterEnginePort>>,
    blocking_mode: BlockingMode,
    upstreams: Vec<Arc<dyn Upstream>>,
    post_processors: Vec<Arc<dyn Stage>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            dhcp: None,
            engine: None,
            blocking_mode: BlockingMode::default(),
            upstreams: Vec::new(),
            post_processors: Vec::new(),
        }
    }

    pub fn with_dhcp(mut self, dhcp: Arc<dyn DhcpReader>) -> Self {
        self.dhcp = Some(dhcp);
        self
    }

    pub fn with_filtering(mut self, engine: Arc<dyn FilterEnginePort>, mode: BlockingMode) -> Self {
        self.engine = Some(engine);
        self.blocking_mode = mode;
        self
    }

    pub fn with_upstream(mut self, upstream: Arc<dyn Upstream>) -> Self {
        self.upstreams.push(upstream);
        self
    }

    pub fn with_post_processor(mut self, stage: Arc<dyn Stage>) -> Self {
        self.post_processors.push(stage);
        self
    }

    pub fn build(self) -> RequestPipeline {
        let mut stages: Vec<Arc<dyn Stage>> = Vec::new();

        if let Some(dhcp) = self.dhcp {
            stages.push(Arc::new(ClientInfoStage::new(dhcp)));
        }
        if let Some(engine) = self.engine.as_ref() {
            stages.push(Arc::new(QuestionFilterStage::new(
                Arc::clone(engine),
                self.blocking_mode,
            )));
        }
        stages.push(Arc::new(UpstreamStage::new(self.upstreams)));
        if let Some(engine) = self.engine {
            stages.push(Arc::new(AnswerFilterStage::new(engine, self.blocking_mode)));
        }
        stages.extend(self.post_processors);

        let pipeline = RequestPipeline { stages };
        info!(stages = ?pipeline.stage_names(), "Request pipeline built");
        pipeline
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
