use crate::pipeline::{DnsContext, ResultCode, Stage};
use crate::ports::Upstream;
use async_trait::async_trait;
use dnsieve_domain::DnsResponse;
use std::sync::Arc;
use tracing::{debug, warn};

/// Forwards the question to the configured upstreams, in order, until one
/// answers.
pub struct UpstreamStage {
    upstreams: Vec<Arc<dyn Upstream>>,
}

impl UpstreamStage {
    pub fn new(upstreams: Vec<Arc<dyn Upstream>>) -> Self {
        Self { upstreams }
    }
}

#[async_trait]
impl Stage for UpstreamStage {
    fn name(&self) -> &'static str {
        "upstream"
    }

    async fn process(&self, ctx: &mut DnsContext) -> ResultCode {
        let Some(question) = ctx.question.clone() else {
            return ResultCode::Error;
        };

        for upstream in &self.upstreams {
            match upstream.exchange(&question).await {
                Ok(response) => {
                    debug!(
                        domain = %question.domain,
                        upstream = upstream.address(),
                        rcode = response.rcode.as_str(),
                        answers = response.answers.len(),
                        "Upstream answered"
                    );
                    ctx.response = Some(response);
                    ctx.response_from_upstream = true;
                    ctx.upstream = Some(Arc::from(upstream.address()));
                    return ResultCode::Success;
                }
                Err(e) => {
                    warn!(
                        domain = %question.domain,
                        upstream = upstream.address(),
                        error = %e,
                        "Upstream exchange failed"
                    );
                }
            }
        }

        ctx.response = Some(DnsResponse::servfail());
        ctx.response_from_upstream = false;
        ResultCode::Error
    }
}
