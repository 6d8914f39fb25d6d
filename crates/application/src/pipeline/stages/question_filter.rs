use super::blocking::blocked_response;
use crate::pipeline::{DnsContext, ResultCode, Stage};
use crate::ports::FilterEnginePort;
use async_trait::async_trait;
use dnsieve_domain::config::BlockingMode;
use dnsieve_domain::{FilterAction, FilterRequest};
use std::sync::Arc;
use tracing::debug;

/// Pre-resolution filtering of the client's question.
pub struct QuestionFilterStage {
    engine: Arc<dyn FilterEnginePort>,
    mode: BlockingMode,
}

impl QuestionFilterStage {
    pub fn new(engine: Arc<dyn FilterEnginePort>, mode: BlockingMode) -> Self {
        Self { engine, mode }
    }
}

#[async_trait]
impl Stage for QuestionFilterStage {
    fn name(&self) -> &'static str {
        "question_filter"
    }

    async fn process(&self, ctx: &mut DnsContext) -> ResultCode {
        let Some(question) = ctx.question.as_ref() else {
            return ResultCode::Success;
        };

        let request = FilterRequest::question(question.normalized_domain(), question.record_type);
        let Some(matched) = self.engine.filter_request(&request) else {
            return ResultCode::Success;
        };

        debug!(
            domain = %request.hostname,
            record_type = %request.record_type,
            rule = %matched.rule,
            filter = %matched.filter_id,
            action = ?matched.action,
            "Question matched a rule"
        );

        match matched.action {
            FilterAction::Allow => {
                ctx.filter_result = Some(matched);
                ResultCode::Success
            }
            FilterAction::Block => {
                ctx.response = Some(blocked_response(question, self.mode));
                ctx.response_from_upstream = false;
                ctx.filter_result = Some(matched);
                ResultCode::Finish
            }
        }
    }
}
