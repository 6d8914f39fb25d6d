use super::blocking::blocked_response;
use crate::pipeline::{DnsContext, ResultCode, Stage};
use crate::ports::FilterEnginePort;
use async_trait::async_trait;
use dnsieve_domain::config::BlockingMode;
use dnsieve_domain::{normalize_hostname, FilterAction, FilterRequest, RecordData, RecordType};
use std::sync::Arc;
use tracing::debug;

/// Post-resolution filtering of CNAME targets and addresses in upstream
/// answers.
pub struct AnswerFilterStage {
    engine: Arc<dyn FilterEnginePort>,
    mode: BlockingMode,
}

impl AnswerFilterStage {
    pub fn new(engine: Arc<dyn FilterEnginePort>, mode: BlockingMode) -> Self {
        Self { engine, mode }
    }

    fn answer_requests(ctx: &DnsContext) -> Vec<FilterRequest> {
        let Some(response) = ctx.response.as_ref() else {
            return Vec::new();
        };

        response
            .answers
            .iter()
            .filter_map(|record| match &record.data {
                RecordData::Cname(target) => Some(FilterRequest::answer(
                    normalize_hostname(target),
                    RecordType::CNAME,
                )),
                RecordData::A(ip) => Some(FilterRequest::answer(ip.to_string(), RecordType::A)),
                RecordData::Aaaa(ip) => {
                    Some(FilterRequest::answer(ip.to_string(), RecordType::AAAA))
                }
                RecordData::Other(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl Stage for AnswerFilterStage {
    fn name(&self) -> &'static str {
        "answer_filter"
    }

    async fn process(&self, ctx: &mut DnsContext) -> ResultCode {
        if !ctx.response_from_upstream {
            return ResultCode::Success;
        }
        // An explicit allow on the question covers its whole answer.
        if ctx
            .filter_result
            .as_ref()
            .is_some_and(|m| m.action == FilterAction::Allow)
        {
            return ResultCode::Success;
        }

        for request in Self::answer_requests(ctx) {
            let Some(matched) = self.engine.filter_request(&request) else {
                continue;
            };
            if matched.action != FilterAction::Block {
                continue;
            }

            debug!(
                answer = %request.hostname,
                rule = %matched.rule,
                filter = %matched.filter_id,
                "Answer matched a blocking rule"
            );

            if let Some(question) = ctx.question.as_ref() {
                ctx.response = Some(blocked_response(question, self.mode));
            }
            ctx.filter_result = Some(matched);
            return ResultCode::Finish;
        }

        ResultCode::Success
    }
}
