use super::{DnsContext, ResultCode};
use async_trait::async_trait;

/// One step of request processing.
///
/// Stages own their failure handling: a best-effort stage logs its errors and
/// returns `Success`, a stage that cannot produce an answer returns `Error`.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn process(&self, ctx: &mut DnsContext) -> ResultCode;
}
