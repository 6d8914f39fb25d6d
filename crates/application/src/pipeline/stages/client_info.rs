use crate::pipeline::{DnsContext, ResultCode, Stage};
use crate::ports::DhcpReader;
use async_trait::async_trait;
use std::sync::Arc;

/// Puts the DHCP hostname of the client on the context. Never fails.
pub struct ClientInfoStage {
    dhcp: Arc<dyn DhcpReader>,
}

impl ClientInfoStage {
    pub fn new(dhcp: Arc<dyn DhcpReader>) -> Self {
        Self { dhcp }
    }
}

#[async_trait]
impl Stage for ClientInfoStage {
    fn name(&self) -> &'static str {
        "client_info"
    }

    async fn process(&self, ctx: &mut DnsContext) -> ResultCode {
        if self.dhcp.enabled() {
            ctx.client_name = self.dhcp.host_by_ip(ctx.client_ip);
        }
        ResultCode::Success
    }
}
