use super::new_manager;
use async_trait::async_trait;
use dnsieve_application::ports::IpsetManager;
use dnsieve_application::{DnsContext, ResultCode, Stage};
use dnsieve_domain::{normalize_hostname, DomainError, RecordType};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Pipeline stage that adds resolved addresses to the configured ipsets.
///
/// Failures here never affect the client's answer: they are logged and the
/// stage reports `Success`.
pub struct IpsetHandler {
    manager: Option<Arc<dyn IpsetManager>>,
    closed: AtomicBool,
}

impl IpsetHandler {
    /// Build the handler from `DOMAIN[,DOMAIN...]/IPSET[,IPSET...]` lines.
    ///
    /// When the OS facility is unavailable or not permitted the handler is
    /// created without a manager; other errors are returned.
    pub async fn new<S: AsRef<str>>(lines: &[S]) -> Result<Self, DomainError> {
        match new_manager(lines).await {
            Ok(manager) => Ok(Self::with_manager(manager)),
            Err(e) if e.is_unsupported() => {
                warn!(error = %e, "Cannot initialize ipset, continuing without it");
                Ok(Self::with_manager(None))
            }
            Err(e) => Err(e),
        }
    }

    pub fn with_manager(manager: Option<Arc<dyn IpsetManager>>) -> Self {
        Self {
            manager,
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.manager.is_some()
    }

    /// Close the manager. Only the first call reaches it.
    pub async fn close(&self) -> Result<(), DomainError> {
        let Some(manager) = self.manager.as_ref() else {
            return Ok(());
        };
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        manager.close().await
    }

    /// The manager when `ctx` is a complete upstream A/AAAA/ANY exchange.
    fn applicable(&self, ctx: &DnsContext) -> Option<&Arc<dyn IpsetManager>> {
        let manager = self.manager.as_ref()?;
        if !ctx.response_from_upstream || ctx.response.is_none() {
            return None;
        }
        let question = ctx.question.as_ref()?;
        matches!(
            question.record_type,
            RecordType::A | RecordType::AAAA | RecordType::ANY
        )
        .then_some(manager)
    }
}

#[async_trait]
impl Stage for IpsetHandler {
    fn name(&self) -> &'static str {
        "ipset"
    }

    async fn process(&self, ctx: &mut DnsContext) -> ResultCode {
        let Some(manager) = self.applicable(ctx) else {
            return ResultCode::Success;
        };
        let (Some(question), Some(response)) = (ctx.question.as_ref(), ctx.response.as_ref())
        else {
            return ResultCode::Success;
        };

        let host = normalize_hostname(&question.domain);
        let (ip4s, ip6s) = response.ips_by_family();

        match manager.add(&host, &ip4s, &ip6s).await {
            Ok(n) => debug!(host = %host, added = n, "Added new ipset entries"),
            Err(e) => error!(host = %host, error = %e, "Adding host ips to ipset failed"),
        }

        ResultCode::Success
    }
}
