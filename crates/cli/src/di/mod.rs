//! Wires configuration into the concrete services the server runs with.

use anyhow::Context;
use dnsieve_application::ports::{BootstrapResolver, EmptyDhcp, FilterEnginePort, Upstream};
use dnsieve_application::RequestPipeline;
use dnsieve_domain::Config;
use dnsieve_infrastructure::dns::bootstrap::{
    resolve_dial, Dialer, ForwardingResolver, NetDialer, SystemResolver, UpstreamUrl,
};
use dnsieve_infrastructure::dns::forwarding::PlainUpstream;
use dnsieve_infrastructure::filtering::{HttpFetcher, RuleListEngine};
use dnsieve_infrastructure::ipset::IpsetHandler;
use dnsieve_jobs::FilterRefreshJob;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct DnsServices {
    pub pipeline: Arc<RequestPipeline>,
    pub engine: Option<Arc<RuleListEngine>>,
    pub ipset: Arc<IpsetHandler>,
}

impl DnsServices {
    pub async fn build(config: &Config) -> anyhow::Result<Self> {
        let timeout = Duration::from_millis(config.upstream.timeout_ms);
        let dialer: Arc<dyn Dialer> = Arc::new(NetDialer);

        let resolver = bootstrap_resolver(config, timeout, Arc::clone(&dialer)).await?;

        let mut builder = RequestPipeline::builder().with_dhcp(Arc::new(EmptyDhcp));

        for server in &config.upstream.servers {
            let upstream = plain_upstream(
                server,
                timeout,
                Some(Arc::clone(&resolver)),
                config.upstream.prefer_ipv6,
                Arc::clone(&dialer),
            )
            .await
            .with_context(|| format!("upstream {}", server))?;
            info!(upstream = upstream.address(), "Upstream configured");
            builder = builder.with_upstream(upstream);
        }

        let engine = if config.filtering.enabled {
            let engine = Arc::new(RuleListEngine::new("main", config.filters()?));
            builder = builder.with_filtering(
                Arc::clone(&engine) as Arc<dyn FilterEnginePort>,
                config.filtering.blocking_mode,
            );
            Some(engine)
        } else {
            info!("Filtering disabled");
            None
        };

        let ipset = Arc::new(
            IpsetHandler::new(&config.ipset.list)
                .await
                .context("ipset initialization")?,
        );
        if ipset.is_enabled() {
            builder = builder.with_post_processor(Arc::clone(&ipset) as _);
        }

        Ok(Self {
            pipeline: Arc::new(builder.build()),
            engine,
            ipset,
        })
    }

    /// The refresh job for the rule list engine, if filtering is on.
    pub fn filter_refresh_job(
        &self,
        config: &Config,
        shutdown: CancellationToken,
    ) -> anyhow::Result<Option<FilterRefreshJob>> {
        let Some(engine) = self.engine.as_ref() else {
            return Ok(None);
        };
        let fetcher = HttpFetcher::new()?;

        Ok(Some(
            FilterRefreshJob::new(
                Arc::clone(engine) as Arc<dyn FilterEnginePort>,
                Arc::new(fetcher),
                config.filtering.cache_dir.as_str(),
            )
            .with_interval(config.filtering.refresh_interval_secs)
            .with_deadline(Duration::from_secs(config.filtering.refresh_deadline_secs))
            .with_max_size(config.filtering.max_rule_list_size)
            .with_cancellation(shutdown),
        ))
    }

    pub async fn shutdown(&self) {
        if let Some(engine) = self.engine.as_ref() {
            engine.close();
        }
        if let Err(e) = self.ipset.close().await {
            warn!(error = %e, "Closing ipset manager failed");
        }
    }
}

async fn plain_upstream(
    server: &str,
    timeout: Duration,
    resolver: Option<Arc<dyn BootstrapResolver>>,
    prefer_ipv6: bool,
    dialer: Arc<dyn Dialer>,
) -> anyhow::Result<Arc<dyn Upstream>> {
    let url = UpstreamUrl::parse(server)?;
    let handler = resolve_dial(server, timeout, resolver, prefer_ipv6, dialer).await?;
    Ok(Arc::new(PlainUpstream::new(&url, handler, timeout)?))
}

/// The OS resolver, or the configured plain-IP bootstrap servers.
async fn bootstrap_resolver(
    config: &Config,
    timeout: Duration,
    dialer: Arc<dyn Dialer>,
) -> anyhow::Result<Arc<dyn BootstrapResolver>> {
    if config.upstream.bootstrap.is_empty() {
        info!("Using the system resolver for upstream hostnames");
        return Ok(Arc::new(SystemResolver));
    }

    let mut servers = Vec::with_capacity(config.upstream.bootstrap.len());
    for addr in &config.upstream.bootstrap {
        let ip: IpAddr = addr
            .parse()
            .with_context(|| format!("bootstrap server {}", addr))?;
        // IP literals never reach the resolver.
        let upstream = plain_upstream(
            &SocketAddr::new(ip, 53).to_string(),
            timeout,
            Some(Arc::new(SystemResolver)),
            config.upstream.prefer_ipv6,
            Arc::clone(&dialer),
        )
        .await
        .with_context(|| format!("bootstrap server {}", addr))?;
        servers.push(upstream);
    }

    info!(servers = servers.len(), "Using bootstrap servers for upstream hostnames");
    Ok(Arc::new(ForwardingResolver::new(servers)))
}
