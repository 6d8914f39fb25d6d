//! # dnsieve
//!
//! Filtering DNS forwarder: rule lists, ipset injection and bootstrap
//! resolution of upstream servers.

mod bootstrap;
mod di;
mod server;

use clap::Parser;
use dnsieve_domain::CliOverrides;
use dnsieve_jobs::JobRunner;
use std::net::{IpAddr, SocketAddr};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "dnsieve")]
#[command(version)]
#[command(about = "Filtering DNS forwarder with rule lists and ipset support")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<String>,

    /// DNS server port
    #[arg(short = 'd', long)]
    dns_port: Option<u16>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Log level or filter directive, e.g. `debug` or `dnsieve=trace`
    #[arg(short = 'l', long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        dns_port: cli.dns_port,
        bind_address: cli.bind,
        log_level: cli.log_level,
    };
    let config = bootstrap::load_config(cli.config.as_deref(), overrides)?;
    bootstrap::init_logging(&config);

    info!(version = env!("CARGO_PKG_VERSION"), "dnsieve starting");
    bootstrap::config::log_summary(&config, cli.config.as_deref());

    let shutdown = CancellationToken::new();
    let services = di::DnsServices::build(&config).await?;

    let mut runner = JobRunner::new();
    if let Some(job) = services.filter_refresh_job(&config, shutdown.clone())? {
        runner = runner.with_filter_refresh(job);
    }
    runner.start().await;

    let bind_ip: IpAddr = config.server.bind_address.parse()?;
    let bind_addr = SocketAddr::new(bind_ip, config.server.dns_port);
    let server = tokio::spawn(server::start_dns_server(
        bind_addr,
        services.pipeline.clone(),
        shutdown.clone(),
    ));

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                error!(error = %e, "Waiting for Ctrl+C failed");
            }
            info!("Shutdown requested");
        }
        res = server => {
            match res {
                Ok(Ok(())) => info!("DNS server stopped"),
                Ok(Err(e)) => error!(error = %e, "DNS server failed"),
                Err(e) => error!(error = %e, "DNS server task panicked"),
            }
        }
    }

    shutdown.cancel();
    services.shutdown().await;
    info!("dnsieve stopped");

    Ok(())
}
