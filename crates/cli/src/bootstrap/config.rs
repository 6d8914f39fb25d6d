use dnsieve_domain::{CliOverrides, Config};
use tracing::info;

/// Load and validate the configuration. Runs before logging is set up.
pub fn load_config(
    config_path: Option<&str>,
    cli_overrides: CliOverrides,
) -> anyhow::Result<Config> {
    let config = Config::load(config_path, cli_overrides)?;
    config.validate()?;
    Ok(config)
}

pub fn log_summary(config: &Config, config_path: Option<&str>) {
    info!(
        config_file = config_path.unwrap_or("default"),
        dns_port = config.server.dns_port,
        bind = %config.server.bind_address,
        upstreams = config.upstream.servers.len(),
        filters = config.filtering.filters.len(),
        ipset_lines = config.ipset.list.len(),
        "Configuration loaded"
    );
}
