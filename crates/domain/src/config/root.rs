use super::errors::ConfigError;
use super::{FilteringConfig, IpsetConfig, LoggingConfig, ServerConfig, UpstreamConfig};
use crate::{Filter, IpsetMapping};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::IpAddr;

/// Command line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub dns_port: Option<u16>,
    pub bind_address: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub filtering: FilteringConfig,

    #[serde(default)]
    pub ipset: IpsetConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load from `path` (TOML) or use defaults when no file is given, then
    /// apply CLI overrides.
    pub fn load(path: Option<&str>, overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_string(),
                    source,
                })?;
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };

        config.apply_overrides(overrides);
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn apply_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.dns_port {
            self.server.dns_port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.dns_port == 0 {
            return Err(ConfigError::Validation("server.dns_port cannot be 0".into()));
        }
        if self.server.bind_address.parse::<IpAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "server.bind_address is not an IP address: {}",
                self.server.bind_address
            )));
        }

        if self.upstream.servers.is_empty() {
            return Err(ConfigError::Validation(
                "at least one upstream server is required".into(),
            ));
        }
        if self.upstream.timeout_ms == 0 {
            return Err(ConfigError::Validation("upstream.timeout_ms cannot be 0".into()));
        }
        for addr in &self.upstream.bootstrap {
            if addr.parse::<IpAddr>().is_err() {
                return Err(ConfigError::Validation(format!(
                    "bootstrap resolver must be a plain IP address: {}",
                    addr
                )));
            }
        }

        if self.filtering.refresh_deadline_secs == 0 {
            return Err(ConfigError::Validation(
                "filtering.refresh_deadline_secs cannot be 0".into(),
            ));
        }
        let mut ids = HashSet::new();
        for entry in &self.filtering.filters {
            if !ids.insert(entry.id) {
                return Err(ConfigError::Validation(format!(
                    "duplicate filter id {}",
                    entry.id
                )));
            }
            entry.to_filter()?;
        }

        self.ipset_mappings()?;

        Ok(())
    }

    pub fn filters(&self) -> Result<Vec<Filter>, ConfigError> {
        self.filtering
            .filters
            .iter()
            .map(|entry| entry.to_filter())
            .collect()
    }

    pub fn ipset_mappings(&self) -> Result<Vec<IpsetMapping>, ConfigError> {
        IpsetMapping::parse_list(&self.ipset.list)
            .map_err(|e| ConfigError::Validation(e.to_string()))
    }
}
