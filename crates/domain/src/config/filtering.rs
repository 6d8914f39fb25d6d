use serde::{Deserialize, Serialize};

/// How blocked questions are answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingMode {
    /// A → 0.0.0.0, AAAA → ::, anything else an empty NOERROR answer.
    #[default]
    NullIp,
    /// NXDOMAIN for every blocked question.
    NxDomain,
}

/// One configured rule list. Exactly one of `path` / `url` must be set.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterEntry {
    pub id: u64,

    pub name: String,

    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Rule list filtering configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilteringConfig {
    /// Enable filtering (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub blocking_mode: BlockingMode,

    /// Seconds between scheduled refreshes (default: 86400)
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Upper bound for one whole refresh (default: 60)
    #[serde(default = "default_refresh_deadline")]
    pub refresh_deadline_secs: u64,

    /// Maximum size of a single rule list in bytes (default: 64 MiB)
    #[serde(default = "default_max_rule_list_size")]
    pub max_rule_list_size: u64,

    /// Where downloaded lists are cached
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    #[serde(default)]
    pub filters: Vec<FilterEntry>,
}

fn default_true() -> bool {
    true
}

fn default_refresh_interval() -> u64 {
    86400
}

fn default_refresh_deadline() -> u64 {
    60
}

fn default_max_rule_list_size() -> u64 {
    64 * 1024 * 1024
}

fn default_cache_dir() -> String {
    "data/filters".to_string()
}

impl Default for FilteringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            blocking_mode: BlockingMode::default(),
            refresh_interval_secs: default_refresh_interval(),
            refresh_deadline_secs: default_refresh_deadline(),
            max_rule_list_size: default_max_rule_list_size(),
            cache_dir: default_cache_dir(),
            filters: vec![],
        }
    }
}

impl FilterEntry {
    /// Turn the configured entry into the filter the engine consumes.
    pub fn to_filter(&self) -> Result<crate::Filter, super::ConfigError> {
        use crate::{Filter, FilterId, FilterSource};
        use std::sync::Arc;

        Filter::validate_name(&self.name).map_err(super::ConfigError::Validation)?;

        let source = match (&self.path, &self.url) {
            (Some(path), None) => FilterSource::File(path.into()),
            (None, Some(url)) => {
                Filter::validate_url(url).map_err(super::ConfigError::Validation)?;
                FilterSource::Url(Arc::from(url.as_str()))
            }
            _ => {
                return Err(super::ConfigError::Validation(format!(
                    "filter {} must set exactly one of `path` or `url`",
                    self.id
                )))
            }
        };

        let filter = Filter::new(FilterId(self.id), self.name.as_str(), source);
        Ok(if self.enabled { filter } else { filter.disabled() })
    }
}
