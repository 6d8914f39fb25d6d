use super::RecordType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterId(pub u64);

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a filter's rule text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSource {
    File(PathBuf),
    Url(Arc<str>),
}

impl fmt::Display for FilterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSource::File(path) => write!(f, "{}", path.display()),
            FilterSource::Url(url) => f.write_str(url),
        }
    }
}

/// One named rule source. Immutable once built.
#[derive(Debug, Clone)]
pub struct Filter {
    pub id: FilterId,
    pub name: Arc<str>,
    pub source: FilterSource,
    pub enabled: bool,
}

impl Filter {
    pub fn new(id: FilterId, name: impl Into<Arc<str>>, source: FilterSource) -> Self {
        Self {
            id,
            name: name.into(),
            source,
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn validate_name(name: &str) -> Result<(), String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err("Filter name cannot be empty".to_string());
        }
        if trimmed.len() > 200 {
            return Err("Filter name cannot exceed 200 characters".to_string());
        }
        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<(), String> {
        if url.starts_with("http://") || url.starts_with("https://") {
            Ok(())
        } else {
            Err(format!("Filter URL must be http(s): {}", url))
        }
    }
}

/// One lookup against the compiled rules.
///
/// `answer` is set when the hostname comes from an upstream answer (a CNAME
/// target or an address) rather than from the client's question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRequest {
    pub hostname: Arc<str>,
    pub record_type: RecordType,
    pub answer: bool,
}

impl FilterRequest {
    pub fn question(hostname: impl Into<Arc<str>>, record_type: RecordType) -> Self {
        Self {
            hostname: hostname.into(),
            record_type,
            answer: false,
        }
    }

    pub fn answer(hostname: impl Into<Arc<str>>, record_type: RecordType) -> Self {
        Self {
            hostname: hostname.into(),
            record_type,
            answer: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAction {
    Block,
    Allow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub action: FilterAction,
    /// The rule text as written in the source.
    pub rule: Arc<str>,
    pub filter_id: FilterId,
}

impl MatchResult {
    pub fn is_blocked(&self) -> bool {
        self.action == FilterAction::Block
    }
}

/// Metadata kept for every compiled source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStats {
    pub filter_id: FilterId,
    pub name: Arc<str>,
    pub rules_count: usize,
    pub invalid_lines: usize,
    pub size: u64,
    /// Hex SHA-256 of the raw source bytes.
    pub checksum: String,
    pub updated_at: DateTime<Utc>,
}
