use std::fmt;
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Invalid DNS response: {0}")]
    InvalidDnsResponse(String),

    #[error("Query timeout")]
    QueryTimeout,

    #[error("Transport error: {0}")]
    Transport(String),

    // ---- configuration / platform ------------------------------------------
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid ipset configuration at line {line}: {reason}")]
    InvalidIpsetConfig { line: usize, reason: String },

    #[error("Invalid upstream address {0:?}")]
    InvalidUpstream(String),

    // ---- rule lists ---------------------------------------------------------
    #[error("Failed to fetch filter {filter}: {reason}")]
    FilterFetch { filter: String, reason: String },

    #[error("Filter {filter} exceeds the maximum size of {max_size} bytes")]
    FilterTooLarge { filter: String, max_size: u64 },

    #[error("Failed to compile filter {filter}: {reason}")]
    FilterCompile { filter: String, reason: String },

    #[error("Filter refresh exceeded its deadline")]
    RefreshDeadline,

    #[error("Rule list engine {0} is closed")]
    EngineClosed(String),

    // ---- bootstrap / dialing -------------------------------------------------
    #[error("No bootstrap resolver configured")]
    NoResolver,

    #[error("Resolving hostname {host}: {source}")]
    Resolution {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("No addresses to dial")]
    NoAddresses,

    #[error("All candidates failed: {0}")]
    DialFailed(DialErrors),

    #[error("Dialing {host:?}: {source}")]
    Dial {
        host: String,
        #[source]
        source: Box<DomainError>,
    },

    // ---- side channels ---------------------------------------------------------
    #[error("ipset: {0}")]
    Ipset(String),
}

impl DomainError {
    /// Errors that mean "the OS side channel is unavailable here", which callers
    /// treat as a disabled feature rather than a startup failure.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            DomainError::Unsupported(_) | DomainError::PermissionDenied(_)
        )
    }

    /// Walks `Dial` annotations down to the aggregated per-candidate errors.
    pub fn dial_errors(&self) -> Option<&DialErrors> {
        match self {
            DomainError::DialFailed(errs) => Some(errs),
            DomainError::Dial { source, .. } => source.dial_errors(),
            _ => None,
        }
    }
}

/// Every per-candidate failure of one dial call, in the order they were tried.
#[derive(Debug, Default)]
pub struct DialErrors {
    failures: Vec<(SocketAddr, io::Error)>,
}

impl DialErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, addr: SocketAddr, err: io::Error) {
        self.failures.push((addr, err));
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(SocketAddr, io::Error)> {
        self.failures.iter()
    }

    pub fn addrs(&self) -> Vec<SocketAddr> {
        self.failures.iter().map(|(addr, _)| *addr).collect()
    }
}

impl fmt::Display for DialErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (addr, err)) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", addr, err)?;
        }
        Ok(())
    }
}
