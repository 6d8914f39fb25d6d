//! Configuration module for dnsieve
//!
//! - `root`: Main configuration and CLI overrides
//! - `server`: DNS listener binding
//! - `upstream`: Upstream servers and bootstrap resolution
//! - `filtering`: Rule lists and refresh limits
//! - `ipset`: Domain to ipset mappings
//! - `logging`: Logging settings
//! - `errors`: Configuration errors

pub mod errors;
pub mod filtering;
pub mod ipset;
pub mod logging;
pub mod root;
pub mod server;
pub mod upstream;

pub use errors::ConfigError;
pub use filtering::{BlockingMode, FilterEntry, FilteringConfig};
pub use ipset::IpsetConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
pub use upstream::UpstreamConfig;
