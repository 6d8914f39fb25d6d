//! Ipset post-processing: pushes addresses from upstream answers into OS
//! address sets keyed by domain.

pub mod backend;
#[cfg(target_os = "linux")]
pub mod command;
pub mod handler;
pub mod manager;

pub use backend::{SetBackend, SetFamily};
#[cfg(target_os = "linux")]
pub use command::IpsetCommand;
pub use handler::IpsetHandler;
pub use manager::SetManager;

use dnsieve_application::ports::IpsetManager;
use dnsieve_domain::{DomainError, IpsetMapping};
use std::sync::Arc;

/// Build the platform's ipset manager from configuration lines.
///
/// An empty list yields `Ok(None)`. Platforms without ipset return
/// `DomainError::Unsupported`.
pub async fn new_manager<S: AsRef<str>>(
    lines: &[S],
) -> Result<Option<Arc<dyn IpsetManager>>, DomainError> {
    if lines.is_empty() {
        return Ok(None);
    }
    let mappings = IpsetMapping::parse_list(lines)?;
    platform_manager(mappings).await.map(Some)
}

#[cfg(target_os = "linux")]
async fn platform_manager(
    mappings: Vec<IpsetMapping>,
) -> Result<Arc<dyn IpsetManager>, DomainError> {
    let manager = SetManager::new(IpsetCommand::new(), mappings).await?;
    Ok(Arc::new(manager))
}

#[cfg(not(target_os = "linux"))]
async fn platform_manager(
    _mappings: Vec<IpsetMapping>,
) -> Result<Arc<dyn IpsetManager>, DomainError> {
    Err(DomainError::Unsupported("ipset"))
}
