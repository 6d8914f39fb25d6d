use async_trait::async_trait;
use dnsieve_domain::DomainError;
use std::time::Duration;

/// Retrieves remote rule list content.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Download `url` into `buf` (cleared first), failing with
    /// `DomainError::FilterTooLarge` once more than `max_size` bytes arrive.
    async fn fetch(
        &self,
        url: &str,
        timeout: Duration,
        max_size: u64,
        buf: &mut Vec<u8>,
    ) -> Result<(), DomainError>;
}
