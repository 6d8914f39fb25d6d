use async_trait::async_trait;
use dnsieve_application::ports::SourceFetcher;
use dnsieve_domain::DomainError;
use std::time::Duration;
use tracing::debug;

/// Downloads rule lists over HTTP(S).
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dnsieve/", env!("CARGO_PKG_VERSION"), " (filter-refresh)"))
            .build()
            .map_err(|e| DomainError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        timeout: Duration,
        max_size: u64,
        buf: &mut Vec<u8>,
    ) -> Result<(), DomainError> {
        buf.clear();

        let fetch_err = |reason: String| DomainError::FilterFetch {
            filter: url.to_string(),
            reason,
        };
        let too_large = || DomainError::FilterTooLarge {
            filter: url.to_string(),
            max_size,
        };

        let mut response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(format!("HTTP {}", status.as_u16())));
        }

        if response.content_length().is_some_and(|len| len > max_size) {
            return Err(too_large());
        }

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| fetch_err(e.to_string()))?
        {
            if (buf.len() + chunk.len()) as u64 > max_size {
                return Err(too_large());
            }
            buf.extend_from_slice(&chunk);
        }

        debug!(url, bytes = buf.len(), "Fetched filter source");
        Ok(())
    }
}
