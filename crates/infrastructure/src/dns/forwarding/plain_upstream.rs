use super::message_builder::MessageBuilder;
use super::response_parser::{ParsedResponse, ResponseParser};
use crate::dns::bootstrap::{DialHandler, Network, UpstreamConn, UpstreamScheme, UpstreamUrl};
use async_trait::async_trait;
use bytes::Bytes;
use dnsieve_application::ports::Upstream;
use dnsieve_domain::{DnsQuery, DnsResponse, DomainError};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::debug;

/// Maximum UDP DNS response size with EDNS(0)
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

/// Unencrypted DNS upstream over UDP or TCP.
///
/// UDP upstreams retry over TCP when the answer comes back truncated.
pub struct PlainUpstream {
    address: String,
    scheme: UpstreamScheme,
    handler: DialHandler,
    timeout: Duration,
}

impl PlainUpstream {
    pub fn new(
        url: &UpstreamUrl,
        handler: DialHandler,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        match url.scheme {
            UpstreamScheme::Udp | UpstreamScheme::Tcp => Ok(Self {
                address: url.to_string(),
                scheme: url.scheme,
                handler,
                timeout,
            }),
            UpstreamScheme::Tls | UpstreamScheme::Https => Err(DomainError::InvalidUpstream(
                format!("{} (encrypted upstreams are not supported)", url),
            )),
        }
    }

    async fn exchange_udp(&self, id: u16, message: &[u8]) -> Result<ParsedResponse, DomainError> {
        let conn = self.handler.dial(Network::Udp, &self.address).await?;
        let UpstreamConn::Udp(socket) = conn else {
            return Err(DomainError::Transport("dialer returned a TCP stream for UDP".into()));
        };

        socket
            .send(message)
            .await
            .map_err(|e| DomainError::Transport(format!("send to {}: {}", self.address, e)))?;

        let mut buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        loop {
            let len = socket
                .recv(&mut buf)
                .await
                .map_err(|e| DomainError::Transport(format!("recv from {}: {}", self.address, e)))?;
            let parsed = ResponseParser::parse(&buf[..len])?;
            if parsed.id == id {
                return Ok(parsed);
            }
            debug!(upstream = %self.address, expected = id, got = parsed.id, "Ignoring mismatched response ID");
        }
    }

    async fn exchange_tcp(&self, id: u16, message: &[u8]) -> Result<ParsedResponse, DomainError> {
        let conn = self.handler.dial(Network::Tcp, &self.address).await?;
        let UpstreamConn::Tcp(mut stream) = conn else {
            return Err(DomainError::Transport("dialer returned a UDP socket for TCP".into()));
        };

        let io_err = |e: std::io::Error| DomainError::Transport(format!("tcp {}: {}", self.address, e));

        let len = u16::try_from(message.len())
            .map_err(|_| DomainError::Transport("query too large for TCP".into()))?;
        let mut framed = Vec::with_capacity(message.len() + 2);
        framed.extend_from_slice(&len.to_be_bytes());
        framed.extend_from_slice(message);
        stream.write_all(&framed).await.map_err(io_err)?;

        let mut len_buf = [0u8; 2];
        stream.read_exact(&mut len_buf).await.map_err(io_err)?;
        let mut body = vec![0u8; u16::from_be_bytes(len_buf) as usize];
        stream.read_exact(&mut body).await.map_err(io_err)?;

        let parsed = ResponseParser::parse_bytes(Bytes::from(body))?;
        if parsed.id != id {
            return Err(DomainError::InvalidDnsResponse(format!(
                "response ID {} does not match query ID {}",
                parsed.id, id
            )));
        }
        Ok(parsed)
    }

    async fn exchange_inner(&self, query: &DnsQuery) -> Result<DnsResponse, DomainError> {
        let (id, message) = MessageBuilder::build_query_with_id(&query.domain, &query.record_type)?;

        if self.scheme == UpstreamScheme::Udp {
            let parsed = self.exchange_udp(id, &message).await?;
            if !parsed.response.truncated {
                return Ok(parsed.response);
            }
            debug!(upstream = %self.address, domain = %query.domain, "Truncated UDP response, retrying over TCP");
        }

        Ok(self.exchange_tcp(id, &message).await?.response)
    }
}

#[async_trait]
impl Upstream for PlainUpstream {
    async fn exchange(&self, query: &DnsQuery) -> Result<DnsResponse, DomainError> {
        tokio::time::timeout(self.timeout, self.exchange_inner(query))
            .await
            .map_err(|_| DomainError::QueryTimeout)?
    }

    fn address(&self) -> &str {
        &self.address
    }
}
