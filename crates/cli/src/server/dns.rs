use dnsieve_application::{RequestPipeline, ResultCode};
use dnsieve_domain::{DnsResponse, ResponseCode};
use dnsieve_infrastructure::dns::forwarding::{decode_request, encode_reply, encode_servfail};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const MAX_UDP_REQUEST_SIZE: usize = 4096;
const TCP_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Serve DNS over UDP and TCP on `bind_addr` until `shutdown` fires.
pub async fn start_dns_server(
    bind_addr: SocketAddr,
    pipeline: Arc<RequestPipeline>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    info!(bind_address = %bind_addr, "Starting DNS server");

    let udp_socket = Arc::new(UdpSocket::bind(bind_addr).await?);
    info!(protocol = "UDP", "DNS server listening");

    let tcp_listener = TcpListener::bind(bind_addr).await?;
    info!(protocol = "TCP", "DNS server listening");

    info!("DNS server ready to accept queries");

    tokio::select! {
        _ = shutdown.cancelled() => {
            info!("DNS server shutting down");
            Ok(())
        }
        res = serve_udp(udp_socket, Arc::clone(&pipeline)) => res,
        res = serve_tcp(tcp_listener, pipeline) => res,
    }
}

async fn serve_udp(socket: Arc<UdpSocket>, pipeline: Arc<RequestPipeline>) -> anyhow::Result<()> {
    let mut buf = vec![0u8; MAX_UDP_REQUEST_SIZE];
    loop {
        let (len, src) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                warn!(error = %e, "UDP receive failed");
                continue;
            }
        };

        let request = buf[..len].to_vec();
        let socket = Arc::clone(&socket);
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            if let Some(reply) = handle_query(&pipeline, src.ip(), &request).await {
                if let Err(e) = socket.send_to(&reply, src).await {
                    debug!(client = %src, error = %e, "UDP reply failed");
                }
            }
        });
    }
}

async fn serve_tcp(listener: TcpListener, pipeline: Arc<RequestPipeline>) -> anyhow::Result<()> {
    loop {
        let (stream, src) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "TCP accept failed");
                continue;
            }
        };

        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            if let Err(e) = serve_tcp_conn(stream, src, &pipeline).await {
                debug!(client = %src, error = %e, "TCP connection closed");
            }
        });
    }
}

async fn serve_tcp_conn(
    mut stream: TcpStream,
    src: SocketAddr,
    pipeline: &RequestPipeline,
) -> std::io::Result<()> {
    loop {
        let len = match tokio::time::timeout(TCP_IDLE_TIMEOUT, stream.read_u16()).await {
            Ok(Ok(len)) => len as usize,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Ok(Err(e)) => return Err(e),
            Err(_) => return Ok(()),
        };

        let mut request = vec![0u8; len];
        stream.read_exact(&mut request).await?;

        let Some(reply) = handle_query(pipeline, src.ip(), &request).await else {
            return Ok(());
        };
        let Ok(reply_len) = u16::try_from(reply.len()) else {
            warn!(client = %src, size = reply.len(), "Reply too large for TCP framing");
            return Ok(());
        };
        stream.write_u16(reply_len).await?;
        stream.write_all(&reply).await?;
    }
}

/// Run one wire-format request through the pipeline and encode the answer.
///
/// `None` means the request could not be decoded at all and gets no reply.
pub async fn handle_query(
    pipeline: &RequestPipeline,
    client: IpAddr,
    request: &[u8],
) -> Option<Vec<u8>> {
    let decoded = match decode_request(request) {
        Ok(decoded) => decoded,
        Err(e) => {
            debug!(client = %client, error = %e, "Dropping malformed request");
            return None;
        }
    };

    let Some(query) = decoded.query else {
        let formerr = DnsResponse::new(ResponseCode::FormErr, Vec::new());
        return encode_reply(&decoded.message, &formerr).ok();
    };

    let ctx = pipeline.handle(client, query).await;

    debug!(
        client = %client,
        client_name = ctx.client_name.as_deref().unwrap_or("-"),
        domain = ctx.question.as_ref().map(|q| q.domain.as_ref()).unwrap_or("-"),
        result = ?ctx.result,
        blocked = ctx.is_blocked(),
        upstream = ctx.upstream.as_deref().unwrap_or("-"),
        elapsed_us = ctx.elapsed().as_micros() as u64,
        "Query processed"
    );

    let encoded = match (ctx.result, ctx.response.as_ref()) {
        (ResultCode::Error, _) | (_, None) => encode_servfail(&decoded.message),
        (_, Some(response)) => encode_reply(&decoded.message, response),
    };

    match encoded {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!(client = %client, error = %e, "Encoding reply failed");
            encode_servfail(&decoded.message).ok()
        }
    }
}
