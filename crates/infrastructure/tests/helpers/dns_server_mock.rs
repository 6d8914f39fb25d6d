#![allow(dead_code)]
use hickory_proto::op::{Message, MessageType};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{RData, Record};
use std::net::{Ipv4Addr, SocketAddr};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};
use tokio::task::JoinHandle;

/// Mock DNS server answering every question with one A record.
///
/// Listens on UDP and TCP on the same port. With `truncate_udp` the UDP
/// answer carries only the TC bit so clients must retry over TCP.
pub struct MockDnsServer {
    addr: SocketAddr,
    tasks: Vec<JoinHandle<()>>,
}

impl MockDnsServer {
    pub async fn start(answer: Ipv4Addr, truncate_udp: bool) -> std::io::Result<Self> {
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        let addr = socket.local_addr()?;
        let listener = TcpListener::bind(addr).await?;

        let udp = tokio::spawn(async move {
            let mut buf = vec![0u8; 512];
            while let Ok((len, peer)) = socket.recv_from(&mut buf).await {
                if let Some(response) = build_response(&buf[..len], answer, truncate_udp) {
                    let _ = socket.send_to(&response, peer).await;
                }
            }
        });

        let tcp = tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut len_buf = [0u8; 2];
                    if stream.read_exact(&mut len_buf).await.is_err() {
                        return;
                    }
                    let mut body = vec![0u8; u16::from_be_bytes(len_buf) as usize];
                    if stream.read_exact(&mut body).await.is_err() {
                        return;
                    }
                    if let Some(response) = build_response(&body, answer, false) {
                        let mut framed = (response.len() as u16).to_be_bytes().to_vec();
                        framed.extend_from_slice(&response);
                        let _ = stream.write_all(&framed).await;
                    }
                });
            }
        });

        Ok(Self {
            addr,
            tasks: vec![udp, tcp],
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

fn build_response(query: &[u8], answer: Ipv4Addr, truncated: bool) -> Option<Vec<u8>> {
    let request = Message::from_vec(query).ok()?;
    let question = request.queries().first()?.clone();

    let mut response = Message::new();
    response
        .set_id(request.id())
        .set_message_type(MessageType::Response)
        .set_recursion_desired(true)
        .set_recursion_available(true)
        .set_truncated(truncated)
        .add_query(question.clone());

    if !truncated {
        response.add_answer(Record::from_rdata(
            question.name().clone(),
            300,
            RData::A(A(answer)),
        ));
    }

    response.to_vec().ok()
}
