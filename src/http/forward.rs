//! Datagram handoff to the collector.

use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::observability::metrics;

/// Sends raw form bodies to the collector, one datagram per submission.
///
/// Delivery is not confirmed. A failed send is reported to the caller, who
/// decides whether the client ever learns about it.
#[derive(Debug)]
pub struct Forwarder {
    socket: UdpSocket,
    target: SocketAddr,
}

impl Forwarder {
    /// Bind an ephemeral local socket for sending to `target`.
    pub async fn bind(target: SocketAddr) -> io::Result<Self> {
        let local = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local).await?;
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Send `payload` verbatim as a single datagram.
    pub async fn forward(&self, payload: &[u8]) -> io::Result<()> {
        let sent = self.socket.send_to(payload, self.target).await;
        match sent {
            Ok(n) if n == payload.len() => {
                metrics::record_forwarded();
                Ok(())
            }
            Ok(n) => {
                metrics::record_forward_failure();
                Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("sent {n} of {} bytes", payload.len()),
                ))
            }
            Err(e) => {
                metrics::record_forward_failure();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_forward_sends_payload_verbatim() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let forwarder = Forwarder::bind(receiver.local_addr().unwrap()).await.unwrap();

        forwarder.forward(b"name=Ann&age=30").await.unwrap();

        let mut buf = [0u8; 64];
        let (len, _) = receiver.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"name=Ann&age=30");
    }
}
