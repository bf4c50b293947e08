use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::{debug, trace};

use super::{DatagramSocket, DatagramTransport};
use crate::error::{DnsError, Result};

/// Largest datagram accepted; EDNS0 responses can exceed 512 bytes.
const MAX_DATAGRAM: usize = 4096;

/// Tokio UDP sockets bound to an OS-chosen port on the wildcard address.
#[derive(Debug, Clone)]
pub struct UdpTransport {
    bind: SocketAddr,
}

impl UdpTransport {
    pub fn new() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
        }
    }

    /// Bind sockets to a specific local address instead of the wildcard.
    pub fn with_bind_addr(bind: SocketAddr) -> Self {
        Self { bind }
    }
}

impl Default for UdpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatagramTransport for UdpTransport {
    async fn open(&self) -> Result<Box<dyn DatagramSocket>> {
        let socket = UdpSocket::bind(self.bind)
            .await
            .map_err(|e| DnsError::Transport(format!("Failed to bind UDP socket: {}", e)))?;
        trace!("Opened UDP socket on {:?}", socket.local_addr().ok());
        Ok(Box::new(TokioDatagram {
            socket,
            buf: vec![0u8; MAX_DATAGRAM],
        }))
    }
}

struct TokioDatagram {
    socket: UdpSocket,
    buf: Vec<u8>,
}

#[async_trait]
impl DatagramSocket for TokioDatagram {
    async fn send_to(&mut self, dest: SocketAddr, payload: &[u8]) -> Result<()> {
        self.socket.send_to(payload, dest).await?;
        trace!("Sent {} bytes to {}", payload.len(), dest);
        Ok(())
    }

    async fn recv(&mut self, wait: Duration) -> Result<Option<Vec<u8>>> {
        match tokio::time::timeout(wait, self.socket.recv_from(&mut self.buf)).await {
            Ok(Ok((len, from))) => {
                trace!("Received {} bytes from {}", len, from);
                Ok(Some(self.buf[..len].to_vec()))
            }
            Ok(Err(e)) => {
                debug!("UDP receive error: {}", e);
                Err(e.into())
            }
            Err(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loopback_exchange() {
        let transport = UdpTransport::with_bind_addr("127.0.0.1:0".parse().unwrap());
        let mut client = transport.open().await.unwrap();

        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let server_addr = server.local_addr().unwrap();

        client.send_to(server_addr, b"ping").await.unwrap();
        let mut buf = [0u8; 16];
        let (len, from) = server.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"ping");
        server.send_to(b"pong", from).await.unwrap();

        let reply = client.recv(Duration::from_secs(2)).await.unwrap();
        assert_eq!(reply.as_deref(), Some(&b"pong"[..]));
    }

    #[tokio::test]
    async fn test_recv_times_out() {
        let transport = UdpTransport::with_bind_addr("127.0.0.1:0".parse().unwrap());
        let mut client = transport.open().await.unwrap();
        let reply = client.recv(Duration::from_millis(20)).await.unwrap();
        assert!(reply.is_none());
    }
}
