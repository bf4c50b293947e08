//! DNS-over-TLS client (RFC 7858)
//!
//! Each query opens a TCP connection, performs the TLS handshake against the
//! webpki root set, and exchanges one message with a two-byte big-endian
//! length prefix (RFC 1035 §4.2.2 framing).

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::debug;

use super::TransportProtocol;
use crate::dns::enums::DNSResourceType;
use crate::dns::{DNSPacket, build_query};
use crate::error::{DnsError, Result};

const MAX_IN_ANSWER_HOPS: usize = 10;

/// Write one length-prefixed message and read one length-prefixed reply.
pub async fn exchange_framed<S>(stream: &mut S, message: &[u8]) -> std::io::Result<Vec<u8>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let len = u16::try_from(message.len()).map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "DNS message exceeds 65535 bytes")
    })?;
    let mut framed = Vec::with_capacity(message.len() + 2);
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(message);
    stream.write_all(&framed).await?;
    stream.flush().await?;

    let reply_len = stream.read_u16().await?;
    let mut reply = vec![0u8; usize::from(reply_len)];
    stream.read_exact(&mut reply).await?;
    Ok(reply)
}

fn client_config() -> Result<Arc<rustls::ClientConfig>> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config =
        rustls::ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()
            .map_err(|e| DnsError::Transport(format!("TLS configuration error: {}", e)))?
            .with_root_certificates(roots)
            .with_no_client_auth();
    Ok(Arc::new(config))
}

pub struct DotResolver {
    server: SocketAddr,
    server_name: ServerName<'static>,
    connector: TlsConnector,
    timeout: Duration,
}

impl DotResolver {
    /// `tls_name` is the name the server certificate must carry.
    pub fn new(server: IpAddr, tls_name: &str, timeout: Duration) -> Result<Self> {
        let server_name = ServerName::try_from(tls_name.to_string())
            .map_err(|e| DnsError::InvalidName(format!("{}: {}", tls_name, e)))?;
        Ok(Self {
            server: SocketAddr::new(server, TransportProtocol::Tls.default_port()),
            server_name,
            connector: TlsConnector::from(client_config()?),
            timeout,
        })
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.server.set_port(port);
        self
    }

    pub async fn query(&self, name: &str, qtype: DNSResourceType) -> Result<DNSPacket> {
        let id = rand::random::<u16>();
        let query = build_query(id, name, qtype, true)?;

        let exchange = async {
            let tcp = TcpStream::connect(self.server).await?;
            let mut tls = self
                .connector
                .connect(self.server_name.clone(), tcp)
                .await?;
            debug!("TLS connection established with {}", self.server);
            exchange_framed(&mut tls, &query).await
        };

        let reply = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| DnsError::NoResponse(name.to_string()))?
            .map_err(|e| DnsError::Transport(format!("DoT exchange with {}: {}", self.server, e)))?;

        Ok(DNSPacket::parse_response(&reply, id)?)
    }

    pub async fn resolve(&self, name: &str, qtype: DNSResourceType) -> Result<IpAddr> {
        let packet = self.query(name, qtype).await?;
        if packet.is_nxdomain() {
            return Err(DnsError::NotFound(name.to_string()));
        }
        packet
            .answer_address(name, qtype, MAX_IN_ANSWER_HOPS)
            .map(|(ip, _)| ip)
            .ok_or_else(|| DnsError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn test_exchange_framed() {
        let (mut client, mut server) = tokio::io::duplex(1024);

        let server_task = tokio::spawn(async move {
            let len = server.read_u16().await.unwrap();
            let mut query = vec![0u8; usize::from(len)];
            server.read_exact(&mut query).await.unwrap();
            assert_eq!(query, b"hello");
            server.write_all(&[0, 3, b'a', b'b', b'c']).await.unwrap();
        });

        let reply = exchange_framed(&mut client, b"hello").await.unwrap();
        assert_eq!(reply, b"abc");
        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_short_reply_is_error() {
        let (mut client, mut server) = tokio::io::duplex(64);
        tokio::spawn(async move {
            let mut sink = [0u8; 7];
            server.read_exact(&mut sink).await.unwrap();
            server.write_all(&[0, 10, 1, 2]).await.unwrap();
        });
        assert!(exchange_framed(&mut client, b"hello").await.is_err());
    }

    #[test]
    fn test_rejects_bad_tls_name() {
        let result = DotResolver::new(
            IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)),
            "not a host name",
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(DnsError::InvalidName(_))));
    }

    #[test]
    fn test_default_port() {
        let dot = DotResolver::new(
            IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)),
            "dns.example",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(dot.server.port(), 853);
        assert_eq!(dot.with_port(8853).server.port(), 8853);
    }
}
