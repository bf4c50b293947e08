//! DNS transport adapters
//!
//! - Plain UDP datagrams (RFC 1035), behind the injectable [`DatagramTransport`]
//! - DNS-over-HTTPS client (RFC 8484), wire POST and JSON GET
//! - DNS-over-TLS client (RFC 7858)
//! - Multicast DNS queries and announcements (RFC 6762)

pub mod doh;
pub mod dot;
pub mod mdns;
pub mod udp;

pub use doh::{DohResolver, HttpResponse, HttpsClient, ReqwestClient};
pub use dot::DotResolver;
pub use mdns::MdnsResolver;
pub use udp::UdpTransport;

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Transport protocol types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportProtocol {
    Udp,
    Tls,
    Https,
    Multicast,
}

impl TransportProtocol {
    /// Get the default port for this transport protocol
    pub fn default_port(&self) -> u16 {
        match self {
            TransportProtocol::Udp => crate::dns::constants::DNS_PORT,
            TransportProtocol::Tls => crate::dns::constants::DOT_PORT,
            TransportProtocol::Https => 443,
            TransportProtocol::Multicast => crate::dns::constants::MDNS_PORT,
        }
    }

    /// Check if this transport requires encryption
    pub fn is_encrypted(&self) -> bool {
        matches!(self, TransportProtocol::Tls | TransportProtocol::Https)
    }
}

/// Source of ephemeral datagram sockets.
///
/// Each query-with-retry sequence opens its own socket; failure to open one
/// is reported immediately and never retried.
#[async_trait]
pub trait DatagramTransport: Send + Sync {
    async fn open(&self) -> Result<Box<dyn DatagramSocket>>;
}

/// One bound ephemeral port. Dropping it releases the port.
#[async_trait]
pub trait DatagramSocket: Send {
    async fn send_to(&mut self, dest: SocketAddr, payload: &[u8]) -> Result<()>;

    /// Wait up to `wait` for one datagram. `Ok(None)` means the wait elapsed.
    async fn recv(&mut self, wait: Duration) -> Result<Option<Vec<u8>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ports() {
        assert_eq!(TransportProtocol::Udp.default_port(), 53);
        assert_eq!(TransportProtocol::Tls.default_port(), 853);
        assert_eq!(TransportProtocol::Multicast.default_port(), 5353);
        assert!(TransportProtocol::Https.is_encrypted());
        assert!(!TransportProtocol::Multicast.is_encrypted());
    }
}
