//! Multicast DNS (RFC 6762): one-shot `.local` queries and gratuitous
//! announcements.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use bytes::{BufMut, BytesMut};
use tokio::time::Instant;
use tracing::{debug, trace};

use super::DatagramTransport;
use crate::dns::constants::{CACHE_FLUSH_BIT, HEADER_LEN, MDNS_PORT};
use crate::dns::enums::{DNSResourceClass, DNSResourceType};
use crate::dns::header::DNSHeader;
use crate::dns::name::encode_name;
use crate::dns::resource::DNSResource;
use crate::dns::{DNSPacket, ParseError};
use crate::error::{DnsError, Result};

pub const MDNS_GROUP: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 251);

/// Question class bit requesting a unicast reply (RFC 6762 §5.4).
const UNICAST_RESPONSE_BIT: u16 = 0x8000;

/// mDNS query: ID 0, no recursion, QU bit set so the responder answers our
/// ephemeral port directly.
pub fn build_mdns_query(name: &str, qtype: DNSResourceType) -> std::result::Result<Vec<u8>, ParseError> {
    let mut head = Vec::with_capacity(HEADER_LEN);
    DNSHeader::query(0, false).write(&mut head)?;

    let mut out = BytesMut::with_capacity(HEADER_LEN + name.len() + 6);
    out.put_slice(&head);
    out.put_slice(&encode_name(name)?);
    out.put_u16(qtype.into());
    out.put_u16(u16::from(DNSResourceClass::IN) | UNICAST_RESPONSE_BIT);
    Ok(out.to_vec())
}

/// Unsolicited authoritative response announcing `host -> ip`, with the
/// cache-flush bit set on the record class.
pub fn build_announcement(host: &str, ip: Ipv4Addr, ttl: u32) -> std::result::Result<Vec<u8>, ParseError> {
    let mut record = DNSResource::a(host, ttl, ip);
    record.rclass = DNSResourceClass::Unknown(u16::from(DNSResourceClass::IN) | CACHE_FLUSH_BIT);

    let mut packet = DNSPacket::default();
    packet.header.qr = true;
    packet.header.aa = true;
    packet.answers.push(record);
    packet.serialize()
}

pub struct MdnsResolver {
    transport: Arc<dyn DatagramTransport>,
    destination: SocketAddr,
    timeout: Duration,
}

impl MdnsResolver {
    pub fn new(transport: Arc<dyn DatagramTransport>, timeout: Duration) -> Self {
        Self {
            transport,
            destination: SocketAddr::from((MDNS_GROUP, MDNS_PORT)),
            timeout,
        }
    }

    /// Send to a fixed address instead of the multicast group.
    pub fn with_destination(mut self, destination: SocketAddr) -> Self {
        self.destination = destination;
        self
    }

    /// Ask the link for `name` and return the first matching A record.
    pub async fn resolve(&self, name: &str) -> Result<Ipv4Addr> {
        let query = build_mdns_query(name, DNSResourceType::A)?;
        let mut socket = self.transport.open().await?;
        socket.send_to(self.destination, &query).await?;
        debug!("Sent mDNS query for {} to {}", name, self.destination);

        let deadline = Instant::now() + self.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(DnsError::NoResponse(name.to_string()));
            }
            let Some(bytes) = socket.recv(remaining).await? else {
                return Err(DnsError::NoResponse(name.to_string()));
            };

            let packet = match DNSPacket::parse_response(&bytes, 0) {
                Ok(packet) => packet,
                Err(e) => {
                    trace!("Ignoring mDNS datagram: {}", e);
                    continue;
                }
            };
            if let Some((IpAddr::V4(ip), _)) = packet.answer_address(name, DNSResourceType::A, 0) {
                return Ok(ip);
            }
        }
    }

    /// Multicast a gratuitous announcement for `host -> ip`.
    pub async fn announce(&self, host: &str, ip: Ipv4Addr, ttl: u32) -> Result<()> {
        let announcement = build_announcement(host, ip, ttl)?;
        let mut socket = self.transport.open().await?;
        socket.send_to(self.destination, &announcement).await?;
        debug!("Announced {} -> {} via mDNS", host, ip);
        Ok(())
    }
}
