//! Stub resolution against the configured nameservers.

use std::net::IpAddr;

use tracing::debug;

use super::exchange::exchange;
use super::{Resolver, query_name};
use crate::dns::DNSPacket;
use crate::dns::enums::DNSResourceType;
use crate::dns::name::normalize_name;
use crate::dns::resource::RecordData;
use crate::error::{DnsError, Result};

/// What a single response says about the name that was asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    Address(IpAddr, u32),
    Alias(String),
    Negative,
}

/// Classify a stub response for `name`. The TTL of a usable address is the
/// smallest TTL across the whole answer section.
pub(crate) fn classify(packet: &DNSPacket, name: &str, qtype: DNSResourceType) -> Outcome {
    if packet.is_nxdomain() || packet.answers.is_empty() {
        return Outcome::Negative;
    }
    let ttl = packet.min_answer_ttl().unwrap_or(0);
    let owned = || packet.answers.iter().filter(|rr| rr.is_owned_by(name));

    let address = owned().find_map(|rr| match (&rr.data, qtype) {
        (RecordData::A(ip), DNSResourceType::A) => Some(IpAddr::V4(*ip)),
        (RecordData::AAAA(ip), DNSResourceType::AAAA) => Some(IpAddr::V6(*ip)),
        _ => None,
    });
    if let Some(ip) = address {
        return Outcome::Address(ip, ttl);
    }

    owned()
        .find_map(|rr| match &rr.data {
            RecordData::CNAME(target) => Some(Outcome::Alias(normalize_name(target))),
            _ => None,
        })
        .unwrap_or(Outcome::Negative)
}

/// Resolve `host` to an address of `qtype` through the nameserver list.
pub async fn resolve(resolver: &Resolver, host: &str, qtype: DNSResourceType) -> Result<IpAddr> {
    let original = query_name(host)?;
    let max_hops = resolver.config().max_cname_hops;
    let cache = resolver.cache();

    let mut current = original.clone();
    let mut hops = 0usize;

    loop {
        if let Some(answer) = resolver.local_answer(&current, qtype) {
            return answer;
        }

        // Snapshot once per pass so a concurrent replacement doesn't split it
        let servers = resolver.nameserver_addrs();
        if servers.is_empty() {
            return Err(DnsError::NoNameservers);
        }

        let Some(packet) = exchange(
            resolver.transport(),
            resolver.config(),
            &servers,
            &current,
            qtype,
            true,
        )
        .await?
        else {
            return Err(DnsError::NoResponse(current));
        };

        match classify(&packet, &current, qtype) {
            Outcome::Address(ip, ttl) => {
                debug!("Resolved {} {} -> {} (ttl {})", current, qtype, ip, ttl);
                cache.put(qtype, &current, ip, ttl);
                if current != original {
                    cache.put(qtype, &original, ip, ttl);
                }
                return Ok(ip);
            }
            Outcome::Alias(target) => {
                hops += 1;
                if hops > max_hops {
                    debug!("CNAME chain from {} exceeded {} hops", original, max_hops);
                    return Err(DnsError::CnameLimit {
                        name: original,
                        limit: max_hops,
                    });
                }
                debug!("Following CNAME {} -> {} (hop {})", current, target, hops);
                current = target;
            }
            Outcome::Negative => {
                debug!("Negative answer for {} {}", current, qtype);
                cache.negative_put(qtype, &current);
                return Err(DnsError::NotFound(current));
            }
        }
    }
}
