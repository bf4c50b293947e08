//! Iterative resolution: start at the root hints and follow referrals until
//! an authoritative server answers.
//!
//! Anything the walk cannot finish on its own (a lame delegation, a dead-end
//! reply, or too many steps) is handed to the stub resolver for the original
//! question.

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;

use tracing::{debug, trace};

use super::exchange::exchange;
use super::{Resolver, query_name, stub};
use crate::dns::DNSPacket;
use crate::dns::enums::DNSResourceType;
use crate::dns::name::normalize_name;
use crate::dns::resource::RecordData;
use crate::error::{DnsError, Result};

/// Where one response leaves the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    /// Authoritative answer carrying a record of the requested type.
    Answer(IpAddr, u32),
    /// Authoritative alias to another name.
    Alias(String),
    /// Authoritative NXDOMAIN or NODATA.
    Nonexistent,
    /// Delegation to the listed nameserver hosts.
    Referral(Vec<String>),
    /// Neither an answer nor a delegation.
    DeadEnd,
}

pub(crate) fn classify(packet: &DNSPacket, name: &str, qtype: DNSResourceType) -> Step {
    if packet.header.aa {
        if packet.is_nxdomain() {
            return Step::Nonexistent;
        }
        let owned = || packet.answers.iter().filter(|rr| rr.is_owned_by(name));
        let answer = owned().find_map(|rr| match (&rr.data, qtype) {
            (RecordData::A(ip), DNSResourceType::A) => Some(Step::Answer(IpAddr::V4(*ip), rr.ttl)),
            (RecordData::AAAA(ip), DNSResourceType::AAAA) => {
                Some(Step::Answer(IpAddr::V6(*ip), rr.ttl))
            }
            _ => None,
        });
        if let Some(step) = answer {
            return step;
        }
        return owned()
            .find_map(|rr| match &rr.data {
                RecordData::CNAME(target) => Some(Step::Alias(normalize_name(target))),
                _ => None,
            })
            .unwrap_or(Step::Nonexistent);
    }

    let hosts = packet.referral_nameservers();
    if hosts.is_empty() {
        Step::DeadEnd
    } else {
        Step::Referral(hosts)
    }
}

/// Next server set for a referral, in authority order: each host's glue
/// address when the additional section carries one, otherwise the host
/// resolved through the stub resolver.
async fn next_candidates(resolver: &Resolver, packet: &DNSPacket, hosts: &[String]) -> Vec<IpAddr> {
    let glue = packet.glue();
    let mut next = Vec::new();
    for host in hosts {
        let ip = match glue.get(host) {
            Some(ip) => IpAddr::V4(*ip),
            None => match stub::resolve(resolver, host, DNSResourceType::A).await {
                Ok(ip) => {
                    trace!("Glueless nameserver {} resolved to {}", host, ip);
                    ip
                }
                Err(e) => {
                    debug!("Could not resolve nameserver {}: {}", host, e);
                    continue;
                }
            },
        };
        if !next.contains(&ip) {
            next.push(ip);
        }
    }
    next
}

/// Resolve `host` from the root down. `depth` is the number of authoritative
/// CNAMEs this walk may still follow.
pub fn resolve<'a>(
    resolver: &'a Resolver,
    host: &'a str,
    qtype: DNSResourceType,
    depth: usize,
) -> Pin<Box<dyn Future<Output = Result<IpAddr>> + Send + 'a>> {
    Box::pin(async move {
        let name = query_name(host)?;
        if let Some(answer) = resolver.local_answer(&name, qtype) {
            return answer;
        }

        let config = resolver.config();
        let mut candidates: Vec<IpAddr> = config.root_hints.iter().map(|ip| IpAddr::V4(*ip)).collect();

        for iteration in 0..config.max_iterations {
            let servers: Vec<SocketAddr> = candidates
                .iter()
                .map(|ip| SocketAddr::new(*ip, config.port))
                .collect();
            trace!("Iteration {} for {} {} over {:?}", iteration, name, qtype, candidates);

            let Some(packet) =
                exchange(resolver.transport(), config, &servers, &name, qtype, false).await?
            else {
                return Err(DnsError::NoResponse(name));
            };

            match classify(&packet, &name, qtype) {
                Step::Answer(ip, ttl) => {
                    debug!("Authoritative answer {} {} -> {} (ttl {})", name, qtype, ip, ttl);
                    resolver.cache().put(qtype, &name, ip, ttl);
                    return Ok(ip);
                }
                Step::Alias(target) => {
                    if depth == 0 {
                        return Err(DnsError::CnameLimit {
                            name,
                            limit: config.max_cname_hops,
                        });
                    }
                    debug!("Authoritative CNAME {} -> {}", name, target);
                    return resolve(resolver, &target, qtype, depth - 1).await;
                }
                Step::Nonexistent => {
                    debug!("Authoritative denial for {} {}", name, qtype);
                    resolver.cache().negative_put(qtype, &name);
                    return Err(DnsError::NotFound(name));
                }
                Step::Referral(hosts) => {
                    let next = next_candidates(resolver, &packet, &hosts).await;
                    if next.is_empty() {
                        debug!("Referral for {} to {:?} has no usable address", name, hosts);
                        break;
                    }
                    debug!("Referral for {} to {:?}", name, next);
                    candidates = next;
                }
                Step::DeadEnd => {
                    debug!("Dead-end response for {}", name);
                    break;
                }
            }
        }

        debug!("Falling back to stub resolution for {}", name);
        stub::resolve(resolver, &name, qtype).await
    })
}
