//! Resolver context and public lookup API.
//!
//! A [`Resolver`] owns everything a lookup needs: configuration, the shared
//! cache, the nameserver list, the hosts table and the datagram transport.
//! Stub lookups ask the configured nameservers with recursion desired;
//! recursive lookups walk delegations down from the root hints.

pub mod exchange;
pub mod iterative;
pub mod stub;

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, info};

use crate::cache::{CacheSnapshotEntry, ResolverCache};
use crate::clock::{Clock, SystemClock};
use crate::config::{ResolverConfig, parse_resolv_conf};
use crate::dns::enums::DNSResourceType;
use crate::dns::name::normalize_name;
use crate::error::{DnsError, Result};
use crate::hosts::HostsFile;
use crate::transport::{DatagramTransport, UdpTransport};

pub struct Resolver {
    config: ResolverConfig,
    cache: Arc<ResolverCache>,
    nameservers: ArcSwap<Vec<IpAddr>>,
    hosts: ArcSwap<HostsFile>,
    transport: Arc<dyn DatagramTransport>,
}

impl Resolver {
    /// Resolver over real UDP sockets and a monotonic system clock.
    pub fn new(config: ResolverConfig) -> Self {
        let clock = Arc::new(SystemClock::new(config.ticks_per_second));
        Self::with_transport(config, Arc::new(UdpTransport::new()), clock)
    }

    pub fn with_transport(
        config: ResolverConfig,
        transport: Arc<dyn DatagramTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = Arc::new(ResolverCache::new(
            clock,
            config.ticks_per_second,
            u64::from(config.negative_ttl),
        ));
        info!(
            "Resolver initialized with {} nameservers, {} root hints",
            config.nameservers.len(),
            config.root_hints.len()
        );
        Self {
            nameservers: ArcSwap::from_pointee(config.nameservers.clone()),
            hosts: ArcSwap::from_pointee(HostsFile::default()),
            config,
            cache,
            transport,
        }
    }

    /// Validate `config`, build a UDP resolver, and load the system files when
    /// `use_system_files` is set.
    pub fn from_config(config: ResolverConfig) -> Result<Self> {
        config.validate()?;
        let resolver = Self::new(config);
        if resolver.config.use_system_files {
            let hosts = resolver.config.hosts_path.clone();
            let resolv = resolver.config.resolv_conf_path.clone();
            resolver.load_system_files(&hosts, &resolv)?;
        }
        Ok(resolver)
    }

    /// Read a hosts file and a resolv.conf. A missing hosts file leaves the
    /// table empty; a resolv.conf without usable entries keeps the current
    /// nameservers.
    pub fn load_system_files(&self, hosts_path: &Path, resolv_conf_path: &Path) -> Result<()> {
        match std::fs::read_to_string(hosts_path) {
            Ok(text) => self.set_hosts(HostsFile::parse(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No hosts file at {}", hosts_path.display());
            }
            Err(e) => return Err(e.into()),
        }

        match std::fs::read_to_string(resolv_conf_path) {
            Ok(text) => {
                let servers = parse_resolv_conf(&text);
                if servers.is_empty() {
                    debug!("{} lists no nameservers", resolv_conf_path.display());
                } else {
                    self.set_nameservers(servers);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No resolv.conf at {}", resolv_conf_path.display());
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResolverCache {
        &self.cache
    }

    pub(crate) fn transport(&self) -> &dyn DatagramTransport {
        self.transport.as_ref()
    }

    /// Replace the nameserver list. Lookups already running keep the list
    /// they started with.
    pub fn set_nameservers(&self, servers: Vec<IpAddr>) {
        info!("Nameservers set to {:?}", servers);
        self.nameservers.store(Arc::new(servers));
    }

    pub fn nameservers(&self) -> Arc<Vec<IpAddr>> {
        self.nameservers.load_full()
    }

    pub(crate) fn nameserver_addrs(&self) -> Vec<SocketAddr> {
        self.nameservers
            .load()
            .iter()
            .map(|ip| SocketAddr::new(*ip, self.config.port))
            .collect()
    }

    pub fn set_hosts(&self, hosts: HostsFile) {
        debug!("Hosts table replaced ({} entries)", hosts.entries().len());
        self.hosts.store(Arc::new(hosts));
    }

    pub fn hosts(&self) -> Arc<HostsFile> {
        self.hosts.load_full()
    }

    pub fn flush_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_snapshot(&self) -> Vec<CacheSnapshotEntry> {
        self.cache.snapshot()
    }

    /// IPv4 address for `host` via the stub resolver.
    pub async fn resolve(&self, host: &str) -> Result<Ipv4Addr> {
        match stub::resolve(self, host, DNSResourceType::A).await? {
            IpAddr::V4(ip) => Ok(ip),
            IpAddr::V6(_) => Err(DnsError::FamilyMismatch(host.to_string())),
        }
    }

    /// IPv6 address for `host` via the stub resolver.
    pub async fn resolve_aaaa(&self, host: &str) -> Result<Ipv6Addr> {
        match stub::resolve(self, host, DNSResourceType::AAAA).await? {
            IpAddr::V6(ip) => Ok(ip),
            IpAddr::V4(_) => Err(DnsError::FamilyMismatch(host.to_string())),
        }
    }

    /// A first, then AAAA. When both fail the A error is returned.
    pub async fn resolve_any(&self, host: &str) -> Result<IpAddr> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(ip);
        }
        match self.resolve(host).await {
            Ok(ip) => Ok(IpAddr::V4(ip)),
            Err(v4_err) => match self.resolve_aaaa(host).await {
                Ok(ip) => Ok(IpAddr::V6(ip)),
                Err(_) => Err(v4_err),
            },
        }
    }

    /// Walk from the root hints to an authoritative answer.
    pub async fn resolve_recursive(&self, host: &str, qtype: DNSResourceType) -> Result<IpAddr> {
        iterative::resolve(self, host, qtype, self.config.max_cname_hops).await
    }

    /// Cached address for `host`, A preferred, without touching the network.
    pub fn resolve_cached(&self, host: &str) -> Option<IpAddr> {
        self.cache
            .get(DNSResourceType::A, host)
            .or_else(|| self.cache.get(DNSResourceType::AAAA, host))
    }

    /// Answers that need no query: literals, the cache, and the hosts table.
    ///
    /// `None` means the name has to go to the network.
    pub(crate) fn local_answer(&self, name: &str, qtype: DNSResourceType) -> Option<Result<IpAddr>> {
        if let Some(result) = literal(name, qtype) {
            return Some(result);
        }

        if let Some(ip) = self.cache.get(qtype, name) {
            debug!("Cache hit for {} {}", name, qtype);
            return Some(Ok(ip));
        }

        if self.cache.negative_get(qtype, name) {
            debug!("Negative cache hit for {} {}", name, qtype);
            return Some(Err(DnsError::NegativeCached(name.to_string())));
        }

        let hosts = self.hosts.load();
        let from_hosts = match qtype {
            DNSResourceType::A => hosts.lookup_v4(name).map(IpAddr::V4),
            DNSResourceType::AAAA => hosts.lookup_v6(name).map(IpAddr::V6),
            _ => None,
        };
        if let Some(ip) = from_hosts {
            debug!("Hosts entry for {}: {}", name, ip);
            self.cache.put(qtype, name, ip, self.config.hosts_ttl);
            return Some(Ok(ip));
        }

        None
    }
}

/// IP literals answer themselves, provided the family fits the query type.
fn literal(name: &str, qtype: DNSResourceType) -> Option<Result<IpAddr>> {
    let ip = name.parse::<IpAddr>().ok()?;
    let fits = matches!(
        (ip, qtype),
        (IpAddr::V4(_), DNSResourceType::A) | (IpAddr::V6(_), DNSResourceType::AAAA)
    );
    Some(if fits {
        Ok(ip)
    } else {
        Err(DnsError::FamilyMismatch(name.to_string()))
    })
}

/// Lowercased name, rejecting inputs that cannot be queried.
pub(crate) fn query_name(host: &str) -> Result<String> {
    let name = normalize_name(host.trim());
    if name.is_empty() {
        return Err(DnsError::InvalidName(host.to_string()));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_family() {
        assert_eq!(
            literal("192.0.2.1", DNSResourceType::A).unwrap().unwrap(),
            IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1))
        );
        assert!(matches!(
            literal("::1", DNSResourceType::A),
            Some(Err(DnsError::FamilyMismatch(_)))
        ));
        assert!(literal("example.com", DNSResourceType::A).is_none());
    }

    #[test]
    fn test_query_name() {
        assert_eq!(query_name(" WWW.Example.COM. ").unwrap(), "www.example.com");
        assert!(matches!(query_name("."), Err(DnsError::InvalidName(_))));
    }
}
