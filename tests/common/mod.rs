//! Shared helpers for the resolver integration tests
//!
//! `ScriptedTransport` stands in for the network: every query a resolver
//! sends is decoded, logged, and handed to a handler closure that plays the
//! part of whichever server the query was addressed to.

#![allow(dead_code)] // Not every test file uses every helper

use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use wayfinder::clock::ManualClock;
use wayfinder::config::ResolverConfig;
use wayfinder::dns::{
    DNSPacket,
    constants::DNSRcode,
    enums::DNSResourceType,
    resource::DNSResource,
};
use wayfinder::error::Result;
use wayfinder::resolver::Resolver;
use wayfinder::transport::{DatagramSocket, DatagramTransport};

pub const NAMESERVER: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 53);

type Handler = dyn Fn(SocketAddr, &DNSPacket) -> Option<DNSPacket> + Send + Sync;

/// One query as seen on the wire
#[derive(Debug, Clone)]
pub struct LoggedQuery {
    pub server: SocketAddr,
    pub name: String,
    pub qtype: DNSResourceType,
    pub id: u16,
    pub recursion_desired: bool,
    pub at: Instant,
}

pub struct ScriptedTransport {
    handler: Arc<Handler>,
    log: Arc<Mutex<Vec<LoggedQuery>>>,
    fail_open: bool,
    noisy: bool,
}

impl ScriptedTransport {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(SocketAddr, &DNSPacket) -> Option<DNSPacket> + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Arc::new(handler),
            log: Arc::new(Mutex::new(Vec::new())),
            fail_open: false,
            noisy: false,
        })
    }

    /// Each real reply is preceded by a junk datagram and a reply carrying
    /// the wrong transaction ID
    pub fn noisy<F>(handler: F) -> Arc<Self>
    where
        F: Fn(SocketAddr, &DNSPacket) -> Option<DNSPacket> + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Arc::new(handler),
            log: Arc::new(Mutex::new(Vec::new())),
            fail_open: false,
            noisy: true,
        })
    }

    /// Every server stays silent
    pub fn silent() -> Arc<Self> {
        Self::new(|_, _| None)
    }

    /// `open` always fails, as when no local port can be allocated
    pub fn unbindable() -> Arc<Self> {
        Arc::new(Self {
            handler: Arc::new(|_, _| None),
            log: Arc::new(Mutex::new(Vec::new())),
            fail_open: true,
            noisy: false,
        })
    }

    pub fn queries(&self) -> Vec<LoggedQuery> {
        self.log.lock().clone()
    }

    pub fn query_count(&self) -> usize {
        self.log.lock().len()
    }

    pub fn servers_asked(&self) -> Vec<SocketAddr> {
        let mut servers: Vec<SocketAddr> = Vec::new();
        for query in self.log.lock().iter() {
            if !servers.contains(&query.server) {
                servers.push(query.server);
            }
        }
        servers
    }
}

#[async_trait]
impl DatagramTransport for ScriptedTransport {
    async fn open(&self) -> Result<Box<dyn DatagramSocket>> {
        if self.fail_open {
            return Err(wayfinder::DnsError::Transport("no free port".to_string()));
        }
        Ok(Box::new(ScriptedSocket {
            handler: self.handler.clone(),
            log: self.log.clone(),
            noisy: self.noisy,
            pending: VecDeque::new(),
        }))
    }
}

struct ScriptedSocket {
    handler: Arc<Handler>,
    log: Arc<Mutex<Vec<LoggedQuery>>>,
    noisy: bool,
    pending: VecDeque<Vec<u8>>,
}

#[async_trait]
impl DatagramSocket for ScriptedSocket {
    async fn send_to(&mut self, dest: SocketAddr, payload: &[u8]) -> Result<()> {
        let query = DNSPacket::parse(payload)?;
        let question = query.questions.first().cloned().unwrap_or_default();
        self.log.lock().push(LoggedQuery {
            server: dest,
            name: question.name.clone(),
            qtype: question.qtype,
            id: query.header.id,
            recursion_desired: query.header.rd,
            at: Instant::now(),
        });

        if let Some(mut response) = (self.handler)(dest, &query) {
            response.header.id = query.header.id;
            response.header.qr = true;
            if response.questions.is_empty() {
                response.questions = query.questions.clone();
            }
            if self.noisy {
                self.pending.push_back(vec![0xde, 0xad, 0xbe]);
                let mut stale = response.clone();
                stale.header.id = query.header.id.wrapping_add(1);
                self.pending.push_back(stale.serialize()?);
            }
            self.pending.push_back(response.serialize()?);
        }
        Ok(())
    }

    async fn recv(&mut self, wait: Duration) -> Result<Option<Vec<u8>>> {
        if let Some(bytes) = self.pending.pop_front() {
            return Ok(Some(bytes));
        }
        tokio::time::sleep(wait).await;
        Ok(None)
    }
}

/// Name and type of the first question
pub fn question(query: &DNSPacket) -> (String, DNSResourceType) {
    let q = &query.questions[0];
    (q.name.to_ascii_lowercase(), q.qtype)
}

pub fn answer(records: Vec<DNSResource>) -> DNSPacket {
    let mut packet = DNSPacket::default();
    packet.header.qr = true;
    packet.header.ra = true;
    packet.answers = records;
    packet
}

pub fn authoritative(records: Vec<DNSResource>) -> DNSPacket {
    let mut packet = answer(records);
    packet.header.aa = true;
    packet
}

pub fn nxdomain() -> DNSPacket {
    let mut packet = answer(Vec::new());
    packet.header.rcode = DNSRcode::NXDOMAIN;
    packet
}

/// Referral naming `hosts` as nameservers for `zone`, with glue for the
/// hosts listed in `glue`
pub fn referral(zone: &str, hosts: &[&str], glue: &[(&str, Ipv4Addr)]) -> DNSPacket {
    let mut packet = DNSPacket::default();
    packet.header.qr = true;
    for host in hosts {
        packet
            .authorities
            .push(DNSResource::ns(zone, 172_800, host).unwrap());
    }
    for (host, ip) in glue {
        packet.additionals.push(DNSResource::a(host, 172_800, *ip));
    }
    packet
}

/// Config with one nameserver, short waits and the default retry schedule
pub fn test_config() -> ResolverConfig {
    ResolverConfig {
        nameservers: vec![IpAddr::V4(NAMESERVER)],
        ..ResolverConfig::default()
    }
}

pub fn create_resolver(
    config: ResolverConfig,
    transport: Arc<ScriptedTransport>,
) -> (Resolver, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(0));
    let resolver = Resolver::with_transport(config, transport, clock.clone());
    (resolver, clock)
}

pub fn nameserver_addr() -> SocketAddr {
    SocketAddr::from((NAMESERVER, 53))
}
