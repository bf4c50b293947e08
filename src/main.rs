use std::future::Future;
use std::net::IpAddr;

use clap::{Parser, ValueEnum};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use wayfinder::dns::enums::DNSResourceType;
use wayfinder::transport::{DohResolver, DotResolver, TransportProtocol};
use wayfinder::{DnsError, Resolver, ResolverConfig};

/// Resolve a host name over UDP, DNS-over-HTTPS or DNS-over-TLS
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host name to resolve
    host: String,

    /// Record type to ask for
    #[arg(short = 't', long = "type", value_enum, ignore_case = true, default_value = "a")]
    record_type: QueryType,

    /// Walk down from the root servers instead of asking a recursive nameserver
    #[arg(long)]
    iterative: bool,

    /// Nameserver to use (repeatable); overrides WAYFINDER_NAMESERVERS
    #[arg(short = 's', long = "server")]
    servers: Vec<IpAddr>,

    /// DNS-over-HTTPS endpoint, e.g. https://cloudflare-dns.com/dns-query
    #[arg(long, conflicts_with_all = ["dot", "iterative"])]
    doh: Option<String>,

    /// DNS-over-TLS server address
    #[arg(long, requires = "tls_name", conflicts_with = "iterative")]
    dot: Option<IpAddr>,

    /// Name the DoT server certificate must carry
    #[arg(long)]
    tls_name: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum QueryType {
    A,
    Aaaa,
    Any,
}

impl QueryType {
    fn families(self) -> &'static [DNSResourceType] {
        match self {
            QueryType::A => &[DNSResourceType::A],
            QueryType::Aaaa => &[DNSResourceType::AAAA],
            QueryType::Any => &[DNSResourceType::A, DNSResourceType::AAAA],
        }
    }
}

/// Try each family in turn; the first error is the one reported.
async fn first_success<F, Fut>(families: &[DNSResourceType], mut lookup: F) -> wayfinder::Result<IpAddr>
where
    F: FnMut(DNSResourceType) -> Fut,
    Fut: Future<Output = wayfinder::Result<IpAddr>>,
{
    let mut first_error = None;
    for &qtype in families {
        match lookup(qtype).await {
            Ok(ip) => return Ok(ip),
            Err(e) => {
                debug!("{} lookup failed: {}", qtype, e);
                first_error.get_or_insert(e);
            }
        }
    }
    Err(first_error.unwrap_or_else(|| DnsError::Unsupported("no record type".to_string())))
}

/// Build the UDP resolver. Servers given on the command line win over any
/// resolv.conf loaded at startup.
fn build_resolver(config: ResolverConfig, servers: &[IpAddr]) -> wayfinder::Result<Resolver> {
    let resolver = Resolver::from_config(config)?;
    if !servers.is_empty() {
        resolver.set_nameservers(servers.to_vec());
    }
    Ok(resolver)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = ResolverConfig::from_env()?;
    if !args.servers.is_empty() {
        config.nameservers = args.servers.clone();
    }
    let timeout = config.max_timeout;
    let families = args.record_type.families();
    let host = args.host.as_str();

    let protocol = if args.doh.is_some() {
        TransportProtocol::Https
    } else if args.dot.is_some() {
        TransportProtocol::Tls
    } else {
        TransportProtocol::Udp
    };
    info!(
        "Resolving {} over {:?} (encrypted: {})",
        host,
        protocol,
        protocol.is_encrypted()
    );

    let result = if let Some(url) = &args.doh {
        let doh = DohResolver::with_reqwest(url.clone(), timeout)?;
        first_success(families, |qtype| doh.resolve(host, qtype)).await
    } else if let Some(server) = args.dot {
        let tls_name = args.tls_name.as_deref().unwrap_or_default();
        let dot = DotResolver::new(server, tls_name, timeout)?;
        first_success(families, |qtype| dot.resolve(host, qtype)).await
    } else {
        let resolver = build_resolver(config, &args.servers)?;
        if args.iterative {
            first_success(families, |qtype| resolver.resolve_recursive(host, qtype)).await
        } else {
            match args.record_type {
                QueryType::A => resolver.resolve(host).await.map(IpAddr::V4),
                QueryType::Aaaa => resolver.resolve_aaaa(host).await.map(IpAddr::V6),
                QueryType::Any => resolver.resolve_any(host).await,
            }
        }
    };

    match result {
        Ok(ip) => {
            println!("{} -> {}", host, ip);
            Ok(())
        }
        Err(e) => {
            error!("Failed to resolve {}: {}", host, e);
            Err(e.into())
        }
    }
}
