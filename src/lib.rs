pub mod cache;
pub mod clock;
pub mod config;
pub mod dns;
pub mod dnssec;
pub mod error;
pub mod hosts;
pub mod resolver;
pub mod transport;

pub use cache::ResolverCache;
pub use config::ResolverConfig;
pub use dns::DNSPacket;
pub use error::{DnsError, Result};
pub use resolver::Resolver;
