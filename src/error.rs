use thiserror::Error;

use crate::dns::ParseError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid nameserver address: {0}")]
    InvalidNameserver(String),

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("Invalid retry count: {0}")]
    InvalidRetries(String),

    #[error("Invalid tick rate: {0}")]
    InvalidTickRate(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

#[derive(Error, Debug, Clone)]
pub enum DnsError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid hostname: {0}")]
    InvalidName(String),

    /// Authoritative "does not exist", or a response with no usable record.
    #[error("No such host: {0}")]
    NotFound(String),

    /// Served from the negative cache without touching the network.
    #[error("Host {0} is negatively cached")]
    NegativeCached(String),

    #[error("No nameserver answered for {0}")]
    NoResponse(String),

    #[error("No nameservers configured")]
    NoNameservers,

    #[error("CNAME chain for {name} exceeded {limit} hops")]
    CnameLimit { name: String, limit: usize },

    #[error("Address family mismatch for literal {0}")]
    FamilyMismatch(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Unsupported DNS feature: {0}")]
    Unsupported(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl DnsError {
    /// True for outcomes that are (or were) recorded in the negative cache.
    pub fn is_negative(&self) -> bool {
        matches!(self, DnsError::NotFound(_) | DnsError::NegativeCached(_))
    }
}

impl From<std::io::Error> for DnsError {
    fn from(err: std::io::Error) -> Self {
        DnsError::Io(err.to_string())
    }
}

impl From<ParseError> for DnsError {
    fn from(err: ParseError) -> Self {
        DnsError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DnsError>;
