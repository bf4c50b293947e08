use std::fmt;

/// DNSSEC validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsSecError {
    /// Signature expired
    SignatureExpired,
    /// Signature not yet valid
    SignatureNotYetValid,
    /// Key tag mismatch
    KeyTagMismatch { expected: u16, actual: u16 },
    /// RRSIG/DS algorithm differs from the DNSKEY's
    AlgorithmMismatch { expected: u8, actual: u8 },
    /// Algorithm not supported
    UnsupportedAlgorithm(u8),
    /// Digest type not supported
    UnsupportedDigestType(u8),
    /// Signature verification failed
    SignatureVerificationFailed,
    /// DS digest mismatch
    DsDigestMismatch,
    /// Invalid public key format
    InvalidPublicKey,
    /// Invalid signature format
    InvalidSignature,
    /// Record RDATA too short or malformed
    InvalidRecord(String),
}

impl fmt::Display for DnsSecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignatureExpired => write!(f, "DNSSEC signature has expired"),
            Self::SignatureNotYetValid => write!(f, "DNSSEC signature is not yet valid"),
            Self::KeyTagMismatch { expected, actual } => {
                write!(f, "Key tag does not match: expected {}, got {}", expected, actual)
            }
            Self::AlgorithmMismatch { expected, actual } => {
                write!(f, "Algorithm does not match: expected {}, got {}", expected, actual)
            }
            Self::UnsupportedAlgorithm(alg) => write!(f, "Unsupported DNSSEC algorithm: {}", alg),
            Self::UnsupportedDigestType(digest) => write!(f, "Unsupported digest type: {}", digest),
            Self::SignatureVerificationFailed => write!(f, "DNSSEC signature verification failed"),
            Self::DsDigestMismatch => write!(f, "DS record digest does not match DNSKEY"),
            Self::InvalidPublicKey => write!(f, "Invalid DNSKEY public key format"),
            Self::InvalidSignature => write!(f, "Invalid RRSIG signature format"),
            Self::InvalidRecord(msg) => write!(f, "Invalid DNSSEC record: {}", msg),
        }
    }
}

impl std::error::Error for DnsSecError {}

pub type Result<T> = std::result::Result<T, DnsSecError>;

impl From<crate::dns::ParseError> for DnsSecError {
    fn from(err: crate::dns::ParseError) -> Self {
        Self::InvalidRecord(err.to_string())
    }
}
