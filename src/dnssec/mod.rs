pub mod algorithm;
pub mod digest;
pub mod errors;
pub mod key_tag;
pub mod records;
pub mod validator;

pub use algorithm::DnsSecAlgorithm;
pub use digest::DigestType;
pub use errors::DnsSecError;
pub use key_tag::calculate_key_tag;
pub use records::{DnsKey, Ds, Rrsig};
pub use validator::{DnsSecValidator, canonical_rrset, validate_dnskey_by_ds, verify_rrsig};

/// DNSSEC validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Signature, key and (if given) DS all check out
    Secure,
    /// No signature or key was supplied, nothing to check
    Insecure,
    /// Validation failed
    Bogus(String),
}

impl ValidationResult {
    pub fn is_secure(&self) -> bool {
        matches!(self, Self::Secure)
    }

    pub fn is_bogus(&self) -> bool {
        matches!(self, Self::Bogus(_))
    }
}
