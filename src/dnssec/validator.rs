use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, trace, warn};

use super::records::{DnsKey, Ds, Rrsig};
use super::{DigestType, DnsSecAlgorithm, DnsSecError, ValidationResult, errors::Result};
use crate::dns::enums::DNSResourceType;
use crate::dns::name::{encode_name_canonical, names_equal};
use crate::dns::resource::{DNSResource, RecordData};

/// Check that `rrsig` was made by `key` over `covered`.
///
/// `covered` is the canonical wire form of the RR set (see [`canonical_rrset`]).
/// Algorithm and key tag are compared before any cryptography runs.
pub fn verify_rrsig(rrsig: &Rrsig, key: &DnsKey, covered: &[u8]) -> Result<()> {
    if rrsig.algorithm != key.algorithm {
        return Err(DnsSecError::AlgorithmMismatch {
            expected: key.algorithm,
            actual: rrsig.algorithm,
        });
    }
    if rrsig.key_tag != key.key_tag {
        return Err(DnsSecError::KeyTagMismatch {
            expected: key.key_tag,
            actual: rrsig.key_tag,
        });
    }

    let algorithm = DnsSecAlgorithm::from_u8(rrsig.algorithm)
        .filter(DnsSecAlgorithm::is_supported)
        .ok_or(DnsSecError::UnsupportedAlgorithm(rrsig.algorithm))?;

    let mut signed_data = rrsig.signed_prefix()?;
    signed_data.extend_from_slice(covered);
    trace!(
        "Verifying {} signature over {} bytes with key tag {}",
        algorithm,
        signed_data.len(),
        key.key_tag
    );

    algorithm.verify(&key.public_key, &signed_data, &rrsig.signature)
}

/// Check that `ds` is a digest of `key`. SHA-1 digests are never accepted.
pub fn validate_dnskey_by_ds(key: &DnsKey, ds: &Ds) -> Result<()> {
    if ds.key_tag != key.key_tag {
        return Err(DnsSecError::KeyTagMismatch {
            expected: ds.key_tag,
            actual: key.key_tag,
        });
    }
    if ds.algorithm != key.algorithm {
        return Err(DnsSecError::AlgorithmMismatch {
            expected: ds.algorithm,
            actual: key.algorithm,
        });
    }

    let digest_type = DigestType::from_u8(ds.digest_type)
        .filter(DigestType::is_supported)
        .ok_or(DnsSecError::UnsupportedDigestType(ds.digest_type))?;

    let computed = digest_type
        .digest(&key.ds_digest_input()?)
        .ok_or(DnsSecError::UnsupportedDigestType(ds.digest_type))?;

    if computed != ds.digest {
        return Err(DnsSecError::DsDigestMismatch);
    }
    Ok(())
}

/// Build the canonical wire form of an RR set (RFC 4034 §6): lowercase owner,
/// the RRSIG's original TTL, embedded names lowercased, records sorted by RDATA.
pub fn canonical_rrset(records: &[&DNSResource], original_ttl: u32) -> Result<Vec<u8>> {
    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        let rdata = match &record.data {
            RecordData::CNAME(target) | RecordData::NS(target) => encode_name_canonical(target)?,
            _ => record.rdata.clone(),
        };
        entries.push((encode_name_canonical(&record.name)?, record, rdata));
    }
    entries.sort_by(|a, b| a.2.cmp(&b.2));
    entries.dedup_by(|a, b| a.2 == b.2);

    let mut out = Vec::new();
    for (owner, record, rdata) in entries {
        let rdlength = u16::try_from(rdata.len())
            .map_err(|_| DnsSecError::InvalidRecord("RDATA exceeds 65535 bytes".into()))?;
        out.extend_from_slice(&owner);
        out.extend_from_slice(&u16::from(record.rtype).to_be_bytes());
        out.extend_from_slice(&u16::from(record.rclass).to_be_bytes());
        out.extend_from_slice(&original_ttl.to_be_bytes());
        out.extend_from_slice(&rdlength.to_be_bytes());
        out.extend_from_slice(&rdata);
    }
    Ok(out)
}

/// DNSSEC validator for caller-supplied RRSIG, DNSKEY and DS material
#[derive(Debug, Default, Clone)]
pub struct DnsSecValidator {
    /// Current time for signature validation (for testing)
    current_time: Option<u32>,
}

impl DnsSecValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set current time for testing
    pub fn set_current_time(&mut self, time: u32) {
        self.current_time = Some(time);
    }

    /// Get current time as Unix timestamp
    fn get_current_time(&self) -> u32 {
        self.current_time.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as u32)
                .unwrap_or(0)
        })
    }

    fn check_signature_validity(&self, rrsig: &Rrsig) -> Result<()> {
        let now = self.get_current_time();
        if now < rrsig.inception {
            return Err(DnsSecError::SignatureNotYetValid);
        }
        if now > rrsig.expiration {
            return Err(DnsSecError::SignatureExpired);
        }
        Ok(())
    }

    /// Validate one signed RR set.
    ///
    /// Missing signature or key yields `Insecure`. With both present the DS
    /// (if any) must vouch for the key, the signature must verify, and the
    /// current time must fall inside the signature's validity window.
    pub fn validate(
        &self,
        rrsig: Option<&Rrsig>,
        key: Option<&DnsKey>,
        ds: Option<&Ds>,
        covered: &[u8],
    ) -> ValidationResult {
        let (Some(rrsig), Some(key)) = (rrsig, key) else {
            debug!("No RRSIG or DNSKEY supplied, result is insecure");
            return ValidationResult::Insecure;
        };

        match self.check_chain(rrsig, key, ds, covered) {
            Ok(()) => {
                debug!(
                    "DNSSEC validation successful for {} signed by {}",
                    rrsig.type_covered, rrsig.signer_name
                );
                ValidationResult::Secure
            }
            Err(e) => {
                warn!("DNSSEC validation failed: {}", e);
                ValidationResult::Bogus(e.to_string())
            }
        }
    }

    fn check_chain(
        &self,
        rrsig: &Rrsig,
        key: &DnsKey,
        ds: Option<&Ds>,
        covered: &[u8],
    ) -> Result<()> {
        if let Some(ds) = ds {
            validate_dnskey_by_ds(key, ds)?;
        }
        verify_rrsig(rrsig, key, covered)?;
        self.check_signature_validity(rrsig)
    }

    /// Validate the `rtype` RR set owned by `name` using the RRSIG found among
    /// `records`, building the canonical form itself.
    pub fn validate_rrset(
        &self,
        records: &[DNSResource],
        name: &str,
        rtype: DNSResourceType,
        key: Option<&DnsKey>,
        ds: Option<&Ds>,
    ) -> ValidationResult {
        let rrset: Vec<&DNSResource> = records
            .iter()
            .filter(|r| r.rtype == rtype && names_equal(&r.name, name))
            .collect();
        if rrset.is_empty() {
            return ValidationResult::Bogus(format!("no {} records for {}", rtype, name));
        }

        let rrsig = records.iter().find_map(|r| match &r.data {
            RecordData::RRSIG(sig) if sig.type_covered == rtype && names_equal(&r.name, name) => {
                Some(sig)
            }
            _ => None,
        });
        let Some(rrsig) = rrsig else {
            debug!("No RRSIG covering {} {}, result is insecure", name, rtype);
            return ValidationResult::Insecure;
        };

        match canonical_rrset(&rrset, rrsig.original_ttl) {
            Ok(covered) => self.validate(Some(rrsig), key, ds, &covered),
            Err(e) => ValidationResult::Bogus(e.to_string()),
        }
    }
}
