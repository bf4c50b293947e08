//! RRSIG, DNSKEY and DS RDATA layouts (RFC 4034 §2, §3, §5).

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};

use super::{DigestType, DnsSecError, calculate_key_tag, errors::Result};
use crate::dns::ParseError;
use crate::dns::enums::DNSResourceType;
use crate::dns::name::{decode_name, encode_name, encode_name_canonical, normalize_name};
use crate::dns::{read_u16, read_u32};

/// Fixed-width RRSIG fields before the signer name.
const RRSIG_FIXED_LEN: usize = 18;

/// DNSKEY flag: zone key
pub const FLAG_ZONE_KEY: u16 = 0x0100;
/// DNSKEY flag: secure entry point
pub const FLAG_SEP: u16 = 0x0001;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rrsig {
    pub type_covered: DNSResourceType,
    pub algorithm: u8,
    pub labels: u8,
    pub original_ttl: u32,
    pub expiration: u32,
    pub inception: u32,
    pub key_tag: u16,
    pub signer_name: String,
    pub signature: Vec<u8>,
}

impl Rrsig {
    /// Parse standalone RRSIG RDATA (signer name must be uncompressed).
    pub fn parse(rdata: &[u8]) -> Result<Self> {
        Self::parse_in_message(rdata, 0, rdata.len())
    }

    /// Parse RRSIG RDATA located at `start` inside a full message, so a
    /// compressed signer name can be followed.
    pub fn parse_in_message(buf: &[u8], start: usize, rdlength: usize) -> Result<Self> {
        let end = start + rdlength;
        if rdlength < RRSIG_FIXED_LEN + 1 || buf.len() < end {
            return Err(DnsSecError::InvalidRecord(format!(
                "RRSIG rdlength {} too short",
                rdlength
            )));
        }

        let (signer_name, sig_start) = decode_name(buf, start + RRSIG_FIXED_LEN)?;
        if sig_start >= end {
            return Err(DnsSecError::InvalidSignature);
        }

        Ok(Self {
            type_covered: read_u16(buf, start)?.into(),
            algorithm: buf[start + 2],
            labels: buf[start + 3],
            original_ttl: read_u32(buf, start + 4)?,
            expiration: read_u32(buf, start + 8)?,
            inception: read_u32(buf, start + 12)?,
            key_tag: read_u16(buf, start + 16)?,
            signer_name,
            signature: buf[sig_start..end].to_vec(),
        })
    }

    /// RDATA fields through the key tag followed by the lowercase signer name.
    /// This is the head of every signed octet stream.
    pub fn signed_prefix(&self) -> Result<Vec<u8>> {
        let mut out = self.fixed_fields();
        out.extend_from_slice(&encode_name_canonical(&self.signer_name)?);
        Ok(out)
    }

    pub fn to_rdata(&self) -> std::result::Result<Vec<u8>, ParseError> {
        let mut out = self.fixed_fields();
        out.extend_from_slice(&encode_name(&self.signer_name)?);
        out.extend_from_slice(&self.signature);
        Ok(out)
    }

    fn fixed_fields(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(RRSIG_FIXED_LEN + self.signer_name.len() + 2);
        out.extend_from_slice(&u16::from(self.type_covered).to_be_bytes());
        out.push(self.algorithm);
        out.push(self.labels);
        out.extend_from_slice(&self.original_ttl.to_be_bytes());
        out.extend_from_slice(&self.expiration.to_be_bytes());
        out.extend_from_slice(&self.inception.to_be_bytes());
        out.extend_from_slice(&self.key_tag.to_be_bytes());
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsKey {
    /// Owner name, normalized. Empty for the root zone.
    pub owner: String,
    pub flags: u16,
    pub protocol: u8,
    pub algorithm: u8,
    pub public_key: Vec<u8>,
    /// Derived from the RDATA, never read off the wire.
    pub key_tag: u16,
}

impl DnsKey {
    pub fn new(flags: u16, protocol: u8, algorithm: u8, public_key: Vec<u8>) -> Self {
        let mut key = Self {
            owner: String::new(),
            flags,
            protocol,
            algorithm,
            public_key,
            key_tag: 0,
        };
        key.key_tag = calculate_key_tag(&key.to_rdata());
        key
    }

    /// Parse bare DNSKEY RDATA. The owner is left as the root zone, which the
    /// DS digest covers; use [`parse_with_owner`](Self::parse_with_owner) for
    /// keys of any other zone.
    pub fn parse(rdata: &[u8]) -> Result<Self> {
        if rdata.len() < 4 {
            return Err(DnsSecError::InvalidRecord(format!(
                "DNSKEY rdlength {} too short",
                rdata.len()
            )));
        }
        Ok(Self {
            owner: String::new(),
            flags: u16::from_be_bytes([rdata[0], rdata[1]]),
            protocol: rdata[2],
            algorithm: rdata[3],
            public_key: rdata[4..].to_vec(),
            key_tag: calculate_key_tag(rdata),
        })
    }

    pub fn parse_with_owner(rdata: &[u8], owner: &str) -> Result<Self> {
        Ok(Self::parse(rdata)?.with_owner(owner))
    }

    /// Build a key from its zone-file form, where the public key is base64
    /// and may be split by whitespace.
    pub fn from_presentation(flags: u16, protocol: u8, algorithm: u8, key: &str) -> Result<Self> {
        let compact: String = key.split_whitespace().collect();
        let public_key = BASE64
            .decode(compact)
            .map_err(|e| DnsSecError::InvalidRecord(format!("DNSKEY base64: {}", e)))?;
        Ok(Self::new(flags, protocol, algorithm, public_key))
    }

    pub fn public_key_base64(&self) -> String {
        BASE64.encode(&self.public_key)
    }

    pub fn with_owner(mut self, owner: &str) -> Self {
        self.owner = normalize_name(owner);
        self
    }

    pub fn is_zone_key(&self) -> bool {
        self.flags & FLAG_ZONE_KEY != 0
    }

    pub fn is_sep(&self) -> bool {
        self.flags & FLAG_SEP != 0
    }

    pub fn to_rdata(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.public_key.len());
        out.extend_from_slice(&self.flags.to_be_bytes());
        out.push(self.protocol);
        out.push(self.algorithm);
        out.extend_from_slice(&self.public_key);
        out
    }

    /// Digest input for a DS record: canonical owner name then RDATA (RFC 4034 §5.1.4).
    pub fn ds_digest_input(&self) -> Result<Vec<u8>> {
        let mut data = encode_name_canonical(&self.owner)?;
        data.extend_from_slice(&self.to_rdata());
        Ok(data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ds {
    pub key_tag: u16,
    pub algorithm: u8,
    pub digest_type: u8,
    pub digest: Vec<u8>,
}

impl Ds {
    pub fn parse(rdata: &[u8]) -> Result<Self> {
        if rdata.len() < 5 {
            return Err(DnsSecError::InvalidRecord(format!(
                "DS rdlength {} too short",
                rdata.len()
            )));
        }
        Ok(Self {
            key_tag: u16::from_be_bytes([rdata[0], rdata[1]]),
            algorithm: rdata[2],
            digest_type: rdata[3],
            digest: rdata[4..].to_vec(),
        })
    }

    /// Compute the DS record a parent zone would publish for `key`.
    pub fn from_key(key: &DnsKey, digest_type: DigestType) -> Result<Self> {
        let digest = digest_type
            .digest(&key.ds_digest_input()?)
            .ok_or(DnsSecError::UnsupportedDigestType(digest_type.to_u8()))?;
        Ok(Self {
            key_tag: key.key_tag,
            algorithm: key.algorithm,
            digest_type: digest_type.to_u8(),
            digest,
        })
    }

    pub fn to_rdata(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.digest.len());
        out.extend_from_slice(&self.key_tag.to_be_bytes());
        out.push(self.algorithm);
        out.push(self.digest_type);
        out.extend_from_slice(&self.digest);
        out
    }
}
