use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use bytes::{BufMut, BytesMut};

use super::{
    ParseError,
    enums::{DNSResourceClass, DNSResourceType},
    name::{decode_name, encode_name, names_equal},
    read_u16, read_u32,
};
use crate::dnssec::records::{DnsKey, Ds, Rrsig};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSResource {
    pub name: String,
    pub rtype: DNSResourceType,
    pub rclass: DNSResourceClass,
    pub ttl: u32,
    /// RDATA with any embedded names expanded, safe to re-serialize.
    pub rdata: Vec<u8>,
    pub data: RecordData,
}

/// Typed view of a record's RDATA.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RecordData {
    #[default]
    Empty,
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    CNAME(String),
    NS(String),
    RRSIG(Rrsig),
    DNSKEY(DnsKey),
    DS(Ds),
    /// Carried as raw bytes in `DNSResource::rdata`.
    Other,
}

impl RecordData {
    pub fn rtype(&self) -> Option<DNSResourceType> {
        match self {
            RecordData::A(_) => Some(DNSResourceType::A),
            RecordData::AAAA(_) => Some(DNSResourceType::AAAA),
            RecordData::CNAME(_) => Some(DNSResourceType::CNAME),
            RecordData::NS(_) => Some(DNSResourceType::NS),
            RecordData::RRSIG(_) => Some(DNSResourceType::RRSIG),
            RecordData::DNSKEY(_) => Some(DNSResourceType::DNSKEY),
            RecordData::DS(_) => Some(DNSResourceType::DS),
            RecordData::Empty | RecordData::Other => None,
        }
    }

    pub fn to_rdata(&self) -> Result<Vec<u8>, ParseError> {
        Ok(match self {
            RecordData::A(ip) => ip.octets().to_vec(),
            RecordData::AAAA(ip) => ip.octets().to_vec(),
            RecordData::CNAME(target) | RecordData::NS(target) => encode_name(target)?,
            RecordData::RRSIG(rrsig) => rrsig.to_rdata()?,
            RecordData::DNSKEY(key) => key.to_rdata(),
            RecordData::DS(ds) => ds.to_rdata(),
            RecordData::Empty | RecordData::Other => Vec::new(),
        })
    }

    /// Target name for CNAME and NS records.
    pub fn target(&self) -> Option<&str> {
        match self {
            RecordData::CNAME(t) | RecordData::NS(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordData::Empty => write!(f, "<empty>"),
            RecordData::A(ip) => write!(f, "{}", ip),
            RecordData::AAAA(ip) => write!(f, "{}", ip),
            RecordData::CNAME(t) | RecordData::NS(t) => write!(f, "{}", t),
            RecordData::RRSIG(r) => write!(
                f,
                "RRSIG {} alg={} tag={} signer={}",
                r.type_covered, r.algorithm, r.key_tag, r.signer_name
            ),
            RecordData::DNSKEY(k) => {
                write!(f, "DNSKEY flags={} alg={} tag={}", k.flags, k.algorithm, k.key_tag)
            }
            RecordData::DS(d) => write!(
                f,
                "DS tag={} alg={} digest_type={}",
                d.key_tag, d.algorithm, d.digest_type
            ),
            RecordData::Other => write!(f, "<opaque>"),
        }
    }
}

impl DNSResource {
    /// Build a class-IN record from typed data.
    pub fn new(name: &str, ttl: u32, data: RecordData) -> Result<Self, ParseError> {
        let rtype = data
            .rtype()
            .ok_or_else(|| ParseError::InvalidRecord("untyped record data".into()))?;
        Ok(Self {
            name: name.trim_end_matches('.').to_string(),
            rtype,
            rclass: DNSResourceClass::IN,
            ttl,
            rdata: data.to_rdata()?,
            data,
        })
    }

    pub fn a(name: &str, ttl: u32, ip: Ipv4Addr) -> Self {
        Self::with_rdata(name, DNSResourceType::A, ttl, ip.octets().to_vec(), RecordData::A(ip))
    }

    pub fn aaaa(name: &str, ttl: u32, ip: Ipv6Addr) -> Self {
        Self::with_rdata(
            name,
            DNSResourceType::AAAA,
            ttl,
            ip.octets().to_vec(),
            RecordData::AAAA(ip),
        )
    }

    pub fn cname(name: &str, ttl: u32, target: &str) -> Result<Self, ParseError> {
        Self::new(name, ttl, RecordData::CNAME(target.trim_end_matches('.').to_string()))
    }

    pub fn ns(name: &str, ttl: u32, host: &str) -> Result<Self, ParseError> {
        Self::new(name, ttl, RecordData::NS(host.trim_end_matches('.').to_string()))
    }

    fn with_rdata(
        name: &str,
        rtype: DNSResourceType,
        ttl: u32,
        rdata: Vec<u8>,
        data: RecordData,
    ) -> Self {
        Self {
            name: name.trim_end_matches('.').to_string(),
            rtype,
            rclass: DNSResourceClass::IN,
            ttl,
            rdata,
            data,
        }
    }

    /// Case-insensitive owner name comparison.
    pub fn is_owned_by(&self, name: &str) -> bool {
        names_equal(&self.name, name)
    }

    pub fn write(&self, out: &mut BytesMut) -> Result<(), ParseError> {
        let rdlength = u16::try_from(self.rdata.len())
            .map_err(|_| ParseError::InvalidRecord("RDATA exceeds 65535 bytes".into()))?;
        out.put_slice(&encode_name(&self.name)?);
        out.put_u16(self.rtype.into());
        out.put_u16(self.rclass.into());
        out.put_u32(self.ttl);
        out.put_u16(rdlength);
        out.put_slice(&self.rdata);
        Ok(())
    }

    /// Read one resource record at `offset`, returning it and the offset after it.
    pub fn read(buf: &[u8], offset: usize) -> Result<(Self, usize), ParseError> {
        let (name, pos) = decode_name(buf, offset)?;
        let rtype: DNSResourceType = read_u16(buf, pos)?.into();
        let rclass = read_u16(buf, pos + 2)?.into();
        let ttl = read_u32(buf, pos + 4)?;
        let rdlength = usize::from(read_u16(buf, pos + 8)?);
        let start = pos + 10;
        let end = start + rdlength;
        let raw = buf.get(start..end).ok_or(ParseError::Truncated)?;

        let data = match rtype {
            DNSResourceType::A => {
                let octets: [u8; 4] = raw
                    .try_into()
                    .map_err(|_| ParseError::InvalidRecord(format!("A rdlength {}", rdlength)))?;
                RecordData::A(Ipv4Addr::from(octets))
            }
            DNSResourceType::AAAA => {
                let octets: [u8; 16] = raw.try_into().map_err(|_| {
                    ParseError::InvalidRecord(format!("AAAA rdlength {}", rdlength))
                })?;
                RecordData::AAAA(Ipv6Addr::from(octets))
            }
            // names inside RDATA may point anywhere in the message
            DNSResourceType::CNAME => RecordData::CNAME(decode_name(buf, start)?.0),
            DNSResourceType::NS => RecordData::NS(decode_name(buf, start)?.0),
            DNSResourceType::RRSIG => RecordData::RRSIG(
                Rrsig::parse_in_message(buf, start, rdlength)
                    .map_err(|e| ParseError::InvalidRecord(e.to_string()))?,
            ),
            DNSResourceType::DNSKEY => RecordData::DNSKEY(
                DnsKey::parse_with_owner(raw, &name)
                    .map_err(|e| ParseError::InvalidRecord(e.to_string()))?,
            ),
            DNSResourceType::DS => RecordData::DS(
                Ds::parse(raw).map_err(|e| ParseError::InvalidRecord(e.to_string()))?,
            ),
            _ => RecordData::Other,
        };

        let rdata = match data {
            RecordData::CNAME(_) | RecordData::NS(_) | RecordData::RRSIG(_) => data.to_rdata()?,
            _ => raw.to_vec(),
        };

        Ok((
            Self {
                name,
                rtype,
                rclass,
                ttl,
                rdata,
                data,
            },
            end,
        ))
    }
}
