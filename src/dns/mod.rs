pub mod constants;
pub mod enums;
pub mod header;
pub mod name;
pub mod question;
pub mod resource;

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};

use bytes::{BufMut, BytesMut};
use constants::{DNSRcode, HEADER_LEN};
use enums::DNSResourceType;
use header::DNSHeader;
use question::DNSQuestion;
use resource::{DNSResource, RecordData};
use tracing::trace;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSPacket {
    pub header: DNSHeader,
    pub questions: Vec<DNSQuestion>,
    pub answers: Vec<DNSResource>,
    pub authorities: Vec<DNSResource>,
    pub additionals: Vec<DNSResource>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    InvalidHeader,
    InvalidLabel,
    LabelTooLong(usize),
    NameTooLong,
    Truncated,
    PointerLoop,
    IdMismatch { expected: u16, actual: u16 },
    NotAResponse,
    UnexpectedRcode(u8),
    InvalidRecord(String),
    InvalidBitStream(String),
}

impl From<std::io::Error> for ParseError {
    fn from(e: std::io::Error) -> Self {
        ParseError::InvalidBitStream(e.to_string())
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidHeader => write!(f, "Invalid DNS header"),
            ParseError::InvalidLabel => write!(f, "Invalid DNS label"),
            ParseError::LabelTooLong(len) => write!(f, "Label of {} bytes exceeds 63", len),
            ParseError::NameTooLong => write!(f, "DNS name exceeds 255 bytes"),
            ParseError::Truncated => write!(f, "Message truncated"),
            ParseError::PointerLoop => write!(f, "Compression pointer loop"),
            ParseError::IdMismatch { expected, actual } => {
                write!(f, "ID mismatch: expected {}, got {}", expected, actual)
            }
            ParseError::NotAResponse => write!(f, "Message is not a response"),
            ParseError::UnexpectedRcode(rcode) => write!(f, "Unexpected RCODE {}", rcode),
            ParseError::InvalidRecord(e) => write!(f, "Invalid record: {}", e),
            ParseError::InvalidBitStream(e) => write!(f, "Invalid bit stream: {}", e),
        }
    }
}

impl std::error::Error for ParseError {}

pub(crate) fn read_u16(buf: &[u8], pos: usize) -> Result<u16, ParseError> {
    let bytes = buf.get(pos..pos + 2).ok_or(ParseError::Truncated)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

pub(crate) fn read_u32(buf: &[u8], pos: usize) -> Result<u32, ParseError> {
    let bytes = buf.get(pos..pos + 4).ok_or(ParseError::Truncated)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Encode a single-question query. `recursive` sets RD (stub mode); iterative
/// queries clear it.
pub fn build_query(
    id: u16,
    name: &str,
    qtype: DNSResourceType,
    recursive: bool,
) -> Result<Vec<u8>, ParseError> {
    let mut header = Vec::with_capacity(HEADER_LEN);
    DNSHeader::query(id, recursive).write(&mut header)?;

    let mut out = BytesMut::with_capacity(HEADER_LEN + name.len() + 6);
    out.put_slice(&header);
    DNSQuestion::new(name, qtype).write(&mut out)?;
    Ok(out.to_vec())
}

impl DNSPacket {
    /// Structural parse of any DNS message, with no response checks.
    pub fn parse(buf: &[u8]) -> Result<Self, ParseError> {
        trace!("Parsing DNS message, size: {} bytes", buf.len());
        let header = DNSHeader::read(buf)?;
        let mut pos = HEADER_LEN;
        let mut packet = DNSPacket {
            header,
            ..Default::default()
        };

        for _ in 0..packet.header.qdcount {
            let (question, next) = DNSQuestion::read(buf, pos)?;
            packet.questions.push(question);
            pos = next;
        }
        for _ in 0..packet.header.ancount {
            let (record, next) = DNSResource::read(buf, pos)?;
            packet.answers.push(record);
            pos = next;
        }
        for _ in 0..packet.header.nscount {
            let (record, next) = DNSResource::read(buf, pos)?;
            packet.authorities.push(record);
            pos = next;
        }
        for _ in 0..packet.header.arcount {
            let (record, next) = DNSResource::read(buf, pos)?;
            packet.additionals.push(record);
            pos = next;
        }

        Ok(packet)
    }

    /// Parse a reply to a query sent with `expected_id`.
    ///
    /// Anything other than a well-formed NOERROR/NXDOMAIN response carrying
    /// that ID is an error; callers treat those the same as a timeout.
    pub fn parse_response(buf: &[u8], expected_id: u16) -> Result<Self, ParseError> {
        let header = DNSHeader::read(buf)?;
        if header.id != expected_id {
            return Err(ParseError::IdMismatch {
                expected: expected_id,
                actual: header.id,
            });
        }
        if !header.qr {
            return Err(ParseError::NotAResponse);
        }
        if header.rcode != DNSRcode::NOERROR && header.rcode != DNSRcode::NXDOMAIN {
            return Err(ParseError::UnexpectedRcode(header.rcode));
        }
        Self::parse(buf)
    }

    /// Uncompressed encoding; section counts are taken from the vectors.
    pub fn serialize(&self) -> Result<Vec<u8>, ParseError> {
        let mut header = self.header.clone();
        header.qdcount = self.questions.len() as u16;
        header.ancount = self.answers.len() as u16;
        header.nscount = self.authorities.len() as u16;
        header.arcount = self.additionals.len() as u16;

        let mut head = Vec::with_capacity(HEADER_LEN);
        header.write(&mut head)?;

        let mut out = BytesMut::with_capacity(512);
        out.put_slice(&head);
        for question in &self.questions {
            question.write(&mut out)?;
        }
        for record in self
            .answers
            .iter()
            .chain(&self.authorities)
            .chain(&self.additionals)
        {
            record.write(&mut out)?;
        }
        Ok(out.to_vec())
    }

    pub fn is_nxdomain(&self) -> bool {
        self.header.rcode == DNSRcode::NXDOMAIN
    }

    /// Smallest TTL across the answer section.
    pub fn min_answer_ttl(&self) -> Option<u32> {
        self.answers.iter().map(|rr| rr.ttl).min()
    }

    /// NS hostnames named in the authority section, in order, without duplicates.
    pub fn referral_nameservers(&self) -> Vec<String> {
        let mut hosts: Vec<String> = Vec::new();
        for record in &self.authorities {
            if let RecordData::NS(host) = &record.data {
                let host = name::normalize_name(host);
                if !hosts.contains(&host) {
                    hosts.push(host);
                }
            }
        }
        hosts
    }

    /// Lowercased hostname to IPv4 map from the additional section's A records.
    pub fn glue(&self) -> HashMap<String, Ipv4Addr> {
        let mut glue = HashMap::new();
        for record in &self.additionals {
            if let RecordData::A(ip) = record.data {
                glue.entry(name::normalize_name(&record.name)).or_insert(ip);
            }
        }
        glue
    }

    /// Address for `name` from this message's answers alone, following any
    /// CNAME chain the server included (at most `max_hops` links).
    pub fn answer_address(
        &self,
        name: &str,
        qtype: DNSResourceType,
        max_hops: usize,
    ) -> Option<(IpAddr, u32)> {
        let mut current = name.to_string();
        for _ in 0..=max_hops {
            let owned = || self.answers.iter().filter(|rr| rr.is_owned_by(&current));
            let address = owned().find_map(|rr| match (&rr.data, qtype) {
                (RecordData::A(ip), DNSResourceType::A) => Some((IpAddr::V4(*ip), rr.ttl)),
                (RecordData::AAAA(ip), DNSResourceType::AAAA) => Some((IpAddr::V6(*ip), rr.ttl)),
                _ => None,
            });
            if address.is_some() {
                return address;
            }
            let next = owned().find_map(|rr| match &rr.data {
                RecordData::CNAME(target) => Some(target.clone()),
                _ => None,
            })?;
            current = next;
        }
        None
    }
}
