use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};

use super::ParseError;
use super::constants::HEADER_LEN;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSHeader {
    pub id: u16,
    pub qr: bool,
    pub opcode: u8,
    pub aa: bool,
    pub tc: bool,
    pub rd: bool,
    pub ra: bool,
    pub z: u8,
    pub rcode: u8,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl DNSHeader {
    /// Header for an outgoing standard query carrying one question.
    pub fn query(id: u16, recursion_desired: bool) -> Self {
        Self {
            id,
            rd: recursion_desired,
            qdcount: 1,
            ..Default::default()
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) -> Result<(), ParseError> {
        let mut writer = BitWriter::endian(out, BigEndian);
        writer.write_var::<u16>(16, self.id)?;
        writer.write_bit(self.qr)?;
        writer.write_var::<u8>(4, self.opcode)?;
        writer.write_bit(self.aa)?;
        writer.write_bit(self.tc)?;
        writer.write_bit(self.rd)?;
        writer.write_bit(self.ra)?;
        writer.write_var::<u8>(3, self.z)?;
        writer.write_var::<u8>(4, self.rcode)?;
        writer.write_var::<u16>(16, self.qdcount)?;
        writer.write_var::<u16>(16, self.ancount)?;
        writer.write_var::<u16>(16, self.nscount)?;
        writer.write_var::<u16>(16, self.arcount)?;
        Ok(())
    }

    pub fn read(buf: &[u8]) -> Result<Self, ParseError> {
        if buf.len() < HEADER_LEN {
            return Err(ParseError::InvalidHeader);
        }
        let mut reader = BitReader::endian(&buf[..HEADER_LEN], BigEndian);
        Ok(Self {
            id: reader.read_var::<u16>(16)?,
            qr: reader.read_bit()?,
            opcode: reader.read_var::<u8>(4)?,
            aa: reader.read_bit()?,
            tc: reader.read_bit()?,
            rd: reader.read_bit()?,
            ra: reader.read_bit()?,
            z: reader.read_var::<u8>(3)?,
            rcode: reader.read_var::<u8>(4)?,
            qdcount: reader.read_var::<u16>(16)?,
            ancount: reader.read_var::<u16>(16)?,
            nscount: reader.read_var::<u16>(16)?,
            arcount: reader.read_var::<u16>(16)?,
        })
    }
}
