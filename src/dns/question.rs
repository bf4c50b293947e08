use bytes::{BufMut, BytesMut};

use super::{
    ParseError,
    enums::{DNSResourceClass, DNSResourceType},
    name::{decode_name, encode_name},
    read_u16,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSQuestion {
    pub name: String,
    pub qtype: DNSResourceType,
    pub qclass: DNSResourceClass,
}

impl DNSQuestion {
    pub fn new(name: &str, qtype: DNSResourceType) -> Self {
        Self {
            name: name.trim_end_matches('.').to_string(),
            qtype,
            qclass: DNSResourceClass::IN,
        }
    }

    pub fn write(&self, out: &mut BytesMut) -> Result<(), ParseError> {
        out.put_slice(&encode_name(&self.name)?);
        out.put_u16(self.qtype.into());
        out.put_u16(self.qclass.into());
        Ok(())
    }

    /// Read one question at `offset`, returning it and the offset after it.
    pub fn read(buf: &[u8], offset: usize) -> Result<(Self, usize), ParseError> {
        let (name, pos) = decode_name(buf, offset)?;
        let qtype = read_u16(buf, pos)?.into();
        let qclass = read_u16(buf, pos + 2)?.into();
        Ok((
            Self {
                name,
                qtype,
                qclass,
            },
            pos + 4,
        ))
    }
}
