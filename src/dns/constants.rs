/// DNS Response Code constants from RFC 1035
pub struct DNSRcode;

impl DNSRcode {
    pub const NOERROR: u8 = 0;
    pub const FORMERR: u8 = 1;
    pub const SERVFAIL: u8 = 2;
    pub const NXDOMAIN: u8 = 3;
    pub const NOTIMP: u8 = 4;
    pub const REFUSED: u8 = 5;
}

/// Fixed header length in bytes.
pub const HEADER_LEN: usize = 12;

/// Longest label allowed on the wire.
pub const MAX_LABEL_LEN: usize = 63;

/// Longest encoded name allowed on the wire.
pub const MAX_NAME_LEN: usize = 255;

/// Upper bound on labels plus pointer jumps while decoding one name.
pub const MAX_NAME_STEPS: usize = 128;

/// Top two bits of a length byte mark a compression pointer.
pub const POINTER_MASK: u8 = 0xC0;

pub const DNS_PORT: u16 = 53;
pub const DOT_PORT: u16 = 853;
pub const MDNS_PORT: u16 = 5353;

/// mDNS class bit asking receivers to flush stale records (RFC 6762 §10.2).
pub const CACHE_FLUSH_BIT: u16 = 0x8000;
