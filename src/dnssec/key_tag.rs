/// Calculate the key tag of a DNSKEY from its RDATA (RFC 4034 Appendix B)
pub fn calculate_key_tag(rdata: &[u8]) -> u16 {
    let mut accumulator: u32 = 0;

    // even index is the high byte of its 16-bit word
    for (i, &byte) in rdata.iter().enumerate() {
        if i % 2 == 0 {
            accumulator += u32::from(byte) << 8;
        } else {
            accumulator += u32::from(byte);
        }
    }

    accumulator += (accumulator >> 16) & 0xFFFF;
    (accumulator & 0xFFFF) as u16
}
