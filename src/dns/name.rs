//! Domain name wire encoding (RFC 1035 §3.1, §4.1.4).

use smallvec::SmallVec;

use super::ParseError;
use super::constants::{MAX_LABEL_LEN, MAX_NAME_LEN, MAX_NAME_STEPS, POINTER_MASK};

/// Encode a dotted name as length-prefixed labels with a zero terminator.
///
/// Empty labels (leading, trailing or doubled dots) are skipped, so `"a..b."`
/// encodes the same as `"a.b"`.
pub fn encode_name(name: &str) -> Result<Vec<u8>, ParseError> {
    let mut out = Vec::with_capacity(name.len() + 2);
    for label in name.split('.').filter(|l| !l.is_empty()) {
        if label.len() > MAX_LABEL_LEN {
            return Err(ParseError::LabelTooLong(label.len()));
        }
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);

    if out.len() > MAX_NAME_LEN {
        return Err(ParseError::NameTooLong);
    }
    Ok(out)
}

/// Canonical (RFC 4034 §6.2) form: lowercase labels, no compression.
pub fn encode_name_canonical(name: &str) -> Result<Vec<u8>, ParseError> {
    encode_name(&name.to_ascii_lowercase())
}

/// Decode a possibly compressed name starting at `offset`.
///
/// Returns the dotted name (no trailing dot, empty for the root) and the
/// cursor where the caller continues reading. When a pointer is followed the
/// cursor is the byte after the *first* pointer in the original stream, not a
/// position inside the jumped-to region.
pub fn decode_name(buf: &[u8], offset: usize) -> Result<(String, usize), ParseError> {
    let mut labels: SmallVec<[String; 8]> = SmallVec::new();
    let mut pos = offset;
    let mut resume = None;
    let mut steps = 0;

    loop {
        steps += 1;
        if steps > MAX_NAME_STEPS {
            return Err(ParseError::PointerLoop);
        }

        let len = *buf.get(pos).ok_or(ParseError::Truncated)?;

        if len & POINTER_MASK == POINTER_MASK {
            let low = *buf.get(pos + 1).ok_or(ParseError::Truncated)?;
            let target = (usize::from(len & !POINTER_MASK) << 8) | usize::from(low);
            if resume.is_none() {
                resume = Some(pos + 2);
            }
            pos = target;
            continue;
        }

        // 0b01 and 0b10 prefixes are reserved
        if len & POINTER_MASK != 0 {
            return Err(ParseError::InvalidLabel);
        }

        if len == 0 {
            pos += 1;
            break;
        }

        let start = pos + 1;
        let end = start + usize::from(len);
        let bytes = buf.get(start..end).ok_or(ParseError::Truncated)?;
        let label = std::str::from_utf8(bytes).map_err(|_| ParseError::InvalidLabel)?;
        labels.push(label.to_string());
        pos = end;
    }

    Ok((labels.join("."), resume.unwrap_or(pos)))
}

/// Lowercase and strip a trailing root dot, for case-insensitive comparison.
pub fn normalize_name(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

pub fn names_equal(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}
