use std::fmt;

use ring::signature::{self, RsaPublicKeyComponents, UnparsedPublicKey};

use super::{DnsSecError, errors::Result};

/// DNSSEC algorithm numbers this crate knows by name (RFC 4034, 5702, 6605, 8080)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DnsSecAlgorithm {
    /// RSA/SHA-1 (RFC 3110)
    RsaSha1 = 5,
    /// RSASHA1-NSEC3-SHA1 (RFC 5155)
    RsaSha1Nsec3Sha1 = 7,
    /// RSA/SHA-256 (RFC 5702)
    RsaSha256 = 8,
    /// RSA/SHA-512 (RFC 5702)
    RsaSha512 = 10,
    /// ECDSA Curve P-256 with SHA-256 (RFC 6605)
    EcdsaP256Sha256 = 13,
    /// ECDSA Curve P-384 with SHA-384 (RFC 6605)
    EcdsaP384Sha384 = 14,
    /// Ed25519 (RFC 8080)
    Ed25519 = 15,
}

impl DnsSecAlgorithm {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            5 => Some(Self::RsaSha1),
            7 => Some(Self::RsaSha1Nsec3Sha1),
            8 => Some(Self::RsaSha256),
            10 => Some(Self::RsaSha512),
            13 => Some(Self::EcdsaP256Sha256),
            14 => Some(Self::EcdsaP384Sha384),
            15 => Some(Self::Ed25519),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Algorithms `verify` will accept. Everything else fails closed.
    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            Self::RsaSha256 | Self::RsaSha512 | Self::EcdsaP256Sha256 | Self::EcdsaP384Sha384
        )
    }

    /// Verify `signature` over `message` with a DNSKEY public key in wire form.
    pub fn verify(&self, public_key: &[u8], message: &[u8], sig: &[u8]) -> Result<()> {
        match self {
            Self::RsaSha256 => verify_rsa(
                &signature::RSA_PKCS1_1024_8192_SHA256_FOR_LEGACY_USE_ONLY,
                public_key,
                message,
                sig,
            ),
            Self::RsaSha512 => verify_rsa(
                &signature::RSA_PKCS1_1024_8192_SHA512_FOR_LEGACY_USE_ONLY,
                public_key,
                message,
                sig,
            ),
            Self::EcdsaP256Sha256 => verify_ecdsa(
                &signature::ECDSA_P256_SHA256_FIXED,
                32,
                public_key,
                message,
                sig,
            ),
            Self::EcdsaP384Sha384 => verify_ecdsa(
                &signature::ECDSA_P384_SHA384_FIXED,
                48,
                public_key,
                message,
                sig,
            ),
            other => Err(DnsSecError::UnsupportedAlgorithm(other.to_u8())),
        }
    }
}

/// Split an RFC 3110 RSA public key into (exponent, modulus).
pub fn parse_rsa_public_key(key: &[u8]) -> Result<(&[u8], &[u8])> {
    let (exp_len, rest) = match key.split_first() {
        Some((0, rest)) if rest.len() >= 2 => {
            (usize::from(u16::from_be_bytes([rest[0], rest[1]])), &rest[2..])
        }
        Some((&len, rest)) if len != 0 => (usize::from(len), rest),
        _ => return Err(DnsSecError::InvalidPublicKey),
    };

    if exp_len == 0 || rest.len() <= exp_len {
        return Err(DnsSecError::InvalidPublicKey);
    }
    let (exponent, modulus) = rest.split_at(exp_len);
    Ok((strip_leading_zeros(exponent), strip_leading_zeros(modulus)))
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[first..]
}

fn verify_rsa(
    params: &'static signature::RsaParameters,
    public_key: &[u8],
    message: &[u8],
    sig: &[u8],
) -> Result<()> {
    let (e, n) = parse_rsa_public_key(public_key)?;
    RsaPublicKeyComponents { n, e }
        .verify(params, message, sig)
        .map_err(|_| DnsSecError::SignatureVerificationFailed)
}

fn verify_ecdsa(
    alg: &'static signature::EcdsaVerificationAlgorithm,
    coordinate_len: usize,
    public_key: &[u8],
    message: &[u8],
    sig: &[u8],
) -> Result<()> {
    if public_key.len() != coordinate_len * 2 {
        return Err(DnsSecError::InvalidPublicKey);
    }
    if sig.len() != coordinate_len * 2 {
        return Err(DnsSecError::InvalidSignature);
    }

    // DNSKEY carries bare X || Y; ring expects an uncompressed SEC1 point
    let mut point = Vec::with_capacity(public_key.len() + 1);
    point.push(0x04);
    point.extend_from_slice(public_key);

    UnparsedPublicKey::new(alg, point)
        .verify(message, sig)
        .map_err(|_| DnsSecError::SignatureVerificationFailed)
}

impl fmt::Display for DnsSecAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RsaSha1 => write!(f, "RSASHA1"),
            Self::RsaSha1Nsec3Sha1 => write!(f, "RSASHA1-NSEC3-SHA1"),
            Self::RsaSha256 => write!(f, "RSASHA256"),
            Self::RsaSha512 => write!(f, "RSASHA512"),
            Self::EcdsaP256Sha256 => write!(f, "ECDSAP256SHA256"),
            Self::EcdsaP384Sha384 => write!(f, "ECDSAP384SHA384"),
            Self::Ed25519 => write!(f, "ED25519"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_set() {
        for alg in [8, 10, 13, 14] {
            assert!(DnsSecAlgorithm::from_u8(alg).unwrap().is_supported());
        }
        for alg in [5, 7, 15] {
            assert!(!DnsSecAlgorithm::from_u8(alg).unwrap().is_supported());
        }
        assert_eq!(DnsSecAlgorithm::from_u8(3), None);
    }

    #[test]
    fn test_rsa_key_short_exponent() {
        let key = [3, 0x01, 0x00, 0x01, 0x00, 0xC5, 0x11];
        let (e, n) = parse_rsa_public_key(&key).unwrap();
        assert_eq!(e, &[0x01, 0x00, 0x01]);
        assert_eq!(n, &[0xC5, 0x11]);
    }

    #[test]
    fn test_rsa_key_long_exponent() {
        let key = [0, 0, 1, 3, 0xAA, 0xBB];
        let (e, n) = parse_rsa_public_key(&key).unwrap();
        assert_eq!(e, &[3]);
        assert_eq!(n, &[0xAA, 0xBB]);
    }

    #[test]
    fn test_rsa_key_without_modulus() {
        assert_eq!(
            parse_rsa_public_key(&[3, 1, 0, 1]),
            Err(DnsSecError::InvalidPublicKey)
        );
        assert_eq!(parse_rsa_public_key(&[]), Err(DnsSecError::InvalidPublicKey));
    }

    #[test]
    fn test_unsupported_fails_closed() {
        let result = DnsSecAlgorithm::RsaSha1.verify(&[3, 1, 0, 1, 9], b"msg", b"sig");
        assert_eq!(result, Err(DnsSecError::UnsupportedAlgorithm(5)));
    }

    #[test]
    fn test_ecdsa_wrong_lengths() {
        let alg = DnsSecAlgorithm::EcdsaP256Sha256;
        assert_eq!(
            alg.verify(&[1; 63], b"msg", &[0; 64]),
            Err(DnsSecError::InvalidPublicKey)
        );
        assert_eq!(
            alg.verify(&[1; 64], b"msg", &[0; 65]),
            Err(DnsSecError::InvalidSignature)
        );
    }
}
