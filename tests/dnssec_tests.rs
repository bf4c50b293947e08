use std::net::Ipv4Addr;

use ring::rand::SystemRandom;
use ring::signature::{
    ECDSA_P384_SHA384_FIXED_SIGNING, EcdsaKeyPair, KeyPair, RSA_PKCS1_SHA256, RSA_PKCS1_SHA512,
    RsaEncoding, RsaKeyPair, RsaPublicKeyComponents,
};
use wayfinder::dns::{
    DNSPacket,
    enums::DNSResourceType,
    resource::{DNSResource, RecordData},
};
use wayfinder::dnssec::{
    DigestType, DnsKey, DnsSecError, DnsSecValidator, Ds, Rrsig, ValidationResult,
    canonical_rrset, validate_dnskey_by_ds,
};

const NOW: u32 = 1_735_689_600;

/// Root zone KSK-2017 public key as published in the root zone
const ROOT_KSK_2017: &str = "AwEAAaz/tAm8yTn4Mfeh5eyI96WSVexTBAvkMgJzkKTOiW1vkIbzxeF3+/4RgWOq7HrxRixHlFlExOLAJr5emLvN7SWXgnLh4+B5xQlNVz8Og8kvArMtNROxVQuCaSnIDdD5LKyWbRd2n9WGe2R8PzgCmr3EgVLrjyBxWezF0jLHwVN8efS3rCj/EWgvIWgb9tarpVUDK/b58Da+sqqls3eNbuv7pr+eoZG+SrDK6nWeL3c6H5Apxz7LjVc1uTIdsIXxuOLYA4/ilBmSVIzuDWfdRUfhHdY6+cn8HFRm+2hM8AnXGXws9555KrUB5qihylGa8subX2Nn6UwNR1AkUTV74bU=";

/// 2048-bit RSA key (PKCS#8) used to sign the RSA/SHA-2 fixtures
const RSA_2048_PKCS8: &[u8] = include_bytes!("data/rsa_2048.pk8");

const ROOT_KSK_2017_DS_SHA256: &str =
    "e06d44b80b8f1d39a95c0b0d7c65d08458e880409bbc683457104237c7f8ec8d";

fn root_ksk() -> DnsKey {
    DnsKey::from_presentation(257, 3, 8, ROOT_KSK_2017)
        .unwrap()
        .with_owner(".")
}

#[test]
fn test_root_ksk_trust_anchor() {
    let key = root_ksk();
    assert_eq!(key.key_tag, 20326);
    assert!(key.is_sep());

    let ds = Ds {
        key_tag: 20326,
        algorithm: 8,
        digest_type: 2,
        digest: hex::decode(ROOT_KSK_2017_DS_SHA256).unwrap(),
    };
    assert_eq!(validate_dnskey_by_ds(&key, &ds), Ok(()));
    assert_eq!(Ds::from_key(&key, DigestType::Sha256).unwrap(), ds);
}

#[test]
fn test_root_ksk_rejects_altered_digest_and_sha1() {
    let key = root_ksk();
    let mut digest = hex::decode(ROOT_KSK_2017_DS_SHA256).unwrap();
    digest[0] ^= 0x01;
    let altered = Ds {
        key_tag: 20326,
        algorithm: 8,
        digest_type: 2,
        digest,
    };
    assert_eq!(
        validate_dnskey_by_ds(&key, &altered),
        Err(DnsSecError::DsDigestMismatch)
    );

    let sha1 = Ds {
        key_tag: 20326,
        algorithm: 8,
        digest_type: 1,
        digest: vec![0; 20],
    };
    assert!(validate_dnskey_by_ds(&key, &sha1).is_err());
}

struct Zone {
    pair: EcdsaKeyPair,
    key: DnsKey,
    rng: SystemRandom,
}

impl Zone {
    fn new() -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P384_SHA384_FIXED_SIGNING, &rng).unwrap();
        let pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P384_SHA384_FIXED_SIGNING, pkcs8.as_ref(), &rng)
                .unwrap();
        let key = DnsKey::new(257, 3, 14, pair.public_key().as_ref()[1..].to_vec())
            .with_owner("example.com");
        Self { pair, key, rng }
    }

    fn sign(&self, records: &[DNSResource]) -> DNSResource {
        let refs: Vec<&DNSResource> = records.iter().collect();
        let mut rrsig = Rrsig {
            type_covered: records[0].rtype,
            algorithm: 14,
            labels: 3,
            original_ttl: 300,
            expiration: NOW + 7 * 86_400,
            inception: NOW - 86_400,
            key_tag: self.key.key_tag,
            signer_name: "example.com".to_string(),
            signature: Vec::new(),
        };
        let mut data = rrsig.signed_prefix().unwrap();
        data.extend_from_slice(&canonical_rrset(&refs, 300).unwrap());
        rrsig.signature = self.pair.sign(&self.rng, &data).unwrap().as_ref().to_vec();
        DNSResource::new(&records[0].name, 300, RecordData::RRSIG(rrsig)).unwrap()
    }
}

fn signed_response(zone: &Zone) -> Vec<u8> {
    let records = vec![
        DNSResource::a("www.example.com", 300, Ipv4Addr::new(192, 0, 2, 2)),
        DNSResource::a("www.example.com", 300, Ipv4Addr::new(192, 0, 2, 1)),
    ];
    let rrsig = zone.sign(&records);

    let mut packet = DNSPacket::default();
    packet.header.qr = true;
    packet.answers = records;
    packet.answers.push(rrsig);
    packet.serialize().unwrap()
}

fn dnskey_from_wire(zone: &Zone) -> DnsKey {
    let mut packet = DNSPacket::default();
    packet.header.qr = true;
    packet.answers.push(
        DNSResource::new("example.com", 3600, RecordData::DNSKEY(zone.key.clone())).unwrap(),
    );
    let parsed = DNSPacket::parse(&packet.serialize().unwrap()).unwrap();
    match &parsed.answers[0].data {
        RecordData::DNSKEY(key) => key.clone(),
        other => panic!("expected DNSKEY, got {:?}", other),
    }
}

fn validator() -> DnsSecValidator {
    let mut validator = DnsSecValidator::new();
    validator.set_current_time(NOW);
    validator
}

#[test]
fn test_signed_rrset_over_the_wire_is_secure() {
    let zone = Zone::new();
    let key = dnskey_from_wire(&zone);
    assert_eq!(key.owner, "example.com");
    assert_eq!(key.key_tag, zone.key.key_tag);

    let ds = Ds::from_key(&key, DigestType::Sha384).unwrap();
    let response = DNSPacket::parse(&signed_response(&zone)).unwrap();

    let result = validator().validate_rrset(
        &response.answers,
        "WWW.example.com",
        DNSResourceType::A,
        Some(&key),
        Some(&ds),
    );
    assert_eq!(result, ValidationResult::Secure);
}

#[test]
fn test_tampered_answer_is_bogus() {
    let zone = Zone::new();
    let key = dnskey_from_wire(&zone);
    let mut response = DNSPacket::parse(&signed_response(&zone)).unwrap();
    response.answers[0] = DNSResource::a("www.example.com", 300, Ipv4Addr::new(203, 0, 113, 66));

    let result = validator().validate_rrset(
        &response.answers,
        "www.example.com",
        DNSResourceType::A,
        Some(&key),
        None,
    );
    assert!(result.is_bogus());
}

#[test]
fn test_expired_signature_is_bogus() {
    let zone = Zone::new();
    let key = dnskey_from_wire(&zone);
    let response = DNSPacket::parse(&signed_response(&zone)).unwrap();

    let mut late = DnsSecValidator::new();
    late.set_current_time(NOW + 30 * 86_400);
    assert!(
        late.validate_rrset(
            &response.answers,
            "www.example.com",
            DNSResourceType::A,
            Some(&key),
            None,
        )
        .is_bogus()
    );
}

#[test]
fn test_unsigned_rrset_is_insecure() {
    let zone = Zone::new();
    let records = vec![DNSResource::a("www.example.com", 300, Ipv4Addr::new(192, 0, 2, 1))];
    assert_eq!(
        validator().validate_rrset(
            &records,
            "www.example.com",
            DNSResourceType::A,
            Some(&zone.key),
            None,
        ),
        ValidationResult::Insecure
    );
}

#[test]
fn test_ds_for_other_key_is_bogus() {
    let zone = Zone::new();
    let other = Zone::new();
    let response = DNSPacket::parse(&signed_response(&zone)).unwrap();
    let wrong_ds = Ds::from_key(&other.key, DigestType::Sha256).unwrap();

    let result = validator().validate_rrset(
        &response.answers,
        "www.example.com",
        DNSResourceType::A,
        Some(&zone.key),
        Some(&wrong_ds),
    );
    assert!(result.is_bogus());
}

/// `www.example.com` A records plus an RRSIG made with the fixture RSA key
fn rsa_signed(algorithm: u8, padding: &'static dyn RsaEncoding) -> (DnsKey, Vec<DNSResource>) {
    let pair = RsaKeyPair::from_pkcs8(RSA_2048_PKCS8).unwrap();
    let public = RsaPublicKeyComponents::<Vec<u8>>::from(pair.public());
    let mut wire_key = vec![public.e.len() as u8];
    wire_key.extend_from_slice(&public.e);
    wire_key.extend_from_slice(&public.n);
    let key = DnsKey::new(257, 3, algorithm, wire_key).with_owner("example.com");

    let mut records = vec![
        DNSResource::a("www.example.com", 300, Ipv4Addr::new(192, 0, 2, 1)),
        DNSResource::a("www.example.com", 300, Ipv4Addr::new(192, 0, 2, 2)),
    ];
    let refs: Vec<&DNSResource> = records.iter().collect();
    let mut rrsig = Rrsig {
        type_covered: DNSResourceType::A,
        algorithm,
        labels: 3,
        original_ttl: 300,
        expiration: NOW + 7 * 86_400,
        inception: NOW - 86_400,
        key_tag: key.key_tag,
        signer_name: "example.com".to_string(),
        signature: Vec::new(),
    };
    let mut data = rrsig.signed_prefix().unwrap();
    data.extend_from_slice(&canonical_rrset(&refs, 300).unwrap());
    let mut signature = vec![0; pair.public().modulus_len()];
    pair.sign(padding, &SystemRandom::new(), &data, &mut signature)
        .unwrap();
    rrsig.signature = signature;

    records.push(DNSResource::new("www.example.com", 300, RecordData::RRSIG(rrsig)).unwrap());
    (key, records)
}

#[test]
fn test_rsa_sha2_signatures_are_secure() {
    for (algorithm, padding) in [
        (8, &RSA_PKCS1_SHA256 as &'static dyn RsaEncoding),
        (10, &RSA_PKCS1_SHA512),
    ] {
        let (key, records) = rsa_signed(algorithm, padding);
        let ds = Ds::from_key(&key, DigestType::Sha256).unwrap();
        let result = validator().validate_rrset(
            &records,
            "www.example.com",
            DNSResourceType::A,
            Some(&key),
            Some(&ds),
        );
        assert_eq!(result, ValidationResult::Secure, "algorithm {}", algorithm);
    }
}

#[test]
fn test_rsa_flipped_signature_byte_is_bogus() {
    for (algorithm, padding) in [
        (8, &RSA_PKCS1_SHA256 as &'static dyn RsaEncoding),
        (10, &RSA_PKCS1_SHA512),
    ] {
        let (key, mut records) = rsa_signed(algorithm, padding);
        let RecordData::RRSIG(mut rrsig) = records[2].data.clone() else {
            panic!("expected RRSIG");
        };
        rrsig.signature[17] ^= 0x80;
        records[2] =
            DNSResource::new("www.example.com", 300, RecordData::RRSIG(rrsig)).unwrap();
        let result = validator().validate_rrset(
            &records,
            "www.example.com",
            DNSResourceType::A,
            Some(&key),
            None,
        );
        assert!(result.is_bogus(), "algorithm {}", algorithm);
    }
}

#[test]
fn test_rsa_key_under_wrong_algorithm_is_bogus() {
    let (key, records) = rsa_signed(8, &RSA_PKCS1_SHA256);
    // Same key bytes announced as RSA/SHA-512
    let relabeled =
        DnsKey::new(key.flags, key.protocol, 10, key.public_key.clone()).with_owner("example.com");
    let result = validator().validate_rrset(
        &records,
        "www.example.com",
        DNSResourceType::A,
        Some(&relabeled),
        None,
    );
    assert!(result.is_bogus());
}
