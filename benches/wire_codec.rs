use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::net::Ipv4Addr;

use wayfinder::dns::{DNSPacket, build_query, enums::DNSResourceType, resource::DNSResource};

fn sample_response() -> Vec<u8> {
    let mut packet = DNSPacket::default();
    packet.header.id = 0x4242;
    packet.header.qr = true;
    packet.header.rd = true;
    packet.header.ra = true;
    packet
        .answers
        .push(DNSResource::cname("www.example.com", 300, "edge.example.net").unwrap());
    for i in 1..=4 {
        packet.answers.push(DNSResource::a(
            "edge.example.net",
            60,
            Ipv4Addr::new(192, 0, 2, i),
        ));
    }
    packet
        .authorities
        .push(DNSResource::ns("example.net", 3600, "ns1.example.net").unwrap());
    packet
        .additionals
        .push(DNSResource::a("ns1.example.net", 3600, Ipv4Addr::new(198, 51, 100, 1)));
    packet.serialize().unwrap()
}

fn bench_wire_codec(c: &mut Criterion) {
    let response = sample_response();

    c.bench_function("build query", |b| {
        b.iter(|| build_query(black_box(0x1234), black_box("www.example.com"), DNSResourceType::A, true))
    });

    c.bench_function("parse response", |b| {
        b.iter(|| DNSPacket::parse_response(black_box(&response), 0x4242))
    });

    let parsed = DNSPacket::parse(&response).unwrap();
    c.bench_function("serialize response", |b| b.iter(|| black_box(&parsed).serialize()));

    c.bench_function("follow in-answer cname", |b| {
        b.iter(|| parsed.answer_address(black_box("www.example.com"), DNSResourceType::A, 10))
    });
}

criterion_group!(benches, bench_wire_codec);
criterion_main!(benches);
