mod common;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use common::*;
use tokio::net::UdpSocket;
use wayfinder::dns::{DNSPacket, enums::DNSResourceType, resource::DNSResource};
use wayfinder::transport::MdnsResolver;
use wayfinder::transport::mdns::MDNS_GROUP;
use wayfinder::{DnsError, Resolver, ResolverConfig};

#[tokio::test]
async fn test_resolver_over_loopback_udp() {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = server.local_addr().unwrap().port();

    let server_task = tokio::spawn(async move {
        let mut buf = [0u8; 512];
        let (len, peer) = server.recv_from(&mut buf).await.unwrap();
        let query = DNSPacket::parse(&buf[..len]).unwrap();
        assert!(query.header.rd);

        let mut reply = answer(vec![DNSResource::a(
            &query.questions[0].name,
            60,
            Ipv4Addr::new(192, 0, 2, 123),
        )]);
        reply.header.id = query.header.id;
        reply.questions = query.questions.clone();
        server
            .send_to(&reply.serialize().unwrap(), peer)
            .await
            .unwrap();
    });

    let config = ResolverConfig {
        nameservers: vec![IpAddr::V4(Ipv4Addr::LOCALHOST)],
        port,
        ..ResolverConfig::default()
    };
    let resolver = Resolver::new(config);

    let ip = resolver.resolve("loopback.example.test").await.unwrap();
    assert_eq!(ip, Ipv4Addr::new(192, 0, 2, 123));
    server_task.await.unwrap();
}

#[tokio::test]
async fn test_mdns_resolve() {
    let group = SocketAddr::from((MDNS_GROUP, 5353));
    let transport = ScriptedTransport::new(move |server, query| {
        if server != group {
            return None;
        }
        let (name, _) = question(query);
        Some(authoritative(vec![DNSResource::a(
            &name,
            120,
            Ipv4Addr::new(192, 168, 1, 44),
        )]))
    });
    let mdns = MdnsResolver::new(transport.clone(), Duration::from_secs(1));

    let ip = mdns.resolve("printer.local").await.unwrap();
    assert_eq!(ip, Ipv4Addr::new(192, 168, 1, 44));

    let query = &transport.queries()[0];
    assert_eq!(query.server, group);
    assert_eq!(query.id, 0);
    assert!(!query.recursion_desired);
    assert_eq!(query.qtype, DNSResourceType::A);
}

#[tokio::test(start_paused = true)]
async fn test_mdns_silence_times_out() {
    let transport = ScriptedTransport::silent();
    let mdns = MdnsResolver::new(transport, Duration::from_millis(1500));

    let start = tokio::time::Instant::now();
    let err = mdns.resolve("nobody.local").await.unwrap_err();
    assert!(matches!(err, DnsError::NoResponse(_)));
    assert_eq!(start.elapsed(), Duration::from_millis(1500));
}

#[tokio::test]
async fn test_mdns_announce() {
    let transport = ScriptedTransport::silent();
    let target = SocketAddr::from(([127, 0, 0, 1], 15353));
    let mdns =
        MdnsResolver::new(transport.clone(), Duration::from_secs(1)).with_destination(target);

    mdns.announce("myhost.local", Ipv4Addr::new(192, 168, 1, 20), 120)
        .await
        .unwrap();
    assert_eq!(transport.servers_asked(), vec![target]);
}
