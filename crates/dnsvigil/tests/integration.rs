//! End-to-end tests for the passive DNS monitor.
//!
//! These drive whole sessions the way the enclosing capture framework
//! would: UDP datagrams and segmented TCP streams in, event sequences
//! out. The wire payloads are hand-assembled from the RFC 1035 layouts.

use std::sync::Arc;

use dnsvigil_analyzer::{
    CollectingSink, Connection, DnsEvent, DnsSession, EventKind, Interpreter, ParseStatus,
    QueryHint, TimerVerdict, Transport, Weird,
};
use dnsvigil_config::MonitorConfig;
use dnsvigil_proto::RrType;

fn connection() -> Connection {
    Connection::new(
        "10.0.0.1:40000".parse().unwrap(),
        "192.0.2.53:53".parse().unwrap(),
    )
}

fn udp_session(config: MonitorConfig) -> DnsSession {
    DnsSession::new(Arc::new(config), connection(), Transport::Udp)
}

fn tcp_session() -> DnsSession {
    DnsSession::new(
        Arc::new(MonitorConfig::default()),
        connection(),
        Transport::Tcp,
    )
}

/// The minimal A query from RFC 1035: `www.example.com IN A`.
fn minimal_a_query() -> Vec<u8> {
    let mut msg = vec![
        0xAA, 0xAA, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];
    msg.extend_from_slice(&[
        0x03, b'w', b'w', b'w', 0x07, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 0x03, b'c', b'o',
        b'm', 0x00,
    ]);
    msg.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
    msg
}

/// The matching response, with the answer's owner name compressed back
/// to offset 12.
fn a_response() -> Vec<u8> {
    let mut msg = vec![
        0xAA, 0xAA, 0x81, 0x80, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
    ];
    msg.extend_from_slice(&[
        0x03, b'w', b'w', b'w', 0x07, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 0x03, b'c', b'o',
        b'm', 0x00,
    ]);
    msg.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
    msg.extend_from_slice(&[
        0xC0, 0x0C, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x0E, 0x10, 0x00, 0x04, 0x5D, 0xB8, 0xD8,
        0x22,
    ]);
    msg
}

fn frame(msg: &[u8]) -> Vec<u8> {
    let mut out = (msg.len() as u16).to_be_bytes().to_vec();
    out.extend_from_slice(msg);
    out
}

#[test]
fn scenario_minimal_a_query() {
    let mut session = udp_session(MonitorConfig::default());
    let mut sink = CollectingSink::new();

    session.deliver_packet(true, &minimal_a_query(), 0.0, &mut sink);

    let kinds: Vec<EventKind> = sink.events().iter().map(DnsEvent::kind).collect();
    assert_eq!(
        kinds,
        [EventKind::Message, EventKind::Request, EventKind::End]
    );

    let DnsEvent::Message { is_query, .. } = &sink.events()[0] else {
        unreachable!()
    };
    assert_eq!(*is_query, QueryHint::Query);

    let DnsEvent::Request { query, .. } = &sink.events()[1] else {
        unreachable!()
    };
    assert_eq!(query.qname.to_string(), "www.example.com");
    assert_eq!(query.qtype, RrType::A);
    assert_eq!(query.qclass, 1);
}

#[test]
fn scenario_a_response_with_compression() {
    let mut session = udp_session(MonitorConfig::default());
    let mut sink = CollectingSink::new();

    session.deliver_packet(true, &minimal_a_query(), 0.0, &mut sink);
    session.deliver_packet(false, &a_response(), 0.1, &mut sink);

    let kinds: Vec<EventKind> = sink.events().iter().map(DnsEvent::kind).collect();
    assert_eq!(
        kinds,
        [
            EventKind::Message,
            EventKind::Request,
            EventKind::End,
            EventKind::Message,
            EventKind::QueryReply,
            EventKind::AReply,
            EventKind::End,
        ]
    );

    let DnsEvent::AReply { answer, addr, .. } = &sink.events()[5] else {
        unreachable!()
    };
    assert_eq!(answer.name.to_string(), "www.example.com");
    assert_eq!(*addr, "93.184.216.34".parse::<std::net::Ipv4Addr>().unwrap());
}

#[test]
fn scenario_malformed_forward_pointer() {
    // qdcount = 1, then a pointer to offset 0x20, beyond its own
    // position.
    let mut msg = vec![
        0xAA, 0xAA, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];
    msg.extend_from_slice(&[0xC0, 0x20, 0x00, 0x01, 0x00, 0x01]);

    let mut interp = Interpreter::new(Arc::new(MonitorConfig::default()), connection());
    let mut sink = CollectingSink::new();

    let status = interp.parse_message(&msg, QueryHint::Query, &mut sink);

    assert_eq!(status, ParseStatus::Failed);
    assert!(sink.has_weird(Weird::ForwardCompressOffset));
    // dns_end is still emitted.
    assert_eq!(sink.count_of(EventKind::End), 1);
}

#[test]
fn scenario_qdcount_ceiling() {
    let msg = vec![
        0xAA, 0xAA, 0x01, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    let mut interp = Interpreter::new(Arc::new(MonitorConfig::default()), connection());
    let mut sink = CollectingSink::new();

    let status = interp.parse_message(&msg, QueryHint::Query, &mut sink);

    assert_eq!(status, ParseStatus::Failed);
    assert!(sink.has_weird(Weird::ConnCountTooLarge));
    assert_eq!(sink.violations(), ["DNS_Conn_count_too_large"]);
    assert_eq!(sink.count_of(EventKind::Message), 1);
    assert_eq!(sink.count_of(EventKind::End), 1);
}

#[test]
fn scenario_role_flip_happens_once() {
    let mut session = udp_session(MonitorConfig::default());
    let mut sink = CollectingSink::new();

    // First datagram arrives originator-side but carries QR=1.
    session.deliver_packet(true, &a_response(), 0.0, &mut sink);

    // The roles flipped: the old originator is now the responder.
    assert_eq!(
        session.conn().resp_addr(),
        "10.0.0.1:40000".parse().unwrap()
    );
    let DnsEvent::Message { is_query, .. } = &sink.events()[0] else {
        unreachable!()
    };
    assert_eq!(*is_query, QueryHint::Response);

    // A second originator-side response does not flip again.
    let before = session.conn().resp_addr();
    session.deliver_packet(true, &a_response(), 0.2, &mut sink);
    assert_eq!(session.conn().resp_addr(), before);
}

#[test]
fn scenario_tcp_segmentation() {
    // One framed message delivered as segments of 1, 1, 10, and the
    // remainder.
    let stream = frame(&a_response());
    assert!(stream.len() > 12);

    let mut session = tcp_session();
    let mut sink = CollectingSink::new();

    session.deliver_stream(false, &stream[0..1], 0.0, &mut sink);
    session.deliver_stream(false, &stream[1..2], 0.1, &mut sink);
    session.deliver_stream(false, &stream[2..12], 0.2, &mut sink);
    session.deliver_stream(false, &stream[12..], 0.3, &mut sink);

    // Exactly one message, parsed once, byte-identical to the
    // unsegmented payload.
    assert_eq!(sink.count_of(EventKind::Message), 1);
    assert_eq!(sink.count_of(EventKind::AReply), 1);
    assert_eq!(sink.count_of(EventKind::End), 1);

    let DnsEvent::Message { len, .. } = sink.events_of(EventKind::Message).next().unwrap() else {
        unreachable!()
    };
    assert_eq!(*len, a_response().len());
}

#[test]
fn tcp_framing_order_and_exactness() {
    // Three messages, split at every possible boundary of a copy of the
    // concatenated stream, must always yield exactly three messages in
    // order.
    let mut stream = Vec::new();
    for _ in 0..3 {
        stream.extend(frame(&a_response()));
    }

    for cut in 1..stream.len() {
        let mut session = tcp_session();
        let mut sink = CollectingSink::new();

        session.deliver_stream(false, &stream[..cut], 0.0, &mut sink);
        session.deliver_stream(false, &stream[cut..], 0.1, &mut sink);

        assert_eq!(sink.count_of(EventKind::Message), 3, "cut at {cut}");
        assert_eq!(sink.count_of(EventKind::AReply), 3, "cut at {cut}");
    }
}

#[test]
fn tcp_flush_delivers_partial_with_unknown_direction() {
    let msg = a_response();
    let mut stream = (msg.len() as u16).to_be_bytes().to_vec();
    stream.extend_from_slice(&msg[..20]);

    let mut session = tcp_session();
    let mut sink = CollectingSink::new();

    session.deliver_stream(false, &stream, 0.0, &mut sink);
    assert_eq!(sink.count_of(EventKind::Message), 0);

    session.connection_closed(&mut sink);

    let DnsEvent::Message { is_query, len, .. } =
        sink.events_of(EventKind::Message).next().unwrap()
    else {
        unreachable!()
    };
    assert_eq!(*is_query, QueryHint::Unknown);
    assert_eq!(*len, 20);
}

#[test]
fn udp_non_dns_flow_is_flagged() {
    let mut session = udp_session(MonitorConfig::default());
    let mut sink = CollectingSink::new();

    let payload = b"SSH-2.0-OpenSSH_9.6";
    session.deliver_packet(true, payload, 0.0, &mut sink);

    let DnsEvent::NonDnsRequest { payload: raw } =
        sink.events_of(EventKind::NonDnsRequest).next().unwrap()
    else {
        unreachable!()
    };
    assert_eq!(raw.as_slice(), payload);
}

#[test]
fn udp_session_timeout_lifecycle() {
    let mut session = udp_session(MonitorConfig::default());
    let mut sink = CollectingSink::new();

    session.deliver_packet(true, &minimal_a_query(), 100.0, &mut sink);

    // Still active at the first firing: re-armed.
    assert_eq!(
        session.expire_timer(105.0, &mut sink),
        TimerVerdict::Rearm(10.0)
    );
    assert_eq!(sink.count_of(EventKind::ConnectionTimeout), 0);

    // Quiet past the allowance: expired and removed.
    assert_eq!(session.expire_timer(115.0, &mut sink), TimerVerdict::Remove);
    assert_eq!(sink.count_of(EventKind::ConnectionTimeout), 1);
}

#[test]
fn event_counts_match_section_counts() {
    // qd=1 an=2 ns=1 ar=1, nothing skipped: 1 dns_message, 1 question
    // event, 2 + 1 + 1 record events, 1 dns_end.
    let mut msg = vec![
        0xAA, 0xAA, 0x81, 0x80, 0x00, 0x01, 0x00, 0x02, 0x00, 0x01, 0x00, 0x01,
    ];
    // Question: www.example.com IN A
    msg.extend_from_slice(&[
        0x03, b'w', b'w', b'w', 0x07, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 0x03, b'c', b'o',
        b'm', 0x00, 0x00, 0x01, 0x00, 0x01,
    ]);
    // Two A answers, compressed owners.
    for last in [10u8, 11] {
        msg.extend_from_slice(&[
            0xC0, 0x0C, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x0E, 0x10, 0x00, 0x04, 192, 0, 2,
            last,
        ]);
    }
    // Authority: NS record, name "example.com" via pointer to offset 16.
    msg.extend_from_slice(&[0xC0, 0x10, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x0E, 0x10]);
    msg.extend_from_slice(&[0x00, 0x05, 0x02, b'n', b's', 0xC0, 0x10]);
    // Additional: OPT.
    msg.extend_from_slice(&[
        0x00, 0x00, 0x29, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ]);

    let mut interp = Interpreter::new(Arc::new(MonitorConfig::default()), connection());
    let mut sink = CollectingSink::new();

    let status = interp.parse_message(&msg, QueryHint::Response, &mut sink);

    assert_eq!(status, ParseStatus::Ok);
    assert!(sink.weirds().is_empty());
    assert_eq!(sink.count_of(EventKind::Message), 1);
    assert_eq!(sink.count_of(EventKind::QueryReply), 1);
    assert_eq!(sink.count_of(EventKind::AReply), 2);
    assert_eq!(sink.count_of(EventKind::NsReply), 1);
    assert_eq!(sink.count_of(EventKind::EdnsAddl), 1);
    assert_eq!(sink.count_of(EventKind::End), 1);
    assert_eq!(sink.confirmations(), 1);
}

#[test]
fn name_normalization_is_idempotent() {
    // The same name queried twice with different label case produces
    // equal decoded names.
    let mut upper = minimal_a_query();
    // Uppercase the "www" label bytes in place.
    upper[13..16].copy_from_slice(b"WWW");

    let mut session = udp_session(MonitorConfig::default());
    let mut sink = CollectingSink::new();
    session.deliver_packet(true, &minimal_a_query(), 0.0, &mut sink);
    session.deliver_packet(true, &upper, 0.1, &mut sink);

    let names: Vec<String> = sink
        .events_of(EventKind::Request)
        .map(|e| {
            let DnsEvent::Request { query, .. } = e else {
                unreachable!()
            };
            query.qname.to_string()
        })
        .collect();

    assert_eq!(names, ["www.example.com", "www.example.com"]);
}

#[test]
fn skip_filters_suppress_trailing_sections() {
    let config = MonitorConfig {
        skip_all_auth: true,
        skip_all_addl: true,
        ..MonitorConfig::default()
    };

    // Response with an answer, an authority record, and an OPT.
    let mut msg = vec![
        0xAA, 0xAA, 0x81, 0x80, 0x00, 0x01, 0x00, 0x01, 0x00, 0x01, 0x00, 0x01,
    ];
    msg.extend_from_slice(&[
        0x03, b'w', b'w', b'w', 0x07, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 0x03, b'c', b'o',
        b'm', 0x00, 0x00, 0x01, 0x00, 0x01,
    ]);
    msg.extend_from_slice(&[
        0xC0, 0x0C, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x0E, 0x10, 0x00, 0x04, 192, 0, 2, 1,
    ]);
    msg.extend_from_slice(&[0xC0, 0x10, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x0E, 0x10]);
    msg.extend_from_slice(&[0x00, 0x05, 0x02, b'n', b's', 0xC0, 0x10]);
    msg.extend_from_slice(&[
        0x00, 0x00, 0x29, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ]);

    let mut interp = Interpreter::new(Arc::new(config), connection());
    let mut sink = CollectingSink::new();

    let status = interp.parse_message(&msg, QueryHint::Response, &mut sink);

    // Both trailing sections skipped: message ends early but cleanly.
    assert_eq!(status, ParseStatus::Ok);
    assert_eq!(sink.count_of(EventKind::AReply), 1);
    assert_eq!(sink.count_of(EventKind::NsReply), 0);
    assert_eq!(sink.count_of(EventKind::EdnsAddl), 0);
    assert_eq!(sink.count_of(EventKind::End), 1);
}
