//! The sink-facing event model.
//!
//! The interpreter emits one abstract event per recognized protocol
//! element. Consumers implement [`EventSink`]; the
//! [`EventSink::enabled`] guard lets the interpreter skip building a
//! payload nobody will consume — the bytes are still parsed so the cursor
//! stays in sync. That guard is load-bearing for throughput on busy links.

use crate::name::DnsName;
use crate::rdata::{
    DnskeyRdata, DsRdata, EdnsRdata, Nsec3Rdata, RrsigRdata, SoaRdata, TsigRdata,
};
use crate::weird::Weird;
use dnsvigil_proto::{Header, RrType};
use serde::Serialize;
use std::collections::HashSet;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Which message section a record was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AnswerSection {
    /// The question section.
    Question,
    /// The answer section.
    Answer,
    /// The authority section.
    Authority,
    /// The additional section.
    Additional,
}

/// The caller's belief about a message's direction.
///
/// The capture framework marks originator-side payloads as queries and
/// responder-side payloads as responses; a partial TCP flush arrives with
/// the direction unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QueryHint {
    /// Delivered from the responder side.
    Response,
    /// Delivered from the originator side.
    Query,
    /// Direction unknown (partial TCP flush).
    Unknown,
}

impl QueryHint {
    /// Maps a direction flag to the corresponding hint.
    #[inline]
    #[must_use]
    pub fn from_orig(is_orig: bool) -> Self {
        if is_orig {
            Self::Query
        } else {
            Self::Response
        }
    }
}

/// The question fields of a query or reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryInfo {
    /// The name being queried.
    pub qname: DnsName,
    /// The query type.
    pub qtype: RrType,
    /// The query class.
    pub qclass: u16,
}

/// The shared prelude of every resource record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsAnswer {
    /// Section the record appeared in.
    pub section: AnswerSection,
    /// Owner name of the record.
    pub name: DnsName,
    /// Record type.
    pub rtype: RrType,
    /// Record class.
    pub class: u16,
    /// Time to live, in seconds.
    pub ttl: u32,
}

/// Discriminants for [`DnsEvent`], used by the [`EventSink::enabled`]
/// guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    /// A message header was decoded.
    Message,
    /// First question of a query.
    Request,
    /// First question of a reply carrying no records at all.
    Rejected,
    /// First question of a normal reply.
    QueryReply,
    /// A record.
    AReply,
    /// AAAA record.
    AaaaReply,
    /// A6 record.
    A6Reply,
    /// NS record.
    NsReply,
    /// CNAME record.
    CnameReply,
    /// PTR record.
    PtrReply,
    /// SOA record.
    SoaReply,
    /// MX record.
    MxReply,
    /// SRV record.
    SrvReply,
    /// TXT record.
    TxtReply,
    /// SPF record.
    SpfReply,
    /// CAA record.
    CaaReply,
    /// EDNS(0) OPT pseudo-record.
    EdnsAddl,
    /// TSIG pseudo-record.
    TsigAddl,
    /// RRSIG record.
    Rrsig,
    /// DNSKEY record.
    Dnskey,
    /// NSEC record.
    Nsec,
    /// NSEC3 record.
    Nsec3,
    /// DS record.
    Ds,
    /// Record of a type outside the dispatched set.
    UnknownReply,
    /// End of message processing.
    End,
    /// Originator payload on a DNS port that did not parse as DNS.
    NonDnsRequest,
    /// UDP session ended normally.
    UdpSessionDone,
    /// UDP session expired idle.
    ConnectionTimeout,
}

impl EventKind {
    /// The stable handler name for this event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Message => "dns_message",
            Self::Request => "dns_request",
            Self::Rejected => "dns_rejected",
            Self::QueryReply => "dns_query_reply",
            Self::AReply => "dns_A_reply",
            Self::AaaaReply => "dns_AAAA_reply",
            Self::A6Reply => "dns_A6_reply",
            Self::NsReply => "dns_NS_reply",
            Self::CnameReply => "dns_CNAME_reply",
            Self::PtrReply => "dns_PTR_reply",
            Self::SoaReply => "dns_SOA_reply",
            Self::MxReply => "dns_MX_reply",
            Self::SrvReply => "dns_SRV_reply",
            Self::TxtReply => "dns_TXT_reply",
            Self::SpfReply => "dns_SPF_reply",
            Self::CaaReply => "dns_CAA_reply",
            Self::EdnsAddl => "dns_EDNS_addl",
            Self::TsigAddl => "dns_TSIG_addl",
            Self::Rrsig => "dns_RRSIG",
            Self::Dnskey => "dns_DNSKEY",
            Self::Nsec => "dns_NSEC",
            Self::Nsec3 => "dns_NSEC3",
            Self::Ds => "dns_DS",
            Self::UnknownReply => "dns_unknown_reply",
            Self::End => "dns_end",
            Self::NonDnsRequest => "non_dns_request",
            Self::UdpSessionDone => "udp_session_done",
            Self::ConnectionTimeout => "connection_timeout",
        }
    }
}

/// One abstract protocol element, as delivered to the sink.
///
/// Every message-scoped event carries a snapshot of the decoded header;
/// record events add the shared answer prelude and their typed payload.
/// Ownership of the payload transfers to the sink on emission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(clippy::large_enum_variant)]
pub enum DnsEvent {
    /// A message header was decoded.
    Message {
        /// Decoded header.
        header: Header,
        /// Direction as delivered (possibly corrected by the role flip).
        is_query: QueryHint,
        /// Total message length in bytes.
        len: usize,
    },
    /// First question of a query.
    Request {
        /// Decoded header.
        header: Header,
        /// The question fields.
        query: QueryInfo,
    },
    /// First question of a reply that carries no records in any section.
    Rejected {
        /// Decoded header.
        header: Header,
        /// The question fields.
        query: QueryInfo,
    },
    /// First question of a normal reply.
    QueryReply {
        /// Decoded header.
        header: Header,
        /// The question fields.
        query: QueryInfo,
    },
    /// A record.
    AReply {
        /// Decoded header.
        header: Header,
        /// Record prelude.
        answer: DnsAnswer,
        /// The IPv4 address.
        addr: Ipv4Addr,
    },
    /// AAAA record.
    AaaaReply {
        /// Decoded header.
        header: Header,
        /// Record prelude.
        answer: DnsAnswer,
        /// The IPv6 address.
        addr: Ipv6Addr,
    },
    /// A6 record (deprecated IPv6 encoding, parsed like AAAA).
    A6Reply {
        /// Decoded header.
        header: Header,
        /// Record prelude.
        answer: DnsAnswer,
        /// The IPv6 address.
        addr: Ipv6Addr,
    },
    /// NS record.
    NsReply {
        /// Decoded header.
        header: Header,
        /// Record prelude.
        answer: DnsAnswer,
        /// The name server.
        name: DnsName,
    },
    /// CNAME record.
    CnameReply {
        /// Decoded header.
        header: Header,
        /// Record prelude.
        answer: DnsAnswer,
        /// The canonical name.
        name: DnsName,
    },
    /// PTR record.
    PtrReply {
        /// Decoded header.
        header: Header,
        /// Record prelude.
        answer: DnsAnswer,
        /// The pointed-to name.
        name: DnsName,
    },
    /// SOA record.
    SoaReply {
        /// Decoded header.
        header: Header,
        /// Record prelude.
        answer: DnsAnswer,
        /// The zone-of-authority fields.
        soa: SoaRdata,
    },
    /// MX record.
    MxReply {
        /// Decoded header.
        header: Header,
        /// Record prelude.
        answer: DnsAnswer,
        /// The mail exchange host.
        exchange: DnsName,
        /// The preference value.
        preference: u16,
    },
    /// SRV record.
    SrvReply {
        /// Decoded header.
        header: Header,
        /// Record prelude.
        answer: DnsAnswer,
        /// The target host.
        target: DnsName,
        /// Priority of this target.
        priority: u16,
        /// Relative weight among same-priority targets.
        weight: u16,
        /// Service port.
        port: u16,
    },
    /// TXT record.
    TxtReply {
        /// Decoded header.
        header: Header,
        /// Record prelude.
        answer: DnsAnswer,
        /// The character strings, in wire order.
        strings: Vec<Vec<u8>>,
    },
    /// SPF record.
    SpfReply {
        /// Decoded header.
        header: Header,
        /// Record prelude.
        answer: DnsAnswer,
        /// The character strings, in wire order.
        strings: Vec<Vec<u8>>,
    },
    /// CAA record.
    CaaReply {
        /// Decoded header.
        header: Header,
        /// Record prelude.
        answer: DnsAnswer,
        /// CAA flags (critical bit).
        flags: u8,
        /// The property tag.
        tag: Vec<u8>,
        /// The property value.
        value: Vec<u8>,
    },
    /// EDNS(0) OPT pseudo-record.
    EdnsAddl {
        /// Decoded header.
        header: Header,
        /// The reinterpreted OPT fields.
        edns: EdnsRdata,
    },
    /// TSIG pseudo-record.
    TsigAddl {
        /// Decoded header.
        header: Header,
        /// The transaction-signature fields.
        tsig: TsigRdata,
    },
    /// RRSIG record.
    Rrsig {
        /// Decoded header.
        header: Header,
        /// Record prelude.
        answer: DnsAnswer,
        /// The signature fields.
        rrsig: RrsigRdata,
    },
    /// DNSKEY record.
    Dnskey {
        /// Decoded header.
        header: Header,
        /// Record prelude.
        answer: DnsAnswer,
        /// The key fields.
        dnskey: DnskeyRdata,
    },
    /// NSEC record.
    Nsec {
        /// Decoded header.
        header: Header,
        /// Record prelude.
        answer: DnsAnswer,
        /// The next name in canonical order.
        next_name: DnsName,
        /// The raw type-bitmap blocks.
        bitmaps: Vec<Vec<u8>>,
    },
    /// NSEC3 record.
    Nsec3 {
        /// Decoded header.
        header: Header,
        /// Record prelude.
        answer: DnsAnswer,
        /// The hashed-denial fields.
        nsec3: Nsec3Rdata,
    },
    /// DS record.
    Ds {
        /// Decoded header.
        header: Header,
        /// Record prelude.
        answer: DnsAnswer,
        /// The delegation-signer fields.
        ds: DsRdata,
    },
    /// Record of a type outside the dispatched set.
    UnknownReply {
        /// Decoded header.
        header: Header,
        /// Record prelude; `rtype` carries the unknown code.
        answer: DnsAnswer,
    },
    /// End of message processing. Emitted exactly once per parse that got
    /// past the header, on success and failure alike.
    End {
        /// Decoded header.
        header: Header,
    },
    /// Originator payload on a DNS port that did not parse as DNS.
    NonDnsRequest {
        /// The raw payload.
        payload: Vec<u8>,
    },
    /// UDP session ended normally.
    UdpSessionDone,
    /// UDP session expired idle.
    ConnectionTimeout,
}

impl DnsEvent {
    /// Returns the discriminant of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Message { .. } => EventKind::Message,
            Self::Request { .. } => EventKind::Request,
            Self::Rejected { .. } => EventKind::Rejected,
            Self::QueryReply { .. } => EventKind::QueryReply,
            Self::AReply { .. } => EventKind::AReply,
            Self::AaaaReply { .. } => EventKind::AaaaReply,
            Self::A6Reply { .. } => EventKind::A6Reply,
            Self::NsReply { .. } => EventKind::NsReply,
            Self::CnameReply { .. } => EventKind::CnameReply,
            Self::PtrReply { .. } => EventKind::PtrReply,
            Self::SoaReply { .. } => EventKind::SoaReply,
            Self::MxReply { .. } => EventKind::MxReply,
            Self::SrvReply { .. } => EventKind::SrvReply,
            Self::TxtReply { .. } => EventKind::TxtReply,
            Self::SpfReply { .. } => EventKind::SpfReply,
            Self::CaaReply { .. } => EventKind::CaaReply,
            Self::EdnsAddl { .. } => EventKind::EdnsAddl,
            Self::TsigAddl { .. } => EventKind::TsigAddl,
            Self::Rrsig { .. } => EventKind::Rrsig,
            Self::Dnskey { .. } => EventKind::Dnskey,
            Self::Nsec { .. } => EventKind::Nsec,
            Self::Nsec3 { .. } => EventKind::Nsec3,
            Self::Ds { .. } => EventKind::Ds,
            Self::UnknownReply { .. } => EventKind::UnknownReply,
            Self::End { .. } => EventKind::End,
            Self::NonDnsRequest { .. } => EventKind::NonDnsRequest,
            Self::UdpSessionDone => EventKind::UdpSessionDone,
            Self::ConnectionTimeout => EventKind::ConnectionTimeout,
        }
    }
}

/// Consumer of the interpreter's output.
///
/// All methods are called inline from the parse path; implementations must
/// not block.
pub trait EventSink {
    /// Returns true if the consumer wants events of this kind.
    ///
    /// The interpreter checks this before constructing a payload, so an
    /// implementation returning false avoids the allocation entirely;
    /// the record bytes are still consumed.
    fn enabled(&self, _kind: EventKind) -> bool {
        true
    }

    /// Delivers one event. Ownership of the payload passes to the sink.
    fn emit(&mut self, event: DnsEvent);

    /// Delivers one protocol-anomaly diagnostic.
    fn weird(&mut self, weird: Weird);

    /// Signals that the payload has been positively identified as DNS.
    fn protocol_confirmation(&mut self) {}

    /// Signals that the payload violates the protocol badly enough to
    /// doubt the port-based identification.
    fn protocol_violation(&mut self, _tag: &'static str) {}
}

/// A sink that records everything it receives.
///
/// Used by the inspector binary and throughout the test suites. Event
/// kinds can be selectively disabled to exercise the interpreter's
/// build-avoidance guard.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Vec<DnsEvent>,
    weirds: Vec<Weird>,
    disabled: HashSet<EventKind>,
    confirmations: usize,
    violations: Vec<&'static str>,
}

impl CollectingSink {
    /// Creates an empty sink with every event kind enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that reports the given kinds as disabled.
    #[must_use]
    pub fn with_disabled(kinds: &[EventKind]) -> Self {
        Self {
            disabled: kinds.iter().copied().collect(),
            ..Self::default()
        }
    }

    /// The recorded events, in emission order.
    #[must_use]
    pub fn events(&self) -> &[DnsEvent] {
        &self.events
    }

    /// The recorded weirds, in emission order.
    #[must_use]
    pub fn weirds(&self) -> &[Weird] {
        &self.weirds
    }

    /// Number of protocol confirmations received.
    #[must_use]
    pub fn confirmations(&self) -> usize {
        self.confirmations
    }

    /// Protocol-violation tags received.
    #[must_use]
    pub fn violations(&self) -> &[&'static str] {
        &self.violations
    }

    /// Returns the recorded events of one kind.
    pub fn events_of(&self, kind: EventKind) -> impl Iterator<Item = &DnsEvent> {
        self.events.iter().filter(move |e| e.kind() == kind)
    }

    /// Number of recorded events of one kind.
    #[must_use]
    pub fn count_of(&self, kind: EventKind) -> usize {
        self.events_of(kind).count()
    }

    /// Returns true if a weird with the same name was recorded,
    /// regardless of its numeric detail.
    #[must_use]
    pub fn has_weird(&self, weird: Weird) -> bool {
        self.weirds.iter().any(|w| w.name() == weird.name())
    }

    /// Drains the recorded events.
    pub fn take_events(&mut self) -> Vec<DnsEvent> {
        std::mem::take(&mut self.events)
    }

    /// Clears everything recorded so far.
    pub fn clear(&mut self) {
        self.events.clear();
        self.weirds.clear();
        self.confirmations = 0;
        self.violations.clear();
    }
}

impl EventSink for CollectingSink {
    fn enabled(&self, kind: EventKind) -> bool {
        !self.disabled.contains(&kind)
    }

    fn emit(&mut self, event: DnsEvent) {
        self.events.push(event);
    }

    fn weird(&mut self, weird: Weird) {
        self.weirds.push(weird);
    }

    fn protocol_confirmation(&mut self) {
        self.confirmations += 1;
    }

    fn protocol_violation(&mut self, tag: &'static str) {
        self.violations.push(tag);
    }
}
