//! The streaming DNS message interpreter.
//!
//! One [`Interpreter`] exists per observed connection. It walks a message
//! section by section — header, questions, answers, authority, additional
//! — emitting events as it recognizes protocol elements and weirds as it
//! recognizes anomalies. Parsing is strictly forward over a
//! [`WireCursor`]; the only backwards movement is name decompression,
//! which is confined to [`NameDecoder`].
//!
//! A large amount of non-DNS traffic runs on port 53. The interpreter
//! therefore treats parse failure as an expected outcome ([`ParseStatus`]
//! rather than an error type) and keeps per-message state isolated so the
//! next payload on the same connection starts fresh.

use crate::event::{
    AnswerSection, DnsEvent, EventKind, EventSink, QueryHint, QueryInfo,
};
use crate::name::{DnsName, NameDecoder};
use crate::rdata::{
    DnskeyRdata, DsRdata, EdnsRdata, Nsec3Rdata, RrsigRdata, SoaRdata, TsigRdata,
};
use crate::session::Connection;
use crate::weird::Weird;
use dnsvigil_config::MonitorConfig;
use dnsvigil_proto::rcode::extended_rcode;
use dnsvigil_proto::{
    DnssecAlgo, DnssecDigest, Header, RrType, WireCursor, HEADER_SIZE, NETBIOS_NS_PORT,
};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use tracing::error;

/// Outcome of a message parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// The message parsed cleanly (possibly with advisory weirds).
    Ok,
    /// The message was abandoned part-way. `dns_end` has still been
    /// emitted if parsing got past the header.
    Failed,
}

impl ParseStatus {
    /// Returns true on [`ParseStatus::Ok`].
    #[inline]
    #[must_use]
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

/// Per-message parse state. Created at the top of
/// [`Interpreter::parse_message`] and dropped on exit; never shared
/// across messages.
struct MsgInfo {
    header: Header,
    is_query: QueryHint,
    section: AnswerSection,
    query_name: Option<DnsName>,
    atype: RrType,
    aclass: u16,
    ttl: u32,
    skip_event: bool,
}

impl MsgInfo {
    fn new(header: Header, is_query: QueryHint) -> Self {
        Self {
            header,
            is_query,
            section: AnswerSection::Question,
            query_name: None,
            atype: RrType::Unknown(0),
            aclass: 0,
            ttl: 0,
            skip_event: false,
        }
    }

    /// Snapshot of the current record's prelude for an event.
    fn answer(&self) -> crate::event::DnsAnswer {
        crate::event::DnsAnswer {
            section: self.section,
            name: self.query_name.clone().unwrap_or_default(),
            rtype: self.atype,
            class: self.aclass,
            ttl: self.ttl,
        }
    }
}

/// The per-connection DNS interpreter.
pub struct Interpreter {
    config: Arc<MonitorConfig>,
    conn: Connection,
    /// Guards the role-flip heuristic: it may fire only on the first
    /// message of the connection.
    first_message: bool,
}

impl Interpreter {
    /// Creates an interpreter for one connection.
    #[must_use]
    pub fn new(config: Arc<MonitorConfig>, conn: Connection) -> Self {
        Self {
            config,
            conn,
            first_message: true,
        }
    }

    /// Returns the connection this interpreter observes.
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Parses one complete DNS message.
    ///
    /// `hint` is the caller's belief about the direction:
    /// [`QueryHint::Query`] for originator-side payloads,
    /// [`QueryHint::Response`] for responder-side,
    /// [`QueryHint::Unknown`] for a partial TCP flush.
    pub fn parse_message(
        &mut self,
        data: &[u8],
        hint: QueryHint,
        sink: &mut dyn EventSink,
    ) -> ParseStatus {
        let Some(header) = Header::parse(data) else {
            sink.weird(Weird::TruncatedMsgHeader);
            return ParseStatus::Failed;
        };

        let mut hint = hint;
        if self.first_message && header.is_response() && hint == QueryHint::Query {
            // The side that spoke first sent a response: the capture saw
            // the connection backwards. Correct the roles once, unless
            // the "responder" is a multicast group (mDNS and friends
            // legitimately answer unasked).
            hint = QueryHint::Response;
            if !self.conn.resp_addr().ip().is_multicast() {
                self.conn.flip_roles();
            }
        }
        self.first_message = false;

        let mut msg = MsgInfo::new(header, hint);

        if sink.enabled(EventKind::Message) {
            sink.emit(DnsEvent::Message {
                header,
                is_query: hint,
                len: data.len(),
            });
        }

        // Most non-DNS traffic on port 53 dies here: a realistic message
        // carries a handful of questions at most.
        if self.config.max_queries > 0 && u32::from(header.qdcount) > self.config.max_queries {
            sink.protocol_violation(Weird::ConnCountTooLarge.name());
            sink.weird(Weird::ConnCountTooLarge);
            self.end_message(&msg, sink);
            return ParseStatus::Failed;
        }

        let mut cur = WireCursor::new(data);
        cur.skip(HEADER_SIZE);
        let decoder = NameDecoder::new(data, self.conn.resp_port() == NETBIOS_NS_PORT);

        for index in 0..header.qdcount {
            if !self.parse_question(&mut msg, index, &decoder, &mut cur, sink) {
                self.end_message(&msg, sink);
                return ParseStatus::Failed;
            }
        }

        msg.section = AnswerSection::Answer;
        for _ in 0..header.ancount {
            if !self.parse_answer(&mut msg, &decoder, &mut cur, sink) {
                self.end_message(&msg, sink);
                return ParseStatus::Failed;
            }
        }

        // Questions and answers parsed cleanly; this really is DNS.
        sink.protocol_confirmation();

        let server = self.conn.resp_addr().ip();
        let mut skip_auth = self.config.skip_all_auth;
        let mut skip_addl = self.config.skip_all_addl;
        if header.ancount > 0 {
            // An answer was seen, so the trailing sections are optional
            // detail; consult the per-responder filters.
            skip_auth = skip_auth || header.nscount == 0 || self.config.skip_auth.contains(&server);
            skip_addl = skip_addl || header.arcount == 0 || self.config.skip_addl.contains(&server);
        }

        if skip_auth && skip_addl {
            self.end_message(&msg, sink);
            return ParseStatus::Ok;
        }

        msg.section = AnswerSection::Authority;
        msg.skip_event = skip_auth;
        for _ in 0..header.nscount {
            if !self.parse_answer(&mut msg, &decoder, &mut cur, sink) {
                self.end_message(&msg, sink);
                return ParseStatus::Failed;
            }
        }

        if skip_addl {
            self.end_message(&msg, sink);
            return ParseStatus::Ok;
        }

        msg.section = AnswerSection::Additional;
        msg.skip_event = skip_addl;
        for _ in 0..header.arcount {
            if !self.parse_answer(&mut msg, &decoder, &mut cur, sink) {
                self.end_message(&msg, sink);
                return ParseStatus::Failed;
            }
        }

        self.end_message(&msg, sink);
        ParseStatus::Ok
    }

    fn end_message(&self, msg: &MsgInfo, sink: &mut dyn EventSink) {
        if sink.enabled(EventKind::End) {
            sink.emit(DnsEvent::End { header: msg.header });
        }
    }

    fn parse_question(
        &self,
        msg: &mut MsgInfo,
        index: u16,
        decoder: &NameDecoder<'_>,
        cur: &mut WireCursor<'_>,
        sink: &mut dyn EventSink,
    ) -> bool {
        let Some(qname) = decoder.decode(cur, sink) else {
            return false;
        };

        if cur.remaining() < 4 {
            sink.weird(Weird::TruncatedQuestion);
            return false;
        }

        let qtype = RrType::from(cur.read_u16());
        let qclass = cur.read_u16();

        // Only the first question is announced; messages with qdcount > 1
        // are rare and the extra questions carry no further dispatch
        // value.
        if index > 0 {
            return true;
        }

        let kind = if !msg.header.is_response() {
            EventKind::Request
        } else if msg.header.has_no_records() {
            // The service rejected the query in some fashion, and no RR
            // will report it.
            EventKind::Rejected
        } else {
            EventKind::QueryReply
        };

        if sink.enabled(kind) && !msg.skip_event {
            let query = QueryInfo {
                qname,
                qtype,
                qclass,
            };
            let event = match kind {
                EventKind::Request => DnsEvent::Request {
                    header: msg.header,
                    query,
                },
                EventKind::Rejected => DnsEvent::Rejected {
                    header: msg.header,
                    query,
                },
                _ => DnsEvent::QueryReply {
                    header: msg.header,
                    query,
                },
            };
            sink.emit(event);
        }

        true
    }

    fn parse_answer(
        &self,
        msg: &mut MsgInfo,
        decoder: &NameDecoder<'_>,
        cur: &mut WireCursor<'_>,
        sink: &mut dyn EventSink,
    ) -> bool {
        let Some(name) = decoder.decode(cur, sink) else {
            return false;
        };

        if cur.remaining() < 4 {
            sink.weird(Weird::TruncatedAnswer);
            return false;
        }

        // The exact meaning of these fields gets re-interpreted by the
        // more adventurous RR types (OPT in particular).
        msg.query_name = Some(name);
        msg.atype = RrType::from(cur.read_u16());
        msg.aclass = cur.read_u16();
        msg.ttl = cur.read_u32();

        let rdlength = cur.read_u16() as usize;
        if rdlength > cur.remaining() {
            sink.weird(Weird::TruncatedRrRdlength);
            return false;
        }

        match msg.atype {
            RrType::A => self.parse_rr_a(msg, cur, rdlength, sink),
            RrType::AAAA | RrType::A6 => self.parse_rr_aaaa(msg, cur, rdlength, sink),
            RrType::NS | RrType::CNAME | RrType::PTR => {
                self.parse_rr_name(msg, decoder, cur, rdlength, sink)
            }
            RrType::SOA => self.parse_rr_soa(msg, decoder, cur, rdlength, sink),
            RrType::WKS | RrType::HINFO | RrType::NBS => {
                // Acknowledged but not decoded.
                cur.skip(rdlength);
                true
            }
            RrType::MX => self.parse_rr_mx(msg, decoder, cur, rdlength, sink),
            RrType::TXT => self.parse_rr_strings(msg, EventKind::TxtReply, cur, rdlength, sink),
            RrType::SPF => self.parse_rr_strings(msg, EventKind::SpfReply, cur, rdlength, sink),
            RrType::CAA => self.parse_rr_caa(msg, cur, rdlength, sink),
            RrType::SRV => {
                if self.conn.resp_port() == NETBIOS_NS_PORT {
                    // An NBSTAT (NetBIOS NODE STATUS) record; the SRV RFC
                    // reused the type code already taken by it.
                    cur.skip(rdlength);
                    true
                } else {
                    self.parse_rr_srv(msg, decoder, cur, rdlength, sink)
                }
            }
            RrType::EDNS => self.parse_rr_edns(msg, cur, rdlength, sink),
            RrType::TSIG => self.parse_rr_tsig(msg, decoder, cur, sink),
            RrType::RRSIG => self.parse_rr_rrsig(msg, decoder, cur, rdlength, sink),
            RrType::DNSKEY => self.parse_rr_dnskey(msg, cur, rdlength, sink),
            RrType::NSEC => self.parse_rr_nsec(msg, decoder, cur, rdlength, sink),
            RrType::NSEC3 => self.parse_rr_nsec3(msg, cur, rdlength, sink),
            RrType::DS => self.parse_rr_ds(msg, cur, rdlength, sink),
            RrType::Unknown(code) => {
                if sink.enabled(EventKind::UnknownReply) && !msg.skip_event {
                    sink.emit(DnsEvent::UnknownReply {
                        header: msg.header,
                        answer: msg.answer(),
                    });
                }
                sink.weird(Weird::RrUnknownType(code));
                cur.skip(rdlength);
                true
            }
        }
    }

    fn parse_rr_a(
        &self,
        msg: &MsgInfo,
        cur: &mut WireCursor<'_>,
        rdlength: usize,
        sink: &mut dyn EventSink,
    ) -> bool {
        if rdlength != 4 {
            sink.weird(Weird::RrBadLength);
            return false;
        }

        let addr = Ipv4Addr::from(cur.read_u32());

        if sink.enabled(EventKind::AReply) && !msg.skip_event {
            sink.emit(DnsEvent::AReply {
                header: msg.header,
                answer: msg.answer(),
                addr,
            });
        }

        true
    }

    fn parse_rr_aaaa(
        &self,
        msg: &MsgInfo,
        cur: &mut WireCursor<'_>,
        _rdlength: usize,
        sink: &mut dyn EventSink,
    ) -> bool {
        let mut octets = [0u8; 16];
        for chunk in octets.chunks_exact_mut(4) {
            if cur.remaining() < 4 {
                sink.weird(if msg.atype == RrType::AAAA {
                    Weird::AaaaNegLength
                } else {
                    Weird::A6NegLength
                });
                return false;
            }
            chunk.copy_from_slice(&cur.read_u32().to_be_bytes());
        }

        let addr = Ipv6Addr::from(octets);
        let kind = if msg.atype == RrType::AAAA {
            EventKind::AaaaReply
        } else {
            EventKind::A6Reply
        };

        if sink.enabled(kind) && !msg.skip_event {
            let event = if msg.atype == RrType::AAAA {
                DnsEvent::AaaaReply {
                    header: msg.header,
                    answer: msg.answer(),
                    addr,
                }
            } else {
                DnsEvent::A6Reply {
                    header: msg.header,
                    answer: msg.answer(),
                    addr,
                }
            };
            sink.emit(event);
        }

        true
    }

    fn parse_rr_name(
        &self,
        msg: &MsgInfo,
        decoder: &NameDecoder<'_>,
        cur: &mut WireCursor<'_>,
        rdlength: usize,
        sink: &mut dyn EventSink,
    ) -> bool {
        let data_start = cur.consumed();

        let Some(name) = decoder.decode(cur, sink) else {
            return false;
        };

        if cur.consumed() - data_start != rdlength {
            sink.weird(Weird::RrLengthMismatch);
        }

        let kind = match msg.atype {
            RrType::NS => EventKind::NsReply,
            RrType::CNAME => EventKind::CnameReply,
            RrType::PTR => EventKind::PtrReply,
            other => {
                error!(rtype = %other, "name rdata dispatch on a non-name record type");
                return true;
            }
        };

        if sink.enabled(kind) && !msg.skip_event {
            let event = match kind {
                EventKind::NsReply => DnsEvent::NsReply {
                    header: msg.header,
                    answer: msg.answer(),
                    name,
                },
                EventKind::CnameReply => DnsEvent::CnameReply {
                    header: msg.header,
                    answer: msg.answer(),
                    name,
                },
                _ => DnsEvent::PtrReply {
                    header: msg.header,
                    answer: msg.answer(),
                    name,
                },
            };
            sink.emit(event);
        }

        true
    }

    fn parse_rr_soa(
        &self,
        msg: &MsgInfo,
        decoder: &NameDecoder<'_>,
        cur: &mut WireCursor<'_>,
        rdlength: usize,
        sink: &mut dyn EventSink,
    ) -> bool {
        let data_start = cur.consumed();

        let Some(mname) = decoder.decode(cur, sink) else {
            return false;
        };
        let Some(rname) = decoder.decode(cur, sink) else {
            return false;
        };

        if cur.remaining() < 20 {
            return false;
        }

        let serial = cur.read_u32();
        let refresh = cur.read_u32();
        let retry = cur.read_u32();
        let expire = cur.read_u32();
        let minimum = cur.read_u32();

        if cur.consumed() - data_start != rdlength {
            sink.weird(Weird::RrLengthMismatch);
        }

        if sink.enabled(EventKind::SoaReply) && !msg.skip_event {
            sink.emit(DnsEvent::SoaReply {
                header: msg.header,
                answer: msg.answer(),
                soa: SoaRdata {
                    mname,
                    rname,
                    serial,
                    refresh,
                    retry,
                    expire,
                    minimum,
                },
            });
        }

        true
    }

    fn parse_rr_mx(
        &self,
        msg: &MsgInfo,
        decoder: &NameDecoder<'_>,
        cur: &mut WireCursor<'_>,
        rdlength: usize,
        sink: &mut dyn EventSink,
    ) -> bool {
        let data_start = cur.consumed();

        let preference = cur.read_u16();

        let Some(exchange) = decoder.decode(cur, sink) else {
            return false;
        };

        if cur.consumed() - data_start != rdlength {
            sink.weird(Weird::RrLengthMismatch);
        }

        if sink.enabled(EventKind::MxReply) && !msg.skip_event {
            sink.emit(DnsEvent::MxReply {
                header: msg.header,
                answer: msg.answer(),
                exchange,
                preference,
            });
        }

        true
    }

    fn parse_rr_srv(
        &self,
        msg: &MsgInfo,
        decoder: &NameDecoder<'_>,
        cur: &mut WireCursor<'_>,
        rdlength: usize,
        sink: &mut dyn EventSink,
    ) -> bool {
        let data_start = cur.consumed();

        let priority = cur.read_u16();
        let weight = cur.read_u16();
        let port = cur.read_u16();

        let Some(target) = decoder.decode(cur, sink) else {
            return false;
        };

        if cur.consumed() - data_start != rdlength {
            sink.weird(Weird::RrLengthMismatch);
        }

        if sink.enabled(EventKind::SrvReply) && !msg.skip_event {
            sink.emit(DnsEvent::SrvReply {
                header: msg.header,
                answer: msg.answer(),
                target,
                priority,
                weight,
                port,
            });
        }

        true
    }

    fn parse_rr_strings(
        &self,
        msg: &MsgInfo,
        kind: EventKind,
        cur: &mut WireCursor<'_>,
        rdlength: usize,
        sink: &mut dyn EventSink,
    ) -> bool {
        if !sink.enabled(kind) || msg.skip_event {
            cur.skip(rdlength);
            return true;
        }

        let mut rdlen = rdlength;
        let mut strings = Vec::new();
        let mut overran = false;

        while rdlen > 0 {
            let size = cur.read_u8() as usize;
            rdlen -= 1;

            if size > rdlen {
                sink.weird(Weird::TxtCharStrPastRdlen);
                overran = true;
                break;
            }

            strings.push(cur.read_stream(size));
            rdlen -= size;
        }

        let event = if kind == EventKind::TxtReply {
            DnsEvent::TxtReply {
                header: msg.header,
                answer: msg.answer(),
                strings,
            }
        } else {
            DnsEvent::SpfReply {
                header: msg.header,
                answer: msg.answer(),
                strings,
            }
        };
        sink.emit(event);

        !overran
    }

    fn parse_rr_caa(
        &self,
        msg: &MsgInfo,
        cur: &mut WireCursor<'_>,
        rdlength: usize,
        sink: &mut dyn EventSink,
    ) -> bool {
        if !sink.enabled(EventKind::CaaReply) || msg.skip_event {
            cur.skip(rdlength);
            return true;
        }

        let flags_and_tag = cur.read_u16();
        let flags = (flags_and_tag >> 8) as u8;
        let tag_len = (flags_and_tag & 0xFF) as usize;

        let rdlen = rdlength.saturating_sub(2);
        if tag_len >= rdlen {
            sink.weird(Weird::CaaCharStrPastRdlen);
            return false;
        }

        let tag = cur.read_stream(tag_len);
        let value = cur.read_stream(rdlen - tag_len);

        sink.emit(DnsEvent::CaaReply {
            header: msg.header,
            answer: msg.answer(),
            flags,
            tag,
            value,
        });

        true
    }

    fn parse_rr_edns(
        &self,
        msg: &MsgInfo,
        cur: &mut WireCursor<'_>,
        rdlength: usize,
        sink: &mut dyn EventSink,
    ) -> bool {
        if sink.enabled(EventKind::EdnsAddl) && !msg.skip_event {
            // The OPT TTL field splits into:
            //   [ ext rcode (8) ][ version (8) ][ Z field (16) ]
            let ercode = ((msg.ttl >> 24) & 0xFF) as u8;
            let version = ((msg.ttl >> 16) & 0xFF) as u8;
            let z = (msg.ttl & 0xFFFF) as u16;

            sink.emit(DnsEvent::EdnsAddl {
                header: msg.header,
                edns: EdnsRdata {
                    section: msg.section,
                    name: msg.query_name.clone().unwrap_or_default(),
                    rtype: msg.atype,
                    payload_size: msg.aclass,
                    extended_rcode: extended_rcode(ercode, msg.header.rcode),
                    version,
                    z,
                    ttl: msg.ttl,
                    is_query: msg.is_query,
                },
            });
        }

        // Options in the RR data are not decoded yet.
        if rdlength > 0 {
            cur.skip(rdlength);
        }

        true
    }

    fn parse_rr_tsig(
        &self,
        msg: &MsgInfo,
        decoder: &NameDecoder<'_>,
        cur: &mut WireCursor<'_>,
        sink: &mut dyn EventSink,
    ) -> bool {
        let Some(alg_name) = decoder.decode(cur, sink) else {
            return false;
        };

        let time_s = cur.read_u32();
        let time_ms = cur.read_u16();
        let fudge = cur.read_u16();
        let sig = cur.read_octets();
        let orig_id = cur.read_u16();
        let rr_error = cur.read_u16();
        let _other_data = cur.read_octets();

        if sink.enabled(EventKind::TsigAddl) {
            sink.emit(DnsEvent::TsigAddl {
                header: msg.header,
                tsig: TsigRdata {
                    name: msg.query_name.clone().unwrap_or_default(),
                    alg_name,
                    sig,
                    time_s,
                    time_ms,
                    fudge,
                    orig_id,
                    rr_error,
                    is_query: msg.is_query,
                },
            });
        }

        true
    }

    fn parse_rr_rrsig(
        &self,
        msg: &MsgInfo,
        decoder: &NameDecoder<'_>,
        cur: &mut WireCursor<'_>,
        rdlength: usize,
        sink: &mut dyn EventSink,
    ) -> bool {
        if !sink.enabled(EventKind::Rrsig) || msg.skip_event {
            cur.skip(rdlength);
            return true;
        }

        if cur.remaining() < 18 {
            return false;
        }

        let type_covered = cur.read_u16();
        let algo_and_labels = cur.read_u16();
        let algorithm = (algo_and_labels >> 8) as u8;
        let labels = (algo_and_labels & 0xFF) as u8;
        let orig_ttl = cur.read_u32();
        let sig_expiration = cur.read_u32();
        let sig_inception = cur.read_u32();
        let key_tag = cur.read_u16();

        let name_start = cur.consumed();
        let Some(signer_name) = decoder.decode(cur, sink) else {
            return false;
        };
        let name_len = cur.consumed() - name_start;

        let sig_len = rdlength.saturating_sub(18 + name_len);
        let signature = cur.read_stream(sig_len);

        match DnssecAlgo::from(algorithm) {
            DnssecAlgo::RsaMd5 => sink.weird(Weird::RrsigNotRecommendedAlgo(algorithm)),
            DnssecAlgo::Indirect => sink.weird(Weird::RrsigIndirectAlgo(algorithm)),
            DnssecAlgo::PrivateDns => sink.weird(Weird::RrsigPrivateDnsAlgo(algorithm)),
            DnssecAlgo::PrivateOid => sink.weird(Weird::RrsigPrivateOidAlgo(algorithm)),
            DnssecAlgo::Unknown(_) => sink.weird(Weird::RrsigUnknownAlgo(algorithm)),
            _ => {}
        }

        sink.emit(DnsEvent::Rrsig {
            header: msg.header,
            answer: msg.answer(),
            rrsig: RrsigRdata {
                type_covered,
                algorithm,
                labels,
                orig_ttl,
                sig_expiration,
                sig_inception,
                key_tag,
                signer_name,
                signature,
            },
        });

        true
    }

    fn parse_rr_dnskey(
        &self,
        msg: &MsgInfo,
        cur: &mut WireCursor<'_>,
        rdlength: usize,
        sink: &mut dyn EventSink,
    ) -> bool {
        if !sink.enabled(EventKind::Dnskey) || msg.skip_event {
            cur.skip(rdlength);
            return true;
        }

        if cur.remaining() < 4 {
            return false;
        }

        let flags = cur.read_u16();
        let proto_and_algo = cur.read_u16();
        let protocol = (proto_and_algo >> 8) as u8;
        let algorithm = (proto_and_algo & 0xFF) as u8;
        let public_key = cur.read_stream(rdlength.saturating_sub(4));

        // Flag bit 7: zone key; bit 8: revoked; bit 15: secure entry
        // point. Everything else must be clear.
        if (flags & 0xFE7E) != 0 {
            sink.weird(Weird::DnskeyInvalidFlag(flags));
        }

        // Zone-key, revoked, and SEP all at once: a revoked KSK.
        if (flags & 0x0181) == 0x0181 {
            sink.weird(Weird::DnskeyRevokedKsk(flags));
        }

        if protocol != 3 {
            sink.weird(Weird::DnskeyInvalidProtocol(protocol));
        }

        match DnssecAlgo::from(algorithm) {
            DnssecAlgo::RsaMd5 => sink.weird(Weird::DnskeyNotRecommendedAlgo(algorithm)),
            DnssecAlgo::Indirect => sink.weird(Weird::DnskeyIndirectAlgo(algorithm)),
            DnssecAlgo::PrivateDns => sink.weird(Weird::DnskeyPrivateDnsAlgo(algorithm)),
            DnssecAlgo::PrivateOid => sink.weird(Weird::DnskeyPrivateOidAlgo(algorithm)),
            DnssecAlgo::Unknown(_) => sink.weird(Weird::DnskeyUnknownAlgo(algorithm)),
            _ => {}
        }

        sink.emit(DnsEvent::Dnskey {
            header: msg.header,
            answer: msg.answer(),
            dnskey: DnskeyRdata {
                flags,
                protocol,
                algorithm,
                public_key,
            },
        });

        true
    }

    fn parse_rr_nsec(
        &self,
        msg: &MsgInfo,
        decoder: &NameDecoder<'_>,
        cur: &mut WireCursor<'_>,
        rdlength: usize,
        sink: &mut dyn EventSink,
    ) -> bool {
        if !sink.enabled(EventKind::Nsec) || msg.skip_event {
            cur.skip(rdlength);
            return true;
        }

        let data_start = cur.consumed();

        let Some(next_name) = decoder.decode(cur, sink) else {
            return false;
        };

        let bitmaps_len = rdlength.saturating_sub(cur.consumed() - data_start);
        let bitmaps = self.parse_type_bitmaps(cur, bitmaps_len, false, sink);

        sink.emit(DnsEvent::Nsec {
            header: msg.header,
            answer: msg.answer(),
            next_name,
            bitmaps,
        });

        true
    }

    fn parse_rr_nsec3(
        &self,
        msg: &MsgInfo,
        cur: &mut WireCursor<'_>,
        rdlength: usize,
        sink: &mut dyn EventSink,
    ) -> bool {
        if !sink.enabled(EventKind::Nsec3) || msg.skip_event {
            cur.skip(rdlength);
            return true;
        }

        if cur.remaining() < 6 {
            return false;
        }

        let data_start = cur.consumed();

        let halgo_and_flags = cur.read_u16();
        let hash_algo = (halgo_and_flags >> 8) as u8;
        let flags = (halgo_and_flags & 0xFF) as u8;
        let iterations = cur.read_u16();

        let salt_len = cur.read_u8();
        let salt = cur.read_stream(salt_len as usize);

        let hash_len = cur.read_u8();
        let hash = cur.read_stream(hash_len as usize);

        let bitmaps_len = rdlength.saturating_sub(cur.consumed() - data_start);
        let bitmaps = self.parse_type_bitmaps(cur, bitmaps_len, true, sink);

        sink.emit(DnsEvent::Nsec3 {
            header: msg.header,
            answer: msg.answer(),
            nsec3: Nsec3Rdata {
                hash_algo,
                flags,
                iterations,
                salt,
                hash,
                bitmaps,
            },
        });

        true
    }

    /// Walks the type-bitmap blocks shared by NSEC and NSEC3:
    /// `(window(u8), length(u8), bytes)` repeated until the rdata or the
    /// message runs out. A zero-length block is anomalous and terminates
    /// the walk.
    fn parse_type_bitmaps(
        &self,
        cur: &mut WireCursor<'_>,
        bitmaps_len: usize,
        nsec3: bool,
        sink: &mut dyn EventSink,
    ) -> Vec<Vec<u8>> {
        let mut remaining = bitmaps_len as i64;
        let mut bitmaps = Vec::new();

        while remaining > 0 && cur.remaining() > 0 {
            let block = cur.read_u16();
            let window = (block >> 8) as u8;
            let bmlen = (block & 0xFF) as usize;

            if bmlen == 0 {
                sink.weird(if nsec3 {
                    Weird::Nsec3BitmapLenZero(window)
                } else {
                    Weird::NsecBitmapLenZero(window)
                });
                break;
            }

            bitmaps.push(cur.read_stream(bmlen));
            remaining -= 2 + bmlen as i64;
        }

        bitmaps
    }

    fn parse_rr_ds(
        &self,
        msg: &MsgInfo,
        cur: &mut WireCursor<'_>,
        rdlength: usize,
        sink: &mut dyn EventSink,
    ) -> bool {
        if !sink.enabled(EventKind::Ds) || msg.skip_event {
            cur.skip(rdlength);
            return true;
        }

        if cur.remaining() < 4 {
            return false;
        }

        let key_tag = cur.read_u16();
        let algo_and_digest = cur.read_u16();
        let algorithm = (algo_and_digest >> 8) as u8;
        let digest_type = (algo_and_digest & 0xFF) as u8;
        let digest = cur.read_stream(rdlength.saturating_sub(4));

        match DnssecDigest::from(digest_type) {
            DnssecDigest::Reserved => sink.weird(Weird::DsReservedDigest(digest_type)),
            DnssecDigest::Unknown(_) => sink.weird(Weird::DsUnknownDigest(digest_type)),
            _ => {}
        }

        sink.emit(DnsEvent::Ds {
            header: msg.header,
            answer: msg.answer(),
            ds: DsRdata {
                key_tag,
                algorithm,
                digest_type,
                digest,
            },
        });

        true
    }
}
