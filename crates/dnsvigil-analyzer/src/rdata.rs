//! Typed payload values for the richer record types.
//!
//! These are transient value bags: a record parser fills one in, hands it
//! to the sink inside the corresponding event, and never touches it again.
//! Simple record types (A, NS, MX, ...) carry their few fields inline on
//! the event instead.

use crate::event::{AnswerSection, QueryHint};
use crate::name::DnsName;
use data_encoding::HEXLOWER;
use dnsvigil_proto::RrType;
use serde::Serialize;
use std::fmt;

/// SOA record payload (RFC 1035 §3.3.13). All intervals are seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoaRdata {
    /// Primary name server of the zone.
    pub mname: DnsName,
    /// Mailbox of the person responsible.
    pub rname: DnsName,
    /// Zone serial number.
    pub serial: u32,
    /// Refresh interval.
    pub refresh: u32,
    /// Retry interval.
    pub retry: u32,
    /// Expiry interval.
    pub expire: u32,
    /// Minimum TTL.
    pub minimum: u32,
}

/// The reinterpreted fields of an EDNS(0) OPT pseudo-record (RFC 6891).
///
/// OPT abuses the generic RR layout: the class field carries the sender's
/// UDP payload size and the TTL field splits into extended rcode, version,
/// and a flag word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdnsRdata {
    /// Section the pseudo-record appeared in.
    pub section: AnswerSection,
    /// Owner name (normally root).
    pub name: DnsName,
    /// The type code (always OPT).
    pub rtype: RrType,
    /// Sender's maximum UDP payload size, from the class field.
    pub payload_size: u16,
    /// Extended rcode combined with the header rcode:
    /// `(ext_rcode << 8) | rcode`.
    pub extended_rcode: u16,
    /// EDNS version.
    pub version: u8,
    /// The Z flag word (includes the DNSSEC-OK bit).
    pub z: u16,
    /// The raw TTL field the above were unpacked from.
    pub ttl: u32,
    /// Direction of the enclosing message.
    pub is_query: QueryHint,
}

/// TSIG pseudo-record payload (RFC 2845).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TsigRdata {
    /// Owner name of the record.
    pub name: DnsName,
    /// Signing algorithm name.
    pub alg_name: DnsName,
    /// The MAC.
    pub sig: Vec<u8>,
    /// Signing time, seconds part of the 48-bit timestamp.
    pub time_s: u32,
    /// Signing time, milliseconds part.
    pub time_ms: u16,
    /// Permitted clock skew, seconds.
    pub fudge: u16,
    /// Original message id.
    pub orig_id: u16,
    /// TSIG error code.
    pub rr_error: u16,
    /// Direction of the enclosing message.
    pub is_query: QueryHint,
}

/// RRSIG record payload (RFC 4034 §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RrsigRdata {
    /// Type code of the RRset covered by the signature.
    pub type_covered: u16,
    /// Signing algorithm number.
    pub algorithm: u8,
    /// Label count of the original owner name.
    pub labels: u8,
    /// TTL of the covered RRset at signing time.
    pub orig_ttl: u32,
    /// Signature expiration, Unix seconds.
    pub sig_expiration: u32,
    /// Signature inception, Unix seconds.
    pub sig_inception: u32,
    /// Key tag of the signing key.
    pub key_tag: u16,
    /// Name of the signing zone.
    pub signer_name: DnsName,
    /// The raw signature.
    pub signature: Vec<u8>,
}

/// DNSKEY record payload (RFC 4034 §2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnskeyRdata {
    /// Key flags (zone key, SEP, revoked).
    pub flags: u16,
    /// Protocol field; must be 3.
    pub protocol: u8,
    /// Signing algorithm number.
    pub algorithm: u8,
    /// The raw public key.
    pub public_key: Vec<u8>,
}

/// NSEC3 record payload (RFC 5155 §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Nsec3Rdata {
    /// Hash algorithm number.
    pub hash_algo: u8,
    /// NSEC3 flags (opt-out).
    pub flags: u8,
    /// Additional hash iterations.
    pub iterations: u16,
    /// The salt.
    pub salt: Vec<u8>,
    /// The next hashed owner name.
    pub hash: Vec<u8>,
    /// The raw type-bitmap blocks.
    pub bitmaps: Vec<Vec<u8>>,
}

/// DS record payload (RFC 4034 §5).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DsRdata {
    /// Key tag of the referenced DNSKEY.
    pub key_tag: u16,
    /// Signing algorithm number.
    pub algorithm: u8,
    /// Digest type number.
    pub digest_type: u8,
    /// The digest.
    pub digest: Vec<u8>,
}

impl fmt::Display for DsRdata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.key_tag,
            self.algorithm,
            self.digest_type,
            HEXLOWER.encode(&self.digest)
        )
    }
}

impl fmt::Display for Nsec3Rdata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let salt = if self.salt.is_empty() {
            "-".to_string()
        } else {
            HEXLOWER.encode(&self.salt)
        };

        write!(
            f,
            "{} {} {} {} {}",
            self.hash_algo,
            self.flags,
            self.iterations,
            salt,
            HEXLOWER.encode(&self.hash)
        )
    }
}
