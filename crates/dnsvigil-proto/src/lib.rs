//! # dnsvigil DNS Wire-Format Primitives
//!
//! This crate provides the low-level building blocks used by the dnsvigil
//! passive DNS monitor to pick apart untrusted DNS messages:
//!
//! - A bounds-checked [`WireCursor`] over a message body whose field
//!   readers never fail and never read past the end of the input
//! - The fixed 12-byte message [`Header`]
//! - Registries for record types, opcodes, response codes, and the DNSSEC
//!   algorithm / digest numbers
//!
//! Everything here is pure data plumbing: no I/O, no events, no policy.
//! Unknown code points are always preserved rather than rejected — a
//! passive observer must keep parsing traffic it does not fully
//! understand.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cursor;
pub mod dnssec;
pub mod header;
pub mod opcode;
pub mod rcode;
pub mod rtype;

pub use cursor::WireCursor;
pub use dnssec::{DnssecAlgo, DnssecDigest};
pub use header::{Header, HeaderFlags, HEADER_SIZE};
pub use opcode::Opcode;
pub use rcode::Rcode;
pub use rtype::RrType;

/// Maximum length of a single DNS label (RFC 1035).
pub const MAX_LABEL_LENGTH: usize = 63;

/// Maximum length of a full domain name in presentation form (RFC 1035).
pub const MAX_NAME_LENGTH: usize = 255;

/// The well-known DNS port.
pub const DNS_PORT: u16 = 53;

/// NetBIOS name service port. Lookups against this port are allowed to
/// carry labels longer than 63 bytes.
pub const NETBIOS_NS_PORT: u16 = 137;
