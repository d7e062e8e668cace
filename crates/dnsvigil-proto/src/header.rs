//! DNS message header.
//!
//! The DNS header is a fixed 12-byte structure at the start of every DNS
//! message. It carries the transaction id, the flag word, and the four
//! section counts.

use crate::opcode::Opcode;
use crate::rcode::Rcode;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of the DNS header in bytes.
pub const HEADER_SIZE: usize = 12;

bitflags! {
    /// The single-bit flags of the DNS header flag word.
    ///
    /// Opcode, rcode, and the three-bit Z field are multi-bit and kept as
    /// raw integers on [`Header`] instead.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct HeaderFlags: u16 {
        /// Query/Response flag: 0 = query, 1 = response
        const QR = 0x8000;

        /// Authoritative Answer: server is authoritative for the domain
        const AA = 0x0400;

        /// Truncation: message was truncated
        const TC = 0x0200;

        /// Recursion Desired: client wants recursive resolution
        const RD = 0x0100;

        /// Recursion Available: server supports recursion
        const RA = 0x0080;
    }
}

/// DNS message header as seen on the wire.
///
/// All multi-bit fields are preserved raw. A passive monitor must never
/// reject a message over an unknown opcode or rcode value, so decoding is
/// lossless: the only way [`Header::parse`] declines is on fewer than 12
/// bytes of input.
///
/// # Wire Format
///
/// ```text
///                                 1  1  1  1  1  1
///   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      ID                       |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |QR|   Opcode  |AA|TC|RD|RA|   Z    |   RCODE   |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    QDCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    ANCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    NSCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    ARCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Transaction identifier.
    pub id: u16,

    /// Single-bit flags (QR, AA, TC, RD, RA).
    pub flags: HeaderFlags,

    /// Operation code, raw 4-bit value.
    pub opcode: u8,

    /// Reserved Z field, raw 3-bit value.
    pub z: u8,

    /// Response code, raw 4-bit value.
    pub rcode: u8,

    /// Number of questions.
    pub qdcount: u16,

    /// Number of answer records.
    pub ancount: u16,

    /// Number of authority records.
    pub nscount: u16,

    /// Number of additional records.
    pub arcount: u16,
}

impl Header {
    /// Decodes a header from the front of `data`.
    ///
    /// Returns `None` when fewer than [`HEADER_SIZE`] bytes are available;
    /// the caller reports the truncation.
    #[must_use]
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < HEADER_SIZE {
            return None;
        }

        let raw = u16::from_be_bytes([data[2], data[3]]);

        Some(Self {
            id: u16::from_be_bytes([data[0], data[1]]),
            flags: HeaderFlags::from_bits_truncate(raw),
            opcode: ((raw >> 11) & 0x0F) as u8,
            z: ((raw >> 4) & 0x07) as u8,
            rcode: (raw & 0x0F) as u8,
            qdcount: u16::from_be_bytes([data[4], data[5]]),
            ancount: u16::from_be_bytes([data[6], data[7]]),
            nscount: u16::from_be_bytes([data[8], data[9]]),
            arcount: u16::from_be_bytes([data[10], data[11]]),
        })
    }

    /// Returns true if the QR bit marks this message as a query.
    #[inline]
    #[must_use]
    pub fn is_query(&self) -> bool {
        !self.flags.contains(HeaderFlags::QR)
    }

    /// Returns true if the QR bit marks this message as a response.
    #[inline]
    #[must_use]
    pub fn is_response(&self) -> bool {
        self.flags.contains(HeaderFlags::QR)
    }

    /// Returns true if the response is authoritative.
    #[inline]
    #[must_use]
    pub fn is_authoritative(&self) -> bool {
        self.flags.contains(HeaderFlags::AA)
    }

    /// Returns true if the message was truncated.
    #[inline]
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.flags.contains(HeaderFlags::TC)
    }

    /// Returns true if recursion was requested.
    #[inline]
    #[must_use]
    pub fn recursion_desired(&self) -> bool {
        self.flags.contains(HeaderFlags::RD)
    }

    /// Returns true if recursion is available.
    #[inline]
    #[must_use]
    pub fn recursion_available(&self) -> bool {
        self.flags.contains(HeaderFlags::RA)
    }

    /// Returns the opcode as a registry value.
    #[inline]
    #[must_use]
    pub fn opcode_enum(&self) -> Opcode {
        Opcode::from(self.opcode)
    }

    /// Returns the response code as a registry value.
    #[inline]
    #[must_use]
    pub fn rcode_enum(&self) -> Rcode {
        Rcode::from(self.rcode)
    }

    /// Returns true if all three response record sections are empty.
    #[inline]
    #[must_use]
    pub fn has_no_records(&self) -> bool {
        self.ancount == 0 && self.nscount == 0 && self.arcount == 0
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID:{:04X} {} {} {}",
            self.id,
            if self.is_query() { "query" } else { "response" },
            self.opcode_enum(),
            self.rcode_enum()
        )?;

        if self.is_authoritative() {
            write!(f, " AA")?;
        }
        if self.is_truncated() {
            write!(f, " TC")?;
        }
        if self.recursion_desired() {
            write!(f, " RD")?;
        }
        if self.recursion_available() {
            write!(f, " RA")?;
        }

        write!(
            f,
            " QD:{} AN:{} NS:{} AR:{}",
            self.qdcount, self.ancount, self.nscount, self.arcount
        )
    }
}
