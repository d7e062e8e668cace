//! DNS record types.
//!
//! This registry covers the record types the interpreter dispatches on:
//! the classic RFC 1035 set, service and text records, EDNS(0)/TSIG
//! pseudo-records, and the DNSSEC family. Anything else is preserved as
//! [`RrType::Unknown`] so the type code survives into the event stream.

use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// DNS record type.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    FromPrimitive,
    IntoPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(u16)]
pub enum RrType {
    /// IPv4 address - RFC 1035
    A = 1,

    /// Authoritative name server - RFC 1035
    NS = 2,

    /// Canonical name (alias) - RFC 1035
    CNAME = 5,

    /// Start of authority - RFC 1035
    SOA = 6,

    /// Well-known services - RFC 1035
    WKS = 11,

    /// Domain name pointer - RFC 1035
    PTR = 12,

    /// Host information - RFC 1035
    HINFO = 13,

    /// Mail exchange - RFC 1035
    MX = 15,

    /// Text strings - RFC 1035
    TXT = 16,

    /// IPv6 address - RFC 3596
    AAAA = 28,

    /// NetBIOS service record - RFC 1002
    NBS = 32,

    /// Service location - RFC 2782
    SRV = 33,

    /// IPv6 address, deprecated encoding - RFC 2874
    A6 = 38,

    /// EDNS(0) OPT pseudo-record - RFC 6891
    EDNS = 41,

    /// Delegation signer - RFC 4034
    DS = 43,

    /// DNSSEC signature - RFC 4034
    RRSIG = 46,

    /// Next secure record - RFC 4034
    NSEC = 47,

    /// DNS public key - RFC 4034
    DNSKEY = 48,

    /// Next secure record v3 - RFC 5155
    NSEC3 = 50,

    /// Sender policy framework - RFC 4408
    SPF = 99,

    /// Transaction signature pseudo-record - RFC 2845
    TSIG = 250,

    /// Certification authority authorization - RFC 6844
    CAA = 257,

    /// Any type code outside the dispatched set.
    #[num_enum(catch_all)]
    Unknown(u16),
}

impl RrType {
    /// Returns the mnemonic for a known type.
    #[must_use]
    pub const fn mnemonic(&self) -> Option<&'static str> {
        match self {
            Self::A => Some("A"),
            Self::NS => Some("NS"),
            Self::CNAME => Some("CNAME"),
            Self::SOA => Some("SOA"),
            Self::WKS => Some("WKS"),
            Self::PTR => Some("PTR"),
            Self::HINFO => Some("HINFO"),
            Self::MX => Some("MX"),
            Self::TXT => Some("TXT"),
            Self::AAAA => Some("AAAA"),
            Self::NBS => Some("NBS"),
            Self::SRV => Some("SRV"),
            Self::A6 => Some("A6"),
            Self::EDNS => Some("OPT"),
            Self::DS => Some("DS"),
            Self::RRSIG => Some("RRSIG"),
            Self::NSEC => Some("NSEC"),
            Self::DNSKEY => Some("DNSKEY"),
            Self::NSEC3 => Some("NSEC3"),
            Self::SPF => Some("SPF"),
            Self::TSIG => Some("TSIG"),
            Self::CAA => Some("CAA"),
            Self::Unknown(_) => None,
        }
    }

    /// Returns true for the DNSSEC record family.
    #[must_use]
    pub const fn is_dnssec(&self) -> bool {
        matches!(
            self,
            Self::DS | Self::RRSIG | Self::NSEC | Self::DNSKEY | Self::NSEC3
        )
    }

    /// Returns true for pseudo-records that only ever appear in the
    /// additional section (OPT, TSIG).
    #[must_use]
    pub const fn is_pseudo(&self) -> bool {
        matches!(self, Self::EDNS | Self::TSIG)
    }
}

impl fmt::Display for RrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mnemonic() {
            Some(name) => f.write_str(name),
            None => write!(f, "TYPE{}", u16::from(*self)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_u16() {
        assert_eq!(RrType::from(1u16), RrType::A);
        assert_eq!(RrType::from(28u16), RrType::AAAA);
        assert_eq!(RrType::from(41u16), RrType::EDNS);
        assert_eq!(RrType::from(257u16), RrType::CAA);
        assert_eq!(RrType::from(999u16), RrType::Unknown(999));
    }

    #[test]
    fn test_roundtrip() {
        for code in [1u16, 2, 5, 6, 15, 16, 28, 33, 41, 43, 46, 47, 48, 50, 99, 250, 257, 4095] {
            assert_eq!(u16::from(RrType::from(code)), code);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(RrType::A.to_string(), "A");
        assert_eq!(RrType::EDNS.to_string(), "OPT");
        assert_eq!(RrType::Unknown(666).to_string(), "TYPE666");
    }

    #[test]
    fn test_classification() {
        assert!(RrType::RRSIG.is_dnssec());
        assert!(RrType::NSEC3.is_dnssec());
        assert!(!RrType::A.is_dnssec());
        assert!(RrType::EDNS.is_pseudo());
        assert!(RrType::TSIG.is_pseudo());
        assert!(!RrType::SOA.is_pseudo());
    }
}
