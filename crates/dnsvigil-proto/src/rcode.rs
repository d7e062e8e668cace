//! DNS response codes.

use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// DNS response code (4-bit field in the header flag word).
///
/// EDNS(0) widens the rcode by prepending an extra byte from the OPT TTL
/// field; see [`extended_rcode`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    FromPrimitive,
    IntoPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
pub enum Rcode {
    /// No error - RFC 1035
    NoError = 0,

    /// Format error - RFC 1035
    FormErr = 1,

    /// Server failure - RFC 1035
    ServFail = 2,

    /// Non-existent domain - RFC 1035
    NxDomain = 3,

    /// Not implemented - RFC 1035
    NotImp = 4,

    /// Query refused - RFC 1035
    Refused = 5,

    /// Name exists when it should not - RFC 2136
    YxDomain = 6,

    /// RR set exists when it should not - RFC 2136
    YxRrSet = 7,

    /// RR set that should exist does not - RFC 2136
    NxRrSet = 8,

    /// Server not authoritative for zone - RFC 2136
    NotAuth = 9,

    /// Name not contained in zone - RFC 2136
    NotZone = 10,

    /// Unassigned rcode value.
    #[num_enum(catch_all)]
    Unknown(u8),
}

impl Rcode {
    /// Returns the mnemonic for a known rcode.
    #[must_use]
    pub const fn mnemonic(&self) -> Option<&'static str> {
        match self {
            Self::NoError => Some("NOERROR"),
            Self::FormErr => Some("FORMERR"),
            Self::ServFail => Some("SERVFAIL"),
            Self::NxDomain => Some("NXDOMAIN"),
            Self::NotImp => Some("NOTIMP"),
            Self::Refused => Some("REFUSED"),
            Self::YxDomain => Some("YXDOMAIN"),
            Self::YxRrSet => Some("YXRRSET"),
            Self::NxRrSet => Some("NXRRSET"),
            Self::NotAuth => Some("NOTAUTH"),
            Self::NotZone => Some("NOTZONE"),
            Self::Unknown(_) => None,
        }
    }

    /// Returns true if this rcode reports an error condition.
    #[must_use]
    pub fn is_error(&self) -> bool {
        *self != Self::NoError
    }
}

impl fmt::Display for Rcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mnemonic() {
            Some(name) => f.write_str(name),
            None => write!(f, "RCODE{}", u8::from(*self)),
        }
    }
}

/// Combines the EDNS extended-rcode byte with the 4-bit header rcode into
/// the 12-bit value defined by RFC 6891.
#[inline]
#[must_use]
pub fn extended_rcode(ext: u8, header_rcode: u8) -> u16 {
    (u16::from(ext) << 8) | u16::from(header_rcode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_u8() {
        assert_eq!(Rcode::from(0u8), Rcode::NoError);
        assert_eq!(Rcode::from(3u8), Rcode::NxDomain);
        assert_eq!(Rcode::from(14u8), Rcode::Unknown(14));
    }

    #[test]
    fn test_is_error() {
        assert!(!Rcode::NoError.is_error());
        assert!(Rcode::ServFail.is_error());
        assert!(Rcode::Unknown(12).is_error());
    }

    #[test]
    fn test_extended_rcode() {
        // BADVERS: extended byte 1 with header rcode 0.
        assert_eq!(extended_rcode(1, 0), 0x0100);
        assert_eq!(extended_rcode(0, 3), 3);
        assert_eq!(extended_rcode(0xFF, 0x0F), 0xFF0F);
    }
}
