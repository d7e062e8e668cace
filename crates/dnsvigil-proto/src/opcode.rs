//! DNS operation codes.

use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// DNS opcode (4-bit field in the header flag word).
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
pub enum Opcode {
    /// Standard query - RFC 1035
    Query = 0,

    /// Inverse query (obsolete) - RFC 3425
    IQuery = 1,

    /// Server status request - RFC 1035
    Status = 2,

    /// Zone change notification - RFC 1996
    Notify = 4,

    /// Dynamic update - RFC 2136
    Update = 5,

    /// Unassigned opcode value.
    #[num_enum(catch_all)]
    Unknown(u8),
}

impl Opcode {
    /// Returns the mnemonic for a known opcode.
    #[must_use]
    pub const fn mnemonic(&self) -> Option<&'static str> {
        match self {
            Self::Query => Some("QUERY"),
            Self::IQuery => Some("IQUERY"),
            Self::Status => Some("STATUS"),
            Self::Notify => Some("NOTIFY"),
            Self::Update => Some("UPDATE"),
            Self::Unknown(_) => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mnemonic() {
            Some(name) => f.write_str(name),
            None => write!(f, "OPCODE{}", u8::from(*self)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_u8() {
        assert_eq!(Opcode::from(0u8), Opcode::Query);
        assert_eq!(Opcode::from(5u8), Opcode::Update);
        assert_eq!(Opcode::from(3u8), Opcode::Unknown(3));
    }

    #[test]
    fn test_display() {
        assert_eq!(Opcode::Query.to_string(), "QUERY");
        assert_eq!(Opcode::Unknown(9).to_string(), "OPCODE9");
    }
}
