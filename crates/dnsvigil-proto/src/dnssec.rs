//! DNSSEC algorithm and digest registries.
//!
//! Only the wire numbers are modeled here. The monitor never verifies a
//! signature; it classifies the advertised algorithm so the interpreter
//! can flag deprecated, indirect, and private values.

use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};

/// DNSSEC zone-signing algorithm numbers (RFC 4034 appendix A.1).
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
pub enum DnssecAlgo {
    /// RSA/MD5, no longer recommended for zone signing
    RsaMd5 = 1,

    /// Diffie-Hellman
    DiffieHellman = 2,

    /// DSA/SHA-1
    DsaSha1 = 3,

    /// Reserved for elliptic curve
    EllipticCurve = 4,

    /// RSA/SHA-1
    RsaSha1 = 5,

    /// DSA-NSEC3-SHA1
    DsaNsec3Sha1 = 6,

    /// RSA/SHA-1 with NSEC3
    RsaSha1Nsec3Sha1 = 7,

    /// RSA/SHA-256
    RsaSha256 = 8,

    /// RSA/SHA-512
    RsaSha512 = 10,

    /// GOST R 34.10-2001
    GostR34_10_2001 = 12,

    /// ECDSA curve P-256 with SHA-256
    EcdsaP256Sha256 = 13,

    /// ECDSA curve P-384 with SHA-384
    EcdsaP384Sha384 = 14,

    /// Indirect keying
    Indirect = 252,

    /// Private algorithm, domain-name encoded
    PrivateDns = 253,

    /// Private algorithm, OID encoded
    PrivateOid = 254,

    /// Unassigned algorithm number.
    #[num_enum(catch_all)]
    Unknown(u8),
}

impl DnssecAlgo {
    /// Returns true for algorithms a signed zone is expected to use.
    ///
    /// Deprecated (MD5), indirect, private, and unassigned numbers all
    /// return false and warrant a diagnostic.
    #[must_use]
    pub const fn is_ordinary(&self) -> bool {
        !matches!(
            self,
            Self::RsaMd5
                | Self::Indirect
                | Self::PrivateDns
                | Self::PrivateOid
                | Self::Unknown(_)
        )
    }
}

/// DNSSEC DS digest type numbers (RFC 4034, RFC 5933, RFC 6605).
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
pub enum DnssecDigest {
    /// Reserved value; must not appear on the wire
    Reserved = 0,

    /// SHA-1
    Sha1 = 1,

    /// SHA-256
    Sha256 = 2,

    /// GOST R 34.11-94
    GostR34_11_94 = 3,

    /// SHA-384
    Sha384 = 4,

    /// Unassigned digest type.
    #[num_enum(catch_all)]
    Unknown(u8),
}
