//! Named protocol-anomaly diagnostics.
//!
//! A "weird" is traffic that parses (or almost parses) but deviates from
//! the RFCs in a way worth surfacing: a forward compression pointer, an
//! oversize label, a revoked key-signing key. Weirds are delivered to the
//! event sink on a channel separate from the regular event stream; the
//! enclosing monitor decides the logging policy.

use serde::Serialize;
use std::fmt;

/// A recognized protocol anomaly.
///
/// Variants carry the numeric detail that identifies the offending value
/// (record type code, algorithm number, flag word) where one exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Weird {
    /// Message shorter than the fixed 12-byte header.
    TruncatedMsgHeader,
    /// Question count above the configured ceiling.
    ConnCountTooLarge,
    /// Question ended before qtype/qclass.
    TruncatedQuestion,
    /// Resource record ended before its fixed fields.
    TruncatedAnswer,
    /// Declared rdlength exceeds the remaining message.
    TruncatedRrRdlength,
    /// Compression pointer targeting its own position or beyond.
    ForwardCompressOffset,
    /// Label length exceeds the remaining packet.
    LabelLenGtPkt,
    /// Label longer than 63 bytes outside NetBIOS name service.
    LabelTooLong,
    /// Label does not fit the name scratch buffer.
    LabelLenGtNameLen,
    /// Assembled name is 255 bytes or longer (advisory).
    NameTooLong,
    /// Record parser consumed a different number of bytes than rdlength.
    RrLengthMismatch,
    /// A record with an rdlength other than 4.
    RrBadLength,
    /// Record type outside the dispatched set.
    RrUnknownType(u16),
    /// TXT/SPF character string running past rdlength.
    TxtCharStrPastRdlen,
    /// CAA tag length running past rdlength.
    CaaCharStrPastRdlen,
    /// AAAA rdata shorter than 16 bytes.
    AaaaNegLength,
    /// A6 rdata shorter than 16 bytes.
    A6NegLength,
    /// RRSIG signed with a no-longer-recommended algorithm.
    RrsigNotRecommendedAlgo(u8),
    /// RRSIG advertising indirect keying.
    RrsigIndirectAlgo(u8),
    /// RRSIG advertising a private (domain-name) algorithm.
    RrsigPrivateDnsAlgo(u8),
    /// RRSIG advertising a private (OID) algorithm.
    RrsigPrivateOidAlgo(u8),
    /// RRSIG with an unassigned algorithm number.
    RrsigUnknownAlgo(u8),
    /// DNSKEY with a no-longer-recommended algorithm.
    DnskeyNotRecommendedAlgo(u8),
    /// DNSKEY advertising indirect keying.
    DnskeyIndirectAlgo(u8),
    /// DNSKEY advertising a private (domain-name) algorithm.
    DnskeyPrivateDnsAlgo(u8),
    /// DNSKEY advertising a private (OID) algorithm.
    DnskeyPrivateOidAlgo(u8),
    /// DNSKEY with an unassigned algorithm number.
    DnskeyUnknownAlgo(u8),
    /// DNSKEY with reserved flag bits set.
    DnskeyInvalidFlag(u16),
    /// DNSKEY marked as a revoked key-signing key.
    DnskeyRevokedKsk(u16),
    /// DNSKEY protocol field other than 3.
    DnskeyInvalidProtocol(u8),
    /// NSEC type bitmap block with a zero length; carries the window.
    NsecBitmapLenZero(u8),
    /// NSEC3 type bitmap block with a zero length; carries the window.
    Nsec3BitmapLenZero(u8),
    /// DS with the reserved digest type zero.
    DsReservedDigest(u8),
    /// DS with an unassigned digest type.
    DsUnknownDigest(u8),
}

impl Weird {
    /// The stable diagnostic name, as surfaced to the monitor's notice
    /// channel.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TruncatedMsgHeader => "DNS_truncated_len_lt_hdr_len",
            Self::ConnCountTooLarge => "DNS_Conn_count_too_large",
            Self::TruncatedQuestion => "DNS_truncated_quest_too_short",
            Self::TruncatedAnswer => "DNS_truncated_ans_too_short",
            Self::TruncatedRrRdlength => "DNS_truncated_RR_rdlength_lt_len",
            Self::ForwardCompressOffset => "DNS_label_forward_compress_offset",
            Self::LabelLenGtPkt => "DNS_label_len_gt_pkt",
            Self::LabelTooLong => "DNS_label_too_long",
            Self::LabelLenGtNameLen => "DNS_label_len_gt_name_len",
            Self::NameTooLong => "DNS_NAME_too_long",
            Self::RrLengthMismatch => "DNS_RR_length_mismatch",
            Self::RrBadLength => "DNS_RR_bad_length",
            Self::RrUnknownType(_) => "DNS_RR_unknown_type",
            Self::TxtCharStrPastRdlen => "DNS_TXT_char_str_past_rdlen",
            Self::CaaCharStrPastRdlen => "DNS_CAA_char_str_past_rdlen",
            Self::AaaaNegLength => "DNS_AAAA_neg_length",
            Self::A6NegLength => "DNS_A6_neg_length",
            Self::RrsigNotRecommendedAlgo(_) => "DNSSEC_RRSIG_NotRecommended_ZoneSignAlgo",
            Self::RrsigIndirectAlgo(_) => "DNSSEC_RRSIG_Indirect_ZoneSignAlgo",
            Self::RrsigPrivateDnsAlgo(_) => "DNSSEC_RRSIG_PrivateDNS_ZoneSignAlgo",
            Self::RrsigPrivateOidAlgo(_) => "DNSSEC_RRSIG_PrivateOID_ZoneSignAlgo",
            Self::RrsigUnknownAlgo(_) => "DNSSEC_RRSIG_unknown_ZoneSignAlgo",
            Self::DnskeyNotRecommendedAlgo(_) => "DNSSEC_DNSKEY_NotRecommended_ZoneSignAlgo",
            Self::DnskeyIndirectAlgo(_) => "DNSSEC_DNSKEY_Indirect_ZoneSignAlgo",
            Self::DnskeyPrivateDnsAlgo(_) => "DNSSEC_DNSKEY_PrivateDNS_ZoneSignAlgo",
            Self::DnskeyPrivateOidAlgo(_) => "DNSSEC_DNSKEY_PrivateOID_ZoneSignAlgo",
            Self::DnskeyUnknownAlgo(_) => "DNSSEC_DNSKEY_unknown_ZoneSignAlgo",
            Self::DnskeyInvalidFlag(_) => "DNSSEC_DNSKEY_Invalid_Flag",
            Self::DnskeyRevokedKsk(_) => "DNSSEC_DNSKEY_Revoked_KSK",
            Self::DnskeyInvalidProtocol(_) => "DNSSEC_DNSKEY_Invalid_Protocol",
            Self::NsecBitmapLenZero(_) => "DNSSEC_NSEC_bitmapLen0",
            Self::Nsec3BitmapLenZero(_) => "DNSSEC_NSEC3_bitmapLen0",
            Self::DsReservedDigest(_) => "DNSSEC_DS_Reserved_DigestType",
            Self::DsUnknownDigest(_) => "DNSSEC_DS_unknown_DigestType",
        }
    }

    /// The numeric detail attached to the anomaly, if any.
    #[must_use]
    pub const fn detail(&self) -> Option<u32> {
        match self {
            Self::RrUnknownType(v) => Some(*v as u32),
            Self::DnskeyInvalidFlag(v) | Self::DnskeyRevokedKsk(v) => Some(*v as u32),
            Self::RrsigNotRecommendedAlgo(v)
            | Self::RrsigIndirectAlgo(v)
            | Self::RrsigPrivateDnsAlgo(v)
            | Self::RrsigPrivateOidAlgo(v)
            | Self::RrsigUnknownAlgo(v)
            | Self::DnskeyNotRecommendedAlgo(v)
            | Self::DnskeyIndirectAlgo(v)
            | Self::DnskeyPrivateDnsAlgo(v)
            | Self::DnskeyPrivateOidAlgo(v)
            | Self::DnskeyUnknownAlgo(v)
            | Self::DnskeyInvalidProtocol(v)
            | Self::NsecBitmapLenZero(v)
            | Self::Nsec3BitmapLenZero(v)
            | Self::DsReservedDigest(v)
            | Self::DsUnknownDigest(v) => Some(*v as u32),
            _ => None,
        }
    }
}

impl fmt::Display for Weird {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail() {
            Some(detail) => write!(f, "{} ({detail})", self.name()),
            None => f.write_str(self.name()),
        }
    }
}
