//! Domain-name decoding from wire format.
//!
//! Names are decoded from arbitrary offsets of an untrusted message,
//! following RFC 1035 compression pointers. Safety comes from two rules:
//! every pointer must target an offset strictly below the position of the
//! pointer byte itself, and every spliced-in read is bounded to end before
//! the pointer it came from. Together these make cycles unrepresentable
//! and bound the total work without a visited set.
//!
//! Decoding is iterative; a pointer terminates the label sequence of the
//! frame it appears in, so no return stack is needed.

use crate::event::EventSink;
use crate::weird::Weird;
use dnsvigil_proto::{WireCursor, MAX_LABEL_LENGTH, MAX_NAME_LENGTH};
use serde::{Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;

/// Size of the per-name scratch buffer: the 255-byte wire maximum is the
/// protocol limit, but anomalous traffic may legitimately exceed it (the
/// overflow is reported, not dropped), so the scratch leaves headroom.
pub const NAME_SCRATCH_SIZE: usize = 513;

/// A decoded, normalized domain name.
///
/// Stored in presentation form: labels joined by `.`, ASCII uppercase
/// folded to lowercase, no trailing dot. The root name is empty. Label
/// bytes are arbitrary — DNS names are byte strings, not UTF-8 — so the
/// [`fmt::Display`] impl is lossy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DnsName {
    bytes: SmallVec<[u8; 64]>,
}

impl DnsName {
    /// Returns the raw name bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the name length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true for the root name.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Iterates over the labels of the name.
    pub fn labels(&self) -> impl Iterator<Item = &[u8]> {
        self.bytes.split(|&b| b == b'.').filter(|l| !l.is_empty())
    }
}

impl From<&[u8]> for DnsName {
    fn from(bytes: &[u8]) -> Self {
        Self {
            bytes: SmallVec::from_slice(bytes),
        }
    }
}

impl From<&str> for DnsName {
    fn from(s: &str) -> Self {
        Self::from(s.as_bytes())
    }
}

impl fmt::Display for DnsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bytes))
    }
}

impl Serialize for DnsName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(&self.bytes))
    }
}

/// Decoder for domain names within one message.
///
/// Holds the full message buffer (compression offsets are message-relative)
/// plus the one per-connection quirk that affects label validation: NetBIOS
/// name service traffic is allowed oversize labels.
#[derive(Debug, Clone, Copy)]
pub struct NameDecoder<'a> {
    /// The complete message, for pointer resolution.
    msg: &'a [u8],
    /// Allow labels longer than 63 bytes (responder port 137).
    allow_long_labels: bool,
}

impl<'a> NameDecoder<'a> {
    /// Creates a decoder over the given message buffer.
    #[inline]
    #[must_use]
    pub const fn new(msg: &'a [u8], allow_long_labels: bool) -> Self {
        Self {
            msg,
            allow_long_labels,
        }
    }

    /// Decodes one name starting at the cursor position.
    ///
    /// On success the cursor has advanced past the name's terminator or,
    /// when compression was used, past the first two-byte pointer; the
    /// spliced-in suffix never moves the cursor. Returns `None` only for
    /// a forward (or self-targeting) compression pointer, which aborts
    /// the enclosing message; every other anomaly is reported through the
    /// sink and yields a truncated but usable name.
    pub fn decode(&self, cur: &mut WireCursor<'_>, sink: &mut dyn EventSink) -> Option<DnsName> {
        let mut scratch = [0u8; NAME_SCRATCH_SIZE];
        let mut out_len = 0usize;
        // One byte held back, mirroring the separator/terminator slot.
        let cap = NAME_SCRATCH_SIZE - 1;

        let msg = self.msg;
        let mut pos = cur.consumed();
        let mut end = msg.len();
        // Where the outer cursor lands once decoding ends; fixed at the
        // first compression jump.
        let mut outer_pos: Option<usize> = None;
        let mut ok = true;

        loop {
            if pos >= end {
                break;
            }

            let label_len = msg[pos] as usize;
            let len_byte_pos = pos;
            pos += 1;

            if pos >= end && label_len != 0 {
                // Length byte with nothing after it: the name ends here.
                break;
            }

            if label_len == 0 {
                // Terminating label.
                break;
            }

            if (label_len & 0xC0) == 0xC0 {
                let offset = ((label_len & 0x3F) << 8) | msg[pos] as usize;
                pos += 1;

                if outer_pos.is_none() {
                    outer_pos = Some(pos);
                }

                // A pointer may only reach strictly backwards. Pointing at
                // itself or ahead would allow cycles; in practice
                // compression even points at other compression, so the
                // only safe floor is the pointer's own position.
                if offset >= len_byte_pos {
                    sink.weird(Weird::ForwardCompressOffset);
                    ok = false;
                    break;
                }

                // Resume at the target, reading no further than the
                // pointer we just followed.
                end = len_byte_pos;
                pos = offset;
                continue;
            }

            let avail = end - pos;
            if label_len > avail {
                sink.weird(Weird::LabelLenGtPkt);
                pos = end;
                break;
            }

            if label_len > MAX_LABEL_LENGTH && !self.allow_long_labels {
                sink.weird(Weird::LabelTooLong);
                break;
            }

            if out_len + label_len >= cap {
                sink.weird(Weird::LabelLenGtNameLen);
                break;
            }

            scratch[out_len..out_len + label_len].copy_from_slice(&msg[pos..pos + label_len]);
            out_len += label_len;
            scratch[out_len] = b'.';
            out_len += 1;
            pos += label_len;
        }

        cur.set_position(outer_pos.unwrap_or(pos));

        if !ok {
            return None;
        }

        if out_len >= MAX_NAME_LENGTH {
            sink.weird(Weird::NameTooLong);
        }

        // Drop the trailing separator and fold to lowercase.
        if out_len >= 2 && scratch[out_len - 1] == b'.' {
            out_len -= 1;
        }
        let name = &mut scratch[..out_len];
        name.make_ascii_lowercase();

        Some(DnsName::from(&*name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::CollectingSink;

    fn decode_at(
        msg: &[u8],
        offset: usize,
        allow_long: bool,
    ) -> (Option<DnsName>, usize, CollectingSink) {
        let mut sink = CollectingSink::new();
        let mut cur = WireCursor::new(msg);
        cur.set_position(offset);
        let name = NameDecoder::new(msg, allow_long).decode(&mut cur, &mut sink);
        (name, cur.consumed(), sink)
    }

    #[test]
    fn test_simple_name() {
        let msg = [
            3, b'w', b'w', b'w', 7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm',
            0,
        ];

        let (name, consumed, sink) = decode_at(&msg, 0, false);
        assert_eq!(name.unwrap().to_string(), "www.example.com");
        assert_eq!(consumed, msg.len());
        assert!(sink.weirds().is_empty());
    }

    #[test]
    fn test_uppercase_folded() {
        let msg = [3, b'W', b'W', b'W', 2, b'F', b'r', 0];

        let (name, _, _) = decode_at(&msg, 0, false);
        assert_eq!(name.unwrap().to_string(), "www.fr");
    }

    #[test]
    fn test_root_name() {
        let msg = [0, 0xFF];

        let (name, consumed, sink) = decode_at(&msg, 0, false);
        assert!(name.unwrap().is_empty());
        assert_eq!(consumed, 1);
        assert!(sink.weirds().is_empty());
    }

    #[test]
    fn test_compressed_name() {
        // example.com at offset 0, www + pointer to 0 at offset 13.
        let msg = [
            7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm', 0, // 0..13
            3, b'w', b'w', b'w', 0xC0, 0x00, // 13..19
        ];

        let (name, consumed, sink) = decode_at(&msg, 13, false);
        assert_eq!(name.unwrap().to_string(), "www.example.com");
        // Cursor advances past "www" and the two pointer bytes only.
        assert_eq!(consumed, 19);
        assert!(sink.weirds().is_empty());
    }

    #[test]
    fn test_pointer_to_pointer() {
        // Chained compression: the second pointer resolves through the first.
        let msg = [
            3, b'c', b'o', b'm', 0, // 0..5
            0xC0, 0x00, // 5..7: -> com
            3, b'f', b'o', b'o', 0xC0, 0x05, // 7..13: foo -> (-> com)
        ];

        let (name, consumed, _) = decode_at(&msg, 7, false);
        assert_eq!(name.unwrap().to_string(), "foo.com");
        assert_eq!(consumed, 13);
    }

    #[test]
    fn test_self_pointer_rejected() {
        let msg = [0xC0, 0x00];

        let (name, _, sink) = decode_at(&msg, 0, false);
        assert!(name.is_none());
        assert!(sink.has_weird(Weird::ForwardCompressOffset));
    }

    #[test]
    fn test_forward_pointer_rejected() {
        let msg = [3, b'w', b'w', b'w', 0xC0, 0x20];

        let (name, consumed, sink) = decode_at(&msg, 0, false);
        assert!(name.is_none());
        assert!(sink.has_weird(Weird::ForwardCompressOffset));
        // The pointer bytes were still consumed.
        assert_eq!(consumed, 6);
    }

    #[test]
    fn test_label_past_packet_end() {
        // Label claims 10 bytes, only 3 remain.
        let msg = [10, b'a', b'b', b'c'];

        let (name, consumed, sink) = decode_at(&msg, 0, false);
        assert!(sink.has_weird(Weird::LabelLenGtPkt));
        // Rest of the packet consumed, truncated name returned.
        assert_eq!(consumed, msg.len());
        assert!(name.unwrap().is_empty());
    }

    #[test]
    fn test_oversize_label_rejected() {
        let mut msg = vec![70u8];
        msg.extend(std::iter::repeat(b'x').take(70));
        msg.push(0);

        let (name, _, sink) = decode_at(&msg, 0, false);
        assert!(sink.has_weird(Weird::LabelTooLong));
        // Name ends at the oversize label but decoding is not fatal.
        assert!(name.unwrap().is_empty());
    }

    #[test]
    fn test_oversize_label_allowed_for_netbios() {
        let mut msg = vec![70u8];
        msg.extend(std::iter::repeat(b'x').take(70));
        msg.push(0);

        let (name, _, sink) = decode_at(&msg, 0, true);
        assert!(!sink.has_weird(Weird::LabelTooLong));
        assert_eq!(name.unwrap().len(), 70);
    }

    #[test]
    fn test_long_name_advisory() {
        // Five 62-byte labels: 5 * 63 = 315 bytes with separators, over
        // the 255-byte protocol limit but within the scratch.
        let mut msg = Vec::new();
        for _ in 0..5 {
            msg.push(62u8);
            msg.extend(std::iter::repeat(b'a').take(62));
        }
        msg.push(0);

        let (name, _, sink) = decode_at(&msg, 0, false);
        assert!(sink.has_weird(Weird::NameTooLong));
        // Advisory only: the name is still returned in full.
        assert_eq!(name.unwrap().len(), 5 * 62 + 4);
    }

    #[test]
    fn test_scratch_overflow_truncates() {
        // Nine 62-byte labels exceed the 512-byte scratch capacity.
        let mut msg = Vec::new();
        for _ in 0..9 {
            msg.push(62u8);
            msg.extend(std::iter::repeat(b'b').take(62));
        }
        msg.push(0);

        let (name, _, sink) = decode_at(&msg, 0, false);
        assert!(sink.has_weird(Weird::LabelLenGtNameLen));
        let name = name.unwrap();
        // Eight labels fit.
        assert_eq!(name.len(), 8 * 62 + 7);
    }

    #[test]
    fn test_decoding_is_deterministic() {
        let msg = [
            7, b'E', b'x', b'A', b'm', b'P', b'l', b'E', 3, b'c', b'O', b'm', 0, 0xC0, 0x00,
        ];

        let (first, _, _) = decode_at(&msg, 0, false);
        let (second, _, _) = decode_at(&msg, 13, false);
        assert_eq!(first.unwrap(), second.unwrap());
    }

    #[test]
    fn test_truncated_after_length_byte() {
        let msg = [5];

        let (name, consumed, sink) = decode_at(&msg, 0, false);
        assert!(name.unwrap().is_empty());
        assert_eq!(consumed, 1);
        assert!(sink.weirds().is_empty());
    }

    #[test]
    fn test_labels_iterator() {
        let name = DnsName::from("mail.example.org");
        let labels: Vec<&[u8]> = name.labels().collect();
        assert_eq!(labels, vec![&b"mail"[..], &b"example"[..], &b"org"[..]]);
    }
}
