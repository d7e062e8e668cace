//! TCP length-prefix reassembly.
//!
//! On TCP, every DNS message is preceded by a two-byte big-endian length
//! (RFC 1035 §4.2.2). Segment boundaries fall wherever they like — in the
//! middle of the prefix, the middle of a message, or packing several
//! messages into one segment — so each direction of a connection gets its
//! own [`TcpFramer`] that assembles whole messages and hands them to the
//! interpreter.

use crate::event::{EventSink, QueryHint};
use crate::interpreter::Interpreter;
use bytes::BytesMut;

/// Reassembly state: which byte the framer expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FramerState {
    /// Waiting for the high byte of the length prefix.
    LenHi,
    /// Waiting for the low byte of the length prefix.
    LenLo,
    /// Accumulating the message body.
    Body,
}

/// One direction's message reassembler.
///
/// The message buffer is owned exclusively by this framer and only ever
/// grows; it is released when the session is torn down.
#[derive(Debug)]
pub struct TcpFramer {
    /// True for the originator-side stream.
    is_orig: bool,
    state: FramerState,
    /// Declared size of the message currently being assembled.
    msg_size: usize,
    /// The assembly buffer; `buf.len()` is the current fill.
    buf: BytesMut,
}

impl TcpFramer {
    /// Creates a framer for one stream direction.
    #[must_use]
    pub fn new(is_orig: bool) -> Self {
        Self {
            is_orig,
            state: FramerState::LenHi,
            msg_size: 0,
            buf: BytesMut::new(),
        }
    }

    /// Returns the number of body bytes currently buffered.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Consumes one stream segment, delivering every message completed by
    /// it to the interpreter.
    pub fn deliver_stream(
        &mut self,
        mut data: &[u8],
        interp: &mut Interpreter,
        sink: &mut dyn EventSink,
    ) {
        loop {
            match self.state {
                FramerState::LenHi => {
                    let Some((&byte, rest)) = data.split_first() else {
                        return;
                    };
                    self.msg_size = usize::from(byte) << 8;
                    self.state = FramerState::LenLo;
                    data = rest;
                }
                FramerState::LenLo => {
                    let Some((&byte, rest)) = data.split_first() else {
                        return;
                    };
                    self.msg_size |= usize::from(byte);
                    self.state = FramerState::Body;
                    self.buf.clear();
                    // Grow-only: reserve never shrinks the allocation.
                    self.buf.reserve(self.msg_size);
                    data = rest;
                }
                FramerState::Body => {
                    let need = self.msg_size - self.buf.len();
                    let take = need.min(data.len());
                    self.buf.extend_from_slice(&data[..take]);
                    data = &data[take..];

                    if self.buf.len() < self.msg_size {
                        // Message still incomplete; wait for the next
                        // segment.
                        return;
                    }

                    interp.parse_message(&self.buf, QueryHint::from_orig(self.is_orig), sink);
                    self.buf.clear();
                    self.state = FramerState::LenHi;

                    if data.is_empty() {
                        return;
                    }
                    // More data to munch on.
                }
            }
        }
    }

    /// Delivers any partially assembled message, marking its direction as
    /// unknown. Called when the connection closes.
    pub fn flush(&mut self, interp: &mut Interpreter, sink: &mut dyn EventSink) {
        if !self.buf.is_empty() {
            interp.parse_message(&self.buf, QueryHint::Unknown, sink);
            self.buf.clear();
        }
        self.msg_size = 0;
        self.state = FramerState::LenHi;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{CollectingSink, DnsEvent, EventKind};
    use crate::session::Connection;
    use dnsvigil_config::MonitorConfig;
    use std::sync::Arc;

    fn interp() -> Interpreter {
        Interpreter::new(
            Arc::new(MonitorConfig::default()),
            Connection::new(
                "10.0.0.1:40000".parse().unwrap(),
                "192.0.2.53:53".parse().unwrap(),
            ),
        )
    }

    fn query_message() -> Vec<u8> {
        let mut msg = vec![
            0xAA, 0xAA, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        msg.extend_from_slice(&[
            3, b'w', b'w', b'w', 7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm',
            0, 0x00, 0x01, 0x00, 0x01,
        ]);
        msg
    }

    fn framed(msg: &[u8]) -> Vec<u8> {
        let mut out = (msg.len() as u16).to_be_bytes().to_vec();
        out.extend_from_slice(msg);
        out
    }

    #[test]
    fn test_whole_message_in_one_segment() {
        let stream = framed(&query_message());
        let mut framer = TcpFramer::new(true);
        let mut interp = interp();
        let mut sink = CollectingSink::new();

        framer.deliver_stream(&stream, &mut interp, &mut sink);

        assert_eq!(sink.count_of(EventKind::Request), 1);
        assert_eq!(sink.count_of(EventKind::End), 1);
        assert_eq!(framer.buffered(), 0);
    }

    #[test]
    fn test_arbitrary_segmentation() {
        // Sizes 1, 1, 10, rest: the prefix itself is split.
        let stream = framed(&query_message());
        let mut framer = TcpFramer::new(true);
        let mut interp = interp();
        let mut sink = CollectingSink::new();

        framer.deliver_stream(&stream[0..1], &mut interp, &mut sink);
        framer.deliver_stream(&stream[1..2], &mut interp, &mut sink);
        framer.deliver_stream(&stream[2..12], &mut interp, &mut sink);
        framer.deliver_stream(&stream[12..], &mut interp, &mut sink);

        assert_eq!(sink.count_of(EventKind::Message), 1);
        assert_eq!(sink.count_of(EventKind::Request), 1);

        let DnsEvent::Message { len, .. } =
            sink.events_of(EventKind::Message).next().unwrap()
        else {
            unreachable!()
        };
        assert_eq!(*len, query_message().len());
    }

    #[test]
    fn test_byte_at_a_time() {
        let stream = framed(&query_message());
        let mut framer = TcpFramer::new(true);
        let mut interp = interp();
        let mut sink = CollectingSink::new();

        for byte in &stream {
            framer.deliver_stream(std::slice::from_ref(byte), &mut interp, &mut sink);
        }

        assert_eq!(sink.count_of(EventKind::Request), 1);
    }

    #[test]
    fn test_two_messages_one_segment() {
        let mut stream = framed(&query_message());
        stream.extend(framed(&query_message()));

        let mut framer = TcpFramer::new(true);
        let mut interp = interp();
        let mut sink = CollectingSink::new();

        framer.deliver_stream(&stream, &mut interp, &mut sink);

        assert_eq!(sink.count_of(EventKind::Message), 2);
        assert_eq!(sink.count_of(EventKind::Request), 2);
        assert_eq!(sink.count_of(EventKind::End), 2);
    }

    #[test]
    fn test_message_straddling_segments() {
        let mut stream = framed(&query_message());
        stream.extend(framed(&query_message()));
        let cut = stream.len() / 2;

        let mut framer = TcpFramer::new(true);
        let mut interp = interp();
        let mut sink = CollectingSink::new();

        framer.deliver_stream(&stream[..cut], &mut interp, &mut sink);
        framer.deliver_stream(&stream[cut..], &mut interp, &mut sink);

        assert_eq!(sink.count_of(EventKind::Request), 2);
    }

    #[test]
    fn test_flush_partial_message() {
        let msg = query_message();
        // Prefix declares the full message but only half arrives.
        let mut stream = (msg.len() as u16).to_be_bytes().to_vec();
        stream.extend_from_slice(&msg[..msg.len() / 2]);

        let mut framer = TcpFramer::new(true);
        let mut interp = interp();
        let mut sink = CollectingSink::new();

        framer.deliver_stream(&stream, &mut interp, &mut sink);
        assert_eq!(sink.count_of(EventKind::Message), 0);
        assert_eq!(framer.buffered(), msg.len() / 2);

        framer.flush(&mut interp, &mut sink);

        let DnsEvent::Message { is_query, .. } =
            sink.events_of(EventKind::Message).next().unwrap()
        else {
            unreachable!()
        };
        assert_eq!(*is_query, crate::event::QueryHint::Unknown);
        assert_eq!(framer.buffered(), 0);
    }

    #[test]
    fn test_flush_empty_is_noop() {
        let mut framer = TcpFramer::new(false);
        let mut interp = interp();
        let mut sink = CollectingSink::new();

        framer.flush(&mut interp, &mut sink);

        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_zero_length_message() {
        // A zero length prefix yields an empty message, reported as
        // truncated, and the framer resynchronizes on the next prefix.
        let mut stream = vec![0x00, 0x00];
        stream.extend(framed(&query_message()));

        let mut framer = TcpFramer::new(true);
        let mut interp = interp();
        let mut sink = CollectingSink::new();

        framer.deliver_stream(&stream, &mut interp, &mut sink);

        assert!(sink.has_weird(crate::weird::Weird::TruncatedMsgHeader));
        assert_eq!(sink.count_of(EventKind::Request), 1);
    }
}
