//! # dnsvigil DNS Analyzer
//!
//! The streaming interpreter at the core of the dnsvigil passive DNS
//! monitor. The enclosing capture framework hands it raw payloads — UDP
//! datagrams directly, TCP byte streams through the length framer — and
//! the interpreter walks the message section by section, emitting one
//! abstract event per recognized protocol element plus a named "weird"
//! diagnostic for every protocol anomaly it can describe.
//!
//! ## Architecture
//!
//! - [`name`]: domain-name decoding with compression-pointer safety limits
//! - [`interpreter`]: the message parser and per-record-type dispatch
//! - [`tcp`]: the two-byte length-prefix reassembly state machine
//! - [`session`]: per-connection binding of interpreter and framers
//! - [`event`] / [`weird`]: the sink-facing event model
//!
//! Everything runs single-threaded and inline: no parser routine
//! suspends, and every event reaches the sink before the next payload is
//! processed.

pub mod event;
pub mod interpreter;
pub mod name;
pub mod rdata;
pub mod session;
pub mod tcp;
pub mod weird;

pub use event::{
    AnswerSection, CollectingSink, DnsAnswer, DnsEvent, EventKind, EventSink, QueryHint,
    QueryInfo,
};
pub use interpreter::{Interpreter, ParseStatus};
pub use name::{DnsName, NameDecoder};
pub use session::{Connection, DnsSession, TimerVerdict, Transport};
pub use tcp::TcpFramer;
pub use weird::Weird;
