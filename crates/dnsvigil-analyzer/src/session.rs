//! Per-connection session shell.
//!
//! A [`DnsSession`] binds one [`Interpreter`] to one observed connection.
//! The enclosing capture framework routes payloads in: UDP datagrams go
//! straight to the interpreter, TCP stream chunks go through the
//! per-direction framers. The framework also drives time — sessions never
//! look at a clock, they are told the current network time with each call.

use crate::event::{DnsEvent, EventKind, EventSink, QueryHint};
use crate::interpreter::Interpreter;
use crate::tcp::TcpFramer;
use dnsvigil_config::MonitorConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::error;

/// Transport of the observed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Datagram transport; messages arrive whole.
    Udp,
    /// Stream transport; messages are length-framed.
    Tcp,
}

/// The endpoints of an observed connection.
///
/// "Originator" is the side that sent the first packet, "responder" the
/// other. The role-flip heuristic may swap them once, when the first
/// message proves the capture saw the connection backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    orig: SocketAddr,
    resp: SocketAddr,
}

impl Connection {
    /// Creates a connection from its two endpoints.
    #[must_use]
    pub const fn new(orig: SocketAddr, resp: SocketAddr) -> Self {
        Self { orig, resp }
    }

    /// The originator endpoint.
    #[must_use]
    pub const fn orig_addr(&self) -> SocketAddr {
        self.orig
    }

    /// The responder endpoint.
    #[must_use]
    pub const fn resp_addr(&self) -> SocketAddr {
        self.resp
    }

    /// The responder port.
    #[must_use]
    pub const fn resp_port(&self) -> u16 {
        self.resp.port()
    }

    /// Swaps originator and responder.
    pub fn flip_roles(&mut self) {
        std::mem::swap(&mut self.orig, &mut self.resp);
    }
}

/// What the session wants done with its idle timer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerVerdict {
    /// Re-arm the timer to fire after this many seconds.
    Rearm(f64),
    /// The session has expired; remove it.
    Remove,
}

/// One observed DNS session.
pub struct DnsSession {
    config: Arc<MonitorConfig>,
    transport: Transport,
    interp: Interpreter,
    /// Per-direction framers; present only for TCP.
    framers: Option<(TcpFramer, TcpFramer)>,
    /// Network time of the most recent payload.
    last_packet: f64,
    expired: bool,
}

impl DnsSession {
    /// Creates a session for a new connection.
    ///
    /// For UDP connections the caller should arm an idle timer for
    /// [`MonitorConfig::session_timeout`] seconds and route its firing to
    /// [`DnsSession::expire_timer`].
    #[must_use]
    pub fn new(config: Arc<MonitorConfig>, conn: Connection, transport: Transport) -> Self {
        let framers = match transport {
            Transport::Tcp => Some((TcpFramer::new(true), TcpFramer::new(false))),
            Transport::Udp => None,
        };

        Self {
            interp: Interpreter::new(config.clone(), conn),
            config,
            transport,
            framers,
            last_packet: 0.0,
            expired: false,
        }
    }

    /// The connection this session observes.
    #[must_use]
    pub fn conn(&self) -> &Connection {
        self.interp.conn()
    }

    /// The transport of this session.
    #[must_use]
    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Delivers one UDP datagram.
    ///
    /// An originator-side payload that fails to parse is surfaced as
    /// `non_dns_request` with the raw bytes: it tells the framework that
    /// this port-53 flow is probably not DNS at all.
    pub fn deliver_packet(
        &mut self,
        is_orig: bool,
        data: &[u8],
        now: f64,
        sink: &mut dyn EventSink,
    ) {
        self.last_packet = now;

        if is_orig {
            let status = self.interp.parse_message(data, QueryHint::Query, sink);
            if !status.is_ok() && sink.enabled(EventKind::NonDnsRequest) {
                sink.emit(DnsEvent::NonDnsRequest {
                    payload: data.to_vec(),
                });
            }
        } else {
            self.interp.parse_message(data, QueryHint::Response, sink);
        }
    }

    /// Delivers one TCP stream chunk for the given direction.
    pub fn deliver_stream(
        &mut self,
        is_orig: bool,
        data: &[u8],
        now: f64,
        sink: &mut dyn EventSink,
    ) {
        self.last_packet = now;

        let Some((orig_framer, resp_framer)) = &mut self.framers else {
            error!("stream delivery on a datagram session");
            return;
        };

        let framer = if is_orig { orig_framer } else { resp_framer };
        framer.deliver_stream(data, &mut self.interp, sink);
    }

    /// Handles TCP connection close: both directions flush any partial
    /// message.
    pub fn connection_closed(&mut self, sink: &mut dyn EventSink) {
        if let Some((orig_framer, resp_framer)) = &mut self.framers {
            orig_framer.flush(&mut self.interp, sink);
            resp_framer.flush(&mut self.interp, sink);
        }
    }

    /// Handles the UDP idle timer firing at network time `now`.
    ///
    /// The allowance of one second under the configured timeout covers
    /// the common single-request/single-reply exchange without arming the
    /// timer twice.
    pub fn expire_timer(&mut self, now: f64, sink: &mut dyn EventSink) -> TimerVerdict {
        let timeout = self.config.session_timeout;

        if now - self.last_packet >= timeout - 1.0 {
            if sink.enabled(EventKind::ConnectionTimeout) {
                sink.emit(DnsEvent::ConnectionTimeout);
            }
            self.expired = true;
            TimerVerdict::Remove
        } else {
            TimerVerdict::Rearm(timeout)
        }
    }

    /// Tears the session down. A UDP session that did not expire reports
    /// a normal end.
    pub fn done(&mut self, sink: &mut dyn EventSink) {
        if self.transport == Transport::Udp
            && !self.expired
            && sink.enabled(EventKind::UdpSessionDone)
        {
            sink.emit(DnsEvent::UdpSessionDone);
        }
    }
}
