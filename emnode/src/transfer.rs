//! Name/info string exchange
//!
//! Node name and info strings are longer than one frame can hold, so they
//! travel as a sequence of [`MessageKind::NameInfo`] fragments: each frame
//! carries up to 7 string bytes after the envelope, in string order, and a
//! single zero byte terminates the stream. The terminator lets the requester
//! detect completion without knowing the total length in advance; a string
//! whose length is a multiple of 7 is followed by a one-byte final fragment
//! holding only the terminator.
//!
//! The serving side is fire-and-forget: fragments are transmitted back to
//! back with no per-fragment acknowledgment. It runs inside the dispatch
//! loop when a get-name/get-info request arrives (see
//! [`crate::node::Registry::poll_once`]).
//!
//! The requesting side is a blocking exchange:
//! `Idle -> AwaitingFirstFragment -> Accumulating -> {Complete | TimedOut | Truncated}`.
//! All terminal states return control to the caller; there is no retry in
//! this layer. Frames from other senders arriving while the exchange is in
//! flight are consumed and discarded; that is the cost of blocking inside
//! the cooperative loop, bounded by the timeout.

use crate::bus::{Bus, BusError};
use crate::core::{DataKind, MessageKind, NodeAddress};
use crate::envelope::Envelope;
use crate::frame::{Data, Frame};
use crate::node::TRANSMIT_TIMEOUT;
use crate::time::{Duration, Instant};

const TERMINATOR: u8 = 0;

const FRAGMENT_ENVELOPE: Envelope = Envelope::new(MessageKind::NameInfo, DataKind::Custom);

/// How a string request exchange ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// The terminator was seen; the buffer holds the whole string
    Complete,
    /// The buffer filled up before the terminator; excess bytes were
    /// discarded
    Truncated,
    /// The deadline passed; the buffer holds whatever prefix arrived
    /// (possibly nothing)
    TimedOut,
}

/// Result of a string request exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reception {
    /// Number of string bytes written into the caller's buffer
    pub length: usize,
    pub outcome: Outcome,
}

/// Requests the name string of the node at `target`.
///
/// Transmits a get-name request, then accumulates fragment frames from
/// `target` into `buffer` until the terminator arrives, the buffer fills, or
/// `timeout` elapses. The buffer always holds the received prefix; `timeout`
/// bounds the whole exchange. Bus-off aborts the exchange; other adapter
/// errors are treated as transient.
pub fn request_name(
    bus: &mut dyn Bus,
    target: NodeAddress,
    buffer: &mut [u8],
    timeout: Duration,
) -> Result<Reception, BusError> {
    request_string(bus, target, MessageKind::GetName, buffer, timeout)
}

/// Requests the info string of the node at `target`.
///
/// Same contract as [`request_name`].
pub fn request_info(
    bus: &mut dyn Bus,
    target: NodeAddress,
    buffer: &mut [u8],
    timeout: Duration,
) -> Result<Reception, BusError> {
    request_string(bus, target, MessageKind::GetInfo, buffer, timeout)
}

fn request_string(
    bus: &mut dyn Bus,
    target: NodeAddress,
    kind: MessageKind,
    buffer: &mut [u8],
    timeout: Duration,
) -> Result<Reception, BusError> {
    let request = Frame {
        id: target,
        data: unwrap!(Data::new(&[Envelope::new(kind, DataKind::Custom).into()])),
        rtr: true,
        slot: None,
    };
    bus.transmit(&request, TRANSMIT_TIMEOUT)?;

    let deadline = Instant::now() + timeout;
    let mut reassembly = Reassembly::new(buffer);
    loop {
        let now = Instant::now();
        if now >= deadline {
            return Ok(Reception {
                length: reassembly.length(),
                outcome: Outcome::TimedOut,
            });
        }
        let frame = match bus.receive(deadline - now) {
            Ok(frame) => frame,
            Err(BusError::Off) => return Err(BusError::Off),
            Err(_) => continue,
        };
        if frame.rtr || frame.id != target {
            continue;
        }
        let Some(envelope) = Envelope::from_frame(&frame) else {
            continue;
        };
        if envelope.kind() != Some(MessageKind::NameInfo) {
            continue;
        }
        let outcome = match reassembly.push_payload(&frame.data[1..]) {
            Progress::Pending => continue,
            Progress::Complete => Outcome::Complete,
            Progress::Truncated => Outcome::Truncated,
        };
        return Ok(Reception {
            length: reassembly.length(),
            outcome,
        });
    }
}

/// Transmits `value` as a fragment sequence from `source`. Fire-and-forget.
pub(crate) fn send_string(
    bus: &mut dyn Bus,
    source: NodeAddress,
    value: &str,
) -> Result<(), BusError> {
    let mut fragmenter = Fragmenter::new(value);
    while let Some(data) = fragmenter.next_payload() {
        let frame = Frame {
            id: source,
            data,
            rtr: false,
            slot: None,
        };
        bus.transmit(&frame, TRANSMIT_TIMEOUT)?;
    }
    Ok(())
}

/// Splits a string plus its terminator into fragment payloads
struct Fragmenter<'s> {
    bytes: &'s [u8],
    /// Position in the terminated stream; `bytes.len()` is the terminator
    offset: usize,
}

impl<'s> Fragmenter<'s> {
    fn new(value: &'s str) -> Self {
        Self {
            bytes: value.as_bytes(),
            offset: 0,
        }
    }

    fn next_payload(&mut self) -> Option<Data> {
        if self.offset > self.bytes.len() {
            return None;
        }
        let mut buf = [0u8; Data::MAX];
        buf[0] = FRAGMENT_ENVELOPE.into();
        let mut length = 1;
        while length < Data::MAX && self.offset <= self.bytes.len() {
            buf[length] = if self.offset == self.bytes.len() {
                TERMINATOR
            } else {
                self.bytes[self.offset]
            };
            length += 1;
            self.offset += 1;
        }
        Some(unwrap!(Data::new(&buf[..length])))
    }
}

enum Progress {
    Pending,
    Complete,
    Truncated,
}

/// Requester-side fragment accumulator
///
/// Appends fragment bytes into the caller's buffer, truncating rather than
/// overflowing. Timeouts are the caller's concern; this object only sees
/// payloads.
struct Reassembly<'b> {
    buffer: &'b mut [u8],
    length: usize,
}

impl<'b> Reassembly<'b> {
    fn new(buffer: &'b mut [u8]) -> Self {
        Self { buffer, length: 0 }
    }

    fn length(&self) -> usize {
        self.length
    }

    fn push_payload(&mut self, payload: &[u8]) -> Progress {
        for &byte in payload {
            if byte == TERMINATOR {
                return Progress::Complete;
            }
            if self.length == self.buffer.len() {
                return Progress::Truncated;
            }
            self.buffer[self.length] = byte;
            self.length += 1;
        }
        Progress::Pending
    }
}
