//! Protocol-agnostic frame parsing contract.
//!
//! Usage:
//! - Call `parse_frame` on the unconsumed tail of a direction's buffer.
//! - On `Parsed::Frame`, drop `consumed` bytes and keep the frame.
//! - On `Parsed::NeedsMoreData`, retain the whole tail and wait for more bytes.
//! - On `Parsed::Invalid`, ask `find_frame_boundary` for the next plausible
//!   frame start and retry from there.

use serde::{Deserialize, Serialize};

/// Direction of a byte stream relative to the traced server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Client -> server.
    Request,
    /// Server -> client.
    Response,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Request => "request",
            MessageType::Response => "response",
        }
    }
}

/// Outcome class of one parse attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    Success,
    NeedsMoreData,
    Invalid,
}

/// Result of one parse attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<F> {
    /// A complete frame; the caller drops `consumed` bytes.
    Frame { frame: F, consumed: usize },
    /// Incomplete; nothing may be dropped.
    NeedsMoreData,
    /// Not a frame at this offset.
    Invalid,
}

impl<F> Parsed<F> {
    pub fn state(&self) -> ParseState {
        match self {
            Parsed::Frame { .. } => ParseState::Success,
            Parsed::NeedsMoreData => ParseState::NeedsMoreData,
            Parsed::Invalid => ParseState::Invalid,
        }
    }
}

/// Frames carry the capture timestamp of their first byte.
pub trait TimestampedFrame {
    fn timestamp_ns(&self) -> u64;
    fn set_timestamp_ns(&mut self, ts: u64);
}

/// Incremental per-direction frame parser.
///
/// One instance serves one direction of one connection, so implementations may
/// keep per-stream state (e.g. whether a startup handshake was already seen).
pub trait FrameParser {
    type Frame: TimestampedFrame;

    /// Protocol label for logs and metrics.
    fn protocol(&self) -> &'static str;

    /// Try to parse one frame from the start of `buf`.
    fn parse_frame(&mut self, msg_type: MessageType, buf: &[u8]) -> Parsed<Self::Frame>;

    /// First offset `>= start` holding a plausible frame-start marker.
    fn find_frame_boundary(&self, msg_type: MessageType, buf: &[u8], start: usize) -> Option<usize>;
}
