//! Redis serialization protocol (RESP).
//!
//! A message starts with one marker byte:
//! `+` simple string, `-` error, `:` integer, `$` bulk string, `*` array.
//! Every line ends with `\r\n`; bulk strings and arrays carry a decimal
//! length, where `-1` means null.

pub mod cmd_args;
pub mod format;
mod parse;

pub use parse::{find_message_boundary, parse_message, RedisParser};

use crate::frame::TimestampedFrame;

pub const SIMPLE_STRING_MARKER: u8 = b'+';
pub const ERROR_MARKER: u8 = b'-';
pub const INTEGER_MARKER: u8 = b':';
pub const BULK_STRING_MARKER: u8 = b'$';
pub const ARRAY_MARKER: u8 = b'*';

pub const MARKERS: [u8; 5] = [
    SIMPLE_STRING_MARKER,
    ERROR_MARKER,
    INTEGER_MARKER,
    BULK_STRING_MARKER,
    ARRAY_MARKER,
];

pub const TERMINAL_SEQUENCE: &[u8] = b"\r\n";

/// Payload rendered for a null bulk string.
pub const NULL_BULK_STRING: &str = "<NULL>";
/// Payload rendered for a null array.
pub const NULL_ARRAY: &str = "[NULL]";

/// One decoded RESP message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub timestamp_ns: u64,
    /// Rendered text (arrays are rendered by `format::format_array`).
    pub payload: String,
    /// Command name, for request arrays naming a known command.
    pub command: Option<String>,
    /// Server push of a pub/sub message, not solicited by a request.
    pub is_published_message: bool,
}

impl TimestampedFrame for Message {
    fn timestamp_ns(&self) -> u64 {
        self.timestamp_ns
    }

    fn set_timestamp_ns(&mut self, ts: u64) {
        self.timestamp_ns = ts;
    }
}

/// Bounds on attacker-controlled sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedisLimits {
    pub max_bulk_len: usize,
    pub max_array_len: usize,
    pub max_array_depth: usize,
}

impl Default for RedisLimits {
    fn default() -> Self {
        Self {
            max_bulk_len: 512 * 1024 * 1024,
            max_array_len: 1024 * 1024,
            max_array_depth: 64,
        }
    }
}
