//! PostgreSQL wire protocol (length-prefixed binary frames).
//!
//! Regular frame: `tag (u8) | len (i32, includes itself) | payload (len - 4)`.
//! Startup frame: `len (i32) | major (i16) | minor (i16) | (name\0 value\0)* \0`.

mod parse;

pub use parse::{
    find_frame_boundary, parse_data_row, parse_regular_frame, parse_row_desc, parse_startup_frame,
    PgsqlParser,
};

use bytes::Bytes;

use crate::frame::TimestampedFrame;

/// Frame type byte. Values overlap between directions (`E` is Execute from the
/// client and ErrorResponse from the server), hence a newtype over `u8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag(pub u8);

impl Tag {
    // Client -> server.
    pub const QUERY: Tag = Tag(b'Q');
    pub const PARSE: Tag = Tag(b'P');
    pub const BIND: Tag = Tag(b'B');
    pub const DESCRIBE: Tag = Tag(b'D');
    pub const EXECUTE: Tag = Tag(b'E');
    pub const SYNC: Tag = Tag(b'S');
    pub const CLOSE: Tag = Tag(b'C');
    pub const PASSWD: Tag = Tag(b'p');
    pub const TERMINATE: Tag = Tag(b'X');
    pub const FLUSH: Tag = Tag(b'H');
    pub const FUNCTION_CALL: Tag = Tag(b'F');
    pub const COPY_FAIL: Tag = Tag(b'f');

    // Both directions.
    pub const COPY_DATA: Tag = Tag(b'd');
    pub const COPY_DONE: Tag = Tag(b'c');

    // Server -> client.
    pub const AUTH: Tag = Tag(b'R');
    pub const BACKEND_KEY_DATA: Tag = Tag(b'K');
    pub const PARAM_STATUS: Tag = Tag(b'S');
    pub const READY_FOR_QUERY: Tag = Tag(b'Z');
    pub const ROW_DESC: Tag = Tag(b'T');
    pub const DATA_ROW: Tag = Tag(b'D');
    pub const CMD_COMPLETE: Tag = Tag(b'C');
    pub const ERR_RESP: Tag = Tag(b'E');
    pub const NOTICE: Tag = Tag(b'N');
    pub const PARSE_COMPLETE: Tag = Tag(b'1');
    pub const BIND_COMPLETE: Tag = Tag(b'2');
    pub const CLOSE_COMPLETE: Tag = Tag(b'3');
    pub const PARAM_DESC: Tag = Tag(b't');
    pub const NO_DATA: Tag = Tag(b'n');
    pub const EMPTY_QUERY_RESP: Tag = Tag(b'I');
    pub const PORTAL_SUSPENDED: Tag = Tag(b's');
    pub const NOTIFICATION: Tag = Tag(b'A');
    pub const FUNCTION_CALL_RESP: Tag = Tag(b'V');
    pub const COPY_IN_RESP: Tag = Tag(b'G');
    pub const COPY_OUT_RESP: Tag = Tag(b'H');
    pub const COPY_BOTH_RESP: Tag = Tag(b'W');

    /// Every byte that starts a known frame in either direction.
    pub const KNOWN: &'static [u8] = b"QPBDESCpXHFfdcRKZTN123tnIsAVGW";

    pub fn is_known(byte: u8) -> bool {
        Self::KNOWN.contains(&byte)
    }

    pub fn as_char(self) -> char {
        char::from(self.0)
    }
}

/// Tagged frame with its raw payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegularFrame {
    pub tag: Tag,
    /// Declared length, including the 4 length bytes.
    pub len: i32,
    pub timestamp_ns: u64,
    pub payload: Bytes,
}

impl TimestampedFrame for RegularFrame {
    fn timestamp_ns(&self) -> u64 {
        self.timestamp_ns
    }

    fn set_timestamp_ns(&mut self, ts: u64) {
        self.timestamp_ns = ts;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolVersion {
    pub major: i16,
    pub minor: i16,
}

/// Untagged handshake frame sent once at connection start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupFrame {
    pub len: i32,
    pub proto_ver: ProtocolVersion,
    /// Name/value parameter pairs (`user`, `database`, ...).
    pub params: Vec<(String, String)>,
}
