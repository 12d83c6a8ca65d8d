use bytes::Bytes;

use crate::cursor::ByteCursor;
use crate::frame::{FrameParser, MessageType, Parsed};

use super::{ProtocolVersion, RegularFrame, StartupFrame, Tag};

/// The length field counts itself.
const LEN_FIELD_LEN: i32 = 4;

/// Startup header: length + two version fields.
const STARTUP_HEADER_LEN: i32 = 8;

/// Per field in a row description after the name: table id (i32), column
/// number (i16), type id (i32), type size (i16), type modifier (i32), format (i16).
const FIELD_DESC_LEN: usize = 3 * 4 + 3 * 2;

/// `-1` value length marks a NULL column.
const NULL_VALUE_LEN: i32 = -1;

macro_rules! or_needs_more {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(_) => return Parsed::NeedsMoreData,
        }
    };
}

/// Decode one tagged frame from the start of `buf`.
pub fn parse_regular_frame(buf: &[u8]) -> Parsed<RegularFrame> {
    let mut cur = ByteCursor::new(buf);
    let tag = or_needs_more!(cur.extract_char());
    let len = or_needs_more!(cur.extract_int::<i32>());
    if len < LEN_FIELD_LEN {
        return Parsed::Invalid;
    }
    let payload = or_needs_more!(cur.extract_fixed_string((len - LEN_FIELD_LEN) as usize));

    Parsed::Frame {
        frame: RegularFrame {
            tag: Tag(tag),
            len,
            timestamp_ns: 0,
            payload: Bytes::copy_from_slice(payload),
        },
        consumed: cur.position(),
    }
}

/// Decode an untagged startup frame from the start of `buf`.
pub fn parse_startup_frame(buf: &[u8]) -> Parsed<StartupFrame> {
    let mut cur = ByteCursor::new(buf);
    let len = or_needs_more!(cur.extract_int::<i32>());
    let major = or_needs_more!(cur.extract_int::<i16>());
    let minor = or_needs_more!(cur.extract_int::<i16>());
    if len < STARTUP_HEADER_LEN {
        return Parsed::Invalid;
    }
    let body = or_needs_more!(cur.extract_fixed_string((len - STARTUP_HEADER_LEN) as usize));

    let mut body = ByteCursor::new(body);
    let mut params = Vec::new();
    while !body.eof() {
        let Ok(name) = body.extract_delimited_string(b"\0") else {
            return Parsed::Invalid;
        };
        if name.is_empty() {
            break;
        }
        let Ok(value) = body.extract_delimited_string(b"\0") else {
            return Parsed::Invalid;
        };
        if value.is_empty() {
            return Parsed::Invalid;
        }
        params.push((
            String::from_utf8_lossy(name).into_owned(),
            String::from_utf8_lossy(value).into_owned(),
        ));
    }

    Parsed::Frame {
        frame: StartupFrame {
            len,
            proto_ver: ProtocolVersion { major, minor },
            params,
        },
        consumed: cur.position(),
    }
}

/// First offset `>= start` whose byte is a known tag.
pub fn find_frame_boundary(buf: &[u8], start: usize) -> Option<usize> {
    let tail = buf.get(start..)?;
    tail.iter().position(|b| Tag::is_known(*b)).map(|i| start + i)
}

/// Column names of a row description payload.
///
/// Stops early, keeping what was decoded, when a field descriptor is cut short.
pub fn parse_row_desc(payload: &[u8]) -> Vec<&[u8]> {
    let mut out = Vec::new();
    let mut cur = ByteCursor::new(payload);
    let Ok(field_count) = cur.extract_int::<i16>() else {
        return out;
    };

    for i in 0..field_count {
        let Ok(name) = cur.extract_delimited_string(b"\0") else {
            return out;
        };
        if name.is_empty() {
            tracing::debug!(column = i, "empty column name in row description");
            out.push(cur.remaining());
            return out;
        }
        out.push(name);

        if cur.extract_fixed_string(FIELD_DESC_LEN).is_err() {
            tracing::debug!(
                needed = FIELD_DESC_LEN,
                got = cur.remaining_size(),
                "row description field truncated"
            );
            return out;
        }
    }
    out
}

/// Column values of a data row payload; `None` is SQL NULL.
///
/// A value longer than the remaining payload is truncated to what is left.
pub fn parse_data_row(payload: &[u8]) -> Vec<Option<&[u8]>> {
    let mut out = Vec::new();
    let mut cur = ByteCursor::new(payload);
    let Ok(field_count) = cur.extract_int::<i16>() else {
        return out;
    };

    for _ in 0..field_count {
        let Ok(value_len) = cur.extract_int::<i32>() else {
            return out;
        };
        if value_len == NULL_VALUE_LEN {
            out.push(None);
            continue;
        }
        if value_len <= 0 {
            out.push(Some(&[][..]));
            continue;
        }
        let mut n = value_len as usize;
        let truncated = cur.remaining_size() < n;
        if truncated {
            tracing::debug!(declared = n, got = cur.remaining_size(), "data row value truncated");
            n = cur.remaining_size();
        }
        let Ok(value) = cur.extract_fixed_string(n) else {
            return out;
        };
        out.push(Some(value));
        if truncated {
            return out;
        }
    }
    out
}

/// Stream parser for one direction of a PostgreSQL connection.
#[derive(Debug, Default, Clone)]
pub struct PgsqlParser {
    startup_checked: bool,
}

impl PgsqlParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Speculatively strip a startup handshake at the start of the request stream.
    ///
    /// Returns the offset regular parsing should start at, or `None` when the
    /// startup frame itself is still incomplete.
    fn skip_startup(&mut self, buf: &[u8]) -> Option<usize> {
        match parse_startup_frame(buf) {
            Parsed::Frame { frame, consumed } if !frame.params.is_empty() => {
                tracing::debug!(
                    major = frame.proto_ver.major,
                    minor = frame.proto_ver.minor,
                    params = frame.params.len(),
                    "skipping startup frame"
                );
                Some(consumed)
            }
            // A startup length starts with 0x00, which is never a tag byte.
            Parsed::NeedsMoreData if buf.first() == Some(&0) => None,
            _ => {
                self.startup_checked = true;
                Some(0)
            }
        }
    }
}

impl FrameParser for PgsqlParser {
    type Frame = RegularFrame;

    fn protocol(&self) -> &'static str {
        "pgsql"
    }

    fn parse_frame(&mut self, msg_type: MessageType, buf: &[u8]) -> Parsed<RegularFrame> {
        if buf.is_empty() {
            return Parsed::NeedsMoreData;
        }
        if msg_type == MessageType::Response || self.startup_checked {
            return parse_regular_frame(buf);
        }

        let Some(skip) = self.skip_startup(buf) else {
            return Parsed::NeedsMoreData;
        };
        let rest = buf.get(skip..).unwrap_or_default();
        match parse_regular_frame(rest) {
            Parsed::Frame { frame, consumed } => {
                self.startup_checked = true;
                Parsed::Frame {
                    frame,
                    consumed: skip + consumed,
                }
            }
            Parsed::Invalid => {
                self.startup_checked = true;
                Parsed::Invalid
            }
            // Keep the startup bytes so the next attempt re-speculates.
            Parsed::NeedsMoreData => Parsed::NeedsMoreData,
        }
    }

    fn find_frame_boundary(
        &self,
        _msg_type: MessageType,
        buf: &[u8],
        start: usize,
    ) -> Option<usize> {
        find_frame_boundary(buf, start)
    }
}
