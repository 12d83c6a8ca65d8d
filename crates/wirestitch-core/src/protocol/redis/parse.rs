use crate::cursor::ByteCursor;
use crate::error::CursorError;
use crate::frame::{FrameParser, MessageType, Parsed};

use super::format::format_array;
use super::{
    Message, RedisLimits, ARRAY_MARKER, BULK_STRING_MARKER, ERROR_MARKER, INTEGER_MARKER, MARKERS,
    NULL_ARRAY, NULL_BULK_STRING, SIMPLE_STRING_MARKER, TERMINAL_SEQUENCE,
};

/// Longer size lines mean the traffic is not RESP.
const SIZE_STR_MAX_LEN: usize = 16;
const NULL_SIZE: i64 = -1;

/// Head token of a pub/sub push array (`message`, channel, payload).
const PUB_MESSAGE_TOKEN: &str = "MESSAGE";
const PUB_MESSAGE_MIN_ELEMENTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fail {
    NeedsMoreData,
    Invalid,
}

impl From<CursorError> for Fail {
    fn from(_: CursorError) -> Self {
        Fail::NeedsMoreData
    }
}

/// One completed value on its way up the array stack.
struct Value {
    payload: String,
    command: Option<String>,
    is_published_message: bool,
}

impl Value {
    fn scalar(payload: String) -> Self {
        Self {
            payload,
            command: None,
            is_published_message: false,
        }
    }
}

/// Array whose elements are still being parsed.
struct PendingArray {
    expected: usize,
    items: Vec<String>,
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn parse_line(cur: &mut ByteCursor<'_>) -> Result<String, Fail> {
    Ok(lossy(cur.extract_delimited_string(TERMINAL_SEQUENCE)?))
}

/// Decimal length line; `-1` is null.
fn parse_size(cur: &mut ByteCursor<'_>) -> Result<i64, Fail> {
    let size_str = match cur.extract_delimited_string(TERMINAL_SEQUENCE) {
        Ok(s) => s,
        // No terminator within a plausible size line will never become valid.
        Err(_) if cur.remaining_size() > SIZE_STR_MAX_LEN + 1 => return Err(Fail::Invalid),
        Err(e) => return Err(e.into()),
    };
    if size_str.len() > SIZE_STR_MAX_LEN {
        return Err(Fail::Invalid);
    }
    let size: i64 = std::str::from_utf8(size_str)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(Fail::Invalid)?;
    if size < NULL_SIZE {
        return Err(Fail::Invalid);
    }
    Ok(size)
}

fn parse_bulk_string(cur: &mut ByteCursor<'_>, limits: &RedisLimits) -> Result<String, Fail> {
    let len = parse_size(cur)?;
    if len == NULL_SIZE {
        return Ok(NULL_BULK_STRING.to_string());
    }
    let len = usize::try_from(len).map_err(|_| Fail::Invalid)?;
    if len > limits.max_bulk_len {
        return Err(Fail::Invalid);
    }
    let body = cur.extract_fixed_string(len + TERMINAL_SEQUENCE.len())?;
    let payload = body.strip_suffix(TERMINAL_SEQUENCE).ok_or(Fail::Invalid)?;
    Ok(lossy(payload))
}

fn is_pub_message(items: &[String]) -> bool {
    items.len() >= PUB_MESSAGE_MIN_ELEMENTS
        && items
            .first()
            .is_some_and(|head| head.eq_ignore_ascii_case(PUB_MESSAGE_TOKEN))
}

fn finish_array(msg_type: MessageType, items: Vec<String>) -> Value {
    let rendered = format_array(msg_type, &items);
    Value {
        payload: rendered.payload,
        command: rendered.command,
        is_published_message: msg_type == MessageType::Response && is_pub_message(&items),
    }
}

/// Parse one message. Arrays are walked with an explicit stack so nesting
/// depth never grows the call stack; depth is also capped by `limits`.
fn parse_value(
    msg_type: MessageType,
    cur: &mut ByteCursor<'_>,
    limits: &RedisLimits,
) -> Result<Value, Fail> {
    let mut stack: Vec<PendingArray> = Vec::new();
    loop {
        let marker = cur.extract_char()?;
        let mut done = match marker {
            SIMPLE_STRING_MARKER | ERROR_MARKER | INTEGER_MARKER => {
                Some(Value::scalar(parse_line(cur)?))
            }
            BULK_STRING_MARKER => Some(Value::scalar(parse_bulk_string(cur, limits)?)),
            ARRAY_MARKER => {
                let len = parse_size(cur)?;
                if len == NULL_SIZE {
                    Some(Value::scalar(NULL_ARRAY.to_string()))
                } else {
                    let len = usize::try_from(len).map_err(|_| Fail::Invalid)?;
                    if len > limits.max_array_len {
                        return Err(Fail::Invalid);
                    }
                    if len == 0 {
                        Some(finish_array(msg_type, Vec::new()))
                    } else {
                        if stack.len() >= limits.max_array_depth {
                            return Err(Fail::Invalid);
                        }
                        stack.push(PendingArray {
                            expected: len,
                            items: Vec::with_capacity(len.min(64)),
                        });
                        None
                    }
                }
            }
            _ => return Err(Fail::Invalid),
        };

        while let Some(value) = done.take() {
            let Some(top) = stack.last_mut() else {
                return Ok(value);
            };
            top.items.push(value.payload);
            if top.items.len() == top.expected {
                if let Some(full) = stack.pop() {
                    done = Some(finish_array(msg_type, full.items));
                }
            }
        }
    }
}

/// Decode one message from the start of `buf`.
pub fn parse_message(msg_type: MessageType, buf: &[u8], limits: &RedisLimits) -> Parsed<Message> {
    let mut cur = ByteCursor::new(buf);
    match parse_value(msg_type, &mut cur, limits) {
        Ok(v) => Parsed::Frame {
            frame: Message {
                timestamp_ns: 0,
                payload: v.payload,
                command: v.command,
                is_published_message: v.is_published_message,
            },
            consumed: cur.position(),
        },
        Err(Fail::NeedsMoreData) => Parsed::NeedsMoreData,
        Err(Fail::Invalid) => Parsed::Invalid,
    }
}

/// First offset `>= start` holding one of the five type markers.
pub fn find_message_boundary(buf: &[u8], start: usize) -> Option<usize> {
    let tail = buf.get(start..)?;
    tail.iter().position(|b| MARKERS.contains(b)).map(|i| start + i)
}

/// Stream parser for one direction of a Redis connection.
#[derive(Debug, Default, Clone)]
pub struct RedisParser {
    limits: RedisLimits,
}

impl RedisParser {
    pub fn new(limits: RedisLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &RedisLimits {
        &self.limits
    }
}

impl FrameParser for RedisParser {
    type Frame = Message;

    fn protocol(&self) -> &'static str {
        "redis"
    }

    fn parse_frame(&mut self, msg_type: MessageType, buf: &[u8]) -> Parsed<Message> {
        parse_message(msg_type, buf, &self.limits)
    }

    fn find_frame_boundary(
        &self,
        _msg_type: MessageType,
        buf: &[u8],
        start: usize,
    ) -> Option<usize> {
        find_message_boundary(buf, start)
    }
}
