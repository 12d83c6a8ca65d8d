//! Frame builders shared by the tracer integration tests.

#![allow(dead_code)]

use bytes::Bytes;

use wirestitch_core::protocol::pgsql::{RegularFrame, Tag};
use wirestitch_core::protocol::redis::Message;

pub fn pg(tag: Tag, ts: u64, payload: &[u8]) -> RegularFrame {
    RegularFrame {
        tag,
        len: payload.len() as i32 + 4,
        timestamp_ns: ts,
        payload: Bytes::copy_from_slice(payload),
    }
}

/// Wire bytes of one tagged frame.
pub fn pg_wire(tag: Tag, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![tag.0];
    out.extend_from_slice(&(payload.len() as i32 + 4).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

pub fn row_desc(names: &[&str]) -> Vec<u8> {
    let mut out = (names.len() as i16).to_be_bytes().to_vec();
    for n in names {
        out.extend_from_slice(n.as_bytes());
        out.push(0);
        out.extend_from_slice(&[0u8; 18]);
    }
    out
}

pub fn data_row(values: &[Option<&str>]) -> Vec<u8> {
    let mut out = (values.len() as i16).to_be_bytes().to_vec();
    for v in values {
        match v {
            Some(s) => {
                out.extend_from_slice(&(s.len() as i32).to_be_bytes());
                out.extend_from_slice(s.as_bytes());
            }
            None => out.extend_from_slice(&(-1i32).to_be_bytes()),
        }
    }
    out
}

pub fn query(sql: &str) -> Vec<u8> {
    let mut out = sql.as_bytes().to_vec();
    out.push(0);
    out
}

pub fn redis(ts: u64, payload: &str) -> Message {
    Message {
        timestamp_ns: ts,
        payload: payload.to_string(),
        command: None,
        is_published_message: false,
    }
}

pub fn redis_cmd(ts: u64, command: &str, payload: &str) -> Message {
    Message {
        command: Some(command.to_string()),
        ..redis(ts, payload)
    }
}

pub fn redis_push(ts: u64, payload: &str) -> Message {
    Message {
        is_published_message: true,
        ..redis(ts, payload)
    }
}
