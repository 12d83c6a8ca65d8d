#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::Arc;

use wirestitch_core::protocol::pgsql::Tag;
use wirestitch_tracer::config::TracerConfig;
use wirestitch_tracer::obs::TracerMetrics;
use wirestitch_tracer::replay::{replay, CaptureChunk, ProtocolKind, ReplaySummary};

mod common;
use common::{pg_wire, query};

fn line(conn: u64, protocol: &str, direction: &str, ts: u64, data: &[u8]) -> String {
    format!(
        r#"{{"conn":{conn},"protocol":"{protocol}","direction":"{direction}","timestamp_ns":{ts},"hex":"{}"}}"#,
        hex::encode(data)
    )
}

#[test]
fn replays_two_connections() {
    let input = [
        line(1, "redis", "request", 1, b"*1\r\n$4\r\nPING\r\n"),
        String::new(),
        line(2, "pgsql", "request", 2, &pg_wire(Tag::QUERY, &query("BEGIN"))),
        line(1, "redis", "response", 3, b"+PONG\r\n"),
        line(2, "pgsql", "response", 4, &pg_wire(Tag::CMD_COMPLETE, &query("BEGIN"))),
    ]
    .join("\n");

    let mut out = Vec::new();
    let summary = replay(
        &TracerConfig::default(),
        input.as_bytes(),
        &mut out,
        Arc::new(TracerMetrics::default()),
    )
    .unwrap();

    assert_eq!(
        summary,
        ReplaySummary {
            chunks: 4,
            connections: 2,
            records: 2,
            errors: 0,
        }
    );

    let lines: Vec<serde_json::Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["conn"], 1);
    assert_eq!(lines[0]["command"], "PING");
    assert_eq!(lines[0]["resp"], "PONG");
    assert_eq!(lines[1]["conn"], 2);
    assert_eq!(lines[1]["req"], "BEGIN");
    assert_eq!(lines[1]["resp"], "BEGIN");
}

#[test]
fn protocol_change_is_rejected() {
    let input = [
        line(1, "redis", "request", 1, b"+OK\r\n"),
        line(1, "pgsql", "request", 2, b"Q"),
    ]
    .join("\n");
    let err = replay(
        &TracerConfig::default(),
        input.as_bytes(),
        Vec::new(),
        Arc::new(TracerMetrics::default()),
    )
    .unwrap_err();
    assert_eq!(err.code().as_str(), "DECODE");
}

#[test]
fn malformed_lines_are_decode_errors() {
    assert!(CaptureChunk::parse_line(r#"{"conn":1}"#).is_err());
    let unknown_protocol =
        r#"{"conn":1,"protocol":"mysql","direction":"request","timestamp_ns":1,"hex":""}"#;
    assert!(CaptureChunk::parse_line(unknown_protocol).is_err());

    let chunk = CaptureChunk::parse_line(&line(9, "redis", "response", 5, b"+OK\r\n")).unwrap();
    assert_eq!(chunk.protocol, ProtocolKind::Redis);
    assert_eq!(chunk.data().unwrap(), b"+OK\r\n");

    let bad_hex = r#"{"conn":1,"protocol":"redis","direction":"request","timestamp_ns":1,"hex":"zz"}"#;
    let err = CaptureChunk::parse_line(bad_hex).unwrap().data().unwrap_err();
    assert_eq!(err.code().as_str(), "DECODE");
}
