//! Offline replay of captured chunks (JSON lines) through per-connection trackers.
//!
//! Input line:
//! `{"conn":1,"protocol":"pgsql","direction":"request","timestamp_ns":10,"hex":"51..."}`
//! Output: one JSON `Record` per line, tagged with its connection id.

use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use wirestitch_core::error::{Result, WireStitchError};
use wirestitch_core::frame::MessageType;

use crate::config::TracerConfig;
use crate::obs::TracerMetrics;
use crate::stitch::{Record, RecordsWithErrorCount};
use crate::tracker::{pgsql_tracker, redis_tracker, PgsqlTracker, RedisTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolKind {
    Pgsql,
    Redis,
}

/// One captured chunk.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureChunk {
    pub conn: u64,
    pub protocol: ProtocolKind,
    pub direction: MessageType,
    pub timestamp_ns: u64,
    pub hex: String,
}

impl CaptureChunk {
    pub fn parse_line(line: &str) -> Result<Self> {
        serde_json::from_str(line)
            .map_err(|e| WireStitchError::Decode(format!("invalid capture line: {e}")))
    }

    pub fn data(&self) -> Result<Vec<u8>> {
        hex::decode(&self.hex).map_err(|e| WireStitchError::Decode(format!("invalid hex: {e}")))
    }
}

enum AnyTracker {
    Pgsql(PgsqlTracker),
    Redis(RedisTracker),
}

impl AnyTracker {
    fn new(
        conn: u64,
        protocol: ProtocolKind,
        cfg: &TracerConfig,
        metrics: &Arc<TracerMetrics>,
    ) -> Self {
        match protocol {
            ProtocolKind::Pgsql => {
                AnyTracker::Pgsql(pgsql_tracker(conn, cfg).with_metrics(metrics.clone()))
            }
            ProtocolKind::Redis => {
                AnyTracker::Redis(redis_tracker(conn, cfg).with_metrics(metrics.clone()))
            }
        }
    }

    fn protocol(&self) -> ProtocolKind {
        match self {
            AnyTracker::Pgsql(_) => ProtocolKind::Pgsql,
            AnyTracker::Redis(_) => ProtocolKind::Redis,
        }
    }

    fn add_data(&mut self, direction: MessageType, timestamp_ns: u64, data: &[u8]) {
        match self {
            AnyTracker::Pgsql(t) => t.add_data(direction, timestamp_ns, data),
            AnyTracker::Redis(t) => t.add_data(direction, timestamp_ns, data),
        }
    }

    fn process(&mut self) -> RecordsWithErrorCount {
        match self {
            AnyTracker::Pgsql(t) => t.process(),
            AnyTracker::Redis(t) => t.process(),
        }
    }
}

#[derive(Serialize)]
struct OutputLine<'a> {
    conn: u64,
    #[serde(flatten)]
    record: &'a Record,
}

/// Totals of one replay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub chunks: usize,
    pub connections: usize,
    pub records: usize,
    pub errors: usize,
}

/// Feed every capture line through its connection's tracker, writing records to `out`.
///
/// Blank lines are skipped. A malformed line or a protocol change on an
/// existing connection aborts the run.
pub fn replay<R: BufRead, W: Write>(
    cfg: &TracerConfig,
    input: R,
    mut out: W,
    metrics: Arc<TracerMetrics>,
) -> Result<ReplaySummary> {
    let mut trackers: HashMap<u64, AnyTracker> = HashMap::new();
    let mut summary = ReplaySummary::default();

    for (lineno, line) in input.lines().enumerate() {
        let line = line.map_err(|e| WireStitchError::Io(format!("read capture failed: {e}")))?;
        if line.trim().is_empty() {
            continue;
        }
        let chunk = CaptureChunk::parse_line(&line)
            .map_err(|e| WireStitchError::Decode(format!("line {}: {e}", lineno + 1)))?;
        let data = chunk.data()?;

        let tracker = trackers
            .entry(chunk.conn)
            .or_insert_with(|| AnyTracker::new(chunk.conn, chunk.protocol, cfg, &metrics));
        if tracker.protocol() != chunk.protocol {
            return Err(WireStitchError::Decode(format!(
                "line {}: connection {} changed protocol",
                lineno + 1,
                chunk.conn
            )));
        }

        tracker.add_data(chunk.direction, chunk.timestamp_ns, &data);
        let res = tracker.process();
        summary.chunks += 1;
        summary.records += res.records.len();
        summary.errors += res.error_count;

        for record in &res.records {
            let line = serde_json::to_string(&OutputLine { conn: chunk.conn, record })
                .map_err(|e| WireStitchError::Decode(format!("record encode failed: {e}")))?;
            writeln!(out, "{line}").map_err(|e| WireStitchError::Io(format!("write failed: {e}")))?;
        }
    }

    summary.connections = trackers.len();
    Ok(summary)
}
