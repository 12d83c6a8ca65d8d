//! Per-connection tracker: two data streams, their parsers, and a stitcher.
//!
//! The owner feeds captured chunks for one connection serially and calls
//! `process` to get the records completed so far. Nothing here locks; one
//! tracker belongs to one connection's processing context.

use std::sync::Arc;
use std::time::Duration;

use wirestitch_core::frame::{FrameParser, MessageType};
use wirestitch_core::protocol::pgsql::PgsqlParser;
use wirestitch_core::protocol::redis::RedisParser;

use crate::config::TracerConfig;
use crate::obs::TracerMetrics;
use crate::stitch::{PgsqlStitcher, RecordsWithErrorCount, RedisStitcher, Stitcher};
use crate::stream::{DataStream, ParseSummary};

pub type PgsqlTracker = ConnTracker<PgsqlParser, PgsqlStitcher>;
pub type RedisTracker = ConnTracker<RedisParser, RedisStitcher>;

pub struct ConnTracker<P: FrameParser, S> {
    conn_id: u64,
    req: DataStream<P::Frame>,
    resp: DataStream<P::Frame>,
    req_parser: P,
    resp_parser: P,
    stitcher: S,
    metrics: Option<Arc<TracerMetrics>>,
}

impl<P, S> ConnTracker<P, S>
where
    P: FrameParser + Clone,
    S: Stitcher<Frame = P::Frame>,
{
    pub fn new(conn_id: u64, parser: P, stitcher: S, max_buffer_bytes: usize) -> Self {
        Self {
            conn_id,
            req: DataStream::new(MessageType::Request, max_buffer_bytes),
            resp: DataStream::new(MessageType::Response, max_buffer_bytes),
            req_parser: parser.clone(),
            resp_parser: parser,
            stitcher,
            metrics: None,
        }
    }

    /// Count frames, parse failures, records, and stitch errors into `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<TracerMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn conn_id(&self) -> u64 {
        self.conn_id
    }

    pub fn add_data(&mut self, direction: MessageType, timestamp_ns: u64, data: &[u8]) {
        match direction {
            MessageType::Request => self.req.add_data(timestamp_ns, data),
            MessageType::Response => self.resp.add_data(timestamp_ns, data),
        }
    }

    pub fn stream(&self, direction: MessageType) -> &DataStream<P::Frame> {
        match direction {
            MessageType::Request => &self.req,
            MessageType::Response => &self.resp,
        }
    }

    /// Parse both directions, then stitch what lines up.
    pub fn process(&mut self) -> RecordsWithErrorCount {
        let req_summary = self.req.process(&mut self.req_parser);
        let resp_summary = self.resp.process(&mut self.resp_parser);

        let out = self
            .stitcher
            .stitch(self.req.frames_mut(), self.resp.frames_mut());

        if out.error_count > 0 {
            tracing::debug!(
                conn = self.conn_id,
                protocol = self.stitcher.protocol(),
                errors = out.error_count,
                "stitch errors"
            );
        }
        self.record_metrics(MessageType::Request, &req_summary);
        self.record_metrics(MessageType::Response, &resp_summary);
        self.record_stitch_metrics(&out);
        out
    }

    fn record_metrics(&self, direction: MessageType, summary: &ParseSummary) {
        let Some(m) = &self.metrics else { return };
        let labels = [("protocol", self.stitcher.protocol()), ("direction", direction.as_str())];
        m.frames.add(&labels, summary.frames);
        m.parse_invalid.add(&labels, summary.invalid);
        m.resyncs.add(&labels, summary.resyncs);
        m.buffer_resets.add(&labels, summary.buffer_resets);
    }

    fn record_stitch_metrics(&self, out: &RecordsWithErrorCount) {
        let Some(m) = &self.metrics else { return };
        let labels = [("protocol", self.stitcher.protocol())];
        m.records.add(&labels, out.records.len() as u64);
        m.stitch_errors.add(&labels, out.error_count as u64);
        for r in &out.records {
            m.exchange_latency
                .observe(&labels, Duration::from_nanos(r.latency_ns()));
        }
    }
}

pub fn pgsql_tracker(conn_id: u64, cfg: &TracerConfig) -> PgsqlTracker {
    ConnTracker::new(
        conn_id,
        PgsqlParser::new(),
        PgsqlStitcher::new(&cfg.pgsql),
        cfg.stream.max_buffer_bytes,
    )
}

pub fn redis_tracker(conn_id: u64, cfg: &TracerConfig) -> RedisTracker {
    ConnTracker::new(
        conn_id,
        RedisParser::new(cfg.redis.limits()),
        RedisStitcher::new(),
        cfg.stream.max_buffer_bytes,
    )
}
