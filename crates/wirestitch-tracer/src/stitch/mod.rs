//! Request/response stitching.
//!
//! A `Stitcher` drains matching prefixes of a connection's request and
//! response frame queues into `Record`s. Unmatched suffixes stay queued for
//! the next pass, so re-running a stitcher never duplicates records.

pub mod pgsql;
pub mod redis;

use std::collections::VecDeque;

use serde::Serialize;
use thiserror::Error;

pub use self::pgsql::PgsqlStitcher;
pub use self::redis::RedisStitcher;

/// One request paired with its (rendered) response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Capture time of the first request frame.
    pub timestamp_ns: u64,
    /// Capture time of the first response frame.
    pub resp_timestamp_ns: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub req: String,
    pub resp: String,
}

impl Record {
    /// Response latency (zero if the clock went backwards).
    pub fn latency_ns(&self) -> u64 {
        self.resp_timestamp_ns.saturating_sub(self.timestamp_ns)
    }
}

/// Output of one stitching pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordsWithErrorCount {
    pub records: Vec<Record>,
    /// Exchanges attempted and dropped in this pass.
    pub error_count: usize,
}

impl RecordsWithErrorCount {
    pub fn extend(&mut self, other: RecordsWithErrorCount) {
        self.records.extend(other.records);
        self.error_count += other.error_count;
    }
}

/// Why one exchange could not be stitched. Counted, never propagated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StitchError {
    #[error("no command-complete or error response in queued responses")]
    NoResponseTerminator,
    #[error("no execute frame in queued requests")]
    NoRequestTerminator,
    #[error("no request frames before execute")]
    EmptyRequestGroup,
    #[error("response precedes every pending request")]
    OrphanResponse,
}

/// Protocol-specific correlation of two frame queues.
pub trait Stitcher {
    type Frame;

    fn protocol(&self) -> &'static str;

    /// Consume matched prefixes of `reqs` and `resps`.
    fn stitch(
        &mut self,
        reqs: &mut VecDeque<Self::Frame>,
        resps: &mut VecDeque<Self::Frame>,
    ) -> RecordsWithErrorCount;
}
