//! wirestitch tracer library entry.
//!
//! This crate wires byte buffering, frame parsing, request/response stitching,
//! and response formatting into per-connection trackers. It is intended to be
//! consumed by a capture pipeline, by the replay binary (`main.rs`), and by
//! integration tests.

pub mod config;
pub mod format;
pub mod obs;
pub mod replay;
pub mod stitch;
pub mod stream;
pub mod tracker;

pub use stitch::{Record, RecordsWithErrorCount};
pub use tracker::{pgsql_tracker, redis_tracker, ConnTracker, PgsqlTracker, RedisTracker};
