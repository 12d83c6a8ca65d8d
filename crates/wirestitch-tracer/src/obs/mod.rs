//! Lightweight in-process metrics.
//!
//! Counters and histograms are stored as atomics keyed by label sets and
//! rendered in Prometheus text format by the replay tool.

pub mod metrics;

pub use metrics::TracerMetrics;
