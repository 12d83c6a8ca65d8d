//! wirestitch replay tool.
//!
//! Usage: `wirestitch-replay <config.yaml> <capture.jsonl>`
//! - Feeds captured chunks through per-connection trackers
//! - Prints stitched records as JSON lines on stdout
//! - Logs a summary and the metrics snapshot at the end

use std::fs::File;
use std::io::{self, BufReader};
use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use wirestitch_tracer::{config, obs::TracerMetrics, replay};

fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let [_, cfg_path, capture_path] = args.as_slice() else {
        eprintln!("usage: wirestitch-replay <config.yaml> <capture.jsonl>");
        return ExitCode::from(2);
    };

    let cfg = match config::load_from_file(cfg_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(
                path = %cfg_path,
                code = e.code().as_str(),
                error = %e,
                "config load failed"
            );
            return ExitCode::FAILURE;
        }
    };

    let input = match File::open(capture_path) {
        Ok(f) => BufReader::new(f),
        Err(e) => {
            tracing::error!(path = %capture_path, error = %e, "failed to open capture");
            return ExitCode::FAILURE;
        }
    };

    let metrics = Arc::new(TracerMetrics::default());
    tracing::info!(capture = %capture_path, "wirestitch replay starting");

    match replay::replay(&cfg, input, io::stdout().lock(), metrics.clone()) {
        Ok(summary) => {
            tracing::info!(
                chunks = summary.chunks,
                connections = summary.connections,
                records = summary.records,
                errors = summary.errors,
                "replay finished"
            );
            tracing::debug!(metrics = %metrics.render(), "metrics snapshot");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(code = e.code().as_str(), error = %e, "replay failed");
            ExitCode::FAILURE
        }
    }
}
