//! Tracer config loader (strict parsing).

pub mod schema;

use std::fs;

use wirestitch_core::error::{Result, WireStitchError};

pub use schema::{PgsqlSection, RedisSection, StreamSection, TracerConfig};

pub fn load_from_file(path: &str) -> Result<TracerConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| WireStitchError::Io(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<TracerConfig> {
    let cfg: TracerConfig = serde_yaml::from_str(s)
        .map_err(|e| WireStitchError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
