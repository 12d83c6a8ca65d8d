use serde::Deserialize;
use wirestitch_core::error::{Result, WireStitchError};
use wirestitch_core::protocol::redis::RedisLimits;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TracerConfig {
    pub version: u32,

    #[serde(default)]
    pub stream: StreamSection,

    #[serde(default)]
    pub redis: RedisSection,

    #[serde(default)]
    pub pgsql: PgsqlSection,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            stream: StreamSection::default(),
            redis: RedisSection::default(),
            pgsql: PgsqlSection::default(),
        }
    }
}

impl TracerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(WireStitchError::UnsupportedVersion);
        }

        self.stream.validate()?;
        self.redis.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamSection {
    /// Per-direction cap on retained unparsed bytes.
    #[serde(default = "default_max_buffer_bytes")]
    pub max_buffer_bytes: usize,
}

impl Default for StreamSection {
    fn default() -> Self {
        Self {
            max_buffer_bytes: default_max_buffer_bytes(),
        }
    }
}

impl StreamSection {
    pub fn validate(&self) -> Result<()> {
        if !(1024..=256 * 1024 * 1024).contains(&self.max_buffer_bytes) {
            return Err(WireStitchError::Config(
                "stream.max_buffer_bytes must be between 1024 and 268435456".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedisSection {
    #[serde(default = "default_max_bulk_len")]
    pub max_bulk_len: usize,

    #[serde(default = "default_max_array_len")]
    pub max_array_len: usize,

    #[serde(default = "default_max_array_depth")]
    pub max_array_depth: usize,
}

impl Default for RedisSection {
    fn default() -> Self {
        Self {
            max_bulk_len: default_max_bulk_len(),
            max_array_len: default_max_array_len(),
            max_array_depth: default_max_array_depth(),
        }
    }
}

impl RedisSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=default_max_bulk_len()).contains(&self.max_bulk_len) {
            return Err(WireStitchError::Config(
                "redis.max_bulk_len must be between 1 and 536870912".into(),
            ));
        }
        if !(1..=16 * 1024 * 1024).contains(&self.max_array_len) {
            return Err(WireStitchError::Config(
                "redis.max_array_len must be between 1 and 16777216".into(),
            ));
        }
        if !(1..=1024).contains(&self.max_array_depth) {
            return Err(WireStitchError::Config(
                "redis.max_array_depth must be between 1 and 1024".into(),
            ));
        }
        Ok(())
    }

    pub fn limits(&self) -> RedisLimits {
        RedisLimits {
            max_bulk_len: self.max_bulk_len,
            max_array_len: self.max_array_len,
            max_array_depth: self.max_array_depth,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PgsqlSection {
    /// How many distinct unhandled request tags get a warning.
    #[serde(default = "default_unhandled_tag_log_limit")]
    pub unhandled_tag_log_limit: usize,
}

impl Default for PgsqlSection {
    fn default() -> Self {
        Self {
            unhandled_tag_log_limit: default_unhandled_tag_log_limit(),
        }
    }
}

fn default_max_buffer_bytes() -> usize {
    1024 * 1024
}
fn default_max_bulk_len() -> usize {
    512 * 1024 * 1024
}
fn default_max_array_len() -> usize {
    1024 * 1024
}
fn default_max_array_depth() -> usize {
    64
}
fn default_unhandled_tag_log_limit() -> usize {
    10
}
