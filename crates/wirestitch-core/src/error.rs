//! Shared error types across wirestitch crates.

use thiserror::Error;

/// Stable error codes (used by the replay tool and tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid or out-of-range configuration.
    Config,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Reading input failed.
    Io,
    /// Malformed input outside the frame decode path (capture lines, hex).
    Decode,
}

impl ErrorCode {
    /// String representation used in logs and test assertions.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Config => "CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Io => "IO",
            ErrorCode::Decode => "DECODE",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, WireStitchError>;

/// Unified error type used by core and tracer.
///
/// Frame decoding never produces this type: it reports `ParseState` instead.
#[derive(Debug, Error)]
pub enum WireStitchError {
    #[error("config: {0}")]
    Config(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("io: {0}")]
    Io(String),
    #[error("decode: {0}")]
    Decode(String),
}

impl WireStitchError {
    /// Map to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            WireStitchError::Config(_) => ErrorCode::Config,
            WireStitchError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            WireStitchError::Io(_) => ErrorCode::Io,
            WireStitchError::Decode(_) => ErrorCode::Decode,
        }
    }
}

/// Failure of a single `ByteCursor` extraction. The cursor is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("not enough data: needed {needed} bytes, {remaining} remaining")]
    NotEnoughData { needed: usize, remaining: usize },
    #[error("delimiter not found")]
    DelimiterNotFound,
}
