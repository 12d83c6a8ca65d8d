//! wirestitch core: byte cursor, frame parsing contract, and protocol grammars.
//!
//! This crate decodes raw captured bytes into protocol frames. It carries no
//! buffering, stitching, or configuration-loading concerns so it can be reused
//! by any capture pipeline.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed input surfaces as `ParseState::Invalid` or `NeedsMoreData`, never
//! as a crash: the tracer is a passive observer of untrusted traffic.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod cursor;
pub mod error;
pub mod frame;
pub mod protocol;

pub use cursor::ByteCursor;
pub use error::{Result, WireStitchError};
pub use frame::{FrameParser, MessageType, ParseState, Parsed, TimestampedFrame};
