//! Protocol grammars (PostgreSQL + Redis).
//!
//! This module hosts the two wire formats traced by wirestitch:
//! - pgsql: tagged, length-prefixed binary frames plus a one-time startup frame.
//! - redis: marker-prefixed text lines, bulk strings, and nested arrays.
//!
//! All parsers read through `ByteCursor` and never panic: malformed input is
//! reported as `Parsed::Invalid`, truncated input as `Parsed::NeedsMoreData`.

pub mod pgsql;
pub mod redis;
