//! Rendering of matched response groups into record text.
//!
//! Redis arrays are rendered while parsing (`wirestitch_core::protocol::redis::format`);
//! this module holds the pgsql response formatting invoked by the stitcher.

pub mod pgsql;

/// Trim NUL padding at both ends (pgsql strings are NUL-terminated on the wire).
pub fn strip_nul(s: &str) -> &str {
    s.trim_matches('\0')
}
