//! Read-only cursor over a borrowed byte range (panic-free).
//!
//! Rules:
//! - Every extraction checks `remaining_size()` before touching the slice.
//! - A failed extraction leaves the position unchanged, so callers can retry
//!   the same cursor once more bytes arrive.

use bytes::Buf;

use crate::error::CursorError;

/// Fixed-width integer that can be read in network (big-endian) byte order.
pub trait WireInt: Sized {
    /// Width in bytes.
    const WIDTH: usize;

    /// Read one value, advancing `buf`. Caller guarantees `WIDTH` bytes remain.
    fn read_be(buf: &mut &[u8]) -> Self;
}

macro_rules! impl_wire_int {
    ($($ty:ty => $get:ident),* $(,)?) => {
        $(
            impl WireInt for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                fn read_be(buf: &mut &[u8]) -> Self {
                    buf.$get()
                }
            }
        )*
    };
}

impl_wire_int! {
    u8 => get_u8,
    i8 => get_i8,
    u16 => get_u16,
    i16 => get_i16,
    u32 => get_u32,
    i32 => get_i32,
    u64 => get_u64,
    i64 => get_i64,
}

/// Cursor over `buf` with a monotonically advancing read position.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Unconsumed suffix.
    pub fn remaining(&self) -> &'a [u8] {
        self.buf.get(self.pos..).unwrap_or_default()
    }

    pub fn remaining_size(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn eof(&self) -> bool {
        self.remaining_size() == 0
    }

    /// Read a big-endian integer of width `T::WIDTH`.
    pub fn extract_int<T: WireInt>(&mut self) -> Result<T, CursorError> {
        let mut bytes = self.take(T::WIDTH)?;
        Ok(T::read_be(&mut bytes))
    }

    pub fn extract_char(&mut self) -> Result<u8, CursorError> {
        self.extract_int::<u8>()
    }

    /// Read exactly `n` bytes.
    pub fn extract_fixed_string(&mut self, n: usize) -> Result<&'a [u8], CursorError> {
        self.take(n)
    }

    /// Read up to the next `delim`, consuming the delimiter but not returning it.
    pub fn extract_delimited_string(&mut self, delim: &[u8]) -> Result<&'a [u8], CursorError> {
        let rest = self.remaining();
        let idx = find_subslice(rest, delim).ok_or(CursorError::DelimiterNotFound)?;
        let out = &rest[..idx];
        self.pos += idx + delim.len();
        Ok(out)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CursorError> {
        let rest = self.remaining();
        if rest.len() < n {
            return Err(CursorError::NotEnoughData {
                needed: n,
                remaining: rest.len(),
            });
        }
        self.pos += n;
        Ok(&rest[..n])
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
