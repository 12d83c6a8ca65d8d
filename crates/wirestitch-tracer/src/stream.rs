//! One direction of one connection: raw byte backlog plus parsed frame queue.
//!
//! Chunks are appended as captured. `process` parses forward from the start of
//! the backlog, releasing consumed bytes and retaining any incomplete tail, so
//! it can simply be called again after more bytes arrive.

use std::collections::VecDeque;

use bytes::{Buf, BytesMut};

use wirestitch_core::frame::{FrameParser, MessageType, Parsed, TimestampedFrame};

/// Counters from one `process` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseSummary {
    pub frames: u64,
    pub invalid: u64,
    pub resyncs: u64,
    pub buffer_resets: u64,
}

pub struct DataStream<F> {
    msg_type: MessageType,
    buf: BytesMut,
    /// `(start offset in buf, capture timestamp)` per retained chunk.
    chunks: VecDeque<(usize, u64)>,
    frames: VecDeque<F>,
    max_buffer_bytes: usize,
}

impl<F: TimestampedFrame> DataStream<F> {
    pub fn new(msg_type: MessageType, max_buffer_bytes: usize) -> Self {
        Self {
            msg_type,
            buf: BytesMut::new(),
            chunks: VecDeque::new(),
            frames: VecDeque::new(),
            max_buffer_bytes,
        }
    }

    /// Append one captured chunk.
    pub fn add_data(&mut self, timestamp_ns: u64, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.chunks.push_back((self.buf.len(), timestamp_ns));
        self.buf.extend_from_slice(data);
    }

    /// Unparsed bytes currently retained.
    pub fn buffered_bytes(&self) -> usize {
        self.buf.len()
    }

    pub fn frames(&self) -> &VecDeque<F> {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut VecDeque<F> {
        &mut self.frames
    }

    /// Timestamp of the chunk holding byte `offset`.
    fn timestamp_at(&self, offset: usize) -> u64 {
        self.chunks
            .iter()
            .take_while(|(start, _)| *start <= offset)
            .last()
            .map(|(_, ts)| *ts)
            .unwrap_or_default()
    }

    /// Parse as many frames as the backlog holds.
    pub fn process<P>(&mut self, parser: &mut P) -> ParseSummary
    where
        P: FrameParser<Frame = F>,
    {
        let mut summary = ParseSummary::default();
        let mut pos = 0;

        while let Some(tail) = self.buf.get(pos..).filter(|t| !t.is_empty()) {
            match parser.parse_frame(self.msg_type, tail) {
                Parsed::Frame { mut frame, consumed } => {
                    frame.set_timestamp_ns(self.timestamp_at(pos));
                    self.frames.push_back(frame);
                    summary.frames += 1;
                    if consumed == 0 {
                        break;
                    }
                    pos += consumed;
                }
                Parsed::NeedsMoreData => break,
                Parsed::Invalid => {
                    summary.invalid += 1;
                    match parser.find_frame_boundary(self.msg_type, &self.buf, pos + 1) {
                        Some(next) => {
                            tracing::debug!(
                                protocol = parser.protocol(),
                                direction = self.msg_type.as_str(),
                                from = pos,
                                to = next,
                                "resynchronizing"
                            );
                            summary.resyncs += 1;
                            pos = next;
                        }
                        None => {
                            pos = self.buf.len();
                            break;
                        }
                    }
                }
            }
        }

        self.consume(pos);

        if self.buf.len() > self.max_buffer_bytes {
            tracing::warn!(
                protocol = parser.protocol(),
                direction = self.msg_type.as_str(),
                buffered = self.buf.len(),
                max = self.max_buffer_bytes,
                "dropping oversized backlog"
            );
            self.reset();
            summary.buffer_resets += 1;
        }
        summary
    }

    /// Drop the raw backlog (frames already parsed are kept).
    pub fn reset(&mut self) {
        self.buf.clear();
        self.chunks.clear();
    }

    fn consume(&mut self, n: usize) {
        let n = n.min(self.buf.len());
        self.buf.advance(n);
        if self.buf.is_empty() {
            self.chunks.clear();
            return;
        }
        while self.chunks.get(1).is_some_and(|(start, _)| *start <= n) {
            self.chunks.pop_front();
        }
        for (start, _) in self.chunks.iter_mut() {
            *start = start.saturating_sub(n);
        }
    }
}
