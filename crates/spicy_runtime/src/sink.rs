//! Sinks: out-of-order byte reassembly for parsers fed from multiple
//! chunks or connections.
//!
//! Grounded on `original_source/spicy/src/rt/parser.cc`'s sink
//! implementation: a sink buffers out-of-order chunks keyed by sequence
//! offset, reassembles contiguous runs, and forwards each contiguous run
//! through the attached filter chain to every connected parser.

use std::collections::BTreeMap;

use crate::failure::{Failure, Result};
use crate::fiber::Resumable;
use crate::filter::FilterUnit;
use crate::stream::Stream;

/// What a sink does on an overlapping write: conflicting retransmissions
/// at an already-buffered offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// Reject conflicting retransmissions (bytes at an already-filled
    /// offset that disagree with what's already buffered).
    Reject,
    /// Keep the first version seen at an offset.
    First,
    /// Replace with the most recently arrived version.
    Last,
}

/// A reassembly gap left by out-of-order or never-delivered bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gap {
    pub offset: usize,
    pub len: usize,
}

struct PendingChunk {
    bytes: Vec<u8>,
}

/// Buffers out-of-order byte ranges keyed by absolute sequence offset and
/// reassembles the contiguous prefix, forwarding it to every connected
/// parser through the sink's filter chain.
pub struct Sink {
    stream: Stream,
    /// Absolute offset of the next byte the sink hasn't yet delivered.
    delivered_up_to: usize,
    /// Chunks received out of order, keyed by their starting offset.
    pending: BTreeMap<usize, PendingChunk>,
    filters: Vec<Box<dyn FilterUnit>>,
    connected: Vec<Resumable>,
    overlap_policy: OverlapPolicy,
    gaps: Vec<Gap>,
    closed: bool,
}

impl Sink {
    pub fn new() -> Self {
        Sink {
            stream: Stream::new(),
            delivered_up_to: 0,
            pending: BTreeMap::new(),
            filters: Vec::new(),
            connected: Vec::new(),
            overlap_policy: OverlapPolicy::Reject,
            gaps: Vec::new(),
            closed: false,
        }
    }

    pub fn set_overlap_policy(&mut self, policy: OverlapPolicy) {
        self.overlap_policy = policy;
    }

    pub fn add_filter(&mut self, filter: Box<dyn FilterUnit>) {
        self.filters.push(filter);
    }

    /// Attaches a parser's fiber; every contiguous run already delivered
    /// plus any future run gets forwarded to it.
    pub fn connect(&mut self, parser: Resumable) {
        self.connected.push(parser);
    }

    /// Tears down all connected parsers without letting them see
    /// end-of-data.
    pub fn disconnect_all(&mut self) {
        for parser in &mut self.connected {
            parser.abort();
        }
        self.connected.clear();
    }

    /// Feeds a chunk of bytes that the sender claims starts at `offset`.
    /// Out-of-order chunks are buffered; once `offset` equals
    /// `delivered_up_to` this (and any now-contiguous buffered chunks)
    /// gets appended to the underlying stream.
    pub fn write_at(&mut self, offset: usize, bytes: Vec<u8>) -> Result<()> {
        if self.closed {
            return Err(Failure::InvalidValue("write to a closed sink".into()));
        }
        if bytes.is_empty() {
            return Ok(());
        }
        if offset < self.delivered_up_to {
            return self.handle_overlap(offset, bytes);
        }
        self.pending.insert(offset, PendingChunk { bytes });
        self.drain_contiguous()
    }

    /// Appends at the current write head, the common case of in-order
    /// delivery.
    pub fn write(&mut self, bytes: Vec<u8>) -> Result<()> {
        let offset = self.delivered_up_to + self.pending_contiguous_len();
        self.write_at(offset, bytes)
    }

    fn pending_contiguous_len(&self) -> usize {
        let mut cursor = self.delivered_up_to;
        for (&start, chunk) in &self.pending {
            if start != cursor {
                break;
            }
            cursor += chunk.bytes.len();
        }
        cursor - self.delivered_up_to
    }

    fn handle_overlap(&mut self, offset: usize, bytes: Vec<u8>) -> Result<()> {
        match self.overlap_policy {
            OverlapPolicy::Reject => Err(Failure::InvalidValue(format!(
                "overlapping write at offset {offset}, already delivered up to {}",
                self.delivered_up_to
            ))),
            OverlapPolicy::First => Ok(()),
            OverlapPolicy::Last => {
                // Bytes already delivered into the stream can't be
                // retracted; a `Last` policy only affects still-pending
                // chunks at the same offset.
                self.pending.insert(offset, PendingChunk { bytes });
                Ok(())
            }
        }
    }

    /// Moves every now-contiguous buffered chunk into the stream and
    /// forwards it through the filter chain to connected parsers.
    fn drain_contiguous(&mut self) -> Result<()> {
        let mut delivered = Vec::new();
        while let Some(chunk) = self.pending.remove(&self.delivered_up_to) {
            self.delivered_up_to += chunk.bytes.len();
            delivered.extend(chunk.bytes);
        }
        if delivered.is_empty() {
            return Ok(());
        }
        let forwarded = self.apply_filters(delivered)?;
        self.stream.append(forwarded)?;
        self.resume_connected()
    }

    fn apply_filters(&mut self, bytes: Vec<u8>) -> Result<Vec<u8>> {
        let mut data = bytes;
        for filter in &mut self.filters {
            data = filter.forward(&data)?;
        }
        Ok(data)
    }

    fn resume_connected(&mut self) -> Result<()> {
        let mut i = 0;
        while i < self.connected.len() {
            match self.connected[i].resume() {
                Ok(true) => {
                    self.connected.remove(i);
                }
                Ok(false) => i += 1,
                Err(e) => {
                    // A connected parser's failure doesn't abort the sink
                    // or its other connected parsers.
                    log::warn!("connected parser failed: {e}");
                    self.connected.remove(i);
                }
            }
        }
        Ok(())
    }

    /// Explicitly marks a range as a permanent gap that will never be
    /// filled, letting reassembly proceed past it immediately.
    pub fn skip(&mut self, offset: usize, len: usize) {
        if offset == self.delivered_up_to {
            self.gaps.push(Gap { offset, len });
            self.delivered_up_to += len;
            let _ = self.drain_contiguous();
        } else if offset > self.delivered_up_to {
            self.gaps.push(Gap { offset, len });
        }
    }

    /// Signals no further data will ever arrive; any remaining gap is
    /// reported but does not itself fail the sink — undelivered trailing
    /// gaps are advisory.
    pub fn close(&mut self) -> Result<()> {
        self.closed = true;
        let mut flushed = Vec::new();
        for filter in &mut self.filters {
            flushed.extend(filter.finalize()?);
        }
        if !flushed.is_empty() {
            self.stream.append(flushed)?;
        }
        self.stream.freeze();
        self.resume_connected()
    }

    pub fn gaps(&self) -> &[Gap] {
        &self.gaps
    }

    pub fn stream(&self) -> &Stream {
        &self.stream
    }

    pub fn delivered_len(&self) -> usize {
        self.delivered_up_to
    }
}

impl Default for Sink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiber::{NeedsInput, Resumable};

    #[test]
    fn in_order_writes_deliver_immediately() {
        let mut sink = Sink::new();
        sink.write(b"hel".to_vec()).unwrap();
        sink.write(b"lo".to_vec()).unwrap();
        assert_eq!(sink.stream().view().to_bytes(), b"hello");
    }

    #[test]
    fn out_of_order_writes_buffer_until_contiguous() {
        let mut sink = Sink::new();
        sink.write_at(3, b"lo".to_vec()).unwrap();
        assert_eq!(sink.stream().view().to_bytes(), b"");
        sink.write_at(0, b"hel".to_vec()).unwrap();
        assert_eq!(sink.stream().view().to_bytes(), b"hello");
    }

    #[test]
    fn reject_policy_fails_on_overlap() {
        let mut sink = Sink::new();
        sink.write(b"abc".to_vec()).unwrap();
        assert!(sink.write_at(1, b"xyz".to_vec()).is_err());
    }

    /// spec.md §8 scenario 4 "Sink reassembly", first half: with the
    /// "first wins" overlap policy, writes `(seq=0,"ab")`, `(seq=2,"cd")`,
    /// `(seq=0,"ab")` deliver exactly `"abcd"`.
    #[test]
    fn first_wins_overlap_policy_delivers_first_version_seen() {
        let mut sink = Sink::new();
        sink.set_overlap_policy(OverlapPolicy::First);
        sink.write_at(0, b"ab".to_vec()).unwrap();
        sink.write_at(2, b"cd".to_vec()).unwrap();
        sink.write_at(0, b"ab".to_vec()).unwrap();
        assert_eq!(sink.stream().view().to_bytes(), b"abcd");
    }

    /// spec.md §8 scenario 4, second half: `(seq=0,"ab")`, `(seq=4,"ef")`
    /// with the gap left open delivers nothing until `(seq=2,"cd")`
    /// arrives to bridge it.
    #[test]
    fn buffered_gap_blocks_delivery_until_bridged() {
        let mut sink = Sink::new();
        sink.write_at(0, b"ab".to_vec()).unwrap();
        sink.write_at(4, b"ef".to_vec()).unwrap();
        assert_eq!(sink.stream().view().to_bytes(), b"ab");
        sink.write_at(2, b"cd".to_vec()).unwrap();
        assert_eq!(sink.stream().view().to_bytes(), b"abcdef");
    }

    #[test]
    fn skip_creates_a_gap_and_unblocks_reassembly() {
        let mut sink = Sink::new();
        sink.write_at(0, b"ab".to_vec()).unwrap();
        sink.skip(2, 3);
        sink.write_at(5, b"fg".to_vec()).unwrap();
        assert_eq!(sink.stream().view().to_bytes(), b"abfg");
        assert_eq!(sink.gaps(), &[Gap { offset: 2, len: 3 }]);
    }

    #[test]
    fn connected_parser_resumes_as_data_arrives() {
        let mut sink = Sink::new();
        let stream_for_parser = sink.stream().clone();
        let parser = Resumable::new(async move {
            loop {
                if stream_for_parser.view().len() >= 5 {
                    return Ok(());
                }
                NeedsInput::new().await;
            }
        });
        sink.connect(parser);
        sink.write(b"hel".to_vec()).unwrap();
        assert_eq!(sink.connected.len(), 1);
        sink.write(b"lo".to_vec()).unwrap();
        assert_eq!(sink.connected.len(), 0);
    }

    #[test]
    fn close_finalizes_filters_and_freezes_stream() {
        let mut sink = Sink::new();
        sink.add_filter(Box::new(crate::filter::Base64Filter::new()));
        sink.write(b"aGVsbG8=".to_vec()).unwrap();
        sink.close().unwrap();
        assert_eq!(sink.stream().view().to_bytes(), b"hello");
        assert!(sink.stream().is_frozen());
    }
}
