//! Streams and views.
//!
//! Grounded on `original_source/hilti/include/rt/iterator.h`'s chunked
//! iteration model: a stream is stored as a list of immutable chunks
//! rather than one contiguous buffer, so appending new data never
//! invalidates a [`View`] or [`StreamIterator`] that already exists over
//! an earlier chunk.
//!
//! A stream is append-only and chunked; a view is a half-open `[begin,
//! end)` offset range over one. Freezing a stream marks it as having no
//! further data, letting `&eod`/`&parse=` loops terminate instead of
//! waiting forever for more input.

use crate::failure::{Failure, Result};
use std::cell::RefCell;
use std::rc::Rc;

struct Chunk {
    /// Absolute stream offset of this chunk's first byte.
    start: usize,
    bytes: Vec<u8>,
}

struct StreamInner {
    chunks: Vec<Chunk>,
    /// Absolute offset one past the last byte ever appended.
    end: usize,
    /// Absolute offset of the oldest byte still retained; bytes before
    /// this have been trimmed.
    begin: usize,
    frozen: bool,
}

/// An append-only, chunked byte buffer with a monotonically advancing
/// head offset.
#[derive(Clone)]
pub struct Stream(Rc<RefCell<StreamInner>>);

impl Stream {
    pub fn new() -> Self {
        Stream(Rc::new(RefCell::new(StreamInner {
            chunks: Vec::new(),
            end: 0,
            begin: 0,
            frozen: false,
        })))
    }

    /// Appends a chunk of newly arrived data. Fails if the stream was
    /// already frozen: no further `append` may follow a `freeze`.
    pub fn append(&self, bytes: Vec<u8>) -> Result<()> {
        let mut inner = self.0.borrow_mut();
        if inner.frozen {
            return Err(Failure::InvalidValue("append to a frozen stream".into()));
        }
        if bytes.is_empty() {
            return Ok(());
        }
        let start = inner.end;
        inner.end += bytes.len();
        inner.chunks.push(Chunk { start, bytes });
        Ok(())
    }

    /// Marks the stream as having no further data.
    pub fn freeze(&self) {
        self.0.borrow_mut().frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.0.borrow().frozen
    }

    /// Discards retained bytes before `offset`, advancing the head. Bytes
    /// still covered by an existing [`View`] are a caller error to trim
    /// away; this primitive trusts its caller the way the sink's
    /// advisory-trim policy trusts unit bodies — trimming is advisory,
    /// not validated against live views.
    pub fn trim(&self, offset: usize) {
        let mut inner = self.0.borrow_mut();
        let offset = offset.min(inner.end);
        if offset <= inner.begin {
            return;
        }
        inner.begin = offset;
        inner.chunks.retain(|c| c.start + c.bytes.len() > offset);
    }

    pub fn len(&self) -> usize {
        let inner = self.0.borrow();
        inner.end - inner.begin
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn end_offset(&self) -> usize {
        self.0.borrow().end
    }

    pub fn begin_offset(&self) -> usize {
        self.0.borrow().begin
    }

    /// An open-ended view starting at the currently retained head and
    /// tracking the stream's live end as more data arrives — the window a
    /// freshly started parse sees, with no fixed end, growing as the
    /// stream does.
    pub fn view(&self) -> View {
        let inner = self.0.borrow();
        View { stream: self.clone(), begin: inner.begin, end: None }
    }

    fn byte_at(&self, offset: usize) -> Option<u8> {
        let inner = self.0.borrow();
        if offset < inner.begin || offset >= inner.end {
            return None;
        }
        for chunk in &inner.chunks {
            if offset >= chunk.start && offset < chunk.start + chunk.bytes.len() {
                return Some(chunk.bytes[offset - chunk.start]);
            }
        }
        None
    }

    fn copy_range(&self, begin: usize, end: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(end.saturating_sub(begin));
        let inner = self.0.borrow();
        for chunk in &inner.chunks {
            let chunk_end = chunk.start + chunk.bytes.len();
            if chunk_end <= begin || chunk.start >= end {
                continue;
            }
            let lo = begin.max(chunk.start) - chunk.start;
            let hi = end.min(chunk_end) - chunk.start;
            out.extend_from_slice(&chunk.bytes[lo..hi]);
        }
        out
    }
}

impl Default for Stream {
    fn default() -> Self {
        Self::new()
    }
}

/// A half-open `[begin, end)` window over a [`Stream`].
/// `end: None` means unbounded — the window tracks the stream's
/// live end rather than a fixed offset, the shape a just-started parse
/// sees before any `&size=`/`limit` has narrowed it. Cheap to clone;
/// advancing a view never mutates the stream.
#[derive(Clone)]
pub struct View {
    stream: Stream,
    begin: usize,
    end: Option<usize>,
}

impl View {
    fn effective_end(&self) -> usize {
        self.end.unwrap_or_else(|| self.stream.end_offset())
    }

    pub fn len(&self) -> usize {
        self.effective_end() - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin >= self.effective_end()
    }

    /// `true` once the view's end has caught up with a frozen stream's end
    /// and no more bytes can ever arrive in this window.
    pub fn at_eod(&self) -> bool {
        self.stream.is_frozen() && self.effective_end() >= self.stream.end_offset()
    }

    /// Whether `len` bytes are available right now without waiting for
    /// more input.
    pub fn has_available(&self, len: usize) -> bool {
        self.effective_end() - self.begin >= len
    }

    /// Returns a sub-view advanced past `count` bytes. Fails with
    /// `OutOfRange` if fewer than `count` bytes are available within this
    /// view's bound.
    pub fn advance(&self, count: usize) -> Result<View> {
        if self.begin + count > self.effective_end() {
            return Err(Failure::OutOfRange(format!(
                "advance({}) past view end (have {} bytes)",
                count,
                self.len()
            )));
        }
        Ok(View { stream: self.stream.clone(), begin: self.begin + count, end: self.end })
    }

    /// Returns a sub-view limited to the first `count` bytes, becoming a
    /// bounded view even if `self` was unbounded.
    pub fn limit(&self, count: usize) -> Result<View> {
        if self.begin + count > self.effective_end() {
            return Err(Failure::OutOfRange(format!("limit({}) exceeds view of {} bytes", count, self.len())));
        }
        Ok(View { stream: self.stream.clone(), begin: self.begin, end: Some(self.begin + count) })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.stream.copy_range(self.begin, self.effective_end())
    }

    pub fn iter(&self) -> StreamIterator {
        StreamIterator { view: self.clone(), pos: self.begin }
    }

    pub fn is_unbounded(&self) -> bool {
        self.end.is_none()
    }

    pub fn begin_offset(&self) -> usize {
        self.begin
    }

    pub fn end_offset(&self) -> usize {
        self.effective_end()
    }
}

/// A byte-at-a-time cursor over a [`View`], stable across intervening
/// `append`s to the backing stream.
pub struct StreamIterator {
    view: View,
    pos: usize,
}

impl Iterator for StreamIterator {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.pos >= self.view.effective_end() {
            return None;
        }
        let byte = self.view.stream.byte_at(self.pos)?;
        self.pos += 1;
        Some(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_read_across_chunks() {
        let s = Stream::new();
        s.append(b"hel".to_vec()).unwrap();
        s.append(b"lo".to_vec()).unwrap();
        let v = s.view();
        assert_eq!(v.to_bytes(), b"hello");
    }

    #[test]
    fn frozen_stream_rejects_append() {
        let s = Stream::new();
        s.append(b"x".to_vec()).unwrap();
        s.freeze();
        assert!(s.append(b"y".to_vec()).is_err());
    }

    #[test]
    fn unbounded_view_grows_with_later_append() {
        let s = Stream::new();
        s.append(b"abc".to_vec()).unwrap();
        let v = s.view();
        s.append(b"def".to_vec()).unwrap();
        // an unbounded view tracks the stream's live end.
        assert_eq!(v.to_bytes(), b"abcdef");
    }

    #[test]
    fn limit_freezes_a_bounded_window() {
        let s = Stream::new();
        s.append(b"abc".to_vec()).unwrap();
        let bounded = s.view().limit(3).unwrap();
        s.append(b"def".to_vec()).unwrap();
        assert_eq!(bounded.to_bytes(), b"abc");
    }

    #[test]
    fn advance_and_limit_slice_correctly() {
        let s = Stream::new();
        s.append(b"0123456789".to_vec()).unwrap();
        let v = s.view();
        let mid = v.advance(3).unwrap().limit(4).unwrap();
        assert_eq!(mid.to_bytes(), b"3456");
    }

    #[test]
    fn advance_past_end_is_out_of_range() {
        let s = Stream::new();
        s.append(b"ab".to_vec()).unwrap();
        let v = s.view();
        assert!(matches!(v.advance(5), Err(Failure::OutOfRange(_))));
    }

    #[test]
    fn at_eod_only_after_freeze_and_view_reaches_end() {
        let s = Stream::new();
        s.append(b"ab".to_vec()).unwrap();
        let v = s.view();
        assert!(!v.at_eod());
        s.freeze();
        assert!(v.at_eod());
    }

    #[test]
    fn trim_discards_leading_bytes() {
        let s = Stream::new();
        s.append(b"abcdef".to_vec()).unwrap();
        s.trim(3);
        assert_eq!(s.view().to_bytes(), b"def");
    }

    #[test]
    fn iterator_walks_view_bytes() {
        let s = Stream::new();
        s.append(b"xyz".to_vec()).unwrap();
        let collected: Vec<u8> = s.view().iter().collect();
        assert_eq!(collected, b"xyz");
    }
}
