//! The parse cursor: parsing state plus the wait-for-input primitive.
//!
//! Grounded on `original_source/spicy/src/rt/parser.cc`'s
//! `waitForInputOrEod`/`haveEod`/`atEod` helpers: a cursor holds a view
//! that may need to grow before the next field can be read, and yields
//! its fiber rather than failing immediately just because the view is
//! momentarily short.

use spicy_runtime::{Failure, NeedsInput, Result, Sink, Stream, View};

/// Whether literal matching backtracks on mismatch (a `try` block) or
/// fails the whole parse immediately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiteralMode {
    Strict,
    Tentative,
}

/// A savepoint a `try { ... }` block can roll back to on `ParseError`.
#[derive(Clone)]
pub struct Savepoint {
    view: View,
}

/// Everything one in-flight unit parse carries. Does not itself carry
/// the unit value under construction —
/// that is owned by the generated parse procedure and threaded
/// alongside a `ParseCursor`, matching how `original_source/spicy/src/
/// rt/parser.cc` keeps the cursor and the unit object as separate
/// locals rather than one combined struct.
pub struct ParseCursor {
    stream: Stream,
    view: View,
    trimming_enabled: bool,
    literal_mode: LiteralMode,
    sink: Option<Sink>,
    /// Offset of the unit's `origin`, set once when `%random-access` is
    /// active.
    random_access_origin: Option<usize>,
}

impl ParseCursor {
    pub fn new(stream: Stream) -> Self {
        let view = stream.view();
        ParseCursor { stream, view, trimming_enabled: false, literal_mode: LiteralMode::Strict, sink: None, random_access_origin: None }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    pub fn stream(&self) -> &Stream {
        &self.stream
    }

    pub fn set_literal_mode(&mut self, mode: LiteralMode) {
        self.literal_mode = mode;
    }

    pub fn literal_mode(&self) -> LiteralMode {
        self.literal_mode
    }

    pub fn set_trimming_enabled(&mut self, enabled: bool) {
        self.trimming_enabled = enabled;
    }

    pub fn attach_sink(&mut self, sink: Sink) {
        self.sink = Some(sink);
    }

    pub fn sink_mut(&mut self) -> Option<&mut Sink> {
        self.sink.as_mut()
    }

    /// Activates `%random-access` tracking, recording the current offset
    /// as the unit's origin.
    pub fn enable_random_access(&mut self) {
        self.random_access_origin = Some(self.view.begin_offset());
    }

    /// `self.offset()` relative to the unit's origin.
    pub fn offset(&self) -> Result<usize> {
        let origin = self
            .random_access_origin
            .ok_or_else(|| Failure::InvalidValue("offset() called without %random-access".into()))?;
        Ok(self.view.begin_offset() - origin)
    }

    /// `self.set_input(i)`: repositions the cursor, requiring
    /// `origin <= i <= current`.
    pub fn set_input(&mut self, absolute_offset: usize) -> Result<()> {
        let origin = self
            .random_access_origin
            .ok_or_else(|| Failure::InvalidValue("set_input() called without %random-access".into()))?;
        if absolute_offset < origin || absolute_offset > self.view.begin_offset() {
            return Err(Failure::OutOfRange(format!(
                "set_input({absolute_offset}) outside [{origin}, {}]",
                self.view.begin_offset()
            )));
        }
        self.view = self.stream.view();
        self.view = self.view.advance(absolute_offset - self.stream.begin_offset())?;
        Ok(())
    }

    /// Releases stream chunks behind the current view's start, if
    /// trimming is enabled.
    pub fn maybe_trim(&self) {
        if self.trimming_enabled {
            self.stream.trim(self.view.begin_offset());
        }
    }

    /// Records a backtracking savepoint at the cursor's current position.
    pub fn save(&self) -> Savepoint {
        Savepoint { view: self.view.clone() }
    }

    /// Restores a previously taken savepoint: the cursor is reset to the
    /// savepoint.
    pub fn restore(&mut self, savepoint: Savepoint) {
        self.view = savepoint.view;
    }

    /// Ensures at least `needed` bytes are available in the current
    /// view, suspending the fiber via [`NeedsInput`] until they arrive or
    /// the stream freezes.
    /// Never returns having observed a partial view size change: the
    /// caller sees either "enough data" or a `ParseError`.
    pub async fn wait_for_bytes(&mut self, needed: usize) -> Result<()> {
        loop {
            if self.view.has_available(needed) {
                return Ok(());
            }
            if self.view.at_eod() {
                return Err(Failure::ParseError(format!(
                    "end of data: needed {needed} bytes, only {} available",
                    self.view.len()
                )));
            }
            NeedsInput::new().await;
            // Re-derive the view against the now-possibly-grown stream:
            // an unbounded view tracks the stream's live end on its own,
            // so nothing further is needed here beyond looping back to
            // re-check `has_available`.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn wait_for_bytes_returns_immediately_when_available() {
        let stream = Stream::new();
        stream.append(b"hello".to_vec()).unwrap();
        let mut cursor = ParseCursor::new(stream);
        assert!(block_on(cursor.wait_for_bytes(5)).is_ok());
    }

    #[test]
    fn wait_for_bytes_fails_at_eod_if_still_short() {
        let stream = Stream::new();
        stream.append(b"ab".to_vec()).unwrap();
        stream.freeze();
        let mut cursor = ParseCursor::new(stream);
        let err = block_on(cursor.wait_for_bytes(5)).unwrap_err();
        assert!(matches!(err, Failure::ParseError(_)));
    }

    #[test]
    fn savepoint_restores_prior_view() {
        let stream = Stream::new();
        stream.append(b"abcdef".to_vec()).unwrap();
        let mut cursor = ParseCursor::new(stream);
        let save = cursor.save();
        cursor.set_view(cursor.view().advance(3).unwrap());
        assert_eq!(cursor.view().begin_offset(), 3);
        cursor.restore(save);
        assert_eq!(cursor.view().begin_offset(), 0);
    }

    #[test]
    fn random_access_offset_tracks_origin() {
        let stream = Stream::new();
        stream.append(b"abcdef".to_vec()).unwrap();
        let mut cursor = ParseCursor::new(stream);
        cursor.enable_random_access();
        cursor.set_view(cursor.view().advance(4).unwrap());
        assert_eq!(cursor.offset().unwrap(), 4);
    }

    #[test]
    fn offset_without_random_access_is_an_error() {
        let stream = Stream::new();
        let cursor = ParseCursor::new(stream);
        assert!(cursor.offset().is_err());
    }
}
