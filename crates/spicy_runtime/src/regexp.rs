//! Incremental regular-expression matching.
//!
//! HILTI compiles its own DFA so it can match against a stream one chunk
//! at a time, reporting an indicator after every chunk the same way a
//! lexer's `yy_more` buffer does. This crate has no DFA compiler of its
//! own, so it leans on the `regex` crate (already part of the dependency
//! stack) and approximates incremental matching by re-running the
//! compiled pattern, anchored at the start, over the full buffer
//! accumulated so far. A known simplification versus a true incremental
//! DFA: once a prefix match is confirmed, it is reported final
//! immediately rather than waiting to see whether a later greedy
//! sub-match could extend it.

use regex::bytes::Regex;

use crate::failure::{Failure, Result};

/// The result of feeding one more chunk to a [`MatchState`]. `as_indicator`
/// maps this to the signed integer ABI used at the parser boundary:
/// positive for a confirmed match of that length, zero for a confirmed
/// failure, `-1` for "undecided, more input could still produce a match".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchIndicator {
    Final(usize),
    Incomplete,
    Fail,
}

impl MatchIndicator {
    pub fn as_indicator(self) -> i64 {
        match self {
            MatchIndicator::Final(n) => n as i64,
            MatchIndicator::Incomplete => -1,
            MatchIndicator::Fail => 0,
        }
    }
}

/// Incremental state for matching one compiled pattern against a byte
/// stream fed in chunks. A state can be advanced exactly until it
/// returns `Final`/`Fail`: advancing a state again after a non-negative
/// indicator is a programming error.
pub struct MatchState {
    pattern: Regex,
    buffer: Vec<u8>,
    done: bool,
}

impl MatchState {
    pub fn new(pattern: &str) -> Result<Self> {
        // Anchor at the start: a Spicy regex literal always matches a
        // prefix of the remaining input, never a substring further in.
        let anchored = if pattern.starts_with('^') { pattern.to_string() } else { format!("^(?:{pattern})") };
        let compiled =
            Regex::new(&anchored).map_err(|e| Failure::InvalidValue(format!("invalid regex literal: {e}")))?;
        Ok(MatchState { pattern: compiled, buffer: Vec::new(), done: false })
    }

    /// Feeds another chunk of data and re-evaluates the match, returning
    /// the new indicator. `is_eod` signals no further bytes will ever
    /// arrive, turning an undecided buffer into a definite `Fail`.
    pub fn advance(&mut self, chunk: &[u8], is_eod: bool) -> Result<MatchIndicator> {
        if self.done {
            return Err(Failure::MatchStateReuse);
        }
        self.buffer.extend_from_slice(chunk);
        let indicator = match self.pattern.find(&self.buffer) {
            Some(m) if m.start() == 0 => MatchIndicator::Final(m.end()),
            _ => {
                if is_eod {
                    MatchIndicator::Fail
                } else {
                    MatchIndicator::Incomplete
                }
            }
        };
        if !matches!(indicator, MatchIndicator::Incomplete) {
            self.done = true;
        }
        Ok(indicator)
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}
