//! Filter chains: a sink or unit may attach a chain of filters that
//! transform bytes before the attached parser ever sees them.
//!
//! `Base64Filter` is grounded on `original_source/spicy/runtime/include/
//! base64.h`; `ZlibFilter` has no direct original_source counterpart (the
//! original links system zlib directly) and instead wraps the `flate2`
//! crate, the ecosystem's standard deflate binding and already part of
//! this project's dependency stack.
//!
//! Forwarding through a chain is naturally recursive — filter *i*'s
//! output is filter *i+1*'s input — so [`forward_chain`] is written with
//! `async_recursion`, the same crate [`crate::fiber`] uses for suspension,
//! rather than a hand-rolled explicit stack.

use async_recursion::async_recursion;
use flate2::write::ZlibDecoder;
use std::io::Write;

use crate::failure::{Failure, Result};

/// One stage of a filter chain. `forward` consumes newly arrived bytes
/// and produces however much decoded output it can; `finalize` flushes
/// anything buffered once the upstream source reaches end-of-data.
pub trait FilterUnit {
    fn forward(&mut self, data: &[u8]) -> Result<Vec<u8>>;
    fn finalize(&mut self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }
    fn name(&self) -> &'static str;
}

/// Decodes standard (RFC 4648) base64, grounded on the original's
/// `base64::Decoder` state machine: it buffers leftover characters that
/// don't yet form a complete 4-character quantum.
#[derive(Default)]
pub struct Base64Filter {
    pending: Vec<u8>,
}

impl Base64Filter {
    pub fn new() -> Self {
        Self::default()
    }

    fn decode_quantum(chars: &[u8; 4]) -> Result<Vec<u8>> {
        let mut vals = [0u8; 4];
        let mut pad = 0;
        for (i, &c) in chars.iter().enumerate() {
            vals[i] = match c {
                b'A'..=b'Z' => c - b'A',
                b'a'..=b'z' => c - b'a' + 26,
                b'0'..=b'9' => c - b'0' + 52,
                b'+' => 62,
                b'/' => 63,
                b'=' => {
                    pad += 1;
                    0
                }
                _ => return Err(Failure::InvalidValue(format!("invalid base64 character {:#x}", c))),
            };
        }
        let n = (u32::from(vals[0]) << 18) | (u32::from(vals[1]) << 12) | (u32::from(vals[2]) << 6) | u32::from(vals[3]);
        let bytes = [((n >> 16) & 0xff) as u8, ((n >> 8) & 0xff) as u8, (n & 0xff) as u8];
        Ok(bytes[..3 - pad.min(2)].to_vec())
    }
}

impl FilterUnit for Base64Filter {
    fn forward(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.pending.extend(data.iter().filter(|b| !b.is_ascii_whitespace()));
        let mut out = Vec::new();
        while self.pending.len() >= 4 {
            let chunk: [u8; 4] = self.pending[..4].try_into().unwrap();
            out.extend(Self::decode_quantum(&chunk)?);
            self.pending.drain(..4);
        }
        Ok(out)
    }

    fn finalize(&mut self) -> Result<Vec<u8>> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }
        if self.pending.len() != 4 {
            return Err(Failure::InvalidValue("base64 input truncated mid-quantum".into()));
        }
        let chunk: [u8; 4] = self.pending[..4].try_into().unwrap();
        self.pending.clear();
        Base64Filter::decode_quantum(&chunk)
    }

    fn name(&self) -> &'static str {
        "base64"
    }
}

/// Encodes standard (RFC 4648) base64 incrementally, grounded on the
/// original's `base64::Stream::encode`/`finish` pair: each call continues
/// where the previous one left off, buffering up to 2 leftover bytes that
/// don't yet form a complete 3-byte quantum until the next call or
/// [`Base64Encoder::finish`] supplies the rest.
///
/// Not a [`FilterUnit`]: filters transform bytes arriving on the *input*
/// side of a parse, while encoding runs the other direction (producing
/// bytes a unit emits), so this is used directly rather than chained
/// through a sink.
#[derive(Default)]
pub struct Base64Encoder {
    pending: Vec<u8>,
}

const BASE64_ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

impl Base64Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn encode_quantum(bytes: &[u8; 3]) -> [u8; 4] {
        let n = (u32::from(bytes[0]) << 16) | (u32::from(bytes[1]) << 8) | u32::from(bytes[2]);
        [
            BASE64_ALPHABET[((n >> 18) & 0x3f) as usize],
            BASE64_ALPHABET[((n >> 12) & 0x3f) as usize],
            BASE64_ALPHABET[((n >> 6) & 0x3f) as usize],
            BASE64_ALPHABET[(n & 0x3f) as usize],
        ]
    }

    /// Encodes the next chunk of data, continuing from any leftover bytes
    /// a previous call couldn't yet form a full quantum from.
    pub fn encode(&mut self, data: &[u8]) -> Vec<u8> {
        self.pending.extend_from_slice(data);
        let mut out = Vec::new();
        while self.pending.len() >= 3 {
            let chunk: [u8; 3] = self.pending[..3].try_into().unwrap();
            out.extend(Self::encode_quantum(&chunk));
            self.pending.drain(..3);
        }
        out
    }

    /// Flushes any trailing 1-2 leftover bytes, padding with `=` as RFC
    /// 4648 requires.
    pub fn finish(&mut self) -> Vec<u8> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        let mut padded = [0u8; 3];
        let n = self.pending.len();
        padded[..n].copy_from_slice(&self.pending);
        self.pending.clear();
        let mut quantum = Self::encode_quantum(&padded).to_vec();
        for slot in quantum.iter_mut().skip(n + 1) {
            *slot = b'=';
        }
        quantum
    }
}

/// Inflates a zlib stream incrementally via `flate2`'s `ZlibDecoder`
/// writer adapter.
pub struct ZlibFilter {
    decoder: ZlibDecoder<Vec<u8>>,
}

impl ZlibFilter {
    pub fn new() -> Self {
        ZlibFilter { decoder: ZlibDecoder::new(Vec::new()) }
    }

    fn drain(&mut self) -> Vec<u8> {
        std::mem::take(self.decoder.get_mut())
    }
}

impl Default for ZlibFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterUnit for ZlibFilter {
    fn forward(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.decoder
            .write_all(data)
            .map_err(|e| Failure::InvalidValue(format!("zlib stream corrupt: {e}")))?;
        Ok(self.drain())
    }

    fn finalize(&mut self) -> Result<Vec<u8>> {
        self.decoder
            .try_finish()
            .map_err(|e| Failure::InvalidValue(format!("zlib stream truncated: {e}")))?;
        Ok(self.drain())
    }

    fn name(&self) -> &'static str {
        "zlib"
    }
}

/// Pushes `data` through the chain from `index` onward, recursing into
/// the next stage with whatever the current stage produced (spec.md
/// §4.1 "chained filters compose left to right").
#[async_recursion(?Send)]
pub async fn forward_chain(chain: &mut [Box<dyn FilterUnit>], index: usize, data: Vec<u8>) -> Result<Vec<u8>> {
    if index >= chain.len() {
        return Ok(data);
    }
    let produced = chain[index].forward(&data)?;
    forward_chain(chain, index + 1, produced).await
}

/// Flushes every stage from `index` onward, feeding each stage's final
/// output into the next.
#[async_recursion(?Send)]
pub async fn finalize_chain(chain: &mut [Box<dyn FilterUnit>], index: usize) -> Result<Vec<u8>> {
    if index >= chain.len() {
        return Ok(Vec::new());
    }
    let produced = chain[index].finalize()?;
    let mut downstream = forward_chain(chain, index + 1, produced).await?;
    downstream.extend(finalize_chain(chain, index + 1).await?);
    Ok(downstream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_decodes_simple_text() {
        let mut f = Base64Filter::new();
        let mut out = f.forward(b"aGVsbG8=").unwrap();
        out.extend(f.finalize().unwrap());
        assert_eq!(out, b"hello");
    }

    #[test]
    fn base64_rejects_invalid_character() {
        let mut f = Base64Filter::new();
        assert!(f.forward(b"!!!!").is_err());
    }

    #[test]
    fn base64_encodes_across_two_calls_plus_finish() {
        let mut enc = Base64Encoder::new();
        let mut out = enc.encode(b"More than ");
        out.extend(enc.encode(b"6 bytes"));
        out.extend(enc.finish());
        assert_eq!(out, b"TW9yZSB0aGFuIDYgYnl0ZXM=".to_vec());
    }

    #[test]
    fn base64_encode_round_trips_through_decode() {
        let mut enc = Base64Encoder::new();
        let mut encoded = enc.encode(b"hello");
        encoded.extend(enc.finish());

        let mut dec = Base64Filter::new();
        let mut decoded = dec.forward(&encoded).unwrap();
        decoded.extend(dec.finalize().unwrap());
        assert_eq!(decoded, b"hello");
    }

    #[test]
    fn base64_encoder_finish_on_empty_input_yields_nothing() {
        let mut enc = Base64Encoder::new();
        assert!(enc.finish().is_empty());
    }

    #[test]
    fn chain_of_one_filter_forwards_through_recursion() {
        let mut chain: Vec<Box<dyn FilterUnit>> = vec![Box::new(Base64Filter::new())];
        let mut out = futures::executor::block_on(forward_chain(&mut chain, 0, b"aGVsbG8=".to_vec())).unwrap();
        out.extend(futures::executor::block_on(finalize_chain(&mut chain, 0)).unwrap());
        assert_eq!(out, b"hello");
    }
}
