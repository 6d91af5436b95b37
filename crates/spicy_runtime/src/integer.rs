//! Fixed-width integer unpacking, the runtime primitive a generated
//! parser calls for every `uintN`/`intN` parse-type field.
//!
//! Grounded on `original_source/hilti/toolchain/src/compiler/codegen/unpack.cc`,
//! whose `UnsignedInteger`/`SignedInteger` visitor cases lower to
//! `::hilti::rt::integer::unpack<uintN_t>(data, byte_order)`; this module
//! is that runtime-side counterpart rather than the codegen-side call
//! site (which lives in `spicy_codegen::field`).

use crate::failure::{Failure, Result};
use crate::stream::View;

/// Byte order a fixed-width integer is unpacked with. `Network` is always
/// big-endian; `Host` resolves to the target's native order at unpack
/// time (this implementation targets little-endian hosts, matching every
/// platform the toolchain's CI currently builds on).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ByteOrder {
    Big,
    Little,
    Network,
    Host,
}

impl ByteOrder {
    fn is_big_endian(self) -> bool {
        match self {
            ByteOrder::Big | ByteOrder::Network => true,
            ByteOrder::Little | ByteOrder::Host => false,
        }
    }
}

fn bytes_to_u64(bytes: &[u8], order: ByteOrder) -> u64 {
    let mut buf = [0u8; 8];
    let width = bytes.len();
    if order.is_big_endian() {
        buf[8 - width..].copy_from_slice(bytes);
        u64::from_be_bytes(buf)
    } else {
        buf[..width].copy_from_slice(bytes);
        u64::from_le_bytes(buf)
    }
}

/// Unpacks a `width`-byte unsigned integer from the front of `view`,
/// returning the value and the remaining view past the consumed bytes.
/// `width` must be 1, 2, 4 or 8 (the Spicy surface widths).
pub fn unpack_uint(view: &View, order: ByteOrder, width: usize) -> Result<(u64, View)> {
    if ![1, 2, 4, 8].contains(&width) {
        return Err(Failure::InvalidValue(format!("unsupported integer width {width}")));
    }
    if !view.has_available(width) {
        return Err(Failure::MissingData(format!("need {width} bytes to unpack an integer, have {}", view.len())));
    }
    let bytes = view.to_bytes();
    let value = bytes_to_u64(&bytes[..width], order);
    Ok((value, view.advance(width)?))
}

/// Unpacks a `width`-byte two's-complement signed integer, sign-extending
/// into an `i64`.
pub fn unpack_int(view: &View, order: ByteOrder, width: usize) -> Result<(i64, View)> {
    let (raw, rest) = unpack_uint(view, order, width)?;
    let shift = 64 - width * 8;
    let value = ((raw << shift) as i64) >> shift;
    Ok((value, rest))
}

/// Packs a `width`-byte unsigned integer the way a generated `&convert=`
/// or serialization path would; the inverse of [`unpack_uint`].
pub fn pack_uint(value: u64, order: ByteOrder, width: usize) -> Result<Vec<u8>> {
    if ![1, 2, 4, 8].contains(&width) {
        return Err(Failure::InvalidValue(format!("unsupported integer width {width}")));
    }
    let be = value.to_be_bytes();
    let le = value.to_le_bytes();
    Ok(if order.is_big_endian() { be[8 - width..].to_vec() } else { le[..width].to_vec() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::Stream;

    /// spec.md §8 scenario 1 "Integer unpack": `\x01\x02\x03\x04` as a
    /// big-endian `uint32` yields `0x01020304` with zero remaining bytes.
    #[test]
    fn big_endian_uint32_unpack_matches_scenario() {
        let s = Stream::new();
        s.append(vec![0x01, 0x02, 0x03, 0x04]).unwrap();
        let (value, rest) = unpack_uint(&s.view(), ByteOrder::Big, 4).unwrap();
        assert_eq!(value, 0x01020304);
        assert_eq!(rest.len(), 0);
    }

    #[test]
    fn little_endian_uint16_unpack() {
        let s = Stream::new();
        s.append(vec![0x34, 0x12]).unwrap();
        let (value, _) = unpack_uint(&s.view(), ByteOrder::Little, 2).unwrap();
        assert_eq!(value, 0x1234);
    }

    #[test]
    fn signed_byte_sign_extends() {
        let s = Stream::new();
        s.append(vec![0xFF]).unwrap();
        let (value, _) = unpack_int(&s.view(), ByteOrder::Big, 1).unwrap();
        assert_eq!(value, -1);
    }

    #[test]
    fn short_input_is_missing_data() {
        let s = Stream::new();
        s.append(vec![0x01, 0x02]).unwrap();
        assert!(matches!(unpack_uint(&s.view(), ByteOrder::Big, 4), Err(Failure::MissingData(_))));
    }

    #[test]
    fn pack_then_unpack_round_trips() {
        let packed = pack_uint(0xdead_beef, ByteOrder::Big, 4).unwrap();
        let s = Stream::new();
        s.append(packed).unwrap();
        let (value, _) = unpack_uint(&s.view(), ByteOrder::Big, 4).unwrap();
        assert_eq!(value, 0xdead_beef);
    }
}
