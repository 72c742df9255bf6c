// Transition model and the little-endian integer packing shared by the
// node encoder and decoder.

use crate::{FstError, Result};

/// Byte offset of an encoded node record within the compiled FST.
pub type StateAddress = u64;

/// A labelled, output-carrying edge to an already compiled state.
///
/// Transitions of one state are kept in strictly increasing `label` order.
/// `output` is the increment contributed to a key's value when the edge is
/// taken; values are the sum of all outputs along the accepted path plus the
/// final output of the last state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub label: u8,
    pub output: u64,
    pub dest: StateAddress,
}

/// Largest output value representable in `width` bytes.
#[inline]
pub fn max_output(width: u8) -> u64 {
    match width {
        0 => 0,
        8.. => u64::MAX,
        w => (1u64 << (u32::from(w) * 8)) - 1,
    }
}

/// Number of bytes needed to store `n` (0 needs zero bytes).
#[inline]
pub fn bytes_needed(n: u64) -> u8 {
    ((u64::BITS - n.leading_zeros()).div_ceil(8)) as u8
}

/// Sum two outputs read from encoded data. A well-formed FST never
/// overflows, since every path sums to an inserted `u64` value.
#[inline]
pub fn add_outputs(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b)
        .ok_or_else(|| FstError::CorruptFormat("output sum overflows u64".to_string()))
}

/// Append the low `width` bytes of `n` to `buf`, little-endian.
///
/// The caller guarantees that `n` fits in `width` bytes.
#[inline]
pub fn pack_uint(buf: &mut Vec<u8>, n: u64, width: u8) {
    debug_assert!(n <= max_output(width), "{n} does not fit in {width} bytes");
    buf.extend_from_slice(&n.to_le_bytes()[..width as usize]);
}

/// Read a `width`-byte little-endian integer from the start of `data`.
///
/// `data` must hold at least `width` bytes.
#[inline]
pub fn unpack_uint(data: &[u8], width: u8) -> u64 {
    let mut raw = [0u8; 8];
    raw[..width as usize].copy_from_slice(&data[..width as usize]);
    u64::from_le_bytes(raw)
}

/// Append `n` as an unsigned LEB128 varint.
pub fn pack_uvarint(buf: &mut Vec<u8>, mut n: u64) {
    while n >= 0x80 {
        buf.push((n as u8) | 0x80);
        n >>= 7;
    }
    buf.push(n as u8);
}

/// Decode an unsigned LEB128 varint from the start of `data`.
///
/// Returns the value and the number of bytes consumed.
pub fn unpack_uvarint(data: &[u8]) -> Result<(u64, usize)> {
    let mut value = 0u64;
    for (i, &byte) in data.iter().enumerate().take(10) {
        let bits = u64::from(byte & 0x7F);
        if i == 9 && byte > 1 {
            return Err(FstError::CorruptFormat("varint overflows u64".to_string()));
        }
        value |= bits << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(FstError::CorruptFormat("truncated varint".to_string()))
}
