//! Byte codec
//!
//! Fixed-width big-endian encode/decode for 16/32/64-bit integers,
//! length-prefixed strings, a base-128 varint, and the deterministic
//! string-to-id hash used to key cached index nodes.
//!
//! All functions are pure and perform no I/O. Decoders never read past
//! the provided slice; short input is a [`MeridianError::Codec`] error.

use crate::error::{MeridianError, Result};

/// Maximum encoded length of a varint-encoded u64 (10 groups of 7 bits)
pub const MAX_VARINT_LEN: usize = 10;

/// Seed shared by the record checksum and the key-uid hash
pub(crate) const HASH_SEED: u64 = 13331;

// =============================================================================
// Fixed-Width Integers (big-endian)
// =============================================================================

/// Encode a u16 as 2 big-endian bytes
pub fn encode_u16(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}

/// Decode a big-endian u16 from the start of `buf`
pub fn decode_u16(buf: &[u8]) -> Result<u16> {
    let bytes = take_prefix::<2>(buf, "u16")?;
    Ok(u16::from_be_bytes(bytes))
}

/// Encode a u32 as 4 big-endian bytes
pub fn encode_u32(value: u32) -> [u8; 4] {
    value.to_be_bytes()
}

/// Decode a big-endian u32 from the start of `buf`
pub fn decode_u32(buf: &[u8]) -> Result<u32> {
    let bytes = take_prefix::<4>(buf, "u32")?;
    Ok(u32::from_be_bytes(bytes))
}

/// Encode a u64 as 8 big-endian bytes
pub fn encode_u64(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Decode a big-endian u64 from the start of `buf`
pub fn decode_u64(buf: &[u8]) -> Result<u64> {
    let bytes = take_prefix::<8>(buf, "u64")?;
    Ok(u64::from_be_bytes(bytes))
}

fn take_prefix<const N: usize>(buf: &[u8], what: &str) -> Result<[u8; N]> {
    if buf.len() < N {
        return Err(MeridianError::Codec(format!(
            "{}: expected {} bytes, got {}",
            what,
            N,
            buf.len()
        )));
    }
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(&buf[..N]);
    Ok(bytes)
}

// =============================================================================
// Length-Prefixed Strings
// =============================================================================

/// Encode a string as a u32 length prefix followed by its UTF-8 bytes
pub fn encode_string(value: &str) -> Vec<u8> {
    let raw = value.as_bytes();
    let mut out = Vec::with_capacity(4 + raw.len());
    out.extend_from_slice(&(raw.len() as u32).to_be_bytes());
    out.extend_from_slice(raw);
    out
}

/// Decode a length-prefixed string from the start of `buf`
///
/// Returns the string and the number of bytes consumed (prefix included).
pub fn decode_string(buf: &[u8]) -> Result<(String, usize)> {
    let len = decode_u32(buf)? as usize;
    if buf.len() < 4 + len {
        return Err(MeridianError::Codec(format!(
            "string: declared {} bytes, only {} available",
            len,
            buf.len() - 4
        )));
    }
    let value = std::str::from_utf8(&buf[4..4 + len])
        .map_err(|e| MeridianError::Codec(format!("string: invalid UTF-8: {}", e)))?
        .to_string();
    Ok((value, 4 + len))
}

// =============================================================================
// Variable-Length Integers
// =============================================================================

/// Encode a u64 as a base-128 varint, low 7-bit group first
///
/// Each byte carries 7 value bits; the high bit is set on every byte
/// except the last.
pub fn encode_varint(mut value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_VARINT_LEN);
    while value & !0x7F != 0 {
        out.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
    out
}

/// Decode a base-128 varint from the start of `buf`
///
/// Returns the value and the number of bytes consumed.
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift = 0u32;
    for (i, &b) in buf.iter().enumerate() {
        if i >= MAX_VARINT_LEN {
            break;
        }
        result |= u64::from(b & 0x7F) << shift;
        if b & 0x80 == 0 {
            return Ok((result, i + 1));
        }
        shift += 7;
    }
    Err(MeridianError::Codec(format!(
        "varint: no terminating byte within {} bytes",
        buf.len().min(MAX_VARINT_LEN)
    )))
}

// =============================================================================
// Key UID Hash
// =============================================================================

/// Deterministic 64-bit id for a logical key
///
/// Index and data managers key the node cache with this hash. Wrapping
/// multiplicative fold over the UTF-8 bytes, same seed as the log
/// checksum.
pub fn key_uid(key: &str) -> u64 {
    let mut uid: u64 = 0;
    for &b in key.as_bytes() {
        uid = uid.wrapping_mul(HASH_SEED).wrapping_add(u64::from(b));
    }
    uid
}
