//! WAL record format
//!
//! Wrapping and parsing of individual log records, and the seeded
//! checksum shared by records and the file header.

use bytes::{BufMut, BytesMut};

/// Multiplier for the running checksum fold
pub const SEED: u32 = 13331;

/// Size of the file header: one u32 file checksum
pub const FILE_HEADER_SIZE: u64 = 4;

/// Size of a record header: u32 length + u32 payload checksum
pub const RECORD_HEADER_SIZE: u64 = 8;

/// Byte offset of the length field within a record
pub(super) const OF_LEN: usize = 0;

/// Byte offset of the checksum field within a record
pub(super) const OF_CHECKSUM: usize = 4;

/// Byte offset of the payload within a record
pub(super) const OF_PAYLOAD: usize = 8;

/// Fold `data` into a running checksum
///
/// `acc = acc * SEED + byte`, wrapping. Chaining calls with the previous
/// result as `base` accumulates over concatenated inputs, which is how
/// the file header folds whole records.
pub fn checksum(base: u32, data: &[u8]) -> u32 {
    let mut acc = base;
    for &b in data {
        acc = acc.wrapping_mul(SEED).wrapping_add(u32::from(b));
    }
    acc
}

/// Wrap a payload as a full on-disk record: `len | checksum | payload`
pub(super) fn wrap(payload: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(OF_PAYLOAD + payload.len());
    buf.put_u32(payload.len() as u32);
    buf.put_u32(checksum(0, payload));
    buf.put_slice(payload);
    buf
}

/// Parse the two header fields of a record
///
/// `header` must hold at least [`RECORD_HEADER_SIZE`] bytes.
pub(super) fn parse_header(header: &[u8]) -> (u32, u32) {
    let len = u32::from_be_bytes([
        header[OF_LEN],
        header[OF_LEN + 1],
        header[OF_LEN + 2],
        header[OF_LEN + 3],
    ]);
    let stored = u32::from_be_bytes([
        header[OF_CHECKSUM],
        header[OF_CHECKSUM + 1],
        header[OF_CHECKSUM + 2],
        header[OF_CHECKSUM + 3],
    ]);
    (len, stored)
}
