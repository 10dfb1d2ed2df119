//! Tests for recovery-by-truncation
//!
//! These tests verify:
//! - Clean reopen of an empty or well-formed log
//! - Truncation of partially-written trailing records
//! - Fatal rejection when a committed record is corrupted
//! - That nothing past a corruption point is ever returned

use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use meridiandb::config::FlushPolicy;
use meridiandb::error::MeridianError;
use meridiandb::wal::Wal;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.log");
    (temp_dir, wal_path)
}

/// Produce a well-formed log with `count` records
fn write_records(path: &PathBuf, count: usize) {
    let wal = Wal::create(path, FlushPolicy::Sync).unwrap();
    for i in 0..count {
        wal.append(format!("record-{}", i).into_bytes().as_slice())
            .unwrap();
    }
    wal.close().unwrap();
}

fn count_records(path: &PathBuf) -> usize {
    let wal = Wal::open(path, FlushPolicy::Sync).unwrap();
    let mut count = 0;
    while wal.next().is_some() {
        count += 1;
    }
    count
}

/// Append raw bytes past the committed end, as a crash mid-append would
/// leave them (header checksum not updated)
fn append_garbage(path: &PathBuf, garbage: &[u8]) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(garbage).unwrap();
    file.sync_all().unwrap();
}

/// Flip one bit at an absolute file offset
fn flip_bit(path: &PathBuf, offset: u64) {
    let mut file = OpenOptions::new().read(true).write(true).open(path).unwrap();
    let mut byte = [0u8; 1];
    file.seek(SeekFrom::Start(offset)).unwrap();
    file.read_exact(&mut byte).unwrap();
    byte[0] ^= 0x01;
    file.seek(SeekFrom::Start(offset)).unwrap();
    file.write_all(&byte).unwrap();
    file.sync_all().unwrap();
}

// =============================================================================
// Clean Reopen Tests
// =============================================================================

#[test]
fn test_reopen_empty_log() {
    let (_temp, wal_path) = setup_temp_wal();
    write_records(&wal_path, 0);

    let wal = Wal::open(&wal_path, FlushPolicy::Sync).unwrap();
    assert_eq!(wal.next(), None);
}

#[test]
fn test_reopen_clean_log_keeps_every_record() {
    let (_temp, wal_path) = setup_temp_wal();
    write_records(&wal_path, 10);

    assert_eq!(count_records(&wal_path), 10);
}

#[test]
fn test_open_rejects_file_shorter_than_header() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(&wal_path, [0u8, 0]).unwrap();

    let err = Wal::open(&wal_path, FlushPolicy::Sync).unwrap_err();
    assert!(matches!(err, MeridianError::CorruptLog { .. }));
}

// =============================================================================
// Partial-Write Truncation Tests
// =============================================================================

#[test]
fn test_truncates_partial_record_header() {
    let (_temp, wal_path) = setup_temp_wal();
    write_records(&wal_path, 3);
    let clean_len = fs::metadata(&wal_path).unwrap().len();

    // only 3 of the 8 record-header bytes made it out
    append_garbage(&wal_path, &[0x00, 0x00, 0x00]);

    assert_eq!(count_records(&wal_path), 3);
    assert_eq!(
        fs::metadata(&wal_path).unwrap().len(),
        clean_len,
        "the partial tail must be physically truncated"
    );
}

#[test]
fn test_truncates_record_with_length_past_eof() {
    let (_temp, wal_path) = setup_temp_wal();
    write_records(&wal_path, 3);
    let clean_len = fs::metadata(&wal_path).unwrap().len();

    // structurally complete header declaring 100 payload bytes, none present
    let mut garbage = Vec::new();
    garbage.extend_from_slice(&100u32.to_be_bytes());
    garbage.extend_from_slice(&0xDEAD_BEEFu32.to_be_bytes());
    garbage.extend_from_slice(b"short");
    append_garbage(&wal_path, &garbage);

    assert_eq!(count_records(&wal_path), 3);
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), clean_len);
}

#[test]
fn test_truncates_uncommitted_record_with_bad_checksum() {
    let (_temp, wal_path) = setup_temp_wal();
    write_records(&wal_path, 2);
    let clean_len = fs::metadata(&wal_path).unwrap().len();

    // structurally valid record whose checksum field is wrong; the file
    // header never committed it, so reopen truncates instead of failing
    let payload = b"ghost";
    let mut garbage = Vec::new();
    garbage.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    garbage.extend_from_slice(&0u32.to_be_bytes());
    garbage.extend_from_slice(payload);
    append_garbage(&wal_path, &garbage);

    assert_eq!(count_records(&wal_path), 2);
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), clean_len);
}

#[test]
fn test_truncation_is_idempotent() {
    let (_temp, wal_path) = setup_temp_wal();
    write_records(&wal_path, 5);

    append_garbage(&wal_path, &[0xFF; 6]);
    assert_eq!(count_records(&wal_path), 5);

    // a second crash-and-reopen cycle changes nothing
    append_garbage(&wal_path, &[0xFF; 6]);
    assert_eq!(count_records(&wal_path), 5);
    assert_eq!(count_records(&wal_path), 5);
}

#[test]
fn test_append_after_truncating_recovery() {
    let (_temp, wal_path) = setup_temp_wal();
    write_records(&wal_path, 2);
    append_garbage(&wal_path, &[0xAB, 0xCD]);

    let wal = Wal::open(&wal_path, FlushPolicy::Sync).unwrap();
    wal.append(b"post-recovery").unwrap();
    wal.close().unwrap();

    let wal = Wal::open(&wal_path, FlushPolicy::Sync).unwrap();
    let mut payloads = Vec::new();
    while let Some(p) = wal.next() {
        payloads.push(p);
    }
    assert_eq!(
        payloads,
        vec![
            b"record-0".to_vec(),
            b"record-1".to_vec(),
            b"post-recovery".to_vec(),
        ]
    );
}

// =============================================================================
// Corruption Rejection Tests
// =============================================================================

#[test]
fn test_bit_flip_in_committed_payload_fails_recovery() {
    let (_temp, wal_path) = setup_temp_wal();
    write_records(&wal_path, 3);

    // a byte inside the first record's payload (4 header + 8 record header)
    flip_bit(&wal_path, 4 + 8 + 2);

    let err = Wal::open(&wal_path, FlushPolicy::Sync).unwrap_err();
    assert!(matches!(err, MeridianError::CorruptLog { .. }));
}

#[test]
fn test_bit_flip_in_record_checksum_fails_recovery() {
    let (_temp, wal_path) = setup_temp_wal();
    write_records(&wal_path, 3);

    // the checksum field of the first record
    flip_bit(&wal_path, 4 + 4);

    let err = Wal::open(&wal_path, FlushPolicy::Sync).unwrap_err();
    assert!(matches!(err, MeridianError::CorruptLog { .. }));
}

#[test]
fn test_bit_flip_in_file_header_fails_recovery() {
    let (_temp, wal_path) = setup_temp_wal();
    write_records(&wal_path, 1);

    flip_bit(&wal_path, 0);

    let err = Wal::open(&wal_path, FlushPolicy::Sync).unwrap_err();
    assert!(matches!(err, MeridianError::CorruptLog { .. }));
}

#[test]
fn test_no_record_past_corruption_is_returned() {
    let (_temp, wal_path) = setup_temp_wal();

    // two committed records, then corrupt the second one's payload:
    // read-time iteration must stop before it, without error
    let wal = Wal::create(&wal_path, FlushPolicy::Sync).unwrap();
    wal.append(b"good").unwrap();
    wal.append(b"soon-bad").unwrap();

    let second_payload_at = 4 + (8 + 4) as u64 + 8;
    flip_bit(&wal_path, second_payload_at);

    assert_eq!(wal.next().as_deref(), Some(&b"good"[..]));
    assert_eq!(wal.next(), None, "iteration stops at the corrupt record");
}
