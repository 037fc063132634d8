//! Tests for the snapshot codec
//!
//! These tests verify:
//! - Line encoding for entries and the sentinel
//! - Version dispatch
//! - Every malformed-line shape is rejected rather than misparsed

use std::io::Cursor;

use blobindex::entry::TTL_INFINITE;
use blobindex::persist::format::{check_key, write_end_offset, write_entry, write_version};
use blobindex::persist::{read_snapshot, END_OFFSET_SENTINEL, SNAPSHOT_VERSION};
use blobindex::{BlobId, BlobIdFactory, IndexError, IndexValue};

// =============================================================================
// Helper Functions
// =============================================================================

fn decode(text: &str) -> blobindex::Result<blobindex::persist::Snapshot<BlobId>> {
    read_snapshot(Cursor::new(text.as_bytes()), &BlobIdFactory)
}

fn key(id: &str) -> BlobId {
    BlobId::new(id).unwrap()
}

fn assert_malformed(text: &str, expected_line: usize) {
    match decode(text) {
        Err(IndexError::Malformed { line, .. }) => assert_eq!(line, expected_line, "{:?}", text),
        other => panic!("expected malformed for {:?}, got {:?}", text, other),
    }
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_snapshot() {
    let mut buf = Vec::new();
    write_version(&mut buf).unwrap();
    write_entry(&mut buf, &key("blob-1"), &IndexValue::new(100, 0, 0, TTL_INFINITE)).unwrap();
    write_entry(&mut buf, &key("blob-2"), &IndexValue::new(50, 100, 1, 99)).unwrap();
    write_end_offset(&mut buf, 150).unwrap();

    assert_eq!(
        String::from_utf8(buf).unwrap(),
        "0\nblob-1 0 100 0 -1\nblob-2 100 50 1 99\nfileendpointer 150\n"
    );
}

#[test]
fn test_encode_rejects_unsplittable_keys() {
    let value = IndexValue::new(10, 0, 0, TTL_INFINITE);

    for bad in ["", "a b", "tab\there", "line\nbreak"] {
        let mut buf = Vec::new();
        let result = write_entry(&mut buf, &bad.to_string(), &value);
        assert!(matches!(result, Err(IndexError::UnwritableKey(_))), "{:?}", bad);
        assert!(buf.is_empty(), "{:?}", bad);
    }
    assert_eq!(check_key(&"blob-1".to_string()).unwrap(), "blob-1");
}

#[test]
fn test_constants() {
    assert_eq!(SNAPSHOT_VERSION, 0);
    assert_eq!(END_OFFSET_SENTINEL, "fileendpointer");
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_decode_snapshot() {
    let snapshot = decode("0\nk1 0 100 0 -1\nk2 100 50 1 -1\nfileendpointer 150\n").unwrap();

    assert_eq!(snapshot.version, 0);
    assert_eq!(snapshot.end_offset, 150);
    assert_eq!(snapshot.entries.len(), 2);
    assert_eq!(
        snapshot.entries.get(&key("k2")),
        Some(&IndexValue::new(50, 100, 1, TTL_INFINITE))
    );
}

#[test]
fn test_decode_sentinel_without_trailing_newline() {
    let snapshot = decode("0\nk1 0 100 0 -1\nfileendpointer 100").unwrap();

    assert_eq!(snapshot.end_offset, 100);
}

#[test]
fn test_decode_tolerates_extra_whitespace() {
    let snapshot = decode("0\nk1\t0   100 0  -1\n  fileendpointer   100  \n").unwrap();

    assert_eq!(snapshot.entries.len(), 1);
    assert_eq!(snapshot.end_offset, 100);
}

#[test]
fn test_decode_stops_at_sentinel() {
    let snapshot = decode("0\nk1 0 10 0 -1\nfileendpointer 10\nthis line is ignored\n").unwrap();

    assert_eq!(snapshot.entries.len(), 1);
    assert_eq!(snapshot.end_offset, 10);
}

#[test]
fn test_decode_empty_input() {
    assert!(matches!(decode(""), Err(IndexError::EmptySnapshot)));
}

#[test]
fn test_decode_version_only() {
    assert!(matches!(decode("0\n"), Err(IndexError::EmptySnapshot)));
}

#[test]
fn test_decode_unsupported_versions() {
    for version in ["1", "2", "-1", "32767"] {
        let text = format!("{}\nfileendpointer 0\n", version);
        assert!(matches!(decode(&text), Err(IndexError::UnsupportedVersion(_))));
    }
}

#[test]
fn test_decode_invalid_version_tag() {
    assert_malformed("zero\nfileendpointer 0\n", 1);
    assert_malformed("70000\nfileendpointer 0\n", 1);
}

#[test]
fn test_decode_malformed_entry_lines() {
    // Too few fields (truncated mid-line)
    assert_malformed("0\nk1 0 100\n", 2);
    // Too many fields
    assert_malformed("0\nk1 0 100 0 -1 extra\nfileendpointer 100\n", 2);
    // Non-numeric offset
    assert_malformed("0\nk1 x 100 0 -1\nfileendpointer 100\n", 2);
    // Negative size
    assert_malformed("0\nk1 0 -5 0 -1\nfileendpointer 100\n", 2);
    // Flags outside int8
    assert_malformed("0\nk1 0 100 300 -1\nfileendpointer 100\n", 2);
    // Truncated ttl
    assert_malformed("0\nk1 0 100 0 -\n", 2);
    // Blank line
    assert_malformed("0\n\nfileendpointer 0\n", 2);
}

#[test]
fn test_decode_malformed_sentinel() {
    assert_malformed("0\nk1 0 100 0 -1\nfileendpointer\n", 3);
    assert_malformed("0\nk1 0 100 0 -1\nfileendpointer abc\n", 3);
    assert_malformed("0\nk1 0 100 0 -1\nendpointer 100\n", 3);
}

#[test]
fn test_decode_missing_sentinel() {
    assert_malformed("0\nk1 0 100 0 -1\nk2 100 100 0 -1\n", 3);
}

#[test]
fn test_decode_invalid_key() {
    assert_malformed("0\nk/1 0 100 0 -1\nfileendpointer 100\n", 2);
}

#[test]
fn test_decode_invalid_utf8() {
    let bytes: &[u8] = b"0\nk1 0 100 0 -1\n\xff\xfe 1 2 3 4\nfileendpointer 100\n";

    let result = read_snapshot(Cursor::new(bytes), &BlobIdFactory);

    assert!(matches!(result, Err(IndexError::Malformed { line: 3, .. })));
}
