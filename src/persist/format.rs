//! Snapshot codec
//!
//! Pure encode/decode of the snapshot text format over `Write` / `BufRead`.
//! File handling, locking and the atomic swap live in the persistor.

use std::collections::HashMap;
use std::fmt::Display;
use std::io::{self, BufRead, Write};

use crate::entry::IndexValue;
use crate::error::{IndexError, Result};
use crate::key::KeyFactory;

use super::{END_OFFSET_SENTINEL, SNAPSHOT_VERSION};

/// Decoded contents of a snapshot
#[derive(Debug, Clone)]
pub struct Snapshot<K> {
    pub version: i16,
    pub entries: HashMap<K, IndexValue>,
    pub end_offset: u64,
}

// =============================================================================
// Encoding
// =============================================================================

pub fn write_version<W: Write>(writer: &mut W) -> io::Result<()> {
    writeln!(writer, "{}", SNAPSHOT_VERSION)
}

/// Serialized form of `key`, if it survives a round trip through an entry line
///
/// The reader splits lines on whitespace, so the key must be a single
/// non-empty field.
pub fn check_key<K: Display>(key: &K) -> Result<String> {
    let text = key.to_string();
    if text.is_empty() || text.contains(char::is_whitespace) {
        return Err(IndexError::UnwritableKey(text));
    }
    Ok(text)
}

/// Field order: key offset size flags ttl
pub fn write_entry<W: Write, K: Display>(
    writer: &mut W,
    key: &K,
    value: &IndexValue,
) -> Result<()> {
    let key = check_key(key)?;
    writeln!(
        writer,
        "{} {} {} {} {}",
        key, value.offset, value.size, value.flags as i8, value.time_to_live
    )?;
    Ok(())
}

pub fn write_end_offset<W: Write>(writer: &mut W, end_offset: u64) -> io::Result<()> {
    writeln!(writer, "{} {}", END_OFFSET_SENTINEL, end_offset)
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a snapshot, dispatching on its version tag
pub fn read_snapshot<R, F>(reader: R, factory: &F) -> Result<Snapshot<F::Key>>
where
    R: BufRead,
    F: KeyFactory,
{
    let mut lines = reader.lines().enumerate().map(|(i, line)| (i + 1, line));

    let (line_no, first) = match lines.next() {
        Some((n, line)) => (n, read_line(n, line)?),
        None => return Err(IndexError::EmptySnapshot),
    };
    let version: i16 = first.trim().parse().map_err(|_| IndexError::Malformed {
        line: line_no,
        reason: format!("invalid version tag {:?}", first),
    })?;

    match version {
        0 => read_v0(lines, factory),
        other => Err(IndexError::UnsupportedVersion(other)),
    }
}

fn read_v0<I, F>(lines: I, factory: &F) -> Result<Snapshot<F::Key>>
where
    I: Iterator<Item = (usize, io::Result<String>)>,
    F: KeyFactory,
{
    let mut entries = HashMap::new();
    let mut last_line = None;

    for (line_no, line) in lines {
        let line = read_line(line_no, line)?;
        last_line = Some(line_no);
        let fields: Vec<&str> = line.split_whitespace().collect();

        match fields.as_slice() {
            [tag, offset] if *tag == END_OFFSET_SENTINEL => {
                let end_offset = parse_field(line_no, "end offset", offset)?;
                tracing::trace!(end_offset, "Read snapshot end offset");
                return Ok(Snapshot {
                    version: 0,
                    entries,
                    end_offset,
                });
            }
            [key, offset, size, flags, ttl] => {
                let key = factory
                    .parse_key(key)
                    .map_err(|e| IndexError::Malformed {
                        line: line_no,
                        reason: e.to_string(),
                    })?;
                let offset: u64 = parse_field(line_no, "offset", offset)?;
                let size: u64 = parse_field(line_no, "size", size)?;
                let flags: i8 = parse_field(line_no, "flags", flags)?;
                let time_to_live: i64 = parse_field(line_no, "ttl", ttl)?;

                tracing::trace!(
                    key = %key,
                    size,
                    offset,
                    flags,
                    time_to_live,
                    "Read snapshot entry"
                );
                entries.insert(key, IndexValue::new(size, offset, flags as u8, time_to_live));
            }
            _ => {
                return Err(IndexError::Malformed {
                    line: line_no,
                    reason: format!("unexpected line {:?}", line),
                })
            }
        }
    }

    let Some(last_line) = last_line else {
        return Err(IndexError::EmptySnapshot);
    };
    Err(IndexError::Malformed {
        line: last_line,
        reason: format!("missing {} line", END_OFFSET_SENTINEL),
    })
}

/// Invalid UTF-8 is a malformed file, anything else is real I/O
fn read_line(line_no: usize, line: io::Result<String>) -> Result<String> {
    line.map_err(|e| match e.kind() {
        io::ErrorKind::InvalidData => IndexError::Malformed {
            line: line_no,
            reason: e.to_string(),
        },
        _ => IndexError::Io(e),
    })
}

fn parse_field<T: std::str::FromStr>(line_no: usize, name: &str, raw: &str) -> Result<T> {
    raw.parse().map_err(|_| IndexError::Malformed {
        line: line_no,
        reason: format!("invalid {} {:?}", name, raw),
    })
}
