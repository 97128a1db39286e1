//! Offset-based read operations for sequential unformatted files
//!
//! All values are decoded as little-endian, which is what the simulation
//! codes write on every platform they are run on in practice.

// standard library
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

// crate modules
use crate::cursor::RecordCursor;
use crate::error::{Error, Result};
use crate::format::{Format, Kind, Values};

// external crates
use serde::de::DeserializeOwned;

/// Read the full content of a binary file into memory
///
/// The snapshot readers work on whole buffers so that any record can be
/// reached by offset without seeking.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Unpack values described by `format` at the `cursor` position
///
/// ```rust
/// # use amrtools_fortran::{read, Format, RecordCursor, RecordWriter, Values};
/// let mut writer = RecordWriter::new();
/// writer.write_i32s(&[4]).write_i32s(&[1, 2, 3]);
/// let buffer = writer.into_bytes();
///
/// // one record of one integer precedes the array
/// let cursor = RecordCursor { ninteg: 1, nlines: 1, ..Default::default() };
/// let values = read(&buffer, &"3i".parse().unwrap(), &cursor).unwrap();
/// assert_eq!(values, Values::Int(vec![1, 2, 3]));
/// ```
pub fn read(buffer: &[u8], format: &Format, cursor: &RecordCursor) -> Result<Values> {
    read_with_correction(buffer, format, cursor, 0)
}

/// Same as [read()] with the offset shifted by `correction` bytes
///
/// Useful for irregular headers. For example, a correction of `-4` lands on
/// the leading length marker of the current record rather than its payload.
pub fn read_with_correction(
    buffer: &[u8],
    format: &Format,
    cursor: &RecordCursor,
    correction: i64,
) -> Result<Values> {
    let offset = cursor.offset() as i64 + correction;
    let bytes = slice_at(buffer, offset, format.byte_length())?;

    Ok(match format.kind {
        Kind::Int32 => Values::Int(decode_i32s(bytes)),
        Kind::Float64 => Values::Float(decode_f64s(bytes)),
    })
}

/// Read `count` 32-bit integers at the cursor position
pub fn read_i32s(buffer: &[u8], cursor: &RecordCursor, count: usize) -> Result<Vec<i32>> {
    let format = Format::ints(count);
    let bytes = slice_at(buffer, cursor.offset() as i64, format.byte_length())?;
    Ok(decode_i32s(bytes))
}

/// Read `count` 64-bit floats at the cursor position
pub fn read_f64s(buffer: &[u8], cursor: &RecordCursor, count: usize) -> Result<Vec<f64>> {
    let format = Format::floats(count);
    let bytes = slice_at(buffer, cursor.offset() as i64, format.byte_length())?;
    Ok(decode_f64s(bytes))
}

/// Read a single 32-bit integer at the cursor position
pub fn read_i32(buffer: &[u8], cursor: &RecordCursor) -> Result<i32> {
    Ok(read_i32s(buffer, cursor, 1)?[0])
}

/// Read a single 64-bit float at the cursor position
pub fn read_f64(buffer: &[u8], cursor: &RecordCursor) -> Result<f64> {
    Ok(read_f64s(buffer, cursor, 1)?[0])
}

/// Byte length stored in the leading marker of the current record
///
/// ```rust
/// # use amrtools_fortran::{read_record_length, RecordCursor, RecordWriter};
/// let mut writer = RecordWriter::new();
/// writer.write_f64s(&[1.0, 2.0]);
/// let buffer = writer.into_bytes();
/// assert_eq!(read_record_length(&buffer, &RecordCursor::new()).unwrap(), 16);
/// ```
pub fn read_record_length(buffer: &[u8], cursor: &RecordCursor) -> Result<usize> {
    let marker = slice_at(buffer, cursor.offset() as i64 - 4, 4)?;
    let length = decode_i32s(marker)[0];
    usize::try_from(length).map_err(|_| Error::UnexpectedByteLength {
        expected: 0,
        found: length as i64,
    })
}

/// Deserialise a fixed-layout record payload into `T`
///
/// The leading length marker must equal `expected_bytes`, otherwise the
/// layout does not match and nothing is decoded.
pub fn read_struct<T: DeserializeOwned>(
    buffer: &[u8],
    cursor: &RecordCursor,
    expected_bytes: usize,
) -> Result<T> {
    let found = read_record_length(buffer, cursor)?;
    if found != expected_bytes {
        return Err(Error::UnexpectedByteLength {
            expected: expected_bytes as i64,
            found: found as i64,
        });
    }

    let bytes = slice_at(buffer, cursor.offset() as i64, expected_bytes)?;
    Ok(bincode::deserialize(bytes)?)
}

/// Bounds checked slice of `length` bytes from `offset`
fn slice_at(buffer: &[u8], offset: i64, length: usize) -> Result<&[u8]> {
    let out_of_bounds = || Error::OutOfBounds {
        offset,
        length,
        available: buffer.len(),
    };

    let start = usize::try_from(offset).map_err(|_| out_of_bounds())?;
    let end = start.checked_add(length).ok_or_else(out_of_bounds)?;
    buffer.get(start..end).ok_or_else(out_of_bounds)
}

fn decode_i32s(bytes: &[u8]) -> Vec<i32> {
    bytes
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn decode_f64s(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect()
}
