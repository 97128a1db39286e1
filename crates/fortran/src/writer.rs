//! Write operations for sequential unformatted records

// standard library
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// crate modules
use crate::error::Result;

/// Builds a byte buffer of Fortran sequential unformatted records
///
/// Every call appends one complete record, i.e. the payload bracketed by its
/// 4-byte length marker on both sides. Values are written little-endian to
/// match the readers.
///
/// ```rust
/// # use amrtools_fortran::RecordWriter;
/// let mut writer = RecordWriter::new();
/// writer.write_i32s(&[1, 2]).write_f64s(&[0.5]);
///
/// // (4 + 8 + 4) + (4 + 8 + 4)
/// assert_eq!(writer.len(), 32);
/// ```
#[derive(Debug, Default, Clone)]
pub struct RecordWriter {
    buffer: Vec<u8>,
}

impl RecordWriter {
    /// Empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record of 32-bit integers
    pub fn write_i32s(&mut self, values: &[i32]) -> &mut Self {
        let payload: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.write_bytes(&payload)
    }

    /// Append one record of 64-bit floats
    pub fn write_f64s(&mut self, values: &[f64]) -> &mut Self {
        let payload: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.write_bytes(&payload)
    }

    /// Append one record of raw bytes, e.g. a character string
    pub fn write_bytes(&mut self, payload: &[u8]) -> &mut Self {
        let marker = (payload.len() as i32).to_le_bytes();
        self.buffer.extend_from_slice(&marker);
        self.buffer.extend_from_slice(payload);
        self.buffer.extend_from_slice(&marker);
        self
    }

    /// Total number of bytes written so far
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True if nothing has been written
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Borrow the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Give up the raw bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Write everything to a file at `path`
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(&self.buffer)?;
        writer.flush()?;
        Ok(())
    }
}
