//! Module for reading Fortran sequential unformatted records by offset
//!
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod cursor;
mod error;
mod format;
mod reader;
mod writer;

// Inline anything important for a nice public API
#[doc(inline)]
pub use cursor::RecordCursor;

#[doc(inline)]
pub use format::{Format, Kind, Values};

#[doc(inline)]
pub use reader::{
    read, read_f64, read_f64s, read_file, read_i32, read_i32s, read_record_length, read_struct,
    read_with_correction,
};

#[doc(inline)]
pub use writer::RecordWriter;

#[doc(inline)]
pub use error::{Error, Result};
