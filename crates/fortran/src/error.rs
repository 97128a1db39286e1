//! Result and Error types for the fortran module

/// Type alias for `Result<T, fortran::Error>`
pub type Result<T> = core::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
/// The error type for `amrtools-fortran`
pub enum Error {
    /// Underlying file I/O error
    #[error("failure in file I/O")]
    IOError(#[from] std::io::Error),

    /// Failure to deserialise a byte stream
    #[error("failed to deserialise byte stream")]
    UnableToDeserialise(#[from] Box<bincode::ErrorKind>),

    /// Computed slice does not fit in the buffer, usually a layout mismatch
    #[error("read of {length} bytes at offset {offset} exceeds buffer of {available} bytes")]
    OutOfBounds {
        offset: i64,
        length: usize,
        available: usize,
    },

    /// Record length marker does not match the payload size expected
    #[error("unexpected byte length (expected {expected:?}, found {found:?})")]
    UnexpectedByteLength { expected: i64, found: i64 },

    /// Format specifier could not be understood, e.g. "3x"
    #[error("invalid format specifier \"{0}\"")]
    InvalidFormat(String),
}
