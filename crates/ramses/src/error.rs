//! Result and Error types for the RAMSES reader

// standard library
use std::path::PathBuf;

/// Type alias for `Result<T, ramses::Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `amrtools-ramses` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed input/output stream")]
    IOError(#[from] std::io::Error),

    #[error("failed to read binary records")]
    FortranError(#[from] amrtools_fortran::Error),

    #[error("failed CSV operation")]
    CsvError(#[from] csv::Error),

    #[error("failed serde JSON operation")]
    JsonError(#[from] serde_json::Error),

    #[error("failed slice operation: {0}")]
    SliceError(#[from] amrtools_utils::Error),

    #[error("info file not found: {0:?}")]
    InfoNotFound(PathBuf),

    #[error("no output directories found in {0:?}")]
    OutputNotFound(PathBuf),

    #[error("key \"{0}\" not found in run metadata")]
    MissingKey(String),

    #[error("key \"{key}\" is not a {expected}")]
    UnexpectedValueType { key: String, expected: String },

    #[error("bad center \"{0}\"")]
    BadCenter(String),

    #[error("sink \"{0}\" not found")]
    SinkNotFound(String),

    #[error("field \"{0}\" not found")]
    FieldNotFound(String),

    #[error("selection \"{0}\" matches no cells")]
    EmptySelection(String),

    #[error("unknown length scale \"{0}\"")]
    UnknownScale(String),

    #[error("parser failed")]
    ParseError(String),

    #[error("inconsistent field lengths (expected {expected:?}, found {found:?})")]
    LengthMismatch { expected: usize, found: usize },
}
