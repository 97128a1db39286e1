//! Reconstruction of leaf cells from RAMSES snapshot files
//!
//! All important types are re-exported to the crate root for easy access.
//!
//! # Quickstart
//!
//! The simplest way to read a snapshot is through the [Dataset](crate::Dataset)
//! convenience constructors:
//!
//! ```rust, no_run
//! # use amrtools_ramses::{Config, Dataset, LoadParams, Output};
//! // Read output_00012 in the current directory with default settings
//! let dataset = Dataset::load(LoadParams::new(Output::Number(12)), Config::default()).unwrap();
//!
//! // Only density, within a 500 au cube around the densest cell
//! let params = LoadParams {
//!     output: Output::Latest,
//!     center: "max:density".parse().unwrap(),
//!     extents: [500.0; 3],
//!     variables: vec!["density".into()],
//!     ..Default::default()
//! };
//! let dataset = Dataset::load(params, Config::default()).unwrap();
//! ```
//!
//! Under the hood a [SnapshotReader] walks through the binary files. This is
//! made public for fine control if needed, for example to read CPU files in
//! parallel or hide the progress bar.
//!
//! ```rust, no_run
//! # use amrtools_ramses::{reader::SnapshotReader, Config, Dataset, LoadParams};
//! let mut reader = SnapshotReader::new();
//! reader.disable_progress();
//! reader.set_parallel(true);
//!
//! let dataset = Dataset::load_with(reader, LoadParams::default(), Config::default()).unwrap();
//! ```
//!
//! # Implementation overview
//!
//! A load proceeds in stages:
//!
//! - Run metadata from `info_NNNNN.txt`, failing early if it is missing
//! - Variable names from `hydro_file_descriptor.txt`, or the configured names
//! - Sink particles from `sink_NNNNN.csv`, if any
//! - Region of interest around the pre-load centre
//! - A scan of every `amr_NNNNN.outCCCCC` and `hydro_NNNNN.outCCCCC` pair
//! - Concatenation of the cell batches into unit-scaled fields
//! - Recentring of the coordinates about the requested centre
//!
//! The binary files are sequences of Fortran unformatted records. Each file
//! is read into memory once and every record is reached through computed
//! offsets, see [RecordCursor](amrtools_fortran::RecordCursor).
//!
//! Only leaf cells are kept, i.e. cells with no children or cells at the
//! deepest level requested. A cell is kept if any part of it overlaps the
//! region of interest.

mod engine;
mod header;
mod snapshot;

#[doc(inline)]
pub use engine::{CellBatch, CropBox, ScanRequest, SnapshotReader};

#[doc(inline)]
pub use header::AmrHeader;

#[doc(inline)]
pub use snapshot::{Output, SnapshotPaths};

// crate modules
use crate::center::Center;
use crate::config::Config;

// standard library
use std::path::PathBuf;

/// Parameters of a load, kept so that updates can reuse them
#[derive(Debug, Clone, PartialEq)]
pub struct LoadParams {
    /// Which output to read
    pub output: Output,
    /// Deepest level to read, 0 for the deepest in the run
    pub lmax: usize,
    /// Origin of the relative coordinates and the region of interest
    pub center: Center,
    /// Length scale name for coordinates, e.g. "au"
    pub scale: String,
    /// Run directory containing the `output_NNNNN` folders
    pub path: PathBuf,
    /// Full widths of the region of interest in the length scale, 0 for all
    pub extents: [f64; 3],
    /// Variables to read, empty for all
    pub variables: Vec<String>,
}

impl Default for LoadParams {
    fn default() -> Self {
        Self {
            output: Output::default(),
            lmax: 0,
            center: Center::Default,
            scale: "au".to_string(),
            path: PathBuf::from("."),
            extents: [0.0; 3],
            variables: Vec::new(),
        }
    }
}

impl LoadParams {
    /// Defaults for everything except the output
    pub fn new(output: Output) -> Self {
        Self {
            output,
            ..Default::default()
        }
    }

    /// Defaults taken from a configuration, i.e. scale, path, and variables
    ///
    /// ```rust
    /// # use amrtools_ramses::{Config, LoadParams, Output};
    /// let mut config = Config::default();
    /// config.length_scale = "pc".into();
    ///
    /// let params = LoadParams::from_config(Output::Latest, &config);
    /// assert_eq!(params.scale, "pc");
    /// assert_eq!(params.path.to_str(), Some("."));
    /// ```
    pub fn from_config(output: Output, config: &Config) -> Self {
        let path = if config.path.is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(&config.path)
        };

        Self {
            output,
            scale: config.length_scale.clone(),
            path,
            variables: config.variables.clone(),
            ..Default::default()
        }
    }
}
