//! Reading RAMSES snapshots into datasets of leaf cells
//!
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod center;
mod config;
mod dataset;
mod descriptor;
mod error;
mod info;
mod operation;
mod parsers;
mod sinks;
mod units;
mod update;

pub mod reader;

// Inline anything important for a nice public API
#[doc(inline)]
pub use dataset::{Dataset, Field, FieldSource, Frame};

#[doc(inline)]
pub use update::UpdateOptions;

#[doc(inline)]
pub use reader::{CropBox, LoadParams, Output, SnapshotPaths};

#[doc(inline)]
pub use center::Center;

#[doc(inline)]
pub use config::{Config, FieldDefinition};

#[doc(inline)]
pub use info::{Info, Value};

#[doc(inline)]
pub use descriptor::{VariableSelection, GEOMETRY_FIELDS};

#[doc(inline)]
pub use sinks::{Sink, SinkTable};

#[doc(inline)]
pub use units::CodeUnits;

#[doc(inline)]
pub use operation::{BinOp, Context, Expr, Func, Operand, Scope};

#[doc(inline)]
pub use error::{Error, Result};
