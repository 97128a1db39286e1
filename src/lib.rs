//! `amrtools` is a modular toolkit for reading and post-processing adaptive
//! mesh refinement simulation snapshots
//!
#![doc = include_str!("../readme.md")]
#![deny(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

// Re-exports of toolkit crates.
#[doc(inline)]
pub use amrtools_utils as utils;

#[doc(inline)]
pub use amrtools_fortran as fortran;

#[cfg(feature = "ramses")]
#[cfg_attr(docsrs, doc(cfg(feature = "ramses")))]
#[doc(inline)]
pub use amrtools_ramses as ramses;
