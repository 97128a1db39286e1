//! Format specifiers for typed reads

// crate modules
use crate::error::{Error, Result};

// nom parser combinators
use nom::character::complete::{one_of, space0, u64 as count};
use nom::combinator::{all_consuming, map, opt};
use nom::sequence::{delimited, pair};
use nom::IResult;

/// Scalar types found in the record payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// 4-byte signed integer (`i`)
    Int32,
    /// 8-byte float (`d`)
    Float64,
}

impl Kind {
    /// Number of bytes for a single value
    pub fn size(&self) -> usize {
        match self {
            Kind::Int32 => std::mem::size_of::<i32>(),
            Kind::Float64 => std::mem::size_of::<f64>(),
        }
    }
}

/// A count of values of a single [Kind]
///
/// Follows the `struct` module convention of a repeat count followed by a
/// type character, where the count defaults to 1.
///
/// ```rust
/// # use amrtools_fortran::{Format, Kind};
/// # use std::str::FromStr;
/// assert_eq!(Format::from_str("3i").unwrap(), Format::new(3, Kind::Int32));
/// assert_eq!(Format::from_str("d").unwrap(), Format::new(1, Kind::Float64));
/// assert!(Format::from_str("3x").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    /// Number of consecutive values
    pub count: usize,
    /// Type of every value
    pub kind: Kind,
}

impl Format {
    /// Construct directly from a count and kind
    pub fn new(count: usize, kind: Kind) -> Self {
        Self { count, kind }
    }

    /// Shorthand for `count` 32-bit integers
    pub fn ints(count: usize) -> Self {
        Self::new(count, Kind::Int32)
    }

    /// Shorthand for `count` 64-bit floats
    pub fn floats(count: usize) -> Self {
        Self::new(count, Kind::Float64)
    }

    /// Total byte length of the values described
    pub fn byte_length(&self) -> usize {
        self.count * self.kind.size()
    }
}

impl std::str::FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        all_consuming(format_spec)(s)
            .map(|(_, format)| format)
            .map_err(|_| Error::InvalidFormat(s.to_string()))
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let c = match self.kind {
            Kind::Int32 => 'i',
            Kind::Float64 => 'd',
        };
        write!(f, "{}{}", self.count, c)
    }
}

/// Values unpacked from a buffer according to a [Format]
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    /// Decoded 32-bit integers
    Int(Vec<i32>),
    /// Decoded 64-bit floats
    Float(Vec<f64>),
}

impl Values {
    /// Number of values held
    pub fn len(&self) -> usize {
        match self {
            Values::Int(v) => v.len(),
            Values::Float(v) => v.len(),
        }
    }

    /// True if no values are held
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widen everything to f64 regardless of the source kind
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            Values::Int(v) => v.iter().map(|i| *i as f64).collect(),
            Values::Float(v) => v.clone(),
        }
    }
}

/// e.g. `3i`, ` 128d `, `i`
fn format_spec(i: &str) -> IResult<&str, Format> {
    map(
        delimited(space0, pair(opt(count), one_of("id")), space0),
        |(n, c)| {
            let kind = match c {
                'i' => Kind::Int32,
                _ => Kind::Float64,
            };
            Format::new(n.unwrap_or(1) as usize, kind)
        },
    )(i)
}
