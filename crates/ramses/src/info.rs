//! Run metadata from `info_NNNNN.txt` files

// crate modules
use crate::error::{Error, Result};
use crate::parsers::{info_value, key_value};

// standard library
use std::collections::BTreeMap;
use std::path::Path;

// external crates
use log::debug;

/// Keys that every info file must provide
pub const REQUIRED_KEYS: [&str; 9] = [
    "ncpu", "ndim", "levelmax", "ngridmax", "boxlen", "time", "unit_l", "unit_d", "unit_t",
];

/// A single metadata value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// `True` or `False`
    Bool(bool),
    /// Bracketed list of literals
    List(Vec<Value>),
    /// Anything that is not a literal
    Str(String),
}

impl Value {
    /// Numeric value, integers are widened
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer value, floats with no fractional part are accepted
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Int(value as i64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(l) => {
                let items: Vec<String> = l.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

/// Mapping of metadata keys to values for a single output
///
/// Keys are kept exactly as written in the file, which includes a few with
/// spaces such as `ordering type`.
///
/// ```rust
/// # use amrtools_ramses::{Info, Value};
/// let info = Info::parse("ncpu = 4\nboxlen = 0.1E+01\nordering type=hilbert");
///
/// assert_eq!(info.int("ncpu").unwrap(), 4);
/// assert_eq!(info.float("boxlen").unwrap(), 1.0);
/// assert_eq!(info.get("ordering type"), Some(&Value::Str("hilbert".into())));
/// assert!(info.float("unit_l").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Info {
    entries: BTreeMap<String, Value>,
}

impl Info {
    /// Parse the text content of an info file
    pub fn parse(content: &str) -> Self {
        let entries = content
            .lines()
            .filter_map(key_value)
            .map(|(k, v)| (k.to_string(), info_value(v)))
            .collect();
        Self { entries }
    }

    /// Read and parse an info file, checking that all required keys exist
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::InfoNotFound(path.to_path_buf()));
        }

        debug!("Reading {}", path.display());
        let info = Self::parse(&std::fs::read_to_string(path)?);
        info.validate()?;
        Ok(info)
    }

    /// Fails on the first required key that is missing
    pub fn validate(&self) -> Result<()> {
        for key in REQUIRED_KEYS {
            if !self.entries.contains_key(key) {
                return Err(Error::MissingKey(key.to_string()));
            }
        }
        Ok(())
    }

    /// Value for a key if it exists
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// True if the key exists
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Set a value, replacing any existing one
    pub fn insert<V: Into<Value>>(&mut self, key: &str, value: V) {
        self.entries.insert(key.to_string(), value.into());
    }

    /// Numeric value of a key
    pub fn float(&self, key: &str) -> Result<f64> {
        self.entries
            .get(key)
            .ok_or_else(|| Error::MissingKey(key.to_string()))?
            .as_f64()
            .ok_or_else(|| Error::UnexpectedValueType {
                key: key.to_string(),
                expected: "number".to_string(),
            })
    }

    /// Integer value of a key
    pub fn int(&self, key: &str) -> Result<i64> {
        self.entries
            .get(key)
            .ok_or_else(|| Error::MissingKey(key.to_string()))?
            .as_i64()
            .ok_or_else(|| Error::UnexpectedValueType {
                key: key.to_string(),
                expected: "integer".to_string(),
            })
    }

    /// Non-negative integer value of a key, e.g. counts and levels
    pub fn count(&self, key: &str) -> Result<usize> {
        usize::try_from(self.int(key)?).map_err(|_| Error::UnexpectedValueType {
            key: key.to_string(),
            expected: "non-negative integer".to_string(),
        })
    }

    /// Numeric value of a key if it exists and is a number
    pub fn number(&self, key: &str) -> Option<f64> {
        self.entries.get(key).and_then(Value::as_f64)
    }

    /// Iterate over all entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
