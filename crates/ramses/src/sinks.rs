//! Sink particles from `sink_NNNNN.csv` files

// crate modules
use crate::error::{Error, Result};
use crate::info::Info;

// standard library
use std::collections::BTreeMap;
use std::path::Path;

// external crates
use amrtools_utils::f;
use log::{debug, info};

/// A single sink particle
///
/// Attributes are named by the configured sink format, plus the `radius`
/// added on load. Positions are in cm after reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Sink {
    /// Particle id from the first column
    pub id: i64,
    /// Named attributes, e.g. "mass", "x", "radius"
    pub attributes: BTreeMap<String, f64>,
}

impl Sink {
    /// Value of an attribute
    pub fn get(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).copied()
    }

    /// Set the value of an attribute
    pub fn set(&mut self, name: &str, value: f64) {
        self.attributes.insert(name.to_string(), value);
    }

    /// The `x`, `y`, `z` attributes, missing ones are zero
    pub fn position(&self) -> [f64; 3] {
        ["x", "y", "z"].map(|k| self.get(k).unwrap_or(0.0))
    }

    /// Replace the `x`, `y`, `z` attributes
    pub fn set_position(&mut self, position: [f64; 3]) {
        for (k, v) in ["x", "y", "z"].iter().zip(position) {
            self.set(k, v);
        }
    }
}

/// Sink particles keyed by `sink<ID>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SinkTable {
    sinks: BTreeMap<String, Sink>,
}

impl SinkTable {
    /// Read the sink file of an output
    ///
    /// A missing file is not an error, the output simply has no sinks.
    pub fn read<P: AsRef<Path>>(
        output_dir: P,
        number: u32,
        info: &Info,
        format: &[String],
    ) -> Result<Self> {
        let path = output_dir.as_ref().join(sink_file_name(number));
        if !path.is_file() {
            debug!("No sink file at {}", path.display());
            return Ok(Self::default());
        }

        debug!("Reading {}", path.display());
        let content = std::fs::read_to_string(&path)?;
        let table = Self::parse(&content, info, format)?;
        if !table.is_empty() {
            info!("Read {} sink particles", table.len());
        }
        Ok(table)
    }

    /// Parse sink CSV text
    ///
    /// Positions are converted to cm with `unit_l` and every sink is given
    /// the accretion radius in normalised box units.
    ///
    /// ```rust
    /// # use amrtools_ramses::{Info, SinkTable};
    /// let info = Info::parse("unit_l = 2.0\nlevelmax = 2\nncell_racc = 2");
    /// let format = vec!["mass".to_string(), "x".to_string()];
    ///
    /// let table = SinkTable::parse("3, 1.5, 0.25", &info, &format).unwrap();
    /// let sink = table.get("sink3").unwrap();
    ///
    /// assert_eq!(sink.get("mass"), Some(1.5));
    /// assert_eq!(sink.get("x"), Some(0.5));
    /// assert_eq!(sink.get("radius"), Some(0.5));
    /// ```
    pub fn parse(content: &str, info: &Info, format: &[String]) -> Result<Self> {
        let unit_l = info.float("unit_l")?;
        let radius = accretion_radius(info)?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut sinks = BTreeMap::new();
        for record in reader.records() {
            let record = record?;
            let values = record
                .iter()
                .map(|s| {
                    s.parse::<f64>()
                        .map_err(|_| Error::ParseError(f!("bad sink value \"{s}\"")))
                })
                .collect::<Result<Vec<f64>>>()?;

            let Some((id, rest)) = values.split_first() else {
                continue;
            };

            let mut sink = Sink {
                id: *id as i64,
                attributes: format.iter().cloned().zip(rest.iter().copied()).collect(),
            };

            for axis in ["x", "y", "z"] {
                if let Some(v) = sink.get(axis) {
                    sink.set(axis, v * unit_l);
                }
            }
            sink.set("radius", radius);

            sinks.insert(f!("sink{}", sink.id), sink);
        }

        Ok(Self { sinks })
    }

    /// Look up a sink by key, e.g. "sink1"
    pub fn get(&self, key: &str) -> Option<&Sink> {
        self.sinks.get(key)
    }

    /// Number of sinks
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// True if there are no sinks
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Iterate over sinks in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Sink)> {
        self.sinks.iter()
    }

    /// Mutable iteration over every sink
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Sink> {
        self.sinks.values_mut()
    }
}

/// e.g. `sink_00012.csv`
pub fn sink_file_name(number: u32) -> String {
    f!("sink_{number:05}.csv")
}

/// Radius in units of the box from the accretion parameters of the run
fn accretion_radius(info: &Info) -> Result<f64> {
    let ncells = info
        .number("ir_cloud")
        .or_else(|| info.number("ncell_racc"))
        .unwrap_or(4.0);
    Ok(ncells / 2f64.powi(info.int("levelmax")? as i32))
}
