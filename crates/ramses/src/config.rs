//! User configuration and physical constants

// crate modules
use crate::error::{Error, Result};

// standard library
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

// external crates
use serde::{Deserialize, Serialize};

/// Default values so that they do not have to be specified on every load
///
/// Every field has a built-in default, and a JSON file only needs to contain
/// the values that should be different.
///
/// ```json
/// {
///     "length_scale": "pc",
///     "constants": { "ly": 9.4607e17 }
/// }
/// ```
///
/// Note that a `constants` table in a file replaces the built-in table as a
/// whole, so any scale names still needed must be repeated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Length scale used for coordinates when none is requested, e.g. "au"
    pub length_scale: String,
    /// Time scale used for reporting the snapshot time, e.g. "kyr"
    pub time_scale: String,
    /// Directory containing the `output_NNNNN` folders
    pub path: String,
    /// Variables to read when no filter is requested, empty for all
    pub variables: Vec<String>,
    /// Hydro variable names used if there is no `hydro_file_descriptor.txt`
    pub var_names: Vec<String>,
    /// Sink CSV column names after the leading id column
    pub sink_format: Vec<String>,
    /// Physical constants and unit conversions to cgs
    pub constants: BTreeMap<String, f64>,
    /// Derived fields computed after every load and update
    pub additional_fields: Vec<FieldDefinition>,
}

/// A derived field described by an operation on other fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Name of the new field
    pub name: String,
    /// Expression evaluated against existing fields, e.g. "dx*dx*dx*density"
    pub operation: String,
    /// Unit string of the result
    #[serde(default)]
    pub unit: String,
}

impl FieldDefinition {
    fn new(name: &str, operation: &str, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            operation: operation.to_string(),
            unit: unit.to_string(),
        }
    }
}

impl Config {
    /// Read a configuration from a JSON file, defaults fill any gaps
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Look up a constant, e.g. the number of cm in one "au"
    ///
    /// ```rust
    /// # use amrtools_ramses::Config;
    /// let config = Config::default();
    /// assert_eq!(config.constant("cm").unwrap(), 1.0);
    /// assert_eq!(config.constant("au").unwrap(), 1.495980e+13);
    /// assert!(config.constant("furlong").is_err());
    /// ```
    pub fn constant(&self, name: &str) -> Result<f64> {
        self.constants
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownScale(name.to_string()))
    }
}

impl Default for Config {
    fn default() -> Self {
        let yr = 365.25 * 86400.0;
        let constants = [
            ("cm", 1.0),
            ("au", 1.495980e+13),
            ("pc", 3.085678e+18),
            ("s", 1.0),
            ("yr", yr),
            ("kyr", yr * 1000.0),
            ("msun", 1.9889e33),
            ("a_r", 7.56591469318689378e-015),
            ("c", 2.9979250e+10),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            length_scale: "au".to_string(),
            time_scale: "kyr".to_string(),
            path: String::new(),
            variables: Vec::new(),
            var_names: [
                "density",
                "velocity_x",
                "velocity_y",
                "velocity_z",
                "B_left_x",
                "B_left_y",
                "B_left_z",
                "B_right_x",
                "B_right_y",
                "B_right_z",
                "thermal_pressure",
                "radiative_energy_1",
                "temperature",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            sink_format: [
                "mass", "dmf", "x", "y", "z", "vx", "vy", "vz", "period", "lx", "ly", "lz",
                "acc_rate", "acc_lum", "age", "int_lum", "t_eff",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            constants,
            additional_fields: vec![
                FieldDefinition::new("B_field_x", "0.5*(B_left_x+B_right_x)", "G"),
                FieldDefinition::new("B_field_y", "0.5*(B_left_y+B_right_y)", "G"),
                FieldDefinition::new("B_field_z", "0.5*(B_left_z+B_right_z)", "G"),
                FieldDefinition::new("mass", "density*(dx*length_unit)**3/msun", "msun"),
            ],
        }
    }
}
