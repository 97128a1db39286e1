//! Choice of the origin for relative coordinates

// crate modules
use crate::error::{Error, Result};
use crate::info::Info;
use crate::operation::{Expr, Scope};
use crate::sinks::SinkTable;

// external crates
use amrtools_utils::{f, SliceExt};
use log::debug;

/// Centre of the relative coordinate frame
///
/// Parsed from strings for convenience, for example on the command line.
///
/// ```rust
/// # use amrtools_ramses::Center;
/// # use std::str::FromStr;
/// assert_eq!(Center::from_str("").unwrap(), Center::Default);
/// assert_eq!(Center::from_str("0.5, 0.4, 0.5").unwrap(), Center::Explicit([0.5, 0.4, 0.5]));
/// assert_eq!(Center::from_str("sink3").unwrap(), Center::Sink("sink3".into()));
/// assert_eq!(Center::from_str("max:density").unwrap(), Center::Max("density".into()));
/// assert_eq!(Center::from_str("av:density > 1").unwrap(), Center::Average("density > 1".into()));
/// assert!(Center::from_str("0.5, 0.5").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Center {
    /// Centre of the simulation box
    #[default]
    Default,
    /// Position in units of the box size, e.g. `[0.5, 0.5, 0.5]`
    Explicit([f64; 3]),
    /// Position of a sink particle, e.g. "sink1"
    Sink(String),
    /// Position of the cell with the largest value of a field
    Max(String),
    /// Position of the cell with the smallest value of a field
    Min(String),
    /// Mean position of cells where a selection expression is non-zero
    Average(String),
}

impl std::str::FromStr for Center {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let bad = || Error::BadCenter(s.to_string());

        if s.is_empty() || s == "default" {
            return Ok(Center::Default);
        }

        if let Some((prefix, rest)) = s.split_once(':') {
            let rest = rest.trim();
            if rest.is_empty() {
                return Err(bad());
            }
            return match prefix.trim() {
                "max" => Ok(Center::Max(rest.to_string())),
                "min" => Ok(Center::Min(rest.to_string())),
                "av" => Ok(Center::Average(rest.to_string())),
                _ => Err(bad()),
            };
        }

        if s.starts_with("sink") {
            return Ok(Center::Sink(s.to_string()));
        }

        let numbers = s
            .trim_start_matches('[')
            .trim_end_matches(']')
            .split(',')
            .map(|v| v.trim().parse::<f64>().map_err(|_| bad()))
            .collect::<Result<Vec<f64>>>()?;

        let position: [f64; 3] = numbers.try_into().map_err(|_| bad())?;
        Ok(Center::Explicit(position))
    }
}

impl std::fmt::Display for Center {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Center::Default => write!(f, "default"),
            Center::Explicit([x, y, z]) => write!(f, "[{x}, {y}, {z}]"),
            Center::Sink(s) => write!(f, "{s}"),
            Center::Max(s) => write!(f, "max:{s}"),
            Center::Min(s) => write!(f, "min:{s}"),
            Center::Average(s) => write!(f, "av:{s}"),
        }
    }
}

impl Center {
    /// Centre in normalised box units, before any cells are loaded
    ///
    /// Extremum and average centres need the cell data, so the reader falls
    /// back to the box centre for cropping and the exact position is only
    /// found once the cells exist.
    pub fn resolve_normalised(&self, info: &Info, sinks: &SinkTable) -> Result<[f64; 3]> {
        match self {
            Center::Default => Ok([0.5; 3]),
            Center::Explicit(c) => Ok(*c),
            Center::Sink(key) => {
                let norm = info.float("boxlen")? * info.float("unit_l")?;
                let sink = sinks
                    .get(key)
                    .ok_or_else(|| Error::SinkNotFound(key.clone()))?;
                Ok(sink.position().map(|p| p / norm))
            }
            Center::Max(_) | Center::Min(_) | Center::Average(_) => {
                debug!("Center {self} uses the box centre for the region of interest");
                Ok([0.5; 3])
            }
        }
    }

    /// Centre in cm, resolved against cell data in absolute cm
    ///
    /// The `scope` must provide the `x`, `y`, `z` fields in cm, `boxsize` is
    /// in cm and the sink positions must also be in cm.
    pub fn resolve_absolute<S: Scope>(
        &self,
        scope: &S,
        boxsize: f64,
        sinks: &SinkTable,
    ) -> Result<[f64; 3]> {
        match self {
            Center::Default => Ok([0.5 * boxsize; 3]),
            Center::Explicit(c) => Ok(c.map(|v| v * boxsize)),
            Center::Sink(key) => sinks
                .get(key)
                .map(|s| s.position())
                .ok_or_else(|| Error::SinkNotFound(key.clone())),
            Center::Max(name) => {
                let index = field(scope, name)?.try_argmax()?;
                position_at(scope, index)
            }
            Center::Min(name) => {
                let index = field(scope, name)?.try_argmin()?;
                position_at(scope, index)
            }
            Center::Average(selection) => {
                let ncells = field(scope, "x")?.len();
                let mask: Vec<bool> = Expr::parse(selection)?
                    .eval(scope)?
                    .into_values(ncells)?
                    .into_iter()
                    .map(|v| v != 0.0)
                    .collect();

                if !mask.iter().any(|m| *m) {
                    return Err(Error::EmptySelection(selection.clone()));
                }

                let mut position = [0.0; 3];
                for (p, axis) in position.iter_mut().zip(["x", "y", "z"]) {
                    *p = field(scope, axis)?.try_masked_mean(&mask)?;
                }
                Ok(position)
            }
        }
    }
}

fn field<'a, S: Scope>(scope: &'a S, name: &str) -> Result<&'a [f64]> {
    scope
        .field(name)
        .ok_or_else(|| Error::FieldNotFound(name.to_string()))
}

fn position_at<S: Scope>(scope: &S, index: usize) -> Result<[f64; 3]> {
    let mut position = [0.0; 3];
    for (p, axis) in position.iter_mut().zip(["x", "y", "z"]) {
        *p = *field(scope, axis)?
            .get(index)
            .ok_or_else(|| Error::LengthMismatch {
                expected: index + 1,
                found: 0,
            })?;
    }
    Ok(position)
}

/// Human readable centre for log messages
pub(crate) fn describe(position: &[f64; 3]) -> String {
    f!("({:.4e}, {:.4e}, {:.4e})", position[0], position[1], position[2])
}
