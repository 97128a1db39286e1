//! Hydro variable declarations and the selection of what to read

// crate modules
use crate::error::Result;
use crate::parsers::{descriptor_nvar, descriptor_variable};

// standard library
use std::path::Path;

// external crates
use log::{debug, warn};

/// Geometry columns appended after the hydro variables of every cell
pub const GEOMETRY_FIELDS: [&str; 5] = ["level", "x", "y", "z", "dx"];

/// Which hydro variables are read, and the full list of output columns
///
/// ```rust
/// # use amrtools_ramses::VariableSelection;
/// let declared = vec!["density".to_string(), "velocity_x".to_string()];
/// let selection = VariableSelection::new(declared, 2, &["velocity_x".to_string()]);
///
/// assert_eq!(selection.read_mask, vec![false, true]);
/// assert_eq!(selection.names, vec!["velocity_x", "level", "x", "y", "z", "dx"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSelection {
    /// Number of hydro variables stored per cell in the hydro files
    pub nvar: usize,
    /// Declared variable names in file order
    pub declared: Vec<String>,
    /// One flag per stored variable, true if it is read
    pub read_mask: Vec<bool>,
    /// Names of the output columns, selected variables then geometry
    pub names: Vec<String>,
}

impl VariableSelection {
    /// Build a selection from declared names
    ///
    /// An empty `filter` selects every declared variable. The mask always has
    /// exactly `nvar` entries, variables beyond the declared names are never
    /// read.
    pub fn new(declared: Vec<String>, nvar: usize, filter: &[String]) -> Self {
        let read_mask: Vec<bool> = (0..nvar)
            .map(|i| match declared.get(i) {
                Some(name) => filter.is_empty() || filter.contains(name),
                None => false,
            })
            .collect();

        let names = declared
            .iter()
            .zip(&read_mask)
            .filter(|(_, keep)| **keep)
            .map(|(name, _)| name.clone())
            .chain(GEOMETRY_FIELDS.iter().map(|s| s.to_string()))
            .collect();

        Self {
            nvar,
            declared,
            read_mask,
            names,
        }
    }

    /// Read `hydro_file_descriptor.txt` from an output directory
    ///
    /// Falls back to `fallback` names when the file does not exist.
    pub fn read<P: AsRef<Path>>(
        output_dir: P,
        fallback: &[String],
        filter: &[String],
    ) -> Result<Self> {
        let path = output_dir.as_ref().join("hydro_file_descriptor.txt");

        let (declared, nvar) = if path.is_file() {
            debug!("Reading {}", path.display());
            parse_descriptor(&std::fs::read_to_string(&path)?)
        } else {
            warn!(
                "No {} found, using default variable names",
                path.display()
            );
            (fallback.to_vec(), fallback.len())
        };

        for name in filter {
            if !declared.contains(name) {
                warn!("Variable \"{name}\" is not declared and will not be read");
            }
        }

        Ok(Self::new(declared, nvar, filter))
    }

    /// Number of hydro columns in the output
    pub fn hydro_columns(&self) -> usize {
        self.names.len() - GEOMETRY_FIELDS.len()
    }

    /// Number of columns in the output, hydro and geometry
    pub fn columns(&self) -> usize {
        self.names.len()
    }
}

/// Declared names in index order, and `nvar` if stated
fn parse_descriptor(content: &str) -> (Vec<String>, usize) {
    let mut nvar = None;
    let mut variables: Vec<(usize, String)> = Vec::new();

    for line in content.lines() {
        if let Some(n) = descriptor_nvar(line) {
            nvar = Some(n);
        } else if let Some(v) = descriptor_variable(line) {
            variables.push(v);
        }
    }

    variables.sort_by_key(|(i, _)| *i);
    let declared: Vec<String> = variables.into_iter().map(|(_, name)| name).collect();
    let nvar = nvar.unwrap_or(declared.len());
    (declared, nvar)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn legacy_descriptor() {
        let content = "nvar =        3\nvariable #  1: density\nvariable #  2: velocity_x\nvariable #  3: thermal_pressure\n";
        let (declared, nvar) = parse_descriptor(content);
        assert_eq!(nvar, 3);
        assert_eq!(declared, names(&["density", "velocity_x", "thermal_pressure"]));
    }

    #[test]
    fn csv_descriptor() {
        let content = "# version:  1\n# ivar, variable_name, variable_type\n  1, density, d\n  2, pressure, d\n";
        let (declared, nvar) = parse_descriptor(content);
        assert_eq!(nvar, 2);
        assert_eq!(declared, names(&["density", "pressure"]));
    }

    #[test]
    fn no_filter_reads_everything() {
        let selection = VariableSelection::new(names(&["a", "b", "c"]), 3, &[]);
        assert_eq!(selection.read_mask, vec![true; 3]);
        assert_eq!(selection.hydro_columns(), 3);
        assert_eq!(selection.columns(), 8);
    }

    #[test]
    fn undeclared_variables_are_never_read() {
        let selection = VariableSelection::new(names(&["a"]), 3, &names(&["a", "zzz"]));
        assert_eq!(selection.read_mask, vec![true, false, false]);
        assert_eq!(selection.names, names(&["a", "level", "x", "y", "z", "dx"]));
    }
}
