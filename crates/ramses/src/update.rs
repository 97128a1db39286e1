//! Reloading a dataset in place and recomputing its derived fields

// crate modules
use crate::center::Center;
use crate::dataset::{Dataset, Field, FieldSource};
use crate::error::Result;
use crate::operation::Expr;
use crate::reader::{LoadParams, Output};

// standard library
use std::path::PathBuf;

// external crates
use itertools::Itertools;
use log::{debug, info};

/// Overrides for an update, anything left as `None` is reused
///
/// ```rust
/// # use amrtools_ramses::{LoadParams, Output, UpdateOptions};
/// let options = UpdateOptions {
///     output: Some(Output::Number(13)),
///     ..Default::default()
/// };
///
/// let params = options.merge(LoadParams::new(Output::Number(12)));
/// assert_eq!(params.output, Output::Number(13));
/// assert_eq!(params.scale, "au");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOptions {
    /// Which output to read
    pub output: Option<Output>,
    /// Deepest level to read, 0 for the deepest in the run
    pub lmax: Option<usize>,
    /// Origin of the relative coordinates and the region of interest
    pub center: Option<Center>,
    /// Length scale name for coordinates
    pub scale: Option<String>,
    /// Run directory
    pub path: Option<PathBuf>,
    /// Full widths of the region of interest in the length scale
    pub extents: Option<[f64; 3]>,
    /// Variables to read, empty for all
    pub variables: Option<Vec<String>>,
}

impl UpdateOptions {
    /// Just the output, everything else as before
    pub fn output(output: Output) -> Self {
        Self {
            output: Some(output),
            ..Default::default()
        }
    }

    /// Apply the overrides on top of previous parameters
    pub fn merge(self, previous: LoadParams) -> LoadParams {
        LoadParams {
            output: self.output.unwrap_or(previous.output),
            lmax: self.lmax.unwrap_or(previous.lmax),
            center: self.center.unwrap_or(previous.center),
            scale: self.scale.unwrap_or(previous.scale),
            path: self.path.unwrap_or(previous.path),
            extents: self.extents.unwrap_or(previous.extents),
            variables: self.variables.unwrap_or(previous.variables),
        }
    }
}

impl Dataset {
    /// Reload with new parameters and recompute every derived field
    ///
    /// The new state is built completely before it replaces the current
    /// one, so on failure the dataset is left exactly as it was.
    ///
    /// Derived fields are evaluated again in order of increasing depth, so
    /// each one only sees fields that are already up to date. Configured
    /// additional fields that can no longer be computed are dropped, any
    /// other failure aborts the update.
    ///
    /// Fields added from plain values are carried over as they are, as long
    /// as they still have one value per cell.
    ///
    /// ```rust, no_run
    /// # use amrtools_ramses::{Config, Dataset, LoadParams, Output, UpdateOptions};
    /// let mut dataset = Dataset::load(LoadParams::new(Output::Number(12)), Config::default()).unwrap();
    /// dataset.update_values(UpdateOptions::output(Output::Number(13))).unwrap();
    /// ```
    pub fn update_values(&mut self, options: UpdateOptions) -> Result<()> {
        let params = options.merge(self.params.clone());
        debug!("Updating with {params:?}");

        let mut fresh = Dataset::read(self.reader, params, self.config.clone())?;

        let ncells = fresh.ncells();
        let given = self.fields.iter().filter(|(name, field)| {
            !field.is_derived() && !field.is_loaded() && !fresh.fields.contains_key(*name)
        });

        let mut kept = Vec::new();
        for (name, field) in given {
            if field.values.len() == ncells {
                kept.push((name.clone(), field.clone()));
            } else {
                debug!("Dropping field \"{name}\", it no longer has one value per cell");
            }
        }
        fresh.fields.extend(kept);

        let derived = self
            .fields
            .iter()
            .filter(|(name, field)| field.is_derived() && !fresh.fields.contains_key(*name))
            .sorted_by_key(|(_, field)| field.depth);

        for (name, field) in derived {
            fresh.recompute(name, field, self.is_additional(name))?;
        }

        fresh.apply_additional_fields()?;
        fresh.log_memory();

        *self = fresh;
        info!("Update complete, {} fields", self.fields.len());
        Ok(())
    }

    fn is_additional(&self, name: &str) -> bool {
        self.config.additional_fields.iter().any(|d| d.name == name)
    }

    /// Evaluate a previous field's operation against this dataset
    fn recompute(&mut self, name: &str, previous: &Field, optional: bool) -> Result<()> {
        if optional {
            let expr = Expr::parse(&previous.operation)?;
            if let Some(missing) = self.missing_reference(&expr) {
                debug!("Dropping field \"{name}\", \"{missing}\" is not available");
                return Ok(());
            }
        }

        self.new_field(
            name,
            FieldSource::Operation(previous.operation.clone()),
            &previous.unit,
            Some(&previous.label),
        )
    }
}
