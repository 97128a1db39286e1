//! Named per-cell fields of a snapshot and their coordinate frame

// crate modules
use crate::center::{describe, Center};
use crate::config::Config;
use crate::descriptor::VariableSelection;
use crate::error::{Error, Result};
use crate::info::Info;
use crate::operation::{Context, Expr, Scope};
use crate::reader::{CellBatch, CropBox, LoadParams, ScanRequest, SnapshotPaths, SnapshotReader};
use crate::sinks::{Sink, SinkTable};
use crate::units::CodeUnits;

// standard library
use std::collections::BTreeMap;

// external crates
use amrtools_utils::{f, SliceExt, ValueExt};
use itertools::Itertools;
use log::{debug, info, warn};

const AXES: [&str; 3] = ["x", "y", "z"];

/// Values of one quantity for every cell
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// One value per cell
    pub values: Vec<f64>,
    /// Physical unit, empty if dimensionless
    pub unit: String,
    /// Expression that generates the values, empty for loaded data
    pub operation: String,
    /// 0 for loaded data, otherwise one more than the deepest reference
    pub depth: u32,
    /// Human readable name, e.g. for axis labels, empty for loaded data
    pub label: String,
}

impl Field {
    /// Loaded data, with no operation and a depth of 0
    pub fn primary(values: Vec<f64>, unit: &str) -> Self {
        Self {
            values,
            unit: unit.to_string(),
            operation: String::new(),
            depth: 0,
            label: String::new(),
        }
    }

    /// True if the field is computed from other fields
    pub fn is_derived(&self) -> bool {
        !self.operation.is_empty()
    }

    /// True if the values were read from the snapshot
    pub fn is_loaded(&self) -> bool {
        !self.is_derived() && self.label.is_empty()
    }

    /// Smallest value, fails if empty
    pub fn min(&self) -> Result<f64> {
        Ok(self.values.try_min()?)
    }

    /// Largest value, fails if empty
    pub fn max(&self) -> Result<f64> {
        Ok(self.values.try_max()?)
    }
}

/// Where the values of a new field come from
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSource {
    /// Values given directly, one per cell
    Values(Vec<f64>),
    /// Expression evaluated against the existing fields
    Operation(String),
}

/// Coordinate frame of the `x`, `y`, `z` and `dx` fields
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Frame {
    /// Positions in cm from the box corner, as read
    #[default]
    Absolute,
    /// Positions in the length scale about a centre
    Relative {
        /// Centre in cm
        center: [f64; 3],
        /// Size of one length scale unit in cm
        length_unit: f64,
    },
}

/// Leaf cells of a snapshot as named fields, with metadata and sinks
///
/// ```rust, no_run
/// # use amrtools_ramses::{Config, Dataset, FieldSource, LoadParams, Output};
/// let mut dataset = Dataset::load(LoadParams::new(Output::Number(12)), Config::default()).unwrap();
///
/// dataset
///     .new_field("log_rho", FieldSource::Operation("log10(density)".into()), "", None)
///     .unwrap();
///
/// println!("{dataset}");
/// ```
#[derive(Debug, Clone)]
pub struct Dataset {
    pub(crate) info: Info,
    pub(crate) params: LoadParams,
    pub(crate) fields: BTreeMap<String, Field>,
    pub(crate) sinks: SinkTable,
    pub(crate) config: Config,
    pub(crate) frame: Frame,
    pub(crate) reader: SnapshotReader,
    /// Active dimensions of the run
    pub(crate) ndim: usize,
    /// Box size in cm
    pub(crate) boxsize: f64,
}

// ! ------------------------------------------------------------------------
// !                                Public API
// ! ------------------------------------------------------------------------

impl Dataset {
    /// Load a snapshot with the default reader
    pub fn load(params: LoadParams, config: Config) -> Result<Self> {
        Self::load_with(SnapshotReader::new(), params, config)
    }

    /// Load a snapshot with a configured reader
    ///
    /// The reader is kept for any later [update](Dataset::update_values).
    pub fn load_with(reader: SnapshotReader, params: LoadParams, config: Config) -> Result<Self> {
        let mut dataset = Self::read(reader, params, config)?;
        dataset.apply_additional_fields()?;
        dataset.log_memory();
        Ok(dataset)
    }

    /// Run metadata, including the values derived on load
    pub fn info(&self) -> &Info {
        &self.info
    }

    /// Parameters of the most recent load
    pub fn params(&self) -> &LoadParams {
        &self.params
    }

    /// Sink particles, possibly empty
    pub fn sinks(&self) -> &SinkTable {
        &self.sinks
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current coordinate frame
    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// Field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Values of a field by name
    pub fn values(&self, name: &str) -> Result<&[f64]> {
        self.fields
            .get(name)
            .map(|f| f.values.as_slice())
            .ok_or_else(|| Error::FieldNotFound(name.to_string()))
    }

    /// Iterate over fields in name order
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Field)> {
        self.fields.iter()
    }

    /// Field names in order
    pub fn names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    /// Number of cells
    pub fn ncells(&self) -> usize {
        self.fields.get("x").map_or(0, |f| f.values.len())
    }

    /// Name resolution against fields, metadata and constants
    pub fn context(&self) -> Context<'_> {
        Context {
            fields: &self.fields,
            info: &self.info,
            constants: &self.config.constants,
        }
    }

    /// Evaluate an expression for every cell without storing it
    pub fn eval(&self, operation: &str) -> Result<Vec<f64>> {
        Expr::parse(operation)?
            .eval(&self.context())?
            .into_values(self.ncells())
    }

    /// Add or replace a field
    ///
    /// Values must have one entry per cell. An operation is evaluated
    /// straight away and is kept so the field can be recomputed on update.
    /// The label defaults to the name.
    pub fn new_field(
        &mut self,
        name: &str,
        source: FieldSource,
        unit: &str,
        label: Option<&str>,
    ) -> Result<()> {
        let ncells = self.ncells();

        let field = match source {
            FieldSource::Values(values) => {
                if values.len() != ncells {
                    return Err(Error::LengthMismatch {
                        expected: ncells,
                        found: values.len(),
                    });
                }
                Field::primary(values, unit)
            }
            FieldSource::Operation(operation) => {
                let expr = Expr::parse(&operation)?;
                let depth = 1 + expr
                    .references()
                    .iter()
                    .filter_map(|r| self.fields.get(r))
                    .map(|f| f.depth)
                    .max()
                    .unwrap_or(0);
                let values = expr.eval(&self.context())?.into_values(ncells)?;
                Field {
                    values,
                    unit: unit.to_string(),
                    operation,
                    depth,
                    label: String::new(),
                }
            }
        };

        debug!("New field \"{name}\" with depth {}", field.depth);
        self.fields.insert(
            name.to_string(),
            Field {
                label: label.unwrap_or(name).to_string(),
                ..field
            },
        );
        Ok(())
    }

    /// Move the origin of the relative frame to a new centre
    ///
    /// Coordinates always pass through the absolute frame, so recentring
    /// twice on the same centre changes nothing. Nothing is modified if the
    /// centre can not be resolved.
    pub fn re_center(&mut self, center: &Center) -> Result<()> {
        self.to_relative(center)
    }

    /// Convert coordinates back to cm from the box corner
    ///
    /// Does nothing if already absolute.
    pub fn to_absolute(&mut self) {
        let Frame::Relative {
            center,
            length_unit: s,
        } = self.frame
        else {
            return;
        };

        for (n, axis) in AXES.iter().enumerate().take(self.ndim) {
            if let Some(field) = self.fields.get_mut(*axis) {
                field.values.iter_mut().for_each(|v| *v = absolute(*v, center[n], s));
                field.unit = "cm".to_string();
            }
        }

        if let Some(field) = self.fields.get_mut("dx") {
            field.values.iter_mut().for_each(|v| *v *= s);
            field.unit = "cm".to_string();
        }

        let relative_boxsize = self.boxsize / s;
        for sink in self.sinks.iter_mut() {
            to_absolute_sink(sink, center, s, relative_boxsize);
        }

        self.info.insert("boxsize", self.boxsize);
        for key in ["xc", "yc", "zc"] {
            self.info.insert(key, 0.0);
        }

        self.frame = Frame::Absolute;
        debug!("Coordinates converted to absolute cm");
    }

    /// Express coordinates in the length scale about `center`
    ///
    /// The centre is resolved before anything is changed, so a bad centre
    /// leaves the dataset as it was.
    pub fn to_relative(&mut self, center: &Center) -> Result<()> {
        let position = self.resolve(center)?;
        let s = self.config.constant(&self.params.scale)?;

        self.to_absolute();
        self.apply_relative(position, s);
        self.params.center = center.clone();

        info!("Centered on {} cm", describe(&position));
        Ok(())
    }
}

// ! ------------------------------------------------------------------------
// !                              Implementation
// ! ------------------------------------------------------------------------

impl Dataset {
    /// Read metadata, sinks and cells, then recentre, with no derived fields
    pub(crate) fn read(reader: SnapshotReader, params: LoadParams, config: Config) -> Result<Self> {
        let number = params.output.resolve(&params.path)?;
        let paths = SnapshotPaths::new(&params.path, number);
        let mut info = Info::read(paths.info())?;
        info!("Reading output {number:05} in {}", params.path.display());

        let levelmax = info.count("levelmax")?;
        let lmax = match params.lmax {
            0 => levelmax,
            l if l > levelmax => {
                warn!("lmax {l} is beyond levelmax, reading up to level {levelmax}");
                levelmax
            }
            l => l,
        };

        let selection = VariableSelection::read(&paths.dir, &config.var_names, &params.variables)?;
        let sinks = SinkTable::read(&paths.dir, number, &info, &config.sink_format)?;

        let boxlen = info.float("boxlen")?;
        let unit_l = info.float("unit_l")?;
        let length_unit = config.constant(&params.scale)?;
        let center = params.center.resolve_normalised(&info, &sinks)?;

        let request = ScanRequest {
            ncpu: info.count("ncpu")?,
            lmax,
            boxlen,
            read_mask: selection.read_mask.clone(),
            crop: CropBox::new(center, params.extents, length_unit / (boxlen * unit_l)),
        };
        debug!("Region of interest {:?} to {:?}", request.crop.min, request.crop.max);

        let batches = reader.scan(&paths, &request)?;
        let units = CodeUnits::from_info(&info)?;
        let fields = assemble(&batches, &selection.names, &units, &params.scale);

        let ncells = batches.iter().map(|b| b.rows).sum::<usize>();
        info!("Read {ncells} cells and {} sinks", sinks.len());

        let boxsize = boxlen * unit_l;
        let time = info.float("time")? * units.unit_t;
        info.insert("boxsize", boxsize);
        info.insert("time", time);
        info.insert("nvar", selection.nvar);
        info.insert("ncells", ncells);
        info.insert("nsinks", sinks.len());
        info.insert("length_unit", length_unit);
        info.insert("lmax", lmax);
        info.insert("nout", number as usize);
        for key in ["xc", "yc", "zc"] {
            info.insert(key, 0.0);
        }

        let mut dataset = Self {
            ndim: info.count("ndim")?,
            info,
            params,
            fields,
            sinks,
            config,
            frame: Frame::Absolute,
            reader,
            boxsize,
        };

        let center = dataset.params.center.clone();
        dataset.to_relative(&center)?;
        Ok(dataset)
    }

    /// Evaluate the configured derived fields that do not exist yet
    ///
    /// Definitions that refer to names the dataset does not have are
    /// skipped.
    pub(crate) fn apply_additional_fields(&mut self) -> Result<()> {
        for definition in self.config.additional_fields.clone() {
            if self.fields.contains_key(&definition.name) {
                continue;
            }

            let expr = Expr::parse(&definition.operation)?;
            if let Some(missing) = self.missing_reference(&expr) {
                debug!(
                    "Skipping field \"{}\", \"{missing}\" is not available",
                    definition.name
                );
                continue;
            }

            self.new_field(
                &definition.name,
                FieldSource::Operation(definition.operation),
                &definition.unit,
                None,
            )?;
        }
        Ok(())
    }

    /// First name in an expression that is neither a field nor a scalar
    pub(crate) fn missing_reference(&self, expr: &Expr) -> Option<String> {
        let context = self.context();
        expr.references()
            .into_iter()
            .find(|r| context.field(r).is_none() && context.scalar(r).is_none())
    }

    /// Centre in absolute cm, whatever the current frame
    fn resolve(&self, center: &Center) -> Result<[f64; 3]> {
        match self.frame {
            Frame::Absolute => center.resolve_absolute(&self.context(), self.boxsize, &self.sinks),
            Frame::Relative {
                center: origin,
                length_unit: s,
            } => {
                let view = AbsoluteView::new(self, origin, s);
                let mut sinks = self.sinks.clone();
                for sink in sinks.iter_mut() {
                    to_absolute_sink(sink, origin, s, self.boxsize / s);
                }
                center.resolve_absolute(&view, self.boxsize, &sinks)
            }
        }
    }

    /// Infallible second half of a move to the relative frame
    fn apply_relative(&mut self, position: [f64; 3], s: f64) {
        for (n, axis) in AXES.iter().enumerate().take(self.ndim) {
            if let Some(field) = self.fields.get_mut(*axis) {
                field.values.iter_mut().for_each(|v| *v = (*v - position[n]) / s);
                field.unit = self.params.scale.clone();
            }
        }

        if let Some(field) = self.fields.get_mut("dx") {
            field.values.iter_mut().for_each(|v| *v /= s);
            field.unit = self.params.scale.clone();
        }

        let relative_boxsize = self.boxsize / s;
        for sink in self.sinks.iter_mut() {
            let p = sink.position();
            sink.set_position([0, 1, 2].map(|n| p[n] / s - position[n] / s));
            if let Some(r) = sink.get("radius") {
                sink.set("radius", r * relative_boxsize);
            }
        }

        self.info.insert("boxsize", relative_boxsize);
        for (key, c) in ["xc", "yc", "zc"].iter().zip(position) {
            self.info.insert(key, c / s);
        }

        self.frame = Frame::Relative {
            center: position,
            length_unit: s,
        };
    }

    pub(crate) fn log_memory(&self) {
        let values = self.fields.len() * self.ncells();
        info!("Memory used: {:.2} MB", (values * 8) as f64 / 1e6);
    }
}

/// Cell batches joined into one unit-scaled field per column
pub(crate) fn assemble(
    batches: &[CellBatch],
    names: &[String],
    units: &CodeUnits,
    scale: &str,
) -> BTreeMap<String, Field> {
    let ncells = batches.iter().map(|b| b.rows).sum();

    names
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let (factor, unit) = units.rule(name, scale);
            let mut values = Vec::with_capacity(ncells);
            for batch in batches {
                values.extend(batch.column(j).map(|v| v * factor));
            }
            (name.clone(), Field::primary(values, unit))
        })
        .collect()
}

fn absolute(v: f64, c: f64, s: f64) -> f64 {
    (v + c / s) * s
}

/// `relative_boxsize` is the box size in the length scale
fn to_absolute_sink(sink: &mut Sink, center: [f64; 3], s: f64, relative_boxsize: f64) {
    let p = sink.position();
    sink.set_position([0, 1, 2].map(|n| absolute(p[n], center[n], s)));
    if let Some(r) = sink.get("radius") {
        sink.set("radius", r / relative_boxsize);
    }
}

/// Absolute copies of the coordinates over a relative dataset
struct AbsoluteView<'a> {
    context: Context<'a>,
    coordinates: BTreeMap<&'static str, Vec<f64>>,
}

impl<'a> AbsoluteView<'a> {
    fn new(dataset: &'a Dataset, center: [f64; 3], s: f64) -> Self {
        let mut coordinates = BTreeMap::new();
        for (n, axis) in AXES.iter().enumerate().take(dataset.ndim) {
            if let Some(field) = dataset.fields.get(*axis) {
                let values = field.values.iter().map(|v| absolute(*v, center[n], s));
                coordinates.insert(*axis, values.collect());
            }
        }
        if let Some(field) = dataset.fields.get("dx") {
            coordinates.insert("dx", field.values.iter().map(|v| v * s).collect());
        }

        Self {
            context: dataset.context(),
            coordinates,
        }
    }
}

impl Scope for AbsoluteView<'_> {
    fn field(&self, name: &str) -> Option<&[f64]> {
        self.coordinates
            .get(name)
            .map(Vec::as_slice)
            .or_else(|| self.context.field(name))
    }

    fn scalar(&self, name: &str) -> Option<f64> {
        self.context.scalar(name)
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let number = self.info.count("nout").unwrap_or_default();
        let head = f!(" > RAMSES output {number:05} [{}D]", self.ndim);
        let mut s = f!("{}\n{}\n{}\n", "-".repeat(60), head, "-".repeat(60));

        let time_scale = &self.config.time_scale;
        let time = self.info.number("time").unwrap_or_default();
        s += &match self.config.constant(time_scale) {
            Ok(t) => f!("time    : {} {time_scale}\n", (time / t).sci(4, 2)),
            Err(_) => f!("time    : {} s\n", time.sci(4, 2)),
        };

        let scale = &self.params.scale;
        let boxsize = self.info.number("boxsize").unwrap_or_default();
        match self.frame {
            Frame::Absolute => {
                s += &f!("boxsize : {} cm\n", boxsize.sci(4, 2));
                s += "frame   : absolute\n";
            }
            Frame::Relative { center, .. } => {
                s += &f!("boxsize : {} {scale}\n", boxsize.sci(4, 2));
                s += &f!("center  : {} cm\n", describe(&center));
            }
        }

        s += &f!("ncells  : {}\n", self.ncells());
        if !self.sinks.is_empty() {
            s += &f!("sinks   : {}\n", self.sinks.iter().map(|(k, _)| k).join(", "));
        }

        s += &f!(
            "\n{:<24} {:<10} {:>12} {:>12}\n",
            "field",
            "unit",
            "min",
            "max"
        );
        for (name, field) in &self.fields {
            let (min, max) = match (field.min(), field.max()) {
                (Ok(min), Ok(max)) => (min.sci(4, 2), max.sci(4, 2)),
                _ => ("-".to_string(), "-".to_string()),
            };
            s += &f!("{name:<24} {:<10} {min:>12} {max:>12}\n", field.unit);
        }

        write!(f, "{s}")
    }
}
