// crate modules
use crate::error::Result;
use crate::reader::header::{hydro_data_cursor, AmrHeader};
use crate::reader::snapshot::SnapshotPaths;

// standard library
use std::path::Path;

// external crates
use amrtools_fortran::{read_f64s, read_file, read_i32, read_i32s, RecordCursor};
use kdam::{Bar, BarBuilder, BarExt};
use log::{debug, error, warn};
use rayon::prelude::*;

/// Leaf cells of one domain at one level
///
/// Values are stored row-major, one row per cell with the selected hydro
/// variables followed by `level`, `x`, `y`, `z` and `dx`.
#[derive(Debug, Clone, PartialEq)]
pub struct CellBatch {
    /// Number of cells
    pub rows: usize,
    /// Number of values per cell
    pub columns: usize,
    /// Flat row-major values
    pub values: Vec<f64>,
}

impl CellBatch {
    fn new(columns: usize) -> Self {
        Self {
            rows: 0,
            columns,
            values: Vec::new(),
        }
    }

    fn push_row(&mut self, row: &[f64]) {
        self.values.extend_from_slice(row);
        self.rows += 1;
    }

    /// Values of the cell at index `row`
    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.columns..(row + 1) * self.columns]
    }

    /// Iterate over the values of one column
    pub fn column(&self, column: usize) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().skip(column).step_by(self.columns).copied()
    }
}

/// Region of interest in normalised box units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropBox {
    /// Lower corner
    pub min: [f64; 3],
    /// Upper corner
    pub max: [f64; 3],
}

impl Default for CropBox {
    fn default() -> Self {
        Self {
            min: [0.0; 3],
            max: [1.0; 3],
        }
    }
}

impl CropBox {
    /// Box around `center` with full widths `extents` in the length scale
    ///
    /// `lconvert` is the size of one length scale unit in units of the box,
    /// i.e. `scale / (boxlen * unit_l)`. Axes with no extent are not cropped.
    ///
    /// ```rust
    /// # use amrtools_ramses::CropBox;
    /// let crop = CropBox::new([0.5; 3], [0.5, 0.0, 0.0], 1.0);
    /// assert_eq!(crop.min, [0.25, 0.0, 0.0]);
    /// assert_eq!(crop.max, [0.75, 1.0, 1.0]);
    /// ```
    pub fn new(center: [f64; 3], extents: [f64; 3], lconvert: f64) -> Self {
        let mut crop = Self::default();
        for n in 0..3 {
            if extents[n] > 0.0 {
                let half = 0.5 * extents[n] * lconvert;
                crop.min[n] = center[n] - half;
                crop.max[n] = center[n] + half;
            }
        }
        crop
    }

    /// True if the cell of half width `h` at `c` overlaps on the active axes
    pub fn intersects(&self, c: &[f64; 3], h: f64, ndim: usize) -> bool {
        (0..ndim).all(|n| c[n] + h >= self.min[n] && c[n] - h <= self.max[n])
    }
}

/// Everything a CPU scan needs to know about the load
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    /// Number of CPU files
    pub ncpu: usize,
    /// Deepest level to read, 1-based
    pub lmax: usize,
    /// Box length in code units
    pub boxlen: f64,
    /// One flag per hydro variable, true if it is read
    pub read_mask: Vec<bool>,
    /// Region of interest
    pub crop: CropBox,
}

impl ScanRequest {
    /// Values per cell, the selected variables plus five geometry columns
    pub fn columns(&self) -> usize {
        self.read_mask.iter().filter(|r| **r).count() + 5
    }
}

/// Reconstructs leaf cells from the AMR and hydro files of a snapshot
///
/// Each CPU file pair is scanned level by level and domain by domain. Every
/// scan keeps one [RecordCursor] per file that is threaded forward through
/// all the records, so only cells of the domain owned by that CPU are
/// decoded while the rest are stepped over.
///
/// ```rust, no_run
/// # use amrtools_ramses::reader::{CropBox, ScanRequest, SnapshotReader};
/// # use amrtools_ramses::SnapshotPaths;
/// let request = ScanRequest {
///     ncpu: 4,
///     lmax: 10,
///     boxlen: 1.0,
///     read_mask: vec![true; 11],
///     crop: CropBox::default(),
/// };
///
/// let mut reader = SnapshotReader::new();
/// reader.disable_progress();
/// let batches = reader.scan(&SnapshotPaths::new("run", 12), &request).unwrap();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotReader {
    /// Disable progress bar?
    disable_progress: bool,
    /// Scan CPU files on the rayon thread pool?
    parallel: bool,
}

// ! ------------------------------------------------------------------------
// !                                Public API
// ! ------------------------------------------------------------------------

impl SnapshotReader {
    /// Just calls Default::default(), nothing special to be initialised
    pub fn new() -> Self {
        Default::default()
    }

    /// Do not print the progress bar
    pub fn disable_progress(&mut self) {
        self.disable_progress = true;
    }

    /// Scan CPU files in parallel
    ///
    /// Results are identical to the serial scan since batches are still
    /// collected in CPU order. No progress bar is shown.
    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel;
    }

    /// Scan every CPU file of a snapshot for leaf cells
    pub fn scan(&self, paths: &SnapshotPaths, request: &ScanRequest) -> Result<Vec<CellBatch>> {
        debug!(
            "Processing {} files in {}",
            request.ncpu,
            paths.dir.display()
        );

        let batches = if self.parallel {
            (0..request.ncpu)
                .into_par_iter()
                .map(|icpu| scan_cpu(paths, request, icpu))
                .collect::<Result<Vec<Vec<CellBatch>>>>()?
                .into_iter()
                .flatten()
                .collect()
        } else {
            self.scan_serial(paths, request)?
        };

        Ok(batches)
    }
}

// ! ------------------------------------------------------------------------
// !                              Implementation
// ! ------------------------------------------------------------------------

impl SnapshotReader {
    fn scan_serial(&self, paths: &SnapshotPaths, request: &ScanRequest) -> Result<Vec<CellBatch>> {
        let mut progress_bar = self.init_progress_bar(request.ncpu);
        if !self.disable_progress {
            progress_bar.refresh()?;
        }

        let mut batches = Vec::new();
        let mut reported = 0;

        for icpu in 0..request.ncpu {
            batches.extend(scan_cpu(paths, request, icpu)?);
            progress_bar.update(1)?;

            let percent = 10 * (icpu + 1) / request.ncpu;
            if percent > reported {
                reported = percent;
                debug!("{:>3}% of CPU files read", 10 * percent);
            }
        }

        // need an extra line for clean spacing if the progress bar is printed
        if !self.disable_progress {
            eprintln!()
        };

        Ok(batches)
    }

    /// Initialise the progress bar, if wanted
    fn init_progress_bar(&self, total: usize) -> Bar {
        BarBuilder::default()
            .total(total)
            .unit(" files")
            .disable(self.disable_progress)
            .bar_format("{desc}{count}/{total} files [{elapsed}]   ")
            .desc("Reading ")
            .build()
            .expect("Failed to initialise progress bar")
    }
}

/// Leaf cells of a single CPU file pair, `icpu` counting from 0
fn scan_cpu(paths: &SnapshotPaths, request: &ScanRequest, icpu: usize) -> Result<Vec<CellBatch>> {
    let amr = load(&paths.amr(icpu + 1))?;
    let hydro = load(&paths.hydro(icpu + 1))?;

    let header = AmrHeader::parse(&amr)?;
    if header.ncpu != request.ncpu {
        warn!(
            "AMR file {} reports {} CPUs, expected {}",
            icpu + 1,
            header.ncpu,
            request.ncpu
        );
    }

    // the hydro file knows best how many variables it holds
    let nvar = read_i32(&hydro, &RecordCursor { ninteg: 1, nlines: 1, ..Default::default() })?
        .max(0) as usize;

    let layout = Layout {
        ndim: header.ndim,
        twotondim: 1 << header.ndim,
        nvar,
        xbound: header.xbound(),
    };

    let mut amr_cursor = header.data_cursor();
    let mut hydro_cursor = hydro_data_cursor();
    let mut batches = Vec::new();

    for ilevel in 0..request.lmax.min(header.levelmax) {
        for idomain in 0..header.ndomains() {
            let ncache = header.ngridlevel[ilevel][idomain];

            // ilevel and ncache are always written to the hydro file
            hydro_cursor.skip_int_records(2, 1);

            if ncache == 0 {
                continue;
            }

            if idomain == icpu {
                let grids = Grids {
                    ilevel,
                    ncache,
                    amr_cursor,
                    hydro_cursor,
                };
                let batch = extract(&amr, &hydro, &grids, &layout, request)?;
                if batch.rows > 0 {
                    batches.push(batch);
                }
            }

            // ind_grid, next, prev, xg, father, nbor, son, cpu_map, flag
            amr_cursor
                .skip_int_records(3, ncache)
                .skip_float_records(layout.ndim, ncache)
                .skip_int_records(1 + 2 * layout.ndim + 3 * layout.twotondim, ncache);

            // one record per variable per octant
            hydro_cursor.skip_float_records(layout.twotondim * layout.nvar, ncache);
        }
    }

    Ok(batches)
}

fn load(path: &Path) -> Result<Vec<u8>> {
    read_file(path).map_err(|e| {
        error!("Unable to read {}", path.display());
        e.into()
    })
}

/// Per-file constants of the record layout
struct Layout {
    ndim: usize,
    twotondim: usize,
    nvar: usize,
    xbound: [f64; 3],
}

/// Grids of one domain at one level, with cursors at their first records
struct Grids {
    ilevel: usize,
    ncache: usize,
    amr_cursor: RecordCursor,
    hydro_cursor: RecordCursor,
}

/// Decode the grids of the domain owned by the current CPU
fn extract(
    amr: &[u8],
    hydro: &[u8],
    grids: &Grids,
    layout: &Layout,
    request: &ScanRequest,
) -> Result<CellBatch> {
    let ncache = grids.ncache;
    let level = (grids.ilevel + 1) as f64;
    let dxcell = 0.5f64.powi(grids.ilevel as i32 + 1);

    // grid centres, after ind_grid, next and prev
    let mut xg = vec![vec![0.0; ncache]; 3];
    for (n, axis) in xg.iter_mut().enumerate().take(layout.ndim) {
        let mut cursor = grids.amr_cursor;
        cursor
            .skip_int_records(3, ncache)
            .skip_float_records(n, ncache);
        *axis = read_f64s(amr, &cursor, ncache)?;
    }

    // son indices, after father and the neighbours
    let son = (0..layout.twotondim)
        .map(|ind| {
            let mut cursor = grids.amr_cursor;
            cursor
                .skip_int_records(3, ncache)
                .skip_float_records(layout.ndim, ncache)
                .skip_int_records(1 + 2 * layout.ndim + ind, ncache);
            read_i32s(amr, &cursor, ncache)
        })
        .collect::<std::result::Result<Vec<Vec<i32>>, _>>()?;

    // selected hydro variables for every octant
    let mut variables: Vec<Vec<Vec<f64>>> = Vec::with_capacity(layout.twotondim);
    for ind in 0..layout.twotondim {
        let mut octant = Vec::new();
        for ivar in (0..layout.nvar).filter(|i| request.read_mask.get(*i) == Some(&true)) {
            let mut cursor = grids.hydro_cursor;
            cursor.skip_float_records(ind * layout.nvar + ivar, ncache);
            octant.push(read_f64s(hydro, &cursor, ncache)?);
        }
        variables.push(octant);
    }

    let offsets: Vec<[f64; 3]> = (0..layout.twotondim)
        .map(|ind| octant_offset(ind, dxcell))
        .collect();

    let columns = request.columns();
    let mut batch = CellBatch::new(columns);
    let mut row = vec![0.0; columns];
    let half = 0.5 * dxcell;

    for igrid in 0..ncache {
        for ind in 0..layout.twotondim {
            if !is_leaf(son[ind][igrid], grids.ilevel + 1, request.lmax) {
                continue;
            }

            let mut xyz = [0.0; 3];
            for n in 0..layout.ndim {
                xyz[n] = xg[n][igrid] + offsets[ind][n] - layout.xbound[n];
            }

            if !request.crop.intersects(&xyz, half, layout.ndim) {
                continue;
            }

            // a variable missing from the file leaves its column at zero
            row.fill(0.0);
            for (value, var) in row.iter_mut().zip(&variables[ind]) {
                *value = var[igrid];
            }
            let geometry = &mut row[columns - 5..];
            geometry[0] = level;
            for (g, x) in geometry[1..4].iter_mut().zip(xyz) {
                *g = x * request.boxlen;
            }
            geometry[4] = dxcell * request.boxlen;

            batch.push_row(&row);
        }
    }

    Ok(batch)
}

/// Centre of octant `ind` relative to its grid centre
///
/// ```text
/// iz = ind / 4, iy = (ind - 4 iz) / 2, ix = ind - 2 iy - 4 iz
/// ```
fn octant_offset(ind: usize, dxcell: f64) -> [f64; 3] {
    let iz = ind / 4;
    let iy = (ind - 4 * iz) / 2;
    let ix = ind - 2 * iy - 4 * iz;
    [ix, iy, iz].map(|i| (i as f64 - 0.5) * dxcell)
}

/// Refined cells are only kept at the deepest level read
fn is_leaf(son: i32, level: usize, lmax: usize) -> bool {
    !(son > 0 && level < lmax)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octant_offsets() {
        assert_eq!(octant_offset(0, 1.0), [-0.5, -0.5, -0.5]);
        assert_eq!(octant_offset(1, 1.0), [0.5, -0.5, -0.5]);
        assert_eq!(octant_offset(2, 1.0), [-0.5, 0.5, -0.5]);
        assert_eq!(octant_offset(5, 0.5), [0.25, -0.25, 0.25]);
        assert_eq!(octant_offset(7, 0.5), [0.25, 0.25, 0.25]);
    }

    #[test]
    fn leaf_rule() {
        assert!(is_leaf(0, 1, 3));
        assert!(!is_leaf(12, 1, 3));
        assert!(!is_leaf(12, 2, 3));
        // refined cells at the deepest level read are kept
        assert!(is_leaf(12, 3, 3));
    }

    #[test]
    fn crop_intersection() {
        let crop = CropBox::new([0.5; 3], [0.5, 0.5, 0.5], 1.0);
        assert!(crop.intersects(&[0.5, 0.5, 0.5], 0.125, 3));
        // touching the boundary still counts
        assert!(crop.intersects(&[0.875, 0.5, 0.5], 0.125, 3));
        assert!(!crop.intersects(&[0.9375, 0.5, 0.5], 0.125, 3));
        // unused axes are ignored
        assert!(crop.intersects(&[0.5, 0.5, 100.0], 0.125, 2));
    }

    #[test]
    fn batch_columns() {
        let mut batch = CellBatch::new(2);
        batch.push_row(&[1.0, 2.0]);
        batch.push_row(&[3.0, 4.0]);
        assert_eq!(batch.rows, 2);
        assert_eq!(batch.row(1), &[3.0, 4.0]);
        assert_eq!(batch.column(1).collect::<Vec<f64>>(), vec![2.0, 4.0]);
    }
}
