//! Header records of the AMR and hydro files
//!
//! The header layout of an AMR file is irregular, so every value needed is
//! read at an explicit position. A `RecordCursor` counts what comes before
//! the value in question.
//!
//! | Record(s)                          | Type     | Count                 |
//! | ---------------------------------- | -------- | --------------------- |
//! | ncpu, ndim                         | int      | 1 each                |
//! | nx ny nz                           | int      | 3                     |
//! | nlevelmax, ngridmax, nboundary     | int      | 1 each                |
//! | ngrid_current                      | int      | 1                     |
//! | boxlen                             | double   | 1                     |
//! | noutput iout ifout                 | int      | 3                     |
//! | tout, aout                         | double   | noutput each          |
//! | t                                  | double   | 1                     |
//! | dtold, dtnew                       | double   | nlevelmax each        |
//! | nstep nstep_coarse                 | int      | 2                     |
//! | cosmology, expansion, star, sph    | double   | 3, 7, 5, 1            |
//! | headl, taill, numbl                | int      | ncpu x nlevelmax each |
//! | numbtot                            | int      | 10 x nlevelmax        |
//! | headb, tailb, numbb (boundaries)   | int      | nboundary x nlevelmax |
//! | free memory                        | int      | 5                     |
//! | ordering                           | char     | 128                   |
//! | bound_key                          | any      | key_size bytes        |
//! | son, flag1, cpu_map (coarse)       | int      | nx ny nz each         |

// crate modules
use crate::error::{Error, Result};

// external crates
use amrtools_fortran::{read_i32, read_i32s, read_record_length, read_struct, RecordCursor};
use amrtools_utils::f;
use serde::Deserialize;

/// Coarse mesh dimensions, read in one go
#[derive(Debug, Deserialize)]
struct MeshSize {
    nx: i32,
    ny: i32,
    nz: i32,
}

/// Everything needed from the header of a single AMR file
#[derive(Debug, Clone, PartialEq)]
pub struct AmrHeader {
    /// Number of CPU domains
    pub ncpu: usize,
    /// Number of dimensions
    pub ndim: usize,
    /// Coarse mesh size on each axis
    pub nx: [usize; 3],
    /// Maximum refinement level of the run
    pub levelmax: usize,
    /// Number of boundary domains
    pub nboundary: usize,
    /// Number of outputs requested in the run
    pub noutput: usize,
    /// Size in bytes of the domain decomposition keys
    pub key_size: usize,
    /// Number of grids for each level (outer) and domain (inner)
    ///
    /// The domains are the `ncpu` CPU domains followed by the boundaries.
    pub ngridlevel: Vec<Vec<usize>>,
}

impl AmrHeader {
    /// Parse the header of an AMR file held in `buffer`
    pub fn parse(buffer: &[u8]) -> Result<Self> {
        let mut cursor = RecordCursor::new();
        let ncpu = count(read_i32(buffer, &cursor)?)?;

        cursor = position(1, 0, 1);
        let ndim = count(read_i32(buffer, &cursor)?)?;
        if !(1..=3).contains(&ndim) {
            return Err(Error::ParseError(f!("ndim {ndim} in AMR header is not 1, 2 or 3")));
        }

        cursor = position(2, 0, 2);
        let size: MeshSize = read_struct(buffer, &cursor, 12)?;
        let nx = [count(size.nx)?, count(size.ny)?, count(size.nz)?];

        cursor = position(5, 0, 3);
        let levelmax = count(read_i32(buffer, &cursor)?)?;

        cursor = position(7, 0, 5);
        let nboundary = count(read_i32(buffer, &cursor)?)?;

        cursor = position(9, 1, 8);
        let noutput = count(read_i32(buffer, &cursor)?)?;

        let nfloat = header_floats(noutput, levelmax);

        // numbl is stored in Fortran order, i.e. ncpu values per level
        cursor = position(14 + 2 * ncpu * levelmax, nfloat, 21);
        let numbl = read_i32s(buffer, &cursor, ncpu * levelmax)?;

        let numbb = if nboundary > 0 {
            cursor = position(
                14 + 3 * ncpu * levelmax + 10 * levelmax + 2 * nboundary * levelmax,
                nfloat,
                25,
            );
            read_i32s(buffer, &cursor, nboundary * levelmax)?
        } else {
            Vec::new()
        };

        let ngridlevel = (0..levelmax)
            .map(|ilevel| {
                let cpus = &numbl[ilevel * ncpu..(ilevel + 1) * ncpu];
                let bounds = &numbb[ilevel * nboundary..(ilevel + 1) * nboundary];
                cpus.iter().chain(bounds).map(|n| count(*n)).collect()
            })
            .collect::<Result<Vec<Vec<usize>>>>()?;

        let key_size = read_record_length(buffer, &key_cursor(ncpu, levelmax, nboundary, nfloat))?;

        Ok(Self {
            ncpu,
            ndim,
            nx,
            levelmax,
            nboundary,
            noutput,
            key_size,
            ngridlevel,
        })
    }

    /// Cell count of the coarse mesh
    pub fn ncoarse(&self) -> usize {
        self.nx.iter().product()
    }

    /// Number of CPU and boundary domains
    pub fn ndomains(&self) -> usize {
        self.ncpu + self.nboundary
    }

    /// Half the coarse mesh extent, with integer division
    pub fn xbound(&self) -> [f64; 3] {
        self.nx.map(|n| (n / 2) as f64)
    }

    /// Position of the first level data record, after the coarse arrays
    pub fn data_cursor(&self) -> RecordCursor {
        let nfloat = header_floats(self.noutput, self.levelmax);
        let mut cursor = key_cursor(self.ncpu, self.levelmax, self.nboundary, nfloat);
        cursor
            .skip_string_records(1, self.key_size)
            .skip_int_records(3, self.ncoarse());
        cursor
    }
}

/// Position of the first level data record in a hydro file
///
/// The header is `ncpu`, `nvar`, `ndim`, `nlevelmax`, `nboundary` and
/// `gamma`.
pub fn hydro_data_cursor() -> RecordCursor {
    position(5, 1, 6)
}

/// Doubles in the header before the grid lists
fn header_floats(noutput: usize, levelmax: usize) -> usize {
    18 + 2 * noutput + 2 * levelmax
}

/// Payload position of the bound key record
///
/// The payload size varies with the ordering, so only the leading marker
/// can tell how large it is.
fn key_cursor(ncpu: usize, levelmax: usize, nboundary: usize, nfloat: usize) -> RecordCursor {
    RecordCursor {
        ninteg: 14 + 3 * ncpu * levelmax + 10 * levelmax + 3 * nboundary * levelmax + 5,
        nfloat,
        nlines: 21 + 2 + 3 * nboundary.min(1) + 1 + 1,
        nstrin: 128,
        nquadr: 0,
    }
}

/// Fixed header positions never involve strings or quads
fn position(ninteg: usize, nfloat: usize, nlines: usize) -> RecordCursor {
    RecordCursor {
        ninteg,
        nfloat,
        nlines,
        ..Default::default()
    }
}

fn count(value: i32) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| Error::ParseError(f!("negative count {value} in AMR header")))
}
