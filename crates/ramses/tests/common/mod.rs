//! Synthetic RAMSES outputs written at test time
//!
//! Every CPU file holds the grids of every domain, the ones owned by other
//! CPUs carry -1 for all hydro values so that a bad record skip shows up
//! as negative data.

#![allow(dead_code)]

use amrtools_fortran::RecordWriter;
use amrtools_ramses::{Config, SnapshotPaths};
use std::path::Path;

pub const VARIABLES: [&str; 3] = ["density", "velocity_x", "thermal_pressure"];

/// One oct, with values per variable (outer) and octant (inner)
#[derive(Debug, Clone)]
pub struct Grid {
    pub center: [f64; 3],
    pub son: [i32; 8],
    pub vars: Vec<[f64; 8]>,
}

impl Grid {
    /// Childless grid where variable `ivar` of octant `ind` is
    /// `base * (ivar + 1) + ind`
    pub fn leaf(center: [f64; 3], base: f64) -> Self {
        let vars = (0..VARIABLES.len())
            .map(|ivar| std::array::from_fn(|ind| base * (ivar + 1) as f64 + ind as f64))
            .collect();
        Self {
            center,
            son: [0; 8],
            vars,
        }
    }

    pub fn with_son(mut self, ind: usize, son: i32) -> Self {
        self.son[ind] = son;
        self
    }

    pub fn scaled(mut self, factor: f64) -> Self {
        for var in self.vars.iter_mut() {
            var.iter_mut().for_each(|v| *v *= factor);
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub ndim: usize,
    pub nx: [i32; 3],
    pub ncpu: usize,
    pub nboundary: usize,
    pub levelmax: usize,
    pub boxlen: f64,
    pub unit_l: f64,
    pub unit_d: f64,
    pub unit_t: f64,
    pub time: f64,
    /// Grids per level (outer) and domain (inner), CPUs then boundaries
    pub grids: Vec<Vec<Vec<Grid>>>,
    pub descriptor: bool,
    pub sinks: Option<String>,
}

impl Snapshot {
    pub fn new(ncpu: usize, nboundary: usize, levelmax: usize) -> Self {
        Self {
            ndim: 3,
            nx: [1, 1, 1],
            ncpu,
            nboundary,
            levelmax,
            boxlen: 1.0,
            unit_l: 2.0,
            unit_d: 3.0,
            unit_t: 4.0,
            time: 0.25,
            grids: vec![vec![Vec::new(); ncpu + nboundary]; levelmax],
            descriptor: true,
            sinks: None,
        }
    }

    /// Root grid on CPU 1 refined in octant 0, the child grid on CPU 2
    ///
    /// Leaf cells are octants 1 to 7 of level 1 and all 8 of level 2.
    pub fn two_levels() -> Self {
        let mut snapshot = Self::new(2, 0, 2);
        snapshot.grids[0][0].push(Grid::leaf([0.5; 3], 1.0).with_son(0, 2));
        snapshot.grids[1][1].push(Grid::leaf([0.25; 3], 20.0));
        snapshot
    }

    pub fn scaled(mut self, factor: f64) -> Self {
        for level in self.grids.iter_mut() {
            for domain in level.iter_mut() {
                for grid in domain.iter_mut() {
                    *grid = grid.clone().scaled(factor);
                }
            }
        }
        self
    }

    fn twotondim(&self) -> usize {
        1 << self.ndim
    }

    fn ndomains(&self) -> usize {
        self.ncpu + self.nboundary
    }

    /// Grid counts in Fortran order for a range of domains
    fn counts(&self, domains: std::ops::Range<usize>) -> Vec<i32> {
        (0..self.levelmax)
            .flat_map(|l| domains.clone().map(move |d| (l, d)))
            .map(|(l, d)| self.grids[l][d].len() as i32)
            .collect()
    }

    pub fn write(&self, run_dir: &Path, number: u32) {
        let paths = SnapshotPaths::new(run_dir, number);
        std::fs::create_dir_all(&paths.dir).unwrap();

        std::fs::write(paths.info(), self.info_text()).unwrap();

        if self.descriptor {
            let mut text = "# version:  1\n# ivar, variable_name, variable_type\n".to_string();
            for (i, name) in VARIABLES.iter().enumerate() {
                text += &format!("{:>2}, {name}, d\n", i + 1);
            }
            std::fs::write(paths.dir.join("hydro_file_descriptor.txt"), text).unwrap();
        }

        if let Some(sinks) = &self.sinks {
            std::fs::write(paths.dir.join(format!("sink_{number:05}.csv")), sinks).unwrap();
        }

        for icpu in 0..self.ncpu {
            self.amr(icpu).write_to(paths.amr(icpu + 1)).unwrap();
            self.hydro(icpu).write_to(paths.hydro(icpu + 1)).unwrap();
        }
    }

    fn info_text(&self) -> String {
        let int = |k: &str, v: usize| format!("{k:<12}={v:>11}\n");
        let real = |k: &str, v: f64| format!("{k:<12}={v:>23.15E}\n");

        let mut s = String::new();
        s += &int("ncpu", self.ncpu);
        s += &int("ndim", self.ndim);
        s += &int("levelmin", 1);
        s += &int("levelmax", self.levelmax);
        s += &int("ngridmax", 1000);
        s += &int("nstep_coarse", 10);
        s += "\n";
        s += &real("boxlen", self.boxlen);
        s += &real("time", self.time);
        s += &real("aexp", 1.0);
        s += &real("unit_l", self.unit_l);
        s += &real("unit_d", self.unit_d);
        s += &real("unit_t", self.unit_t);
        s += "\n";
        s += "ordering type=hilbert\n";
        s += "   DOMAIN   ind_min                 ind_max\n";
        for icpu in 0..self.ncpu {
            s += &format!("{:>8}   {:>23.15E} {:>23.15E}\n", icpu + 1, 0.0, 1.0);
        }
        s
    }

    fn amr(&self, icpu: usize) -> RecordWriter {
        let ncpu = self.ncpu as i32;
        let nlevel = self.levelmax * self.ncpu;
        let nbound = self.levelmax * self.nboundary;
        let noutput = 2;
        let ncoarse = self.nx.iter().product::<i32>() as usize;

        let mut w = RecordWriter::new();
        w.write_i32s(&[ncpu])
            .write_i32s(&[self.ndim as i32])
            .write_i32s(&self.nx)
            .write_i32s(&[self.levelmax as i32])
            .write_i32s(&[1000])
            .write_i32s(&[self.nboundary as i32])
            .write_i32s(&[3])
            .write_f64s(&[self.boxlen])
            .write_i32s(&[noutput as i32, 1, 1])
            .write_f64s(&vec![0.5; noutput])
            .write_f64s(&vec![1.0; noutput])
            .write_f64s(&[self.time])
            .write_f64s(&vec![1e-3; self.levelmax])
            .write_f64s(&vec![1e-3; self.levelmax])
            .write_i32s(&[10, 10])
            .write_f64s(&[0.0; 3])
            .write_f64s(&[0.0; 7])
            .write_f64s(&[0.0; 5])
            .write_f64s(&[0.0])
            // headl, taill, numbl and numbtot
            .write_i32s(&vec![1; nlevel])
            .write_i32s(&vec![1; nlevel])
            .write_i32s(&self.counts(0..self.ncpu))
            .write_i32s(&vec![0; 10 * self.levelmax]);

        if self.nboundary > 0 {
            w.write_i32s(&vec![1; nbound])
                .write_i32s(&vec![1; nbound])
                .write_i32s(&self.counts(self.ncpu..self.ndomains()));
        }

        let mut ordering = b"hilbert".to_vec();
        ordering.resize(128, b' ');

        w.write_i32s(&[0; 5])
            .write_bytes(&ordering)
            .write_bytes(&vec![7u8; 16 * (self.ncpu + 1)])
            .write_i32s(&vec![1; ncoarse])
            .write_i32s(&vec![0; ncoarse])
            .write_i32s(&vec![icpu as i32 + 1; ncoarse]);

        for level in &self.grids {
            for grids in level.iter().filter(|g| !g.is_empty()) {
                let n = grids.len() as i32;
                let ids: Vec<i32> = (1..=n).collect();
                w.write_i32s(&ids).write_i32s(&ids).write_i32s(&ids);

                for dim in 0..self.ndim {
                    let xg: Vec<f64> = grids.iter().map(|g| g.center[dim]).collect();
                    w.write_f64s(&xg);
                }

                // father and neighbours
                for _ in 0..1 + 2 * self.ndim {
                    w.write_i32s(&vec![0; grids.len()]);
                }

                for ind in 0..self.twotondim() {
                    let son: Vec<i32> = grids.iter().map(|g| g.son[ind]).collect();
                    w.write_i32s(&son);
                }

                // cpu_map and flag1
                for _ in 0..2 * self.twotondim() {
                    w.write_i32s(&vec![icpu as i32 + 1; grids.len()]);
                }
            }
        }

        w
    }

    fn hydro(&self, icpu: usize) -> RecordWriter {
        let mut w = RecordWriter::new();
        w.write_i32s(&[self.ncpu as i32])
            .write_i32s(&[VARIABLES.len() as i32])
            .write_i32s(&[self.ndim as i32])
            .write_i32s(&[self.levelmax as i32])
            .write_i32s(&[self.nboundary as i32])
            .write_f64s(&[1.4]);

        for (ilevel, level) in self.grids.iter().enumerate() {
            for (idomain, grids) in level.iter().enumerate() {
                w.write_i32s(&[ilevel as i32 + 1])
                    .write_i32s(&[grids.len() as i32]);

                if grids.is_empty() {
                    continue;
                }

                for ind in 0..self.twotondim() {
                    for ivar in 0..VARIABLES.len() {
                        let values: Vec<f64> = grids
                            .iter()
                            .map(|g| if idomain == icpu { g.vars[ivar][ind] } else { -1.0 })
                            .collect();
                        w.write_f64s(&values);
                    }
                }
            }
        }

        w
    }
}

/// Configuration with a plain cm length scale
pub fn config() -> Config {
    let mut config = Config::default();
    config.length_scale = "cm".into();
    config
}
