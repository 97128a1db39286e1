//! File naming of snapshot outputs

// crate modules
use crate::error::{Error, Result};

// standard library
use std::path::{Path, PathBuf};

// external crates
use amrtools_utils::f;
use log::debug;

/// Which output to read from a run directory
///
/// ```rust
/// # use amrtools_ramses::Output;
/// # use std::str::FromStr;
/// assert_eq!(Output::from_str("12").unwrap(), Output::Number(12));
/// assert_eq!(Output::from_str("latest").unwrap(), Output::Latest);
/// assert!(Output::from_str("first").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// A specific output number, e.g. 12 for `output_00012`
    Number(u32),
    /// The highest numbered output found in the run directory
    Latest,
}

impl Default for Output {
    fn default() -> Self {
        Output::Number(1)
    }
}

impl std::str::FromStr for Output {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "latest" | "last" => Ok(Output::Latest),
            n => n
                .parse::<u32>()
                .map(Output::Number)
                .map_err(|_| Error::ParseError(f!("invalid output \"{s}\""))),
        }
    }
}

impl std::fmt::Display for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Output::Number(n) => write!(f, "{n}"),
            Output::Latest => write!(f, "latest"),
        }
    }
}

impl Output {
    /// Output number, searching the run directory for [Output::Latest]
    pub fn resolve<P: AsRef<Path>>(&self, run_dir: P) -> Result<u32> {
        match self {
            Output::Number(n) => Ok(*n),
            Output::Latest => {
                let run_dir = run_dir.as_ref();
                let latest = std::fs::read_dir(run_dir)
                    .map_err(|_| Error::OutputNotFound(run_dir.to_path_buf()))?
                    .filter_map(|entry| entry.ok())
                    .filter(|entry| entry.path().is_dir())
                    .filter_map(|entry| output_number(&entry.file_name().to_string_lossy()))
                    .max()
                    .ok_or_else(|| Error::OutputNotFound(run_dir.to_path_buf()))?;
                debug!("Latest output is {latest}");
                Ok(latest)
            }
        }
    }
}

/// Paths to every file of a single output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPaths {
    /// Output number
    pub number: u32,
    /// The `output_NNNNN` directory
    pub dir: PathBuf,
}

impl SnapshotPaths {
    /// Paths for output `number` inside the run directory
    ///
    /// ```rust
    /// # use amrtools_ramses::SnapshotPaths;
    /// # use std::path::PathBuf;
    /// let paths = SnapshotPaths::new("run", 7);
    /// assert_eq!(paths.info(), PathBuf::from("run/output_00007/info_00007.txt"));
    /// assert_eq!(paths.amr(3), PathBuf::from("run/output_00007/amr_00007.out00003"));
    /// assert_eq!(paths.hydro(12), PathBuf::from("run/output_00007/hydro_00007.out00012"));
    /// ```
    pub fn new<P: AsRef<Path>>(run_dir: P, number: u32) -> Self {
        Self {
            number,
            dir: run_dir.as_ref().join(f!("output_{number:05}")),
        }
    }

    /// The `info_NNNNN.txt` metadata file
    pub fn info(&self) -> PathBuf {
        self.dir.join(f!("info_{:05}.txt", self.number))
    }

    /// AMR file of a CPU, numbered from 1
    pub fn amr(&self, cpu: usize) -> PathBuf {
        self.dir.join(f!("amr_{:05}.out{cpu:05}", self.number))
    }

    /// Hydro file of a CPU, numbered from 1
    pub fn hydro(&self, cpu: usize) -> PathBuf {
        self.dir.join(f!("hydro_{:05}.out{cpu:05}", self.number))
    }
}

/// Number of an `output_NNNNN` directory name
fn output_number(name: &str) -> Option<u32> {
    let digits = name.strip_prefix("output_")?;
    if digits.len() == 5 && digits.bytes().all(|b| b.is_ascii_digit()) {
        digits.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_directory_names() {
        assert_eq!(output_number("output_00042"), Some(42));
        assert_eq!(output_number("output_1"), None);
        assert_eq!(output_number("output_0004a"), None);
        assert_eq!(output_number("movie_00001"), None);
    }

    #[test]
    fn latest_output() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["output_00002", "output_00010", "output_00003", "notes"] {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }
        // files are ignored even if the name matches
        std::fs::write(dir.path().join("output_00099"), "").unwrap();

        assert_eq!(Output::Latest.resolve(dir.path()).unwrap(), 10);
        assert_eq!(Output::Number(3).resolve(dir.path()).unwrap(), 3);
    }

    #[test]
    fn no_outputs() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Output::Latest.resolve(dir.path()),
            Err(Error::OutputNotFound(_))
        ));
    }
}
