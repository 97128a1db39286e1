//! Command line summary of a RAMSES snapshot
//!
//! Loads a snapshot exactly as the library would and prints the run metadata
//! along with the range of every field.
//!
//! # Usage
//!
//! ```text
//! Usage: amrinfo [output] [options]
//! ```
//!
//! Help is printed with the `-h` flag, and `--help` will show examples,
//! default values, and any important behaviour.
//!
//! ## Examples
//!
//! ```bash
//! # Latest output in the current directory
//! amrinfo
//!
//! # Output 12 of a run elsewhere, centred on a sink in pc
//! amrinfo 12 --path /path/to/run --center sink1 --scale pc
//!
//! # Only the densest 100 au, to level 14
//! amrinfo 12 --center max:density --extent 100 --lmax 14
//! ```

// standard libraries
use std::path::PathBuf;

// crate modules
use amrtools::ramses::reader::SnapshotReader;
use amrtools::ramses::{Center, Config, Dataset, LoadParams, Output};
use amrtools::utils::f;

// external crates
use anyhow::Result;
use clap::Parser;
use log::*;

#[doc(hidden)]
fn main() -> Result<()> {
    // set up the command line interface and match arguments
    let cli: Cli = Cli::parse();

    // set up logging (+2 to make Info the default)
    let verbosity = cli.verbose as usize + 2;
    logging_init(verbosity, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            info!("Reading configuration from {}", path.display());
            Config::from_json(path)?
        }
        None => Config::default(),
    };

    let params = params_init(&cli, &config)?;
    debug!("{params:?}");

    let mut reader = SnapshotReader::new();
    reader.set_parallel(cli.parallel);
    if cli.quiet || cli.no_progress {
        reader.disable_progress();
    }

    let dataset = Dataset::load_with(reader, params, config)?;
    println!("{dataset}");

    Ok(())
}

/// Summary of a RAMSES AMR snapshot
///
/// Examples
/// --------
///
///  Typical use:
///     $ amrinfo 12 --path run
///
///  Sink centred region in parsecs:
///     $ amrinfo 12 --center sink1      \
///               --scale pc             \
///               --extent 0.1
///
///  Anisotropic region about an explicit position:
///     $ amrinfo latest --center 0.5,0.5,0.4  \
///               --extent 500 500 100
///
/// Notes
/// -----
///
/// Centres are one of "default", three comma separated values in units of
/// the box, a sink name such as "sink1", or "max:<field>", "min:<field>" or
/// "av:<selection>" where the selection is an expression such as
/// "density > 1e-15".
///
/// Extents are full widths in the length scale, a single value is used for
/// all three axes and 0 leaves an axis unconstrained.
#[doc(hidden)]
#[derive(Parser)]
#[command(
    verbatim_doc_comment,
    before_help(banner()),
    after_help("Typical use: amrinfo 12 --path run \n\nNOTE: --help shows more detail and examples"),
    term_width(70),
    hide_possible_values(true),
    override_usage("amrinfo [output] [options]")
)]
struct Cli {
    // * Positional
    /// Output number, or "latest"
    ///
    /// e.g. 12 for output_00012
    #[arg(name = "output")]
    #[arg(default_value = "latest")]
    output: String,

    // * Optional
    /// Run directory containing the output folders
    #[arg(help_heading("Snapshot options"))]
    #[arg(short, long)]
    #[arg(value_name = "dir")]
    path: Option<PathBuf>,

    /// Deepest refinement level to read
    ///
    /// Defaults to the deepest level of the run.
    #[arg(help_heading("Snapshot options"))]
    #[arg(short, long)]
    #[arg(value_name = "level")]
    lmax: Option<usize>,

    /// Centre of the coordinates and the region
    #[arg(help_heading("Snapshot options"))]
    #[arg(short, long)]
    #[arg(value_name = "center")]
    #[arg(allow_hyphen_values(true))]
    center: Option<String>,

    /// Length scale of the coordinates, e.g. au or pc
    #[arg(help_heading("Snapshot options"))]
    #[arg(short, long)]
    #[arg(value_name = "name")]
    scale: Option<String>,

    /// Full widths of the region to read
    #[arg(help_heading("Snapshot options"))]
    #[arg(short, long)]
    #[arg(value_parser, num_args = 1..=3, value_delimiter = ' ')]
    #[arg(value_name = "width")]
    extent: Vec<f64>,

    /// Hydro variables to read, all by default
    #[arg(help_heading("Snapshot options"))]
    #[arg(long)]
    #[arg(value_parser, num_args = 1.., value_delimiter = ' ')]
    #[arg(value_name = "list")]
    variables: Vec<String>,

    /// JSON configuration file
    #[arg(help_heading("Snapshot options"))]
    #[arg(long)]
    #[arg(value_name = "path")]
    config: Option<PathBuf>,

    /// Read CPU files in parallel
    #[arg(help_heading("Snapshot options"))]
    #[arg(long)]
    parallel: bool,

    // * Flags
    /// Verbose logging (-v, -vv)
    ///
    /// If specified, the default log level of INFO is increased to DEBUG (-v)
    /// or TRACE (-vv). Errors and Warnings are always logged unless in quiet
    /// (-q) mode.
    #[arg(short, long)]
    #[arg(action = clap::ArgAction::Count)]
    verbose: u8,

    /// Supress all log output (overrules --verbose)
    #[arg(short, long)]
    quiet: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

#[doc(hidden)]
fn banner() -> String {
    let mut s = f!("{:-<1$}\n", "", 70);
    s += &f!("{:^70}\n", "AMR Tools :: AMR Info");
    s += &f!("{:-<1$}", "", 70);
    s
}

#[doc(hidden)]
fn logging_init(verbosity: usize, quiet: bool) {
    stderrlog::new()
        .modules(vec![module_path!(), "amrtools_ramses"])
        .quiet(quiet)
        .verbosity(verbosity)
        .show_level(false)
        .color(stderrlog::ColorChoice::Never)
        .timestamp(stderrlog::Timestamp::Off)
        .init()
        .unwrap();
}

#[doc(hidden)]
fn params_init(cli: &Cli, config: &Config) -> Result<LoadParams> {
    let output: Output = cli.output.parse()?;
    let mut params = LoadParams::from_config(output, config);

    if let Some(path) = &cli.path {
        params.path = path.clone();
    }

    if let Some(lmax) = cli.lmax {
        params.lmax = lmax;
    }

    if let Some(center) = &cli.center {
        params.center = center.parse::<Center>()?;
    }

    if let Some(scale) = &cli.scale {
        params.scale = scale.clone();
    }

    params.extents = match cli.extent.as_slice() {
        [] => [0.0; 3],
        [w] => [*w; 3],
        [x, y] => [*x, *y, 0.0],
        [x, y, z, ..] => [*x, *y, *z],
    };

    if !cli.variables.is_empty() {
        params.variables = cli.variables.clone();
    }

    Ok(params)
}
