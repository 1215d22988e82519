use crate::utils::parser;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu, William A. Goddard III, Victor Wai Tak Kam",
    version,
    about = "helixdex CLI - Index helical diffraction lattices and derive rise, twist and n-start from a parameter record.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Refine a lattice, enumerate its real-space points and extract the helical symmetry.
    Index(IndexArgs),
    /// Derive the symmetry of the strand family through two picked real-space points.
    Strand(StrandArgs),
    /// Compare a layerline profile (CSV) with a Bessel function of given order and radius.
    Fit(FitArgs),
    /// List the predicted diffraction peaks of a lattice with their Bessel orders.
    Peaks(PeaksArgs),
    /// Print the reconstruction command for the indexed symmetry.
    Command(CommandArgs),
}

/// Options shared by every command that indexes a lattice.
#[derive(Args, Debug, Clone)]
pub struct LatticeArgs {
    /// Path to the parameter record describing the lattice.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub params: PathBuf,

    /// Width of the power spectrum in pixels.
    #[arg(long, value_name = "PIXELS")]
    pub width: Option<usize>,

    /// Height of the power spectrum in pixels.
    #[arg(long, value_name = "PIXELS")]
    pub height: Option<usize>,

    /// Override the pixel size (Å/pixel) stored in the parameter record.
    #[arg(long, value_name = "FLOAT")]
    pub pixel_size: Option<f64>,

    /// Override the Bessel orders of both base vectors, e.g. `3,1`.
    #[arg(short = 'n', long, allow_hyphen_values = true, value_name = "N1,N2", value_parser = parser::parse_order_pair)]
    pub orders: Option<(i32, i32)>,

    /// Path to an indexing configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the refinement tolerance from the config file.
    #[arg(long, value_name = "FLOAT")]
    pub tolerance: Option<f64>,

    /// Override the maximum number of refinement evaluations.
    #[arg(long, value_name = "INT")]
    pub max_iterations: Option<usize>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S window.y-high=4
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `index` subcommand.
#[derive(Args, Debug)]
pub struct IndexArgs {
    #[command(flatten)]
    pub lattice: LatticeArgs,

    /// Write the refined record, including real-space vectors and symmetry, to this path.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Print every enumerated real-space point.
    #[arg(long)]
    pub show_points: bool,
}

/// Arguments for the `strand` subcommand.
#[derive(Args, Debug)]
pub struct StrandArgs {
    #[command(flatten)]
    pub lattice: LatticeArgs,

    /// First real-space position (Å), e.g. `0,0`.
    #[arg(long, required = true, allow_hyphen_values = true, value_name = "X,Y", value_parser = parser::parse_point)]
    pub from: (f64, f64),

    /// Second real-space position (Å), e.g. `16,10`.
    #[arg(long, required = true, allow_hyphen_values = true, value_name = "X,Y", value_parser = parser::parse_point)]
    pub to: (f64, f64),
}

/// Arguments for the `fit` subcommand.
#[derive(Args, Debug)]
pub struct FitArgs {
    /// Path to the layerline profile (`radial_index,amplitude[,phase]`).
    #[arg(short = 'i', long, required = true, value_name = "PATH")]
    pub profile: PathBuf,

    /// Bessel order assumed for the layerline.
    #[arg(short = 'n', long, required = true, allow_negative_numbers = true, value_name = "INT")]
    pub order: i32,

    /// Helix radius in Å.
    #[arg(short, long, required = true, value_name = "FLOAT")]
    pub radius: f64,

    /// Uncertainty of the helix radius in Å.
    #[arg(short = 'e', long, default_value_t = 0.0, value_name = "FLOAT")]
    pub radius_error: f64,

    /// Width of the power spectrum in pixels.
    #[arg(long, required = true, value_name = "PIXELS")]
    pub width: usize,

    /// Pixel size in Å/pixel.
    #[arg(long, required = true, value_name = "FLOAT")]
    pub pixel_size: f64,

    /// Path to an indexing configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Arguments for the `peaks` subcommand.
#[derive(Args, Debug)]
pub struct PeaksArgs {
    /// Path to the parameter record describing the lattice.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub params: PathBuf,

    /// Steps along base vector 1 as `LOWER:UPPER`.
    #[arg(long, default_value = "0:2", value_name = "LOWER:UPPER", value_parser = parser::parse_step_range)]
    pub steps1: (u32, u32),

    /// Steps along base vector 2 as `LOWER:UPPER`.
    #[arg(long, default_value = "0:2", value_name = "LOWER:UPPER", value_parser = parser::parse_step_range)]
    pub steps2: (u32, u32),
}

/// Arguments for the `command` subcommand.
#[derive(Args, Debug)]
pub struct CommandArgs {
    #[command(flatten)]
    pub lattice: LatticeArgs,

    /// Override the point group (defaults to `C<n-start>`).
    #[arg(long, value_name = "CN")]
    pub point_group: Option<String>,

    /// Override the box dimension in pixels (defaults to the image width).
    #[arg(long, value_name = "PIXELS")]
    pub box_dimension: Option<u32>,

    /// Also lay out the helical model and print its subunit coordinates.
    #[arg(long)]
    pub show_model: bool,
}
