use clap::{Args, Parser, Subcommand, ValueEnum};
use retis::simulation::config::SimulationType;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "RETIS++ CLI - A command-line interface for RETIS++, a rare-event path-sampling library implementing TIS and RETIS.",
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
    /// Load and validate a simulation settings file.
    Check(CheckArgs),
    /// Analyze interface crossings of an order-parameter trace.
    Crossings(CrossingsArgs),
}

/// The simulation kinds a settings file can be checked against.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Tis,
    Retis,
}

impl From<TaskKind> for SimulationType {
    fn from(kind: TaskKind) -> Self {
        match kind {
            TaskKind::Tis => SimulationType::Tis,
            TaskKind::Retis => SimulationType::Retis,
        }
    }
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the simulation settings file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Require the settings to describe this kind of simulation.
    #[arg(short, long, value_enum, value_name = "TASK")]
    pub task: Option<TaskKind>,

    /// Number of path ensembles, used to validate per-ensemble settings.
    #[arg(short, long, value_name = "INT")]
    pub ensembles: Option<usize>,
}

/// Arguments for the `crossings` subcommand.
#[derive(Args, Debug)]
pub struct CrossingsArgs {
    /// Path to a whitespace separated `time order` trace.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Interface to count crossings of.
    #[arg(long, value_name = "FLOAT", allow_negative_numbers = true)]
    pub interface: f64,

    /// Left interface for segment analysis.
    #[arg(short, long, value_name = "FLOAT", requires = "right", allow_negative_numbers = true)]
    pub left: Option<f64>,

    /// Right interface for segment analysis.
    #[arg(short, long, value_name = "FLOAT", requires = "left", allow_negative_numbers = true)]
    pub right: Option<f64>,

    /// Seed of the generator used to draw a segment.
    #[arg(short, long, default_value_t = 0, value_name = "INT")]
    pub seed: u64,

    /// Select this segment instead of drawing one.
    #[arg(long, value_name = "INT")]
    pub segment: Option<usize>,
}
