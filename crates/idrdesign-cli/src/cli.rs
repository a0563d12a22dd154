use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "idrdesign - design disordered protein sequences whose bulk biophysical features match a target.",
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

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Design sequences whose features match those of a target sequence.
    Design(DesignArgs),
    /// Estimate per-feature reference variances from a FASTA corpus.
    Variance(VarianceArgs),
    /// Compute the feature table of every record in a FASTA file.
    Features(FeaturesArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyArg {
    /// Every single-residue substitution, every round.
    Exhaustive,
    /// Random sampling of improving moves, combined into multi-point candidates.
    Multipoint,
}

/// Arguments for the `design` subcommand.
#[derive(Args, Debug, Default)]
pub struct DesignArgs {
    // --- Target and starts ---
    /// Target sequence, as one-letter amino-acid codes.
    #[arg(short, long, value_name = "SEQ", conflicts_with = "target_fasta")]
    pub target: Option<String>,

    /// Read the target from the first record of a FASTA file.
    #[arg(long, value_name = "PATH")]
    pub target_fasta: Option<PathBuf>,

    /// Start the search from this sequence.
    #[arg(long, value_name = "SEQ", conflicts_with = "count")]
    pub start: Option<String>,

    /// Number of random start sequences to design from.
    #[arg(short = 'n', long, value_name = "INT")]
    pub count: Option<usize>,

    // --- Inputs ---
    /// Path to a design configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to a feature set definition in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub features: Option<PathBuf>,

    /// Reference variance table (CSV with `feature,variance` columns).
    #[arg(long, value_name = "PATH", conflicts_with = "reference")]
    pub variance: Option<PathBuf>,

    /// Estimate reference variances from the sequences of this FASTA file.
    #[arg(long, value_name = "PATH")]
    pub reference: Option<PathBuf>,

    // --- Search overrides ---
    /// Step size at or below which a search is converged.
    #[arg(long, value_name = "FLOAT")]
    pub precision: Option<f64>,

    /// Candidate generation strategy.
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Seed for start generation and randomised strategies.
    #[arg(long, value_name = "U64")]
    pub seed: Option<u64>,

    /// Wall-clock budget per search, in seconds.
    #[arg(long, value_name = "SECS")]
    pub time_budget: Option<f64>,

    /// Maximum number of rounds per search.
    #[arg(long, value_name = "INT")]
    pub max_iterations: Option<usize>,

    // --- Output ---
    /// Write designed sequences to this FASTA file.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S search.precision=1e-5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `variance` subcommand.
#[derive(Args, Debug)]
pub struct VarianceArgs {
    /// FASTA corpus of reference sequences.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub reference: PathBuf,

    /// Path to a feature set definition in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub features: Option<PathBuf>,

    /// Path for the output variance table.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,
}

/// Arguments for the `features` subcommand.
#[derive(Args, Debug)]
pub struct FeaturesArgs {
    /// FASTA file of sequences to evaluate.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to a feature set definition in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub features: Option<PathBuf>,

    /// Path for the output feature table (CSV).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,
}
