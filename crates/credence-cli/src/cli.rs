//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Credence CLI - Measure calibration and trace defeat through claim graphs.
#[derive(Debug, Parser)]
#[command(name = "credence")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CREDENCE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Claim database path (overrides the configuration)
    #[arg(short, long, global = true, env = "CREDENCE_DB")]
    pub database: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (headline numbers or IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute a calibration curve and report from labelled samples
    Calibrate(CalibrateArgs),

    /// Fit an isotonic mapping from raw scores to probabilities
    Isotonic(IsotonicArgs),

    /// Compute the kernel-smoothed calibration error
    SmoothEce(SmoothEceArgs),

    /// Samples needed to calibrate within a tolerance
    Requirements(RequirementsArgs),

    /// Show the bootstrap calibration tier for a dataset size
    Bootstrap(BootstrapArgs),

    /// Load claims and edges into the claim database
    Load(LoadArgs),

    /// List claims in the claim database
    Claims(ClaimsArgs),

    /// Trace the claims affected by defeating a claim
    Propagate(PropagateArgs),

    /// Show the dependency graph around a claim
    Graph(GraphArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Input for commands that read a JSON array.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// JSON file to read; `-` reads stdin
    pub file: String,
}

/// Arguments for the calibrate command.
#[derive(Debug, Parser)]
pub struct CalibrateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Number of equal-width buckets
    #[arg(short, long)]
    pub buckets: Option<usize>,

    /// Dataset name for the report
    #[arg(long, default_value = "default")]
    pub dataset: String,

    /// Maximum ECE still considered calibrated
    #[arg(long, default_value = "0.05")]
    pub max_ece: f64,
}

/// Arguments for the isotonic command.
#[derive(Debug, Parser)]
pub struct IsotonicArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Raw scores to map through the fitted mapping
    #[arg(short, long, num_args = 1.., value_delimiter = ',')]
    pub apply: Vec<f64>,
}

/// Arguments for the smooth-ece command.
#[derive(Debug, Parser)]
pub struct SmoothEceArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Kernel bandwidth (Silverman's rule when omitted)
    #[arg(long)]
    pub bandwidth: Option<f64>,

    /// Smoothing kernel
    #[arg(short, long, value_enum)]
    pub kernel: Option<KernelArg>,

    /// Grid points over [0, 1]
    #[arg(long)]
    pub points: Option<usize>,
}

/// Arguments for the requirements command.
#[derive(Debug, Parser)]
pub struct RequirementsArgs {
    /// Tolerance on each bucket's accuracy
    #[arg(short, long, default_value = "0.05")]
    pub epsilon: f64,

    /// Confidence level 1 - delta
    #[arg(long, default_value = "0.95")]
    pub confidence: f64,

    /// Number of buckets that must hold simultaneously
    #[arg(short, long)]
    pub bins: Option<u32>,

    /// Samples available per bucket, to check against the bound
    #[arg(short, long)]
    pub actual: Option<usize>,
}

/// Arguments for the bootstrap command.
#[derive(Debug, Parser)]
pub struct BootstrapArgs {
    /// Number of labelled samples
    pub samples: usize,
}

/// Arguments for the load command.
#[derive(Debug, Parser)]
pub struct LoadArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Namespace for claims that do not name one
    #[arg(short, long, default_value = "default")]
    pub namespace: String,
}

/// Arguments for the claims command.
#[derive(Debug, Parser)]
pub struct ClaimsArgs {
    /// Filter by namespace prefix
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Filter by status
    #[arg(short, long)]
    pub status: Option<String>,

    /// Maximum number of results
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for the propagate command.
#[derive(Debug, Parser)]
pub struct PropagateArgs {
    /// ID of the defeated claim
    pub claim_id: String,

    /// Dependency levels to follow (overrides the configuration)
    #[arg(long)]
    pub depth: Option<usize>,

    /// Mark affected claims stale instead of only reporting them
    #[arg(long)]
    pub apply: bool,
}

/// Arguments for the graph command.
#[derive(Debug, Parser)]
pub struct GraphArgs {
    /// Root claim ID
    pub claim_id: String,

    /// Follow what the claim relies on instead of what relies on it
    #[arg(short, long)]
    pub upstream: bool,

    /// Dependency levels to follow (overrides the configuration)
    #[arg(long)]
    pub depth: Option<usize>,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Show the configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Kernel argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum KernelArg {
    /// Gaussian kernel
    Gaussian,
    /// Epanechnikov kernel
    Epanechnikov,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<KernelArg> for credence_calibration::KernelType {
    fn from(kernel: KernelArg) -> Self {
        match kernel {
            KernelArg::Gaussian => credence_calibration::KernelType::Gaussian,
            KernelArg::Epanechnikov => credence_calibration::KernelType::Epanechnikov,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_definitions() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_calibrate_command() {
        let cli = Cli::parse_from(["credence", "calibrate", "samples.json", "--buckets", "5"]);
        match cli.command {
            Command::Calibrate(args) => {
                assert_eq!(args.input.file, "samples.json");
                assert_eq!(args.buckets, Some(5));
                assert_eq!(args.max_ece, 0.05);
            }
            _ => panic!("Expected Calibrate command"),
        }
    }

    #[test]
    fn test_isotonic_apply_list() {
        let cli = Cli::parse_from(["credence", "isotonic", "-", "--apply", "0.2,0.8"]);
        match cli.command {
            Command::Isotonic(args) => assert_eq!(args.apply, vec![0.2, 0.8]),
            _ => panic!("Expected Isotonic command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["credence", "-vv", "propagate", "claim-1", "--format", "json", "--apply"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        match cli.command {
            Command::Propagate(args) => {
                assert_eq!(args.claim_id, "claim-1");
                assert!(args.apply);
            }
            _ => panic!("Expected Propagate command"),
        }
    }

    #[test]
    fn test_kernel_conversion() {
        let kernel: credence_calibration::KernelType = KernelArg::Epanechnikov.into();
        assert_eq!(kernel, credence_calibration::KernelType::Epanechnikov);
    }
}
