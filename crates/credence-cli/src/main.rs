//! Credence CLI - Command-line interface for calibration and defeat propagation.

use clap::Parser;
use credence_cli::commands;
use credence_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins over `-v` when set.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

fn run(cli: Cli) -> credence_cli::Result<()> {
    // Load config
    let mut config = Config::load(cli.config.as_deref())?;

    // Override database if specified
    if let Some(database) = cli.database {
        config.settings.database = Some(database);
    }

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Calibrate(args) => commands::execute_calibrate(args, &config, &formatter),
        Command::Isotonic(args) => commands::execute_isotonic(args, &formatter),
        Command::SmoothEce(args) => commands::execute_smooth_ece(args, &config, &formatter),
        Command::Requirements(args) => commands::execute_requirements(args, &formatter),
        Command::Bootstrap(args) => commands::execute_bootstrap(args, &formatter),
        Command::Load(args) => commands::execute_load(args, &config, &formatter),
        Command::Claims(args) => commands::execute_claims(args, &config, &formatter),
        Command::Propagate(args) => commands::execute_propagate(args, &config, &formatter),
        Command::Graph(args) => commands::execute_graph(args, &config, &formatter),
        Command::Config(args) => {
            commands::execute_config(args, &config, cli.config.as_deref(), &formatter)
        }
    }
}
