//! Bootstrap command implementation.

use crate::cli::BootstrapArgs;
use crate::error::Result;
use crate::output::Formatter;
use credence_calibration::bootstrap_calibration;

/// Execute the bootstrap command.
pub fn execute_bootstrap(args: BootstrapArgs, formatter: &Formatter) -> Result<()> {
    let config = bootstrap_calibration(args.samples);
    println!("{}", formatter.format_bootstrap(&config)?);
    Ok(())
}
