//! Requirements command implementation.

use crate::cli::RequirementsArgs;
use crate::error::Result;
use crate::output::Formatter;
use credence_calibration::{check_calibration_requirements, compute_min_samples_for_calibration};

/// Execute the requirements command.
///
/// Without `--actual` this prints the bound; with it, the comparison.
pub fn execute_requirements(args: RequirementsArgs, formatter: &Formatter) -> Result<()> {
    let output = match args.actual {
        Some(actual) => {
            let check = check_calibration_requirements(actual, args.epsilon, args.confidence, args.bins)?;
            formatter.format_requirements(&check)?
        }
        None => {
            let requirement = compute_min_samples_for_calibration(args.epsilon, args.confidence, args.bins)?;
            formatter.format_sample_requirement(&requirement)?
        }
    };

    println!("{}", output);

    Ok(())
}
