//! Isotonic command implementation.

use crate::cli::IsotonicArgs;
use crate::error::Result;
use crate::output::Formatter;
use credence_calibration::{apply_isotonic_mapping, isotonic_calibration, Prediction};

/// Execute the isotonic command.
pub fn execute_isotonic(args: IsotonicArgs, formatter: &Formatter) -> Result<()> {
    let predictions: Vec<Prediction> = super::read_json(&args.input.file)?;
    let mapping = isotonic_calibration(&predictions)?;

    let applied: Vec<(f64, f64)> = args
        .apply
        .iter()
        .map(|&raw| (raw, apply_isotonic_mapping(&mapping, raw)))
        .collect();

    println!("{}", formatter.format_mapping(&mapping, &applied)?);

    Ok(())
}
