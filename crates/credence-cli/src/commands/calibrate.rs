//! Calibrate command implementation.

use crate::cli::CalibrateArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use credence_calibration::{
    build_calibration_report, compute_calibration_curve, CalibrationSample, CurveOptions,
};

/// Execute the calibrate command.
pub fn execute_calibrate(args: CalibrateArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let samples: Vec<CalibrationSample> = super::read_json(&args.input.file)?;
    if samples.is_empty() {
        return Err(CliError::InvalidInput("No samples provided".to_string()));
    }
    if !(0.0..=1.0).contains(&args.max_ece) {
        return Err(CliError::InvalidInput(
            "Maximum ECE must be between 0.0 and 1.0".to_string(),
        ));
    }

    let options = CurveOptions {
        bucket_count: args.buckets.unwrap_or(config.curve.bucket_count),
    };
    let curve = compute_calibration_curve(&samples, &options)?;
    let report = build_calibration_report(args.dataset, curve);

    println!("{}", formatter.format_report(&report, args.max_ece)?);

    Ok(())
}
