//! Smooth-ECE command implementation.

use crate::cli::SmoothEceArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use credence_calibration::{compute_smooth_ece, Prediction, SmoothEceOptions};

/// Execute the smooth-ece command.
pub fn execute_smooth_ece(args: SmoothEceArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let predictions: Vec<Prediction> = super::read_json(&args.input.file)?;
    let options = merge_options(&args, &config.smooth_ece);
    let result = compute_smooth_ece(&predictions, &options)?;

    println!("{}", formatter.format_smooth_ece(&result)?);

    Ok(())
}

/// Command-line flags take precedence over the configuration.
fn merge_options(args: &SmoothEceArgs, configured: &SmoothEceOptions) -> SmoothEceOptions {
    SmoothEceOptions {
        bandwidth: args.bandwidth.or(configured.bandwidth),
        kernel: args.kernel.map(Into::into).unwrap_or(configured.kernel),
        num_eval_points: args.points.unwrap_or(configured.num_eval_points),
    }
}
