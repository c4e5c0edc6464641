//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::{CliError, Result};
use colored::*;
use credence_calibration::{
    BootstrapConfig, CalibrationReport, CalibrationRequirements, IsotonicMapping, SampleRequirement,
    SmoothEceResult,
};
use credence_defeat::{AffectedClaim, DependencyGraph, TransitiveDefeatReport};
use credence_domain::{CalibrationStatus, Claim, ClaimId};
use serde::Serialize;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a calibration report.
    pub fn format_report(&self, report: &CalibrationReport, max_ece: f64) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(report),
            OutputFormat::Quiet => Ok(format!("{:.4}", report.curve.ece)),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Bucket", "Samples", "Stated", "Accuracy", "Gap", "Std Err"]);

                let last = report.curve.buckets.len().saturating_sub(1);
                for (i, bucket) in report.curve.buckets.iter().enumerate() {
                    if bucket.is_empty() {
                        builder.push_record([bucket.label(i == last), "0".into(), "-".into(), "-".into(), "-".into(), "-".into()]);
                        continue;
                    }
                    builder.push_record([
                        bucket.label(i == last),
                        bucket.sample_size.to_string(),
                        format!("{:.3}", bucket.stated_mean),
                        format!("{:.3}", bucket.empirical_accuracy),
                        format!("{:+.3}", bucket.empirical_accuracy - bucket.stated_mean),
                        format!("{:.3}", bucket.standard_error),
                    ]);
                }

                let status = match report.status(max_ece) {
                    CalibrationStatus::Preserved => self.success("Calibrated"),
                    CalibrationStatus::Degraded => self.warning(&format!("Miscalibrated (ECE above {})", max_ece)),
                };
                Ok(format!("{}\n{}\n{}", table(builder), report.summary(), status))
            }
        }
    }

    /// Format an isotonic mapping and any scores mapped through it.
    pub fn format_mapping(&self, mapping: &IsotonicMapping, applied: &[(f64, f64)]) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(&serde_json::json!({
                "mapping": mapping,
                "applied": applied
                    .iter()
                    .map(|(raw, calibrated)| serde_json::json!({ "raw": raw, "calibrated": calibrated }))
                    .collect::<Vec<_>>(),
            })),
            OutputFormat::Quiet => {
                if applied.is_empty() {
                    return Ok(mapping.points.len().to_string());
                }
                let values: Vec<String> = applied.iter().map(|(_, c)| format!("{:.4}", c)).collect();
                Ok(values.join("\n"))
            }
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Raw", "Calibrated"]);
                for point in &mapping.points {
                    builder.push_record([format!("{:.4}", point.raw), format!("{:.4}", point.calibrated)]);
                }

                let mut out = format!(
                    "{}\n{}",
                    table(builder),
                    self.info(&format!(
                        "{} samples, raw range [{:.3}, {:.3}], strictly monotonic: {}",
                        mapping.sample_size, mapping.min_raw, mapping.max_raw, mapping.is_strictly_monotonic
                    ))
                );
                for (raw, calibrated) in applied {
                    out.push_str(&format!("\n{:.4} -> {:.4}", raw, calibrated));
                }
                Ok(out)
            }
        }
    }

    /// Format a smoothed ECE result.
    pub fn format_smooth_ece(&self, result: &SmoothEceResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(result),
            OutputFormat::Quiet => Ok(format!("{:.4}", result.smooth_ece)),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Smooth ECE", "Bandwidth", "Kernel", "Samples", "Grid points"]);
                builder.push_record([
                    format!("{:.4}", result.smooth_ece),
                    format!("{:.4}", result.bandwidth),
                    result.kernel.as_str().to_string(),
                    result.sample_size.to_string(),
                    result.curve.len().to_string(),
                ]);
                Ok(table(builder))
            }
        }
    }

    /// Format a sample-size bound.
    pub fn format_sample_requirement(&self, requirement: &SampleRequirement) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(requirement),
            OutputFormat::Quiet => Ok(requirement.min_samples.to_string()),
            OutputFormat::Table => Ok(self.info(&format!(
                "{} samples per bucket ({} across {} bucket(s)) for accuracy within {} at {:.1}% confidence",
                requirement.min_samples,
                requirement.total_samples,
                requirement.num_bins,
                requirement.epsilon,
                requirement.confidence * 100.0
            ))),
        }
    }

    /// Format a requirements check.
    pub fn format_requirements(&self, check: &CalibrationRequirements) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(check),
            OutputFormat::Quiet => Ok(check.meets.to_string()),
            OutputFormat::Table => {
                let detail = format!(
                    "{} of {} samples per bucket; achievable accuracy {:.4}",
                    check.actual, check.required, check.achievable_accuracy
                );
                if check.meets {
                    Ok(self.success(&detail))
                } else {
                    Ok(self.warning(&format!("{} (short by {})", detail, check.deficit)))
                }
            }
        }
    }

    /// Format a bootstrap tier.
    pub fn format_bootstrap(&self, config: &BootstrapConfig) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(config),
            OutputFormat::Quiet => Ok(config.tier.as_str().to_string()),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Tier", "Weight", "Prior", "Buckets", "Min/bucket", "Isotonic"]);
                builder.push_record([
                    config.tier.as_str().to_string(),
                    format!("{:.1}", config.calibration_weight),
                    format!("Beta({}, {})", config.prior.alpha, config.prior.beta),
                    config.bucket_count.to_string(),
                    config.min_samples_per_bucket.to_string(),
                    if config.use_isotonic { "yes" } else { "no" }.to_string(),
                ]);
                Ok(table(builder))
            }
        }
    }

    /// Format claims output.
    pub fn format_claims(&self, claims: &[Claim]) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(claims),
            OutputFormat::Quiet => Ok(join_ids(claims.iter().map(|c| &c.id))),
            OutputFormat::Table => {
                if claims.is_empty() {
                    return Ok(self.colorize("No claims found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["ID", "Namespace", "Proposition", "Status", "Confidence"]);
                for claim in claims {
                    builder.push_record([
                        claim.id.to_string(),
                        claim.namespace.clone(),
                        claim.proposition.clone(),
                        claim.status.as_str().to_string(),
                        claim.confidence.to_string(),
                    ]);
                }
                Ok(table(builder))
            }
        }
    }

    /// Format claims reached by defeat propagation.
    pub fn format_affected(&self, affected: &[AffectedClaim]) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(affected),
            OutputFormat::Quiet => Ok(join_ids(affected.iter().map(|a| &a.claim_id))),
            OutputFormat::Table => Ok(self.affected_table(affected)),
        }
    }

    /// Format the outcome of applying transitive defeat.
    pub fn format_transitive_report(&self, report: &TransitiveDefeatReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(report),
            OutputFormat::Quiet => Ok(report.staled_count.to_string()),
            OutputFormat::Table => Ok(format!(
                "{}\n{}",
                self.affected_table(&report.affected),
                self.success(&format!(
                    "Marked {} claim(s) stale, recorded {} defeater(s)",
                    report.staled_count,
                    report.defeaters_created.len()
                ))
            )),
        }
    }

    /// Format a dependency graph view.
    pub fn format_graph(&self, graph: &DependencyGraph) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(graph),
            OutputFormat::Quiet => Ok(join_ids(graph.nodes.iter().map(|n| &n.claim_id))),
            OutputFormat::Table => {
                let mut nodes = Builder::default();
                nodes.push_record(["Depth", "Claim", "Status"]);
                for node in &graph.nodes {
                    nodes.push_record([
                        node.depth.to_string(),
                        node.claim_id.to_string(),
                        node.status.map_or("missing", |s| s.as_str()).to_string(),
                    ]);
                }

                let mut edges = Builder::default();
                edges.push_record(["From", "Type", "To", "Strength"]);
                for edge in &graph.edges {
                    edges.push_record([
                        edge.from_claim_id.to_string(),
                        edge.edge_type.as_str().to_string(),
                        edge.to_claim_id.to_string(),
                        format!("{:.2}", edge.strength),
                    ]);
                }
                Ok(format!("{}\n{}", table(nodes), table(edges)))
            }
        }
    }

    fn affected_table(&self, affected: &[AffectedClaim]) -> String {
        if affected.is_empty() {
            return self.colorize("No dependent claims.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Claim", "Depth", "Via", "Action", "Path"]);
        for a in affected {
            let path: Vec<&str> = a.dependency_path.iter().map(|id| id.as_str()).collect();
            builder.push_record([
                a.claim_id.to_string(),
                a.depth.to_string(),
                a.dependency_type.as_str().to_string(),
                self.colorize(a.suggested_action.as_str(), action_color(a.suggested_action.as_str())),
                path.join(" -> "),
            ]);
        }
        table(builder)
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Format bulk operation result.
    pub fn bulk_result(&self, operation: &str, count: usize, noun: &str) -> String {
        self.success(&format!("{} {} {}(s)", operation, count, noun))
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

fn action_color(action: &str) -> &'static str {
    match action {
        "mark_stale" => "red",
        "investigate" => "yellow",
        _ => "cyan",
    }
}

fn json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(CliError::Render)
}

fn join_ids<'a>(ids: impl Iterator<Item = &'a ClaimId>) -> String {
    ids.map(|id| id.as_str()).collect::<Vec<_>>().join("\n")
}

fn table(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}
