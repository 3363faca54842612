//! Verify command - compare extracted totals with reference figures.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use rust_decimal::Decimal;

use wbp_core::{aggregate, format_amount, Exporter, VerificationReport, Verifier};

use super::{apply_overrides, extract_periods, extraction_date, grant_periods, load_config};

/// Arguments for the verify command.
#[derive(Args)]
pub struct VerifyArgs {
    /// Only verify this grant period
    #[arg(long)]
    gp: Option<u8>,

    /// Accepted absolute difference in EUR
    #[arg(short, long)]
    tolerance: Option<Decimal>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Directory with the extracted report text
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Directory for verification_report.json
    #[arg(short = 'd', long)]
    output_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
    /// CSV output
    Csv,
}

pub async fn run(args: VerifyArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, args.source_dir, args.output_dir);
    let periods = grant_periods(args.gp, &config)?;

    let extraction = extract_periods(&config, &periods).await?;
    let summary = aggregate(&extraction.results, &periods);

    let mut verifier = Verifier::from_config(&config.verification);
    if let Some(tolerance) = args.tolerance {
        verifier = verifier.with_tolerance(tolerance);
    }
    if let Some(gp) = args.gp {
        let prefix = format!("GP{}.", gp);
        verifier = verifier.retain(|field| field.starts_with(&prefix));
    }

    let report = verifier.verify(&summary);

    let exporter = Exporter::from_config(&config.output, extraction_date(None));
    exporter.write_verification(&report)?;

    let rendered = match args.format {
        OutputFormat::Json => exporter.render(&report, "verification report")?,
        OutputFormat::Text => format_report_text(&report),
        OutputFormat::Csv => format_report_csv(&report)?,
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &rendered)?;
            println!("{} Report written to {}", style("✓").green(), path.display());
        }
        None => print!("{}", rendered),
    }

    if !report.is_clean() {
        anyhow::bail!("{} of {} reference figures do not match", report.len(), report.checked);
    }

    Ok(())
}

fn format_report_text(report: &VerificationReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Checked {} reference figures (tolerance {} EUR)\n",
        report.checked,
        format_amount(report.tolerance)
    ));

    if report.is_clean() {
        output.push_str(&format!("{} All figures match\n", style("✓").green()));
        return output;
    }

    for entry in &report.mismatches {
        let mut notes = Vec::new();
        if entry.missing {
            notes.push("missing");
        }
        if entry.not_found_in_source {
            notes.push("not found in source");
        }
        let notes = if notes.is_empty() {
            String::new()
        } else {
            format!(" ({})", notes.join(", "))
        };

        output.push_str(&format!(
            "{} {}: expected {}, actual {}, diff {}{}\n",
            style("✗").red(),
            entry.field,
            format_amount(entry.expected),
            format_amount(entry.actual),
            format_amount(entry.diff),
            notes
        ));
    }

    output
}

fn format_report_csv(report: &VerificationReport) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["field", "expected", "actual", "diff", "missing", "not_found_in_source"])?;

    for entry in &report.mismatches {
        wtr.write_record([
            entry.field.as_str(),
            &format!("{:.2}", entry.expected),
            &format!("{:.2}", entry.actual),
            &format!("{:.2}", entry.diff),
            &entry.missing.to_string(),
            &entry.not_found_in_source.to_string(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}
