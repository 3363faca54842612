//! Extract command - parse work and budget plans and write JSON artifacts.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;

use wbp_core::{aggregate, format_amount, Exporter};

use super::{apply_overrides, extract_periods, extraction_date, grant_periods, load_config};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Grant period to extract (default: all configured periods)
    #[arg(long)]
    gp: Option<u8>,

    /// Directory with the extracted report text
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Extraction date written into metadata (default: today)
    #[arg(long)]
    date: Option<String>,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, args.source_dir, args.output_dir);
    let periods = grant_periods(args.gp, &config)?;

    let extraction = extract_periods(&config, &periods).await?;

    let exporter = Exporter::from_config(&config.output, extraction_date(args.date));
    for result in &extraction.results {
        exporter.write_period(result)?;

        println!(
            "{} GP{}: {} meetings, {} training schools, total grant {} EUR",
            style("✓").green(),
            result.grant_period,
            result.meetings.len(),
            result.training_schools.len(),
            format_amount(result.budget_summary.total_grant())
        );
        if !result.warnings.is_empty() {
            println!("   {} warnings", style(result.warnings.len()).yellow());
        }
    }

    let summary = aggregate(&extraction.results, &periods);
    let summary_path = exporter.write_summary(&summary)?;

    println!();
    println!(
        "{} Summary written to {} ({} meetings, {} training schools, total grant {} EUR) in {:?}",
        style("✓").green(),
        summary_path.display(),
        summary.total_meetings_planned,
        summary.total_training_schools_planned,
        format_amount(summary.totals.total_grant),
        start.elapsed()
    );

    if !extraction.failed.is_empty() {
        println!();
        println!("{}", style("Grant periods without source text:").red());
        for (gp, reason) in &extraction.failed {
            println!("  - GP{}: {}", gp, reason);
        }
        anyhow::bail!("{} of {} grant periods could not be extracted", extraction.failed.len(), periods.len());
    }

    Ok(())
}
