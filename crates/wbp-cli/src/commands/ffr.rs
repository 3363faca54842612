//! FFR command - extract actual meeting costs and virtual mobility grants.

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::warn;

use wbp_core::{format_amount, DocumentKind, Exporter, FfrParser, ReportParser, SourceLocator};

use super::{apply_overrides, extraction_date, grant_periods, load_config, progress_bar};

/// Arguments for the ffr command.
#[derive(Args)]
pub struct FfrArgs {
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

pub async fn run(args: FfrArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, args.source_dir, args.output_dir);
    let periods = grant_periods(args.gp, &config)?;

    let locator = SourceLocator::new(&config.sources);
    let parser = FfrParser::new();
    let exporter = Exporter::from_config(&config.output, extraction_date(args.date));

    let pb = progress_bar(periods.len(), "reports");
    let mut parsed = Vec::new();
    let mut failed = Vec::new();

    for &gp in &periods {
        match locator.load(gp, DocumentKind::Ffr) {
            Ok(document) => {
                let result = parser.parse(&document);
                exporter.write_ffr(&result)?;
                parsed.push(result);
            }
            Err(e) => {
                warn!("GP{}: {}", gp, e);
                failed.push((gp, e.to_string()));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    for result in &parsed {
        println!(
            "{} GP{}: {} meetings ({} EUR), {} virtual mobility grants ({} EUR)",
            style("✓").green(),
            result.grant_period,
            result.meetings.len(),
            format_amount(result.meetings_total()),
            result.vm_grants.len(),
            format_amount(result.vm_total())
        );
    }

    if !failed.is_empty() {
        println!();
        println!("{}", style("Grant periods without a financial report:").red());
        for (gp, reason) in &failed {
            println!("  - GP{}: {}", gp, reason);
        }
        anyhow::bail!("{} of {} financial reports could not be read", failed.len(), periods.len());
    }

    Ok(())
}
