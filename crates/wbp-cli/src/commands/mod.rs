//! CLI command implementations.

pub mod config;
pub mod extract;
pub mod ffr;
pub mod pdf;
pub mod verify;

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use wbp_core::source::validate_grant_period;
use wbp_core::{DocumentKind, ExtractionResult, PipelineConfig, ReportParser, SourceLocator, WbpParser};

/// Load the configuration given with `--config`, or the defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<PipelineConfig> {
    match config_path {
        Some(path) => Ok(PipelineConfig::from_file(Path::new(path))?),
        None => Ok(PipelineConfig::default()),
    }
}

/// Apply directory overrides from the command line.
pub fn apply_overrides(config: &mut PipelineConfig, source_dir: Option<PathBuf>, output_dir: Option<PathBuf>) {
    if let Some(dir) = source_dir {
        config.sources.source_dir = dir;
    }
    if let Some(dir) = output_dir {
        config.output.output_dir = dir;
    }
}

/// The selected grant period, or every configured one.
pub fn grant_periods(gp: Option<u8>, config: &PipelineConfig) -> anyhow::Result<Vec<u8>> {
    let mut periods = match gp {
        Some(gp) => vec![gp],
        None => config.sources.grant_periods.clone(),
    };
    periods.sort_unstable();
    periods.dedup();

    for &gp in &periods {
        validate_grant_period(gp)?;
    }
    Ok(periods)
}

/// Date stamped into `_metadata`.
pub fn extraction_date(date: Option<String>) -> String {
    date.unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string())
}

pub fn progress_bar(len: usize, unit: &str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let template = format!("{{spinner:.green}} [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {}", unit);
    if let Ok(style) = ProgressStyle::default_bar().template(&template) {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}

/// Outcome of extracting several grant periods.
pub struct Extraction {
    /// Results in ascending grant period order.
    pub results: Vec<ExtractionResult>,
    /// Grant periods whose source could not be loaded, with the reason.
    pub failed: Vec<(u8, String)>,
}

/// Parse the work and budget plan of each grant period, one blocking task
/// per period. Results are joined in ascending period order.
pub async fn extract_periods(config: &PipelineConfig, periods: &[u8]) -> anyhow::Result<Extraction> {
    let locator = SourceLocator::new(&config.sources);
    let parser = WbpParser::new().with_section_spans(config.sections);

    let handles: Vec<_> = periods
        .iter()
        .map(|&gp| {
            let locator = locator.clone();
            let parser = parser.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let document = locator.load(gp, DocumentKind::Wbp)?;
                Ok::<_, wbp_core::error::SourceError>(parser.parse(&document))
            });
            (gp, handle)
        })
        .collect();

    let pb = progress_bar(periods.len(), "grant periods");
    let mut extraction = Extraction {
        results: Vec::with_capacity(periods.len()),
        failed: Vec::new(),
    };

    for (gp, handle) in handles {
        match handle.await? {
            Ok(result) => {
                debug!("GP{} parsed from {}", gp, result.source_file);
                extraction.results.push(result);
            }
            Err(e) => {
                warn!("GP{}: {}", gp, e);
                extraction.failed.push((gp, e.to_string()));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(extraction)
}
