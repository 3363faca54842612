//! PDF to text command - convert report PDFs to page-marked text files.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use glob::glob;
use tracing::{debug, error};

use wbp_core::pdf::{render_pages, PdfExtractor, PdfProcessor};

use super::progress_bar;

/// Arguments for the pdf-to-text command.
#[derive(Args)]
pub struct PdfToTextArgs {
    /// Input PDF file or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory (default: next to each PDF)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

pub async fn run(args: PdfToTextArgs) -> anyhow::Result<()> {
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No PDF files found for pattern: {}", args.input);
    }

    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir)?;
    }

    let pb = progress_bar(files.len(), "files");
    let mut failed = Vec::new();

    for path in &files {
        match convert(path, args.output_dir.as_deref()) {
            Ok(output) => debug!("{} -> {}", path.display(), output.display()),
            Err(e) => {
                error!("Failed to convert {}: {}", path.display(), e);
                failed.push((path, e.to_string()));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!(
        "{} Converted {} of {} files",
        style("✓").green(),
        files.len() - failed.len(),
        files.len()
    );

    if !failed.is_empty() {
        println!("{}", style("Failed files:").red());
        for (path, reason) in &failed {
            println!("  - {}: {}", path.display(), reason);
        }
        anyhow::bail!("{} files could not be converted", failed.len());
    }

    Ok(())
}

fn convert(path: &Path, output_dir: Option<&Path>) -> anyhow::Result<PathBuf> {
    let extractor = PdfExtractor::open(path)?;
    let text = render_pages(&extractor.extract_pages()?);
    if text.trim().is_empty() {
        anyhow::bail!("No text extracted from PDF");
    }

    let file_name = path.with_extension("txt");
    let file_name = file_name
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", path.display()))?;
    let output = match output_dir {
        Some(dir) => dir.join(file_name),
        None => path.with_extension("txt"),
    };

    fs::write(&output, text)?;
    Ok(output)
}
