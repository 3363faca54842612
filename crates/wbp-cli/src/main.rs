//! CLI application for COST Action work and budget plan extraction.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, extract, ffr, pdf, verify};

/// Extract and verify budget data from COST Action work and budget plans
#[derive(Parser)]
#[command(name = "wbp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse work and budget plans and write per-period and summary JSON
    Extract(extract::ExtractArgs),

    /// Compare extracted totals with reference figures
    Verify(verify::VerifyArgs),

    /// Extract meeting costs and virtual mobility grants from financial reports
    Ffr(ffr::FfrArgs),

    /// Convert report PDFs to page-marked text
    PdfToText(pdf::PdfToTextArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Extract(args) => extract::run(args, cli.config.as_deref()).await,
        Commands::Verify(args) => verify::run(args, cli.config.as_deref()).await,
        Commands::Ffr(args) => ffr::run(args, cli.config.as_deref()).await,
        Commands::PdfToText(args) => pdf::run(args).await,
        Commands::Config(args) => config::run(args, cli.config.as_deref()).await,
    }
}
