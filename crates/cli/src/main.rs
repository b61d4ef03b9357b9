use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use docscan_core::PipelineConfig;
use tracing_subscriber::EnvFilter;

mod commands;

/// Extract text, QR/barcodes and structured fields from document images.
#[derive(Parser)]
#[command(name = "docscan", version)]
struct Cli {
    /// TOML configuration file; defaults apply for anything it omits
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline on each image and print one JSON result per line
    Scan {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Skip structured-field extraction
        #[arg(long)]
        no_fields: bool,

        /// Keep derived images next to the sources
        #[arg(long)]
        keep_artifacts: bool,

        /// Report average OCR confidence
        #[arg(long)]
        confidence: bool,
    },
    /// Extract structured fields from text (a file, or stdin when omitted)
    Fields { file: Option<PathBuf> },
    /// Validate images and print their header information
    Info {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Report which native backends are compiled in
    Capabilities,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Command::Scan { paths, no_fields, keep_artifacts, confidence } => {
            let opts = commands::ScanOptions { no_fields, keep_artifacts, confidence };
            commands::scan(&config, &paths, &opts)
        }
        Command::Fields { file } => commands::fields(file.as_deref()),
        Command::Info { paths } => commands::info(&paths),
        Command::Capabilities => commands::capabilities(&config),
    }
}
