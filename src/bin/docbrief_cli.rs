use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docbrief::{
    config::Config,
    extraction::{FormatTag, TextExtractor},
    logging,
    metrics::PipelineMetrics,
    service::resolve_format,
    summarization::assembler_from_config,
};

#[derive(Parser)]
#[command(
    name = "docbrief-cli",
    about = "Summarize or extract text from local documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the structured summary of a document as JSON.
    Summarize {
        path: PathBuf,
        /// MIME type; inferred from the extension when omitted.
        #[arg(long)]
        mime: Option<String>,
    },
    /// Print the plain text extracted from a document.
    Extract {
        path: PathBuf,
        /// MIME type; inferred from the extension when omitted.
        #[arg(long)]
        mime: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_cli_tracing();
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("invalid configuration")?;

    match cli.command {
        Command::Summarize { path, mime } => {
            let (format, content) = load(&path, mime.as_deref()).await?;
            let assembler = assembler_from_config(&config, Arc::new(PipelineMetrics::new()))
                .context("failed to build HTTP client")?;
            let summary = assembler
                .summarize_file(content, format)
                .await
                .with_context(|| format!("failed to extract text from {}", path.display()))?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Extract { path, mime } => {
            let (format, content) = load(&path, mime.as_deref()).await?;
            let text = TextExtractor::new(&config.libreoffice_path, config.libreoffice_timeout)
                .extract(content, format)
                .await
                .with_context(|| format!("failed to extract text from {}", path.display()))?;
            println!("{text}");
        }
    }

    Ok(())
}

async fn load(path: &Path, mime: Option<&str>) -> Result<(FormatTag, Vec<u8>)> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let format = resolve_format(file_name, mime)
        .with_context(|| format!("cannot determine the format of {}", path.display()))?;
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok((format, content))
}
