use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use token_video_toolkit::{analyze_log, logging, Config};
use tracing::warn;

#[derive(Parser)]
#[command(name = "analyze-tokens")]
#[command(about = "Estimate prompt/response token usage from a debug log")]
struct Cli {
    /// Log file to analyze (defaults to analyzer.log_file from the config)
    log_file: Option<PathBuf>,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the prompt marker phrase
    #[arg(long)]
    prompt_marker: Option<String>,

    /// Override the response marker phrase
    #[arg(long)]
    response_marker: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let logs = logging::init(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|_| Config::default()),
    };

    if let Err(e) = logs.apply_level(&config.output.log_level) {
        warn!("Ignoring log level {:?}: {}", config.output.log_level, e);
    }

    if let Some(marker) = cli.prompt_marker {
        config.analyzer.prompt_marker = marker;
    }
    if let Some(marker) = cli.response_marker {
        config.analyzer.response_marker = marker;
    }
    if let Err(e) = config.validate() {
        warn!("Invalid configuration, using defaults: {}", e);
        config = Config::default();
    }

    let log_file = cli.log_file.unwrap_or_else(|| config.analyzer.log_file.clone());
    let report = analyze_log(&log_file, &config.analyzer).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }

    Ok(())
}
