use anyhow::Result;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, warn};

use token_video_toolkit::app::run_compressor;
use token_video_toolkit::{logging, Config, FfmpegToolkit};

#[derive(Parser)]
#[command(name = "video-compressor")]
#[command(about = "Resize and re-encode every video in a directory with ffmpeg")]
struct Cli {
    /// Directory scanned for videos (not recursive)
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let logs = logging::init(cli.verbose);

    let config = match &cli.config {
        Some(path) => match Config::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{:#}", e);
                return Ok(());
            }
        },
        None => Config::load().unwrap_or_else(|_| Config::default()),
    };

    if let Err(e) = logs.apply_level(&config.output.log_level) {
        warn!("Ignoring log level {:?}: {}", config.output.log_level, e);
    }

    let config = match config.validate() {
        Ok(()) => config,
        Err(e) => {
            warn!("Invalid configuration, using defaults: {}", e);
            Config::default()
        }
    };

    let toolkit = Arc::new(FfmpegToolkit::from_config(&config.compression));
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    match run_compressor(&config, &cli.dir, toolkit, &mut input, &mut output).await {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{:#}", e);
            Ok(())
        }
    }
}
