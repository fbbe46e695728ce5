use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::Config;
use crate::menu::{confirm, example_commands, prompt_choice, MenuChoice};
use crate::processing::{format_size, BatchProcessor};
use crate::script::{ScriptGenerator, ScriptPlatform};
use crate::video::MediaToolkit;

/// Exit code when the encoder cannot be launched
pub const EXIT_MISSING_ENCODER: i32 = 1;

fn write_install_hint<W: Write>(output: &mut W, encoder: &str) -> Result<()> {
    writeln!(output, "❌ {} was not found or could not be run.", encoder)?;
    writeln!(output, "💡 Install ffmpeg and make sure it is on your PATH:")?;
    writeln!(output, "   macOS:   brew install ffmpeg")?;
    writeln!(output, "   Debian:  sudo apt install ffmpeg")?;
    writeln!(output, "   RHEL:    sudo yum install ffmpeg")?;
    writeln!(output, "   Windows: https://ffmpeg.org/download.html")?;
    Ok(())
}

/// Interactive compressor session over `dir`, returning the process exit code.
///
/// Only a failed preflight yields a non-zero code; scan, encode and script
/// failures are reported on `output` and the session ends normally.
pub async fn run_compressor<R: BufRead, W: Write>(
    config: &Config,
    dir: &Path,
    toolkit: Arc<dyn MediaToolkit>,
    input: &mut R,
    output: &mut W,
) -> Result<i32> {
    let processor = BatchProcessor::new(config.compression.clone(), toolkit);

    match processor.preflight().await {
        Ok(version) => info!("🔧 {}", version),
        Err(e) => {
            error!("{}", e);
            write_install_hint(output, &config.compression.encoder)?;
            return Ok(EXIT_MISSING_ENCODER);
        }
    }

    let choice = match prompt_choice(input, output, &config.compression)? {
        Some(choice) => choice,
        None => {
            writeln!(output, "Unknown choice, nothing to do")?;
            return Ok(0);
        }
    };

    match choice {
        MenuChoice::CompressAll => {
            let videos = match processor.discover(dir) {
                Ok(videos) => videos,
                Err(e) => {
                    error!("{:#}", e);
                    writeln!(output, "Could not scan {}: {:#}", dir.display(), e)?;
                    return Ok(0);
                }
            };
            if videos.is_empty() {
                writeln!(output, "No video files found in {}", dir.display())?;
                return Ok(0);
            }

            writeln!(output, "\nFound {} video files:", videos.len())?;
            for video in &videos {
                let size = std::fs::metadata(video).map(|m| m.len()).unwrap_or(0);
                let name = video.file_name().unwrap_or_default().to_string_lossy();
                writeln!(output, "  {} ({})", name, format_size(size))?;
            }
            writeln!(output)?;

            if !confirm(input, output, "Start compression?")? {
                writeln!(output, "Cancelled")?;
                return Ok(0);
            }
            writeln!(output)?;

            let result = processor
                .process_files_with(&videos, dir, |outcome| {
                    writeln!(output, "{}", outcome)?;
                    Ok(())
                })
                .await;

            match result {
                Ok(summary) => write!(output, "{}", summary)?,
                Err(e) => {
                    error!("{:#}", e);
                    writeln!(output, "Batch aborted: {:#}", e)?;
                }
            }
        }
        MenuChoice::GenerateScript => {
            let platform = ScriptPlatform::current();
            match ScriptGenerator::new(&config.compression).write(dir, platform).await {
                Ok(path) => {
                    writeln!(output, "Script written to {}", path.display())?;
                    match platform {
                        ScriptPlatform::Unix => writeln!(output, "Run it with: ./{}", platform.file_name())?,
                        ScriptPlatform::Windows => writeln!(output, "Run it with: {}", platform.file_name())?,
                    }
                }
                Err(e) => {
                    error!("{:#}", e);
                    writeln!(output, "Could not write script: {:#}", e)?;
                }
            }
        }
        MenuChoice::ShowExamples => {
            writeln!(output)?;
            write!(output, "{}", example_commands(&config.compression))?;
        }
    }

    output.flush()?;
    Ok(0)
}
