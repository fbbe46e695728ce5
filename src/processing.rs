use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::config::CompressionConfig;
use crate::error::{ToolError, ToolResult};
use crate::video::{discover_videos, EncodeSettings, MediaInfo, MediaToolkit};

/// Outcome of compressing one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Probe result for the source; all zero when the probe failed
    pub original: MediaInfo,
    pub compressed_size: u64,
    /// Side length of the square frame the file was scaled to
    pub target_resolution: u32,
    pub elapsed: Duration,
    pub status: JobStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobStatus {
    Succeeded,
    /// Encoder ran and exited non-zero
    EncodeFailed { stderr: String },
    /// Anything else that stopped the job
    Failed { reason: String },
}

impl CompressionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, JobStatus::Succeeded)
    }

    pub fn filename(&self) -> String {
        self.input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.input.display().to_string())
    }

    pub fn size_change_percent(&self) -> Option<f64> {
        size_change_percent(self.original.size_bytes, self.compressed_size)
    }

    /// Succeeded with a known original size, so it can enter size totals
    pub fn is_measured(&self) -> bool {
        self.is_success() && self.original.size_bytes > 0
    }
}

impl fmt::Display for CompressionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            JobStatus::Succeeded => {
                writeln!(f, "✓ Done: {}", self.filename())?;
                writeln!(
                    f,
                    "  Original:   {}x{}, {}",
                    self.original.width,
                    self.original.height,
                    format_size(self.original.size_bytes)
                )?;
                writeln!(
                    f,
                    "  Compressed: {}x{}, {}",
                    self.target_resolution,
                    self.target_resolution,
                    format_size(self.compressed_size)
                )?;
                match self.size_change_percent() {
                    Some(pct) if pct >= 0.0 => writeln!(f, "  Size:       {:.1}% smaller", pct)?,
                    Some(pct) => writeln!(f, "  Size:       {:.1}% larger", -pct)?,
                    None => writeln!(f, "  Size:       original size unknown")?,
                }
                writeln!(f, "  Time:       {:.1}s", self.elapsed.as_secs_f64())
            }
            JobStatus::EncodeFailed { stderr } => {
                writeln!(f, "✗ Failed: {}", self.filename())?;
                writeln!(f, "  Encoder output:")?;
                for line in stderr.lines() {
                    writeln!(f, "    {}", line)?;
                }
                Ok(())
            }
            JobStatus::Failed { reason } => {
                writeln!(f, "✗ Failed: {}", self.filename())?;
                writeln!(f, "  Error: {}", reason)
            }
        }
    }
}

/// Percentage saved relative to `original`; negative when the file grew.
/// `None` when the original size is unknown (zero).
pub fn size_change_percent(original: u64, compressed: u64) -> Option<f64> {
    if original == 0 {
        return None;
    }
    Some((original as f64 - compressed as f64) * 100.0 / original as f64)
}

/// Human readable byte count
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit])
    }
}

/// Totals over one batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_time: Duration,
    pub finished_at: DateTime<Local>,
    pub results: Vec<CompressionOutcome>,
}

impl BatchSummary {
    fn from_results(results: Vec<CompressionOutcome>, total_time: Duration) -> Self {
        let successful = results.iter().filter(|r| r.is_success()).count();
        Self {
            total: results.len(),
            successful,
            failed: results.len() - successful,
            total_time,
            finished_at: Local::now(),
            results,
        }
    }

    /// Original bytes over successful files whose original size is known
    pub fn original_bytes(&self) -> u64 {
        self.results
            .iter()
            .filter(|r| r.is_measured())
            .map(|r| r.original.size_bytes)
            .sum()
    }

    /// Compressed bytes over the same files as `original_bytes`
    pub fn compressed_bytes(&self) -> u64 {
        self.results
            .iter()
            .filter(|r| r.is_measured())
            .map(|r| r.compressed_size)
            .sum()
    }

    /// Successful files left out of the size totals
    pub fn unmeasured(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.is_success() && !r.is_measured())
            .count()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "Compression finished")?;
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "Files:      {}", self.total)?;
        writeln!(f, "Succeeded:  {}", self.successful)?;
        writeln!(f, "Failed:     {}", self.failed)?;
        writeln!(f, "Total time: {:.1}s", self.total_time.as_secs_f64())?;

        let original = self.original_bytes();
        let compressed = self.compressed_bytes();
        if original > 0 {
            write!(
                f,
                "Size:       {} -> {}",
                format_size(original),
                format_size(compressed)
            )?;
            match size_change_percent(original, compressed) {
                Some(pct) if pct >= 0.0 => writeln!(f, " ({:.1}% smaller)", pct)?,
                Some(pct) => writeln!(f, " ({:.1}% larger)", -pct)?,
                None => writeln!(f)?,
            }
        }
        let unmeasured = self.unmeasured();
        if unmeasured > 0 {
            writeln!(f, "Unknown original size (not in totals): {}", unmeasured)?;
        }

        for result in self.results.iter().filter(|r| !r.is_success()) {
            writeln!(f, "  ✗ {}", result.filename())?;
        }
        Ok(())
    }
}

/// Sequential batch compressor over an external media toolkit
pub struct BatchProcessor {
    config: CompressionConfig,
    settings: EncodeSettings,
    toolkit: Arc<dyn MediaToolkit>,
}

impl BatchProcessor {
    pub fn new(config: CompressionConfig, toolkit: Arc<dyn MediaToolkit>) -> Self {
        let settings = EncodeSettings::from(&config);
        Self {
            config,
            settings,
            toolkit,
        }
    }

    pub fn settings(&self) -> &EncodeSettings {
        &self.settings
    }

    /// Check that the encoder can be launched before any file is touched
    pub async fn preflight(&self) -> ToolResult<String> {
        self.toolkit.check_encoder().await
    }

    /// Matching video files directly inside `input_dir`
    pub fn discover(&self, input_dir: &Path) -> Result<Vec<PathBuf>> {
        discover_videos(input_dir, &self.config.supported_extensions)
            .with_context(|| format!("Failed to scan {}", input_dir.display()))
    }

    /// Compress every matching file in `input_dir`
    pub async fn process_directory(&self, input_dir: &Path) -> Result<BatchSummary> {
        let videos = self.discover(input_dir)?;
        self.process_files(&videos, input_dir).await
    }

    /// Compress `videos` one after another into the output directory under `input_dir`
    pub async fn process_files(&self, videos: &[PathBuf], input_dir: &Path) -> Result<BatchSummary> {
        self.process_files_with(videos, input_dir, |_| Ok(())).await
    }

    /// Like `process_files`, handing each outcome to `on_outcome` as soon as it is known
    pub async fn process_files_with<F>(
        &self,
        videos: &[PathBuf],
        input_dir: &Path,
        mut on_outcome: F,
    ) -> Result<BatchSummary>
    where
        F: FnMut(&CompressionOutcome) -> Result<()>,
    {
        let start_time = Instant::now();

        if videos.is_empty() {
            warn!("No videos found in {}", input_dir.display());
            return Ok(BatchSummary::from_results(Vec::new(), start_time.elapsed()));
        }

        let output_dir = input_dir.join(&self.config.output_dir);
        tokio::fs::create_dir_all(&output_dir)
            .await
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        info!("🚀 Compressing {} videos into {}", videos.len(), output_dir.display());

        let mut results = Vec::with_capacity(videos.len());
        for (index, video) in videos.iter().enumerate() {
            info!("📹 [{}/{}] {}", index + 1, videos.len(), video.display());
            let outcome = self.process_file(video, &output_dir).await;
            log_outcome(&outcome);
            on_outcome(&outcome)?;
            results.push(outcome);
        }

        let summary = BatchSummary::from_results(results, start_time.elapsed());

        if self.config.write_results_json {
            let results_path = output_dir.join("compression_results.json");
            let json_data = serde_json::to_string_pretty(&summary)?;
            tokio::fs::write(&results_path, json_data).await?;
            info!("💾 Results saved to: {}", results_path.display());
        }

        Ok(summary)
    }

    /// Probe and encode a single file. Never fails: errors land in the outcome.
    pub async fn process_file(&self, input: &Path, output_dir: &Path) -> CompressionOutcome {
        let start_time = Instant::now();
        let output = match input.file_name() {
            Some(name) => output_dir.join(name),
            None => output_dir.join("output.mp4"),
        };

        let original = match self.toolkit.probe(input).await {
            Ok(info) => info,
            Err(e) => {
                warn!("⚠️ {}; continuing with unknown original size", e);
                MediaInfo::default()
            }
        };

        let mut outcome = CompressionOutcome {
            input: input.to_path_buf(),
            output: output.clone(),
            original,
            compressed_size: 0,
            target_resolution: self.settings.resolution,
            elapsed: Duration::from_secs(0),
            status: JobStatus::Succeeded,
        };

        match self.encode_and_measure(input, &output).await {
            Ok(size) => outcome.compressed_size = size,
            Err(ToolError::EncodeFailed { stderr, .. }) => {
                outcome.status = JobStatus::EncodeFailed { stderr };
            }
            Err(e) => {
                outcome.status = JobStatus::Failed {
                    reason: e.to_string(),
                };
            }
        }

        outcome.elapsed = start_time.elapsed();
        outcome
    }

    async fn encode_and_measure(&self, input: &Path, output: &Path) -> ToolResult<u64> {
        self.toolkit.encode(input, output, &self.settings).await?;
        Ok(tokio::fs::metadata(output).await?.len())
    }
}

fn log_outcome(outcome: &CompressionOutcome) {
    match &outcome.status {
        JobStatus::Succeeded => {
            let change = match outcome.size_change_percent() {
                Some(pct) if pct >= 0.0 => format!("{:.1}% smaller", pct),
                Some(pct) => format!("{:.1}% larger", -pct),
                None => "original size unknown".to_string(),
            };
            info!(
                "✅ {}: {}x{} -> {}x{}, {} -> {} ({}) in {:.2}s",
                outcome.filename(),
                outcome.original.width,
                outcome.original.height,
                outcome.target_resolution,
                outcome.target_resolution,
                format_size(outcome.original.size_bytes),
                format_size(outcome.compressed_size),
                change,
                outcome.elapsed.as_secs_f64()
            );
        }
        JobStatus::EncodeFailed { stderr } => {
            error!("❌ Encoding failed: {}\n{}", outcome.filename(), stderr);
        }
        JobStatus::Failed { reason } => {
            error!("❌ Failed: {} - {}", outcome.filename(), reason);
        }
    }
}
