use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::CompressionConfig;
use crate::error::{ToolError, ToolResult};

/// Number of trailing encoder stderr lines kept on failure
const STDERR_TAIL_LINES: usize = 10;

/// Basic media properties reported by the probe.
///
/// The all-zero default stands in for a file the probe could not read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub duration_secs: f64,
    pub size_bytes: u64,
    pub width: u32,
    pub height: u32,
}

/// Fixed encoder parameters applied to every file in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodeSettings {
    pub resolution: u32,
    pub crf: u8,
    pub video_codec: String,
    pub preset: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
}

impl EncodeSettings {
    pub fn scale_filter(&self) -> String {
        format!("scale={}:{}", self.resolution, self.resolution)
    }

    /// Arguments between the input and the output path
    pub fn codec_args(&self) -> Vec<String> {
        vec![
            "-vf".to_string(),
            self.scale_filter(),
            "-c:v".to_string(),
            self.video_codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
            "-y".to_string(),
        ]
    }

    /// Full encoder argument vector for one file
    pub fn encode_args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-i".into(), input.as_os_str().to_os_string()];
        args.extend(self.codec_args().into_iter().map(OsString::from));
        args.push(output.as_os_str().to_os_string());
        args
    }

    /// Printable command line with quoted paths
    pub fn command_line(&self, encoder: &str, input: &str, output: &str) -> String {
        format!(
            "{} -i \"{}\" {} \"{}\"",
            encoder,
            input,
            self.codec_args().join(" "),
            output
        )
    }
}

impl From<&CompressionConfig> for EncodeSettings {
    fn from(config: &CompressionConfig) -> Self {
        Self {
            resolution: config.resolution,
            crf: config.crf,
            video_codec: config.video_codec.clone(),
            preset: config.preset.clone(),
            audio_codec: config.audio_codec.clone(),
            audio_bitrate: config.audio_bitrate.clone(),
        }
    }
}

/// Parse `ffprobe -print_format json` output.
///
/// Duration and size come from `format`; width and height from the first
/// stream that reports a width.
pub fn parse_probe_output(json_str: &str) -> std::result::Result<MediaInfo, String> {
    let data: serde_json::Value =
        serde_json::from_str(json_str).map_err(|e| format!("invalid probe output: {}", e))?;

    let format = &data["format"];
    let duration_secs = format["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or("missing format.duration")?;
    let size_bytes = format["size"]
        .as_str()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or("missing format.size")?;

    let stream = data["streams"]
        .as_array()
        .and_then(|streams| streams.iter().find(|s| s["width"].is_u64()))
        .ok_or("no stream with a width")?;

    Ok(MediaInfo {
        duration_secs,
        size_bytes,
        width: stream["width"].as_u64().unwrap_or(0) as u32,
        height: stream["height"].as_u64().unwrap_or(0) as u32,
    })
}

/// Video files directly inside `dir`, sorted by name. Subdirectories are not entered.
pub fn discover_videos(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut videos = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if let Some(ext_str) = path.extension().and_then(|e| e.to_str()) {
            let ext_lower = ext_str.to_lowercase();
            if extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext_lower)) {
                videos.push(path.to_path_buf());
            }
        }
    }

    videos.sort();
    Ok(videos)
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

/// External encoder and probe used by the batch driver
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Confirm the encoder can be launched; returns its version banner
    async fn check_encoder(&self) -> ToolResult<String>;

    /// Read duration, size and frame dimensions of a file
    async fn probe(&self, path: &Path) -> ToolResult<MediaInfo>;

    /// Re-encode `input` into `output`
    async fn encode(&self, input: &Path, output: &Path, settings: &EncodeSettings) -> ToolResult<()>;
}

/// `MediaToolkit` backed by the ffmpeg/ffprobe command line tools
#[derive(Debug, Clone)]
pub struct FfmpegToolkit {
    encoder: String,
    probe: String,
}

impl FfmpegToolkit {
    pub fn new(encoder: &str, probe: &str) -> Self {
        Self {
            encoder: encoder.to_string(),
            probe: probe.to_string(),
        }
    }

    pub fn from_config(config: &CompressionConfig) -> Self {
        Self::new(&config.encoder, &config.probe)
    }

    pub fn encoder(&self) -> &str {
        &self.encoder
    }
}

impl Default for FfmpegToolkit {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn check_encoder(&self) -> ToolResult<String> {
        let output = tokio::process::Command::new(&self.encoder)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ToolError::EncoderUnavailable {
                program: self.encoder.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ToolError::EncoderUnavailable {
                program: self.encoder.clone(),
                reason: format!("`{} -version` exited with {}", self.encoder, output.status),
            });
        }

        let banner = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();
        debug!("🔧 {}", banner);
        Ok(banner)
    }

    async fn probe(&self, path: &Path) -> ToolResult<MediaInfo> {
        let output = tokio::process::Command::new(&self.probe)
            .args([
                "-v", "quiet",
                "-print_format", "json",
                "-show_entries", "format=duration,size:stream=width,height",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ToolError::ProbeFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ToolError::ProbeFailed {
                path: path.to_path_buf(),
                reason: format!("{} exited with {}", self.probe, output.status),
            });
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        let info = parse_probe_output(&json_str).map_err(|reason| ToolError::ProbeFailed {
            path: path.to_path_buf(),
            reason,
        })?;

        info!(
            "📹 Analyzed video: {} ({}x{}, {:.1}s, {} bytes)",
            path.display(),
            info.width,
            info.height,
            info.duration_secs,
            info.size_bytes
        );
        Ok(info)
    }

    async fn encode(&self, input: &Path, output: &Path, settings: &EncodeSettings) -> ToolResult<()> {
        debug!(
            "🎬 {}",
            settings.command_line(
                &self.encoder,
                &input.display().to_string(),
                &output.display().to_string()
            )
        );

        let result = tokio::process::Command::new(&self.encoder)
            .args(settings.encode_args(input, output))
            .stdin(Stdio::null())
            .output()
            .await?;

        if !result.status.success() {
            return Err(ToolError::EncodeFailed {
                input: input.to_path_buf(),
                stderr: stderr_tail(&result.stderr),
            });
        }

        Ok(())
    }
}
