use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration shared by the log analyzer and the video compressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log segment extraction settings
    pub analyzer: AnalyzerConfig,

    /// Batch compression settings
    pub compression: CompressionConfig,

    /// Logging and output settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Debug log analyzed when no path is given on the command line
    pub log_file: PathBuf,

    /// Marker phrase that opens a prompt section
    pub prompt_marker: String,

    /// Marker phrase that opens a response section
    pub response_marker: String,

    /// Number of characters of the first prompt shown as a sample
    pub prompt_sample_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// Encoder executable (ffmpeg)
    pub encoder: String,

    /// Probe executable (ffprobe)
    pub probe: String,

    /// Side length of the square output frame, in pixels
    pub resolution: u32,

    /// Constant rate factor handed to the video codec
    pub crf: u8,

    /// Video codec name
    pub video_codec: String,

    /// Encoder speed preset
    pub preset: String,

    /// Audio codec name
    pub audio_codec: String,

    /// Audio bitrate, ffmpeg notation
    pub audio_bitrate: String,

    /// Output subdirectory created under the input directory
    pub output_dir: PathBuf,

    /// Video file extensions picked up by the batch scan
    pub supported_extensions: Vec<String>,

    /// Write compression_results.json into the output directory
    pub write_results_json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_paths = [
            Path::new("token-video-toolkit.toml"),
            Path::new("config/token-video-toolkit.toml"),
        ];
        Self::load_first(&config_paths, |key| std::env::var(key).ok())
    }

    /// First candidate that parses wins; environment overrides apply either way
    fn load_first<F>(paths: &[&Path], lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        for path in paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        config.apply_overrides(&lookup);
                        tracing::info!("📄 Loaded configuration from: {}", path.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
                    }
                }
            }
        }

        let mut config = Self::default();
        config.apply_overrides(&lookup);
        Ok(config)
    }

    /// Load configuration from an explicit file, then apply environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env();
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(log_file) = lookup("TVT_LOG_FILE") {
            self.analyzer.log_file = PathBuf::from(log_file);
        }

        if let Some(resolution) = lookup("TVT_RESOLUTION") {
            self.compression.resolution = resolution.parse().unwrap_or(self.compression.resolution);
        }

        if let Some(crf) = lookup("TVT_CRF") {
            self.compression.crf = crf.parse().unwrap_or(self.compression.crf);
        }

        if let Some(preset) = lookup("TVT_PRESET") {
            self.compression.preset = preset;
        }

        if let Some(output_dir) = lookup("TVT_OUTPUT_DIR") {
            self.compression.output_dir = PathBuf::from(output_dir);
        }

        if let Some(log_level) = lookup("TVT_LOG_LEVEL") {
            self.output.log_level = log_level;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.analyzer.prompt_marker.is_empty() || self.analyzer.response_marker.is_empty() {
            return Err(anyhow!("prompt_marker and response_marker must not be empty"));
        }

        if self.compression.resolution == 0 {
            return Err(anyhow!("resolution must be greater than 0"));
        }

        // libx264 accepts 0..=51
        if self.compression.crf > 51 {
            return Err(anyhow!("crf must be between 0 and 51, got {}", self.compression.crf));
        }

        if self.compression.supported_extensions.is_empty() {
            return Err(anyhow!("supported_extensions must list at least one extension"));
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Toolkit Configuration:\n\
            - Log File: {}\n\
            - Markers: {:?} / {:?}\n\
            - Encoder: {} (probe: {})\n\
            - Resolution: {}x{}\n\
            - CRF: {}\n\
            - Codecs: {} ({}) / {} @ {}\n\
            - Output Directory: {}\n\
            - Supported Extensions: {}",
            self.analyzer.log_file.display(),
            self.analyzer.prompt_marker,
            self.analyzer.response_marker,
            self.compression.encoder,
            self.compression.probe,
            self.compression.resolution,
            self.compression.resolution,
            self.compression.crf,
            self.compression.video_codec,
            self.compression.preset,
            self.compression.audio_codec,
            self.compression.audio_bitrate,
            self.compression.output_dir.display(),
            self.compression.supported_extensions.join(", "),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerConfig {
                log_file: PathBuf::from("logs/flutter_debug.txt"),
                prompt_marker: "Prompt内容:".to_string(),
                response_marker: "API响应:".to_string(),
                prompt_sample_chars: 500,
            },
            compression: CompressionConfig {
                encoder: "ffmpeg".to_string(),
                probe: "ffprobe".to_string(),
                resolution: 512,
                crf: 23,
                video_codec: "libx264".to_string(),
                preset: "medium".to_string(),
                audio_codec: "aac".to_string(),
                audio_bitrate: "128k".to_string(),
                output_dir: PathBuf::from("compressed_videos"),
                supported_extensions: vec!["mp4".to_string()],
                write_results_json: false,
            },
            output: OutputConfig {
                log_level: "info".to_string(),
            },
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_log_file(mut self, path: PathBuf) -> Self {
        self.config.analyzer.log_file = path;
        self
    }

    pub fn with_markers(mut self, prompt: &str, response: &str) -> Self {
        self.config.analyzer.prompt_marker = prompt.to_string();
        self.config.analyzer.response_marker = response.to_string();
        self
    }

    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.config.compression.resolution = resolution;
        self
    }

    pub fn with_crf(mut self, crf: u8) -> Self {
        self.config.compression.crf = crf;
        self
    }

    pub fn with_preset(mut self, preset: &str) -> Self {
        self.config.compression.preset = preset.to_string();
        self
    }

    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.config.compression.output_dir = dir;
        self
    }

    pub fn with_encoder(mut self, encoder: &str, probe: &str) -> Self {
        self.config.compression.encoder = encoder.to_string();
        self.config.compression.probe = probe.to_string();
        self
    }

    pub fn write_results_json(mut self, enable: bool) -> Self {
        self.config.compression.write_results_json = enable;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
