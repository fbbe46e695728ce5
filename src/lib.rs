/// Token/Video Toolkit
///
/// Two small command-line utilities sharing one library: a debug-log
/// prompt/response token estimator and an ffmpeg batch video compressor.

pub mod analysis;
pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod menu;
pub mod processing;
pub mod script;
pub mod video;

// Re-export main types for easy access
pub use crate::analysis::{analyze_lines, analyze_log, estimate_tokens, AnalysisReport, SegmentExtractor};
pub use crate::app::run_compressor;
pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::ToolError;
pub use crate::menu::MenuChoice;
pub use crate::processing::{BatchProcessor, BatchSummary, CompressionOutcome, JobStatus};
pub use crate::script::{ScriptGenerator, ScriptPlatform};
pub use crate::video::{EncodeSettings, FfmpegToolkit, MediaInfo, MediaToolkit};
