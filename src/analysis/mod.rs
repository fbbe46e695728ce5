//! Prompt/response extraction and token estimation for debug logs

pub mod estimator;
pub mod report;
pub mod segmenter;

pub use estimator::{char_breakdown, estimate_tokens, CharBreakdown};
pub use report::{AnalysisReport, CallRecord, SegmentStats};
pub use segmenter::{read_log_lines, ExtractedSegments, Segment, SegmentExtractor, SegmentKind};

use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

use crate::config::AnalyzerConfig;

/// Segment already-loaded log lines and build the report
pub fn analyze_lines<S: AsRef<str>>(lines: &[S], config: &AnalyzerConfig) -> Result<AnalysisReport> {
    let extractor = SegmentExtractor::new(&config.prompt_marker, &config.response_marker)?;
    let segments = extractor.extract(lines);

    if segments.prompts.len() != segments.responses.len() {
        warn!(
            "⚠️ Found {} prompts but {} responses; calls are paired by position",
            segments.prompts.len(),
            segments.responses.len()
        );
    }

    Ok(AnalysisReport::build(&segments, config.prompt_sample_chars))
}

/// Read a log file and analyze it
pub async fn analyze_log(path: &Path, config: &AnalyzerConfig) -> Result<AnalysisReport> {
    info!("📄 Reading log: {}", path.display());
    let lines = read_log_lines(path).await?;
    info!("📏 {} lines loaded", lines.len());
    analyze_lines(&lines, config)
}
