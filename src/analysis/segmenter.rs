use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use super::estimator::estimate_tokens;

/// Box-drawing runs that close a logged section
const BOUNDARY_GLYPHS: [&str; 2] = ["└───", "┌───"];

/// Left margin drawn in front of every line inside a logged box
const MARGIN_DECORATION: &str = "│  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    Prompt,
    Response,
}

/// Cleaned text of one prompt or response section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub kind: SegmentKind,
    /// Index of the line carrying the marker
    pub start_line: usize,
    /// Index of the boundary line, or the line count when the log ends first
    pub end_line: usize,
    pub text: String,
}

impl Segment {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn estimated_tokens(&self) -> usize {
        estimate_tokens(&self.text)
    }
}

/// Prompt and response segments in extraction order
#[derive(Debug, Clone, Default)]
pub struct ExtractedSegments {
    pub prompts: Vec<Segment>,
    pub responses: Vec<Segment>,
}

/// Extracts marker-delimited sections from a debug log
#[derive(Debug, Clone)]
pub struct SegmentExtractor {
    prompt_marker: String,
    response_marker: String,
    ansi_color: Regex,
    ansi_reset: Regex,
    log_prefix: Regex,
}

impl SegmentExtractor {
    pub fn new(prompt_marker: &str, response_marker: &str) -> Result<Self> {
        Ok(Self {
            prompt_marker: prompt_marker.to_string(),
            response_marker: response_marker.to_string(),
            ansi_color: Regex::new(r"\x1b?\[38;5;\d+m")?,
            ansi_reset: Regex::new(r"\x1b?\[0m")?,
            log_prefix: Regex::new(r"I/flutter \(\d+\): ")?,
        })
    }

    /// Line indices containing `marker`, in order
    pub fn find_markers<S: AsRef<str>>(lines: &[S], marker: &str) -> Vec<usize> {
        lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.as_ref().contains(marker))
            .map(|(i, _)| i)
            .collect()
    }

    /// First boundary line after `start`, or `lines.len()`
    pub fn find_boundary<S: AsRef<str>>(lines: &[S], start: usize) -> usize {
        lines
            .iter()
            .enumerate()
            .skip(start + 1)
            .find(|(_, line)| {
                let line = line.as_ref();
                BOUNDARY_GLYPHS.iter().any(|glyph| line.contains(glyph))
            })
            .map(|(i, _)| i)
            .unwrap_or(lines.len())
    }

    /// Strip color codes, the log prefix and box margin, then trim
    pub fn clean_line(&self, line: &str) -> String {
        let line = self.ansi_color.replace_all(line, "");
        let line = self.ansi_reset.replace_all(&line, "");
        let line = self.log_prefix.replace_all(&line, "");
        line.replace(MARGIN_DECORATION, "").trim().to_string()
    }

    /// Cleaned, non-empty lines strictly between `start` and its boundary
    pub fn extract_segment<S: AsRef<str>>(
        &self,
        lines: &[S],
        start: usize,
        kind: SegmentKind,
    ) -> Segment {
        let end = Self::find_boundary(lines, start);
        let body = lines.get(start + 1..end).unwrap_or(&[]);

        let text = body
            .iter()
            .map(|line| self.clean_line(line.as_ref()))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Segment {
            kind,
            start_line: start,
            end_line: end,
            text,
        }
    }

    /// Extract every prompt and response segment from the log lines
    pub fn extract<S: AsRef<str>>(&self, lines: &[S]) -> ExtractedSegments {
        let mut prompt_starts = Vec::new();
        let mut response_starts = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            if line.contains(&self.prompt_marker) {
                prompt_starts.push(i);
            } else if line.contains(&self.response_marker) {
                response_starts.push(i);
            }
        }

        debug!(
            "🔍 Found {} prompt markers and {} response markers in {} lines",
            prompt_starts.len(),
            response_starts.len(),
            lines.len()
        );

        ExtractedSegments {
            prompts: prompt_starts
                .into_iter()
                .map(|start| self.extract_segment(lines, start, SegmentKind::Prompt))
                .collect(),
            responses: response_starts
                .into_iter()
                .map(|start| self.extract_segment(lines, start, SegmentKind::Response))
                .collect(),
        }
    }
}

/// Read a log file into lines, dropping undecodable bytes
pub async fn read_log_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read log file {}", path.display()))?;

    let content: String = bytes.utf8_chunks().map(|chunk| chunk.valid()).collect();
    Ok(content.lines().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> SegmentExtractor {
        SegmentExtractor::new("Prompt内容:", "API响应:").unwrap()
    }

    fn sample_log() -> Vec<&'static str> {
        vec![
            "I/flutter (1234): ┌────────────────",
            "I/flutter (1234): │  Prompt内容:",
            "I/flutter (1234): │  \x1b[38;5;12m请描述这张脸\x1b[0m",
            "I/flutter (1234): │  ",
            "I/flutter (1234): │  Return JSON only",
            "I/flutter (1234): └────────────────",
            "I/flutter (1234): ┌────────────────",
            "I/flutter (1234): │  API响应:",
            "I/flutter (1234): │  {\"score\": 87}",
            "I/flutter (1234): └────────────────",
        ]
    }

    #[test]
    fn test_find_markers() {
        let lines = sample_log();
        assert_eq!(SegmentExtractor::find_markers(&lines, "Prompt内容:"), vec![1]);
        assert_eq!(SegmentExtractor::find_markers(&lines, "API响应:"), vec![7]);
    }

    #[test]
    fn test_find_boundary_stops_at_either_glyph() {
        let lines = sample_log();
        assert_eq!(SegmentExtractor::find_boundary(&lines, 1), 5);
        assert_eq!(SegmentExtractor::find_boundary(&lines, 5), 6);
        assert_eq!(SegmentExtractor::find_boundary(&lines, 7), 9);
    }

    #[test]
    fn test_clean_line() {
        let extractor = extractor();
        assert_eq!(
            extractor.clean_line("I/flutter (99): │  \x1b[38;5;208mhello\x1b[0m  "),
            "hello"
        );
        // Codes without the ESC byte, as some log sinks write them
        assert_eq!(extractor.clean_line("[38;5;1mred[0m"), "red");
        assert_eq!(extractor.clean_line("I/flutter (1): │  "), "");
    }

    #[test]
    fn test_extract_prompt_and_response() {
        let segments = extractor().extract(&sample_log());

        assert_eq!(segments.prompts.len(), 1);
        assert_eq!(segments.responses.len(), 1);

        let prompt = &segments.prompts[0];
        assert_eq!(prompt.kind, SegmentKind::Prompt);
        assert_eq!(prompt.start_line, 1);
        assert_eq!(prompt.end_line, 5);
        assert_eq!(prompt.text, "请描述这张脸\nReturn JSON only");

        assert_eq!(segments.responses[0].text, "{\"score\": 87}");
    }

    #[test]
    fn test_segment_excludes_boundary_and_artifacts() {
        let segments = extractor().extract(&sample_log());
        for segment in segments.prompts.iter().chain(segments.responses.iter()) {
            assert!(!segment.text.contains('─'));
            assert!(!segment.text.contains('│'));
            assert!(!segment.text.contains("I/flutter"));
            assert!(!segment.text.contains("[38;5;"));
            assert!(!segment.text.contains("[0m"));
            assert!(!segment.text.contains('\x1b'));
        }
    }

    #[test]
    fn test_marker_without_boundary_runs_to_eof() {
        let lines = vec!["API响应:", "line one", "", "line two"];
        let segments = extractor().extract(&lines);

        assert_eq!(segments.responses.len(), 1);
        assert_eq!(segments.responses[0].end_line, 4);
        assert_eq!(segments.responses[0].text, "line one\nline two");
    }

    #[test]
    fn test_marker_on_last_line_is_empty_segment() {
        let lines = vec!["noise", "Prompt内容:"];
        let segments = extractor().extract(&lines);

        assert_eq!(segments.prompts.len(), 1);
        assert_eq!(segments.prompts[0].text, "");
        assert_eq!(segments.prompts[0].estimated_tokens(), 0);
    }

    #[test]
    fn test_empty_input() {
        let lines: Vec<String> = Vec::new();
        let segments = extractor().extract(&lines);
        assert!(segments.prompts.is_empty());
        assert!(segments.responses.is_empty());
    }

    #[test]
    fn test_prompt_count_matches_marker_lines() {
        let mut lines = Vec::new();
        for i in 0..7 {
            lines.push("Prompt内容:".to_string());
            lines.push(format!("question {}", i));
            if i % 2 == 0 {
                lines.push("└───".to_string());
            }
        }

        let segments = extractor().extract(&lines);
        let marker_lines = SegmentExtractor::find_markers(&lines, "Prompt内容:").len();
        assert_eq!(segments.prompts.len(), marker_lines);
        assert_eq!(segments.prompts.len(), 7);
    }

    #[test]
    fn test_segment_char_count_uses_chars() {
        let segments = extractor().extract(&sample_log());
        // "请描述这张脸" (6) + "\n" (1) + "Return JSON only" (16)
        assert_eq!(segments.prompts[0].char_count(), 23);
    }

    #[tokio::test]
    async fn test_read_log_lines_drops_invalid_bytes() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("debug.txt");
        tokio::fs::write(&path, b"ok\xff line\nsecond\n").await.unwrap();

        let lines = read_log_lines(&path).await.unwrap();
        assert_eq!(lines, vec!["ok line".to_string(), "second".to_string()]);
    }

    #[tokio::test]
    async fn test_read_log_lines_keeps_encoded_replacement_char() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("debug.txt");
        let mut bytes = "bad \u{fffd} glyph".as_bytes().to_vec();
        bytes.extend_from_slice(b"\xc3\n");
        tokio::fs::write(&path, &bytes).await.unwrap();

        let lines = read_log_lines(&path).await.unwrap();
        assert_eq!(lines, vec!["bad \u{fffd} glyph".to_string()]);
    }

    #[tokio::test]
    async fn test_read_log_lines_missing_file() {
        let result = read_log_lines(Path::new("/nonexistent/debug.txt")).await;
        assert!(result.is_err());
    }
}
