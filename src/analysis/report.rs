use serde::{Deserialize, Serialize};
use std::fmt;

use super::segmenter::{ExtractedSegments, Segment};

const RULE_WIDTH: usize = 70;

/// Character and token counts of one segment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentStats {
    pub chars: usize,
    pub tokens: usize,
}

impl From<&Segment> for SegmentStats {
    fn from(segment: &Segment) -> Self {
        Self {
            chars: segment.char_count(),
            tokens: segment.estimated_tokens(),
        }
    }
}

/// The i-th prompt paired with the i-th response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    /// 1-based call number
    pub index: usize,
    pub prompt: SegmentStats,
    pub response: SegmentStats,
}

impl CallRecord {
    pub fn char_ratio(&self) -> Option<f64> {
        ratio(self.response.chars, self.prompt.chars)
    }

    pub fn token_ratio(&self) -> Option<f64> {
        ratio(self.response.tokens, self.prompt.tokens)
    }
}

/// `numerator / denominator`, or `None` when the denominator is zero
pub fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64)
    }
}

/// Full result of one log analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub prompts_found: usize,
    pub responses_found: usize,
    pub records: Vec<CallRecord>,
    pub total_prompt: SegmentStats,
    pub total_response: SegmentStats,
    pub prompt_sample_chars: usize,
    pub prompt_sample: Option<String>,
    pub response_sample: Option<String>,
}

impl AnalysisReport {
    /// Pair segments by position and aggregate their counts.
    ///
    /// Pairing stops at the shorter of the two lists.
    pub fn build(segments: &ExtractedSegments, prompt_sample_chars: usize) -> Self {
        let records: Vec<CallRecord> = segments
            .prompts
            .iter()
            .zip(segments.responses.iter())
            .enumerate()
            .map(|(i, (prompt, response))| CallRecord {
                index: i + 1,
                prompt: prompt.into(),
                response: response.into(),
            })
            .collect();

        let mut total_prompt = SegmentStats::default();
        let mut total_response = SegmentStats::default();
        for record in &records {
            total_prompt.chars += record.prompt.chars;
            total_prompt.tokens += record.prompt.tokens;
            total_response.chars += record.response.chars;
            total_response.tokens += record.response.tokens;
        }

        Self {
            prompts_found: segments.prompts.len(),
            responses_found: segments.responses.len(),
            records,
            total_prompt,
            total_response,
            prompt_sample_chars,
            prompt_sample: segments
                .prompts
                .first()
                .map(|p| truncate_chars(&p.text, prompt_sample_chars)),
            response_sample: segments.responses.first().map(|r| r.text.clone()),
        }
    }

    pub fn is_balanced(&self) -> bool {
        self.prompts_found == self.responses_found
    }

    pub fn average_prompt(&self) -> Option<(f64, f64)> {
        average(self.total_prompt, self.prompts_found)
    }

    pub fn average_response(&self) -> Option<(f64, f64)> {
        average(self.total_response, self.responses_found)
    }

    pub fn overall_char_ratio(&self) -> Option<f64> {
        ratio(self.total_response.chars, self.total_prompt.chars)
    }

    pub fn overall_token_ratio(&self) -> Option<f64> {
        ratio(self.total_response.tokens, self.total_prompt.tokens)
    }
}

// Averages divide by the number of segments found, not the number of pairs
fn average(total: SegmentStats, count: usize) -> Option<(f64, f64)> {
    if count == 0 {
        return None;
    }
    Some((
        total.chars as f64 / count as f64,
        total.tokens as f64 / count as f64,
    ))
}

/// First `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn fmt_ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v))
}

fn heading(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(f, "{}", rule)?;
    writeln!(f, "{}", title)?;
    writeln!(f, "{}", rule)
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Found {} API calls", self.prompts_found)?;
        writeln!(f)?;
        heading(f, "API call statistics")?;

        for record in &self.records {
            writeln!(f)?;
            writeln!(f, "Call #{}:", record.index)?;
            writeln!(
                f,
                "  Prompt:   {:6} chars, ~{:4} tokens",
                record.prompt.chars, record.prompt.tokens
            )?;
            writeln!(
                f,
                "  Response: {:6} chars, ~{:4} tokens",
                record.response.chars, record.response.tokens
            )?;
            writeln!(
                f,
                "  Ratio: Response/Prompt = {} (chars), {} (tokens)",
                fmt_ratio(record.char_ratio()),
                fmt_ratio(record.token_ratio())
            )?;
        }

        writeln!(f)?;
        heading(f, "Totals")?;
        writeln!(f, "Total prompt chars:    {:8} chars", self.total_prompt.chars)?;
        writeln!(f, "Total response chars:  {:8} chars", self.total_response.chars)?;
        writeln!(f, "Total prompt tokens:   ~{:6} tokens", self.total_prompt.tokens)?;
        writeln!(f, "Total response tokens: ~{:6} tokens", self.total_response.tokens)?;

        writeln!(f)?;
        writeln!(f, "Average per call:")?;
        match self.average_prompt() {
            Some((chars, tokens)) => {
                writeln!(f, "  Prompt:   {:.0} chars, ~{:.0} tokens", chars, tokens)?
            }
            None => writeln!(f, "  Prompt:   n/a")?,
        }
        match self.average_response() {
            Some((chars, tokens)) => {
                writeln!(f, "  Response: {:.0} chars, ~{:.0} tokens", chars, tokens)?
            }
            None => writeln!(f, "  Response: n/a")?,
        }

        writeln!(f)?;
        writeln!(f, "Overall ratio:")?;
        writeln!(
            f,
            "  Response/Prompt = {} (chars)",
            fmt_ratio(self.overall_char_ratio())
        )?;
        writeln!(
            f,
            "  Response/Prompt = {} (tokens)",
            fmt_ratio(self.overall_token_ratio())
        )?;

        writeln!(f)?;
        heading(
            f,
            &format!("First prompt sample (first {} chars):", self.prompt_sample_chars),
        )?;
        if let Some(sample) = &self.prompt_sample {
            writeln!(f, "{}", sample)?;
        }

        writeln!(f)?;
        heading(f, "First response sample:")?;
        if let Some(sample) = &self.response_sample {
            writeln!(f, "{}", sample)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::segmenter::SegmentKind;

    fn segment(kind: SegmentKind, text: &str) -> Segment {
        Segment {
            kind,
            start_line: 0,
            end_line: 0,
            text: text.to_string(),
        }
    }

    fn segments(prompts: &[&str], responses: &[&str]) -> ExtractedSegments {
        ExtractedSegments {
            prompts: prompts.iter().map(|t| segment(SegmentKind::Prompt, t)).collect(),
            responses: responses
                .iter()
                .map(|t| segment(SegmentKind::Response, t))
                .collect(),
        }
    }

    #[test]
    fn test_records_pair_by_position() {
        let report = AnalysisReport::build(&segments(&["你好hello", "abcdefg"], &["abc", "你好世界"]), 500);

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0].index, 1);
        assert_eq!(report.records[0].prompt, SegmentStats { chars: 7, tokens: 2 });
        assert_eq!(report.records[1].response, SegmentStats { chars: 4, tokens: 2 });

        assert_eq!(report.total_prompt, SegmentStats { chars: 14, tokens: 4 });
        assert_eq!(report.total_response, SegmentStats { chars: 7, tokens: 2 });
        assert!(report.is_balanced());
    }

    #[test]
    fn test_zero_denominators_are_guarded() {
        let report = AnalysisReport::build(&segments(&[""], &["abcdefg"]), 500);
        let record = &report.records[0];

        assert_eq!(record.char_ratio(), None);
        assert_eq!(record.token_ratio(), None);
        assert_eq!(report.overall_char_ratio(), None);

        let rendered = report.to_string();
        assert!(rendered.contains("Response/Prompt = n/a (chars), n/a (tokens)"));
    }

    #[test]
    fn test_empty_log_report() {
        let report = AnalysisReport::build(&ExtractedSegments::default(), 500);

        assert!(report.records.is_empty());
        assert_eq!(report.average_prompt(), None);
        assert_eq!(report.average_response(), None);
        assert_eq!(report.prompt_sample, None);

        let rendered = report.to_string();
        assert!(rendered.starts_with("Found 0 API calls"));
        assert!(rendered.contains("Prompt:   n/a"));
    }

    #[test]
    fn test_unbalanced_counts_truncate_pairs() {
        let report = AnalysisReport::build(&segments(&["a", "b", "c"], &["x"]), 500);
        assert_eq!(report.records.len(), 1);
        assert!(!report.is_balanced());
        assert_eq!(report.prompts_found, 3);
        assert_eq!(report.responses_found, 1);
    }

    #[test]
    fn test_ratios() {
        let report = AnalysisReport::build(&segments(&["abcdefghijklmn"], &["abcdefg"]), 500);
        assert_eq!(report.records[0].char_ratio(), Some(0.5));
        assert_eq!(report.records[0].token_ratio(), Some(0.5));
        assert!(report.to_string().contains("Response/Prompt = 0.50 (chars), 0.50 (tokens)"));
    }

    #[test]
    fn test_prompt_sample_truncated_by_chars() {
        let long_prompt = "字".repeat(600);
        let report = AnalysisReport::build(&segments(&[&long_prompt], &["full response"]), 500);

        assert_eq!(report.prompt_sample.as_ref().unwrap().chars().count(), 500);
        assert_eq!(report.response_sample.as_deref(), Some("full response"));
    }
}
