/// Characters per token for CJK Unified Ideographs
const CJK_CHARS_PER_TOKEN: f64 = 1.5;

/// Characters per token for everything else
const OTHER_CHARS_PER_TOKEN: f64 = 3.5;

/// Character composition of a piece of text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharBreakdown {
    pub cjk: usize,
    pub other: usize,
}

impl CharBreakdown {
    pub fn total(&self) -> usize {
        self.cjk + self.other
    }
}

/// Whether `c` falls inside the CJK Unified Ideographs block (U+4E00..=U+9FFF)
pub fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// Split the characters of `text` into CJK and other
pub fn char_breakdown(text: &str) -> CharBreakdown {
    let mut breakdown = CharBreakdown::default();
    for c in text.chars() {
        if is_cjk(c) {
            breakdown.cjk += 1;
        } else {
            breakdown.other += 1;
        }
    }
    breakdown
}

/// Heuristic token count: floor(cjk / 1.5 + other / 3.5).
///
/// This is not a tokenizer. The divisors and the flooring are kept fixed so
/// numbers stay comparable with earlier reports.
pub fn estimate_tokens(text: &str) -> usize {
    let breakdown = char_breakdown(text);
    let tokens = breakdown.cjk as f64 / CJK_CHARS_PER_TOKEN
        + breakdown.other as f64 / OTHER_CHARS_PER_TOKEN;
    tokens.floor() as usize
}
