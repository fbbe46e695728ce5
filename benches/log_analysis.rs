use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::fs;
use tempfile::TempDir;
use token_video_toolkit::video::discover_videos;
use token_video_toolkit::{analyze_lines, estimate_tokens, Config, SegmentExtractor};

/// Synthetic debug log with `calls` prompt/response boxes
fn synthetic_log(calls: usize) -> Vec<String> {
    let mut lines = Vec::with_capacity(calls * 12);
    for i in 0..calls {
        lines.push("I/flutter (4821): ┌──────────────────────────".to_string());
        lines.push("I/flutter (4821): │  \x1b[38;5;12m💬 Prompt内容:\x1b[0m".to_string());
        for j in 0..4 {
            lines.push(format!(
                "I/flutter (4821): │  \x1b[38;5;12m请分析第{}张照片的第{}个特征 and answer in JSON\x1b[0m",
                i, j
            ));
        }
        lines.push("I/flutter (4821): └──────────────────────────".to_string());
        lines.push("I/flutter (4821): ┌──────────────────────────".to_string());
        lines.push("I/flutter (4821): │  \x1b[38;5;10m✅ API响应:\x1b[0m".to_string());
        lines.push(format!(
            "I/flutter (4821): │  \x1b[38;5;10m{{\"call\": {}, \"score\": 90, \"comment\": \"很好\"}}\x1b[0m",
            i
        ));
        lines.push("I/flutter (4821): └──────────────────────────".to_string());
    }
    lines
}

/// Benchmark token estimation on mixed CJK/ASCII text
fn bench_estimate_tokens(c: &mut Criterion) {
    let text = "你是一个面部评分助手。Return a JSON object with score and comment. ".repeat(200);

    c.bench_function("estimate_tokens", |b| {
        b.iter(|| estimate_tokens(black_box(&text)))
    });
}

/// Benchmark segment extraction at several log sizes
fn bench_segment_extraction(c: &mut Criterion) {
    let extractor = SegmentExtractor::new("Prompt内容:", "API响应:").unwrap();
    let mut group = c.benchmark_group("segment_extraction");

    for calls in [10, 100, 1000] {
        let lines = synthetic_log(calls);
        group.bench_with_input(BenchmarkId::from_parameter(calls), &lines, |b, lines| {
            b.iter(|| extractor.extract(black_box(lines)))
        });
    }

    group.finish();
}

/// Benchmark the full analysis including report aggregation
fn bench_full_analysis(c: &mut Criterion) {
    let config = Config::default();
    let lines = synthetic_log(500);

    c.bench_function("analyze_lines_500_calls", |b| {
        b.iter(|| analyze_lines(black_box(&lines), &config.analyzer))
    });
}

/// Benchmark video discovery in a directory of mixed files
fn bench_video_discovery(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    for i in 0..200 {
        let ext = if i % 3 == 0 { "txt" } else { "mp4" };
        fs::write(temp_dir.path().join(format!("clip_{}.{}", i, ext)), b"").unwrap();
    }
    let extensions = Config::default().compression.supported_extensions;

    c.bench_function("video_discovery", |b| {
        b.iter(|| discover_videos(black_box(temp_dir.path()), &extensions))
    });
}

criterion_group!(
    benches,
    bench_estimate_tokens,
    bench_segment_extraction,
    bench_full_analysis,
    bench_video_discovery
);
criterion_main!(benches);
