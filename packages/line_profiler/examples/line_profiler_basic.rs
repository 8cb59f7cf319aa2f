//! Profiles a small text-processing routine and prints both reports.
//!
//! Run with: `cargo run --example line_profiler_basic`.

use std::collections::HashMap;
use std::hint::black_box;

use line_profiler::{LineSortKey, ReportOptions, TopLinesOptions, probe, probe_line};

fn word_frequencies(text: &str) -> HashMap<String, usize> {
    let p = probe!();
    probe_line!(p);
    let lowered = text.to_lowercase();
    probe_line!(p);
    let mut counts = HashMap::new();
    probe_line!(p);
    for word in lowered.split_whitespace() {
        let entry: &mut usize = counts.entry(word.to_owned()).or_default();
        *entry = entry.saturating_add(1);
    }
    probe_line!(p);
    counts
}

fn most_common(counts: &HashMap<String, usize>) -> Option<(&str, usize)> {
    let p = probe!();
    probe_line!(p);
    let best = counts.iter().max_by_key(|(_, count)| **count);
    probe_line!(p);
    best.map(|(word, count)| (word.as_str(), *count))
}

fn main() {
    let text = "the quick brown fox jumps over the lazy dog ".repeat(2_000);

    let mut profiler = line_profiler::profiler!();
    println!("Project root: {:?}", profiler.project_root());
    println!();

    {
        let _active = profiler
            .enable()
            .expect("no other line profiler is active on the main thread");

        for _ in 0..5 {
            let counts = word_frequencies(&text);
            black_box(most_common(&counts));
        }
    }

    profiler.print_stats(ReportOptions::new().sort_by(LineSortKey::Line));
    profiler.print_global_top_stats(TopLinesOptions::new().top_n(5));
}
