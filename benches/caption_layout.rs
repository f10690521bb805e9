//! Benchmarks for caption layout
//!
//! Covers cue timing from measured scene durations and rendering the ASS
//! script burned into every video.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use jobreel::pipeline::caption_texts;
use jobreel::planning::{PlanSource, Scene, ShotPlan};
use jobreel_av::compose::{build_cues, format_timestamp, render_ass};
use jobreel_av::CaptionStyle;
use jobreel_common::HexColor;

fn durations(count: usize) -> Vec<f64> {
    (0..count).map(|i| 7.9 + (i % 3) as f64 * 0.07).collect()
}

fn texts(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("Scene {}: build {{reliable}} systems\nwith a kind team", i))
        .collect()
}

fn plan(count: usize) -> ShotPlan {
    ShotPlan {
        aspect_ratio: "9:16".into(),
        music_mood: "corporate_ambient".into(),
        subtitle_style: "boxed_bottom".into(),
        scenes: (0..count)
            .map(|i| Scene {
                duration_secs: 8.0,
                visual: "office".into(),
                overlay_text: if i % 2 == 0 { String::new() } else { format!("Overlay {}", i) },
            })
            .collect(),
        source: PlanSource::Generated,
    }
}

fn bench_build_cues(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_cues");
    for count in [1usize, 3, 12] {
        let d = durations(count);
        let t = texts(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| build_cues(black_box(&d), black_box(&t)))
        });
    }
    group.finish();
}

fn bench_render_ass(c: &mut Criterion) {
    let style = CaptionStyle::new("Arial", 64, HexColor::new(0x0B, 0x5F, 0xFF), 0x40);
    let mut group = c.benchmark_group("render_ass");
    for count in [1usize, 3, 12] {
        let cues = build_cues(&durations(count), &texts(count)).unwrap_or_default();
        group.bench_with_input(BenchmarkId::from_parameter(count), &cues, |b, cues| {
            b.iter(|| render_ass(black_box(&style), black_box(cues)))
        });
    }
    group.finish();
}

fn bench_caption_texts(c: &mut Criterion) {
    let plan = plan(12);
    let pitch: Vec<String> = (0..6).map(|i| format!("Pitch {}", i)).collect();
    c.bench_function("caption_texts_12", |b| {
        b.iter(|| caption_texts(black_box(&plan), None, Some(black_box(&pitch)), 80))
    });
}

fn bench_format_timestamp(c: &mut Criterion) {
    c.bench_function("format_timestamp", |b| {
        b.iter(|| format_timestamp(black_box(3723.456)))
    });
}

criterion_group!(
    benches,
    bench_build_cues,
    bench_render_ass,
    bench_caption_texts,
    bench_format_timestamp
);
criterion_main!(benches);
