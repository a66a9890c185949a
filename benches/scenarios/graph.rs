//! Benchmarks for rendering a live binaural session.

use std::hint::black_box;

use binaura::{BeatEngine, EngineConfig, OfflineOpener};
use criterion::{BenchmarkId, Criterion};

use crate::BLOCK_SIZES;

pub fn bench_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/graph");

    for &size in BLOCK_SIZES {
        let opener = OfflineOpener::new(48_000.0);
        let mut engine = BeatEngine::new(EngineConfig::default(), opener.clone());
        engine.start().expect("offline start");
        let mut renderer = opener.take_renderer().expect("renderer");

        // === STEADY: two oscillators, merger, gain ===
        let mut data = vec![0.0f32; size * 2];
        group.bench_with_input(BenchmarkId::new("binaural_stereo", size), &size, |b, _| {
            b.iter(|| renderer.render_interleaved(black_box(&mut data), 2))
        });

        // === LIVE EDIT: retune and regain before every block ===
        let mut base = 220.0f32;
        group.bench_with_input(BenchmarkId::new("binaural_live_edit", size), &size, |b, _| {
            b.iter(|| {
                base = if base >= 500.0 { 20.0 } else { base + 1.0 };
                engine.set_base_frequency(base).expect("retune");
                engine.set_volume(-15.0 - (base % 10.0)).expect("regain");
                renderer.render_interleaved(black_box(&mut data), 2)
            })
        });
    }

    group.finish();
}
