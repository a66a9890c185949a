//! Benchmarks for sine generation.

use std::hint::black_box;

use binaura::dsp::SineOscillator;
use criterion::{BenchmarkId, Criterion};

use crate::BLOCK_SIZES;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Steady tone - one sin() per sample
        let mut osc = SineOscillator::new();
        group.bench_with_input(BenchmarkId::new("sine", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer), black_box(220.0), 48_000.0);
            })
        });

        // Slider drag - frequency changes every block
        let mut osc = SineOscillator::new();
        let mut hz = 220.0f32;
        group.bench_with_input(BenchmarkId::new("sine_retune", size), &size, |b, _| {
            b.iter(|| {
                hz = if hz >= 500.0 { 20.0 } else { hz + 1.0 };
                osc.render(black_box(&mut buffer), black_box(hz), 48_000.0);
            })
        });
    }

    group.finish();
}
