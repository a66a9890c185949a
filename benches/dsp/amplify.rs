//! Benchmarks for gain primitives.

use std::hint::black_box;

use binaura::dsp::amplify;
use criterion::{BenchmarkId, Criterion};

use crate::BLOCK_SIZES;

pub fn bench_amplify(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/amplify");

    for &size in BLOCK_SIZES {
        let signal: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        let mut signal_copy = signal.clone();
        group.bench_with_input(BenchmarkId::new("apply_gain", size), &size, |b, _| {
            b.iter(|| {
                signal_copy.copy_from_slice(&signal);
                amplify::apply_gain(black_box(&mut signal_copy), black_box(0.178))
            })
        });

        let mut signal_copy = signal.clone();
        group.bench_with_input(BenchmarkId::new("apply_gain_ramp", size), &size, |b, _| {
            b.iter(|| {
                signal_copy.copy_from_slice(&signal);
                amplify::apply_gain_ramp(
                    black_box(&mut signal_copy),
                    black_box(0.178),
                    black_box(1.0),
                )
            })
        });
    }

    group.bench_function("db_to_amplitude", |b| {
        b.iter(|| amplify::db_to_amplitude(black_box(-15.0)))
    });

    group.finish();
}
