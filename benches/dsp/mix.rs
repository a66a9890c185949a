//! Benchmarks for summing, downmixing and interleaving.

use std::hint::black_box;

use binaura::dsp::{merge, mix};
use criterion::{BenchmarkId, Criterion};

use crate::BLOCK_SIZES;

pub fn bench_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/mix");

    for &size in BLOCK_SIZES {
        let left: Vec<f32> = (0..size).map(|i| (i as f32 * 0.01).sin()).collect();
        let right: Vec<f32> = (0..size).map(|i| (i as f32 * 0.011).sin()).collect();
        let mut out = vec![0.0f32; size];

        group.bench_with_input(BenchmarkId::new("sum_in_place", size), &size, |b, _| {
            b.iter(|| mix::sum_in_place(black_box(&mut out), black_box(&left)))
        });

        group.bench_with_input(BenchmarkId::new("downmix", size), &size, |b, _| {
            b.iter(|| {
                mix::sum_downmix_in_place(black_box(&mut out), black_box(&left), black_box(&right))
            })
        });

        // Typical device layouts
        for channels in [2usize, 6] {
            let mut interleaved = vec![0.0f32; size * channels];
            group.bench_with_input(
                BenchmarkId::new(format!("interleave_{channels}ch"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        merge::interleave(
                            black_box(&left),
                            black_box(&right),
                            black_box(&mut interleaved),
                            channels,
                        )
                    })
                },
            );
        }
    }

    group.finish();
}
