//! Benchmarks for the stereo chorus.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use wavemorph::dsp::chorus::Chorus;

use crate::BLOCK_SIZES;

pub fn bench_chorus(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/chorus");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin()).collect();

        let mut chorus = Chorus::new(48_000.0, 2);
        chorus.set_depth(0.5);
        chorus.set_mix(0.5);
        let mut left = input.clone();
        let mut right = input.clone();
        group.bench_with_input(BenchmarkId::new("stereo", size), &size, |b, _| {
            b.iter(|| {
                left.copy_from_slice(&input);
                right.copy_from_slice(&input);
                chorus.process(0, black_box(&mut left));
                chorus.process(1, black_box(&mut right));
            })
        });
    }

    group.finish();
}
