//! Benchmarks for delay line operations.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use wavemorph::dsp::delay::DelayLine;

use crate::BLOCK_SIZES;

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        // Write then modulated read, the chorus access pattern
        let mut delay = DelayLine::with_duration(0.012, 48_000.0);
        group.bench_with_input(BenchmarkId::new("write_read", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for (i, &sample) in input.iter().enumerate() {
                    let delay_time = 336.0 + (i as f32 * 0.01).sin() * 240.0;
                    sum += delay.read_interpolated(black_box(delay_time));
                    delay.write(sample);
                }
                sum
            })
        });
    }

    group.finish();
}
