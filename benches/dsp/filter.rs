//! Benchmarks for state-variable filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use wavemorph::dsp::filter::{FilterSettings, ModulatedFilter, SVFilter};
use wavemorph::dsp::RenderCtx;

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");
    let ctx = RenderCtx::from_freq(48_000.0, 440.0, 100.0);

    for &size in BLOCK_SIZES {
        // Generate a test signal (sawtooth-like ramp)
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        // Fixed coefficients for the whole block
        let mut filter = SVFilter::new();
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("lowpass_static", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer), 1_000.0, 0.5, black_box(&ctx));
            })
        });

        // Coefficients recomputed every sample, as in a voice
        let mut filter = ModulatedFilter::new(FilterSettings {
            cutoff_hz: 800.0,
            resonance: 0.6,
            cutoff_env_amount: 0.5,
            resonance_env_amount: 0.2,
        });
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("lowpass_modulated", size), &size, |b, _| {
            b.iter(|| {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let env = i as f32 / size as f32;
                    *sample = filter.next_sample(input[i], env, 0.5, black_box(&ctx));
                }
            })
        });
    }

    group.finish();
}
