//! Benchmarks for the wavescanning oscillator.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use wavemorph::dsp::oscillator::{SineOscillator, WavetableOscillator};
use wavemorph::dsp::wavetable::WavetableBank;
use wavemorph::dsp::RenderCtx;

use crate::BLOCK_SIZES;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");
    let ctx = RenderCtx::from_freq(48_000.0, 440.0, 100.0);
    let bank = WavetableBank::builtin();

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Integer wavescan - single slot read
        let mut osc = WavetableOscillator::new(&bank, [0, 2, 4, 6, 8]);
        osc.set_wavescan(2.0);
        group.bench_with_input(BenchmarkId::new("wavetable_single", size), &size, |b, _| {
            b.iter(|| {
                for sample in buffer.iter_mut() {
                    *sample = osc.next_sample(black_box(&ctx));
                }
            })
        });

        // Fractional wavescan - two reads and a blend
        let mut osc = WavetableOscillator::new(&bank, [0, 2, 4, 6, 8]);
        osc.set_wavescan(2.5);
        group.bench_with_input(BenchmarkId::new("wavetable_blend", size), &size, |b, _| {
            b.iter(|| {
                for sample in buffer.iter_mut() {
                    *sample = osc.next_sample(black_box(&ctx));
                }
            })
        });

        // Sine - uses sin() transcendental function
        let mut osc = SineOscillator::new();
        group.bench_with_input(BenchmarkId::new("sine", size), &size, |b, _| {
            b.iter(|| {
                for sample in buffer.iter_mut() {
                    *sample = osc.next_sample(black_box(&ctx));
                }
            })
        });
    }

    // Slot reload cost (2048-sample copy)
    let mut osc = WavetableOscillator::new(&bank, [0, 2, 4, 6, 8]);
    let mut index = 0;
    group.bench_function("set_table", |b| {
        b.iter(|| {
            index = (index + 1) % bank.len();
            osc.set_table(0, black_box(index), &bank)
        })
    });

    group.finish();
}
