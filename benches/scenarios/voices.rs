//! Benchmarks for the voice pool.
//!
//! Polyphony is the main cost driver: each busy voice runs two
//! oscillators, two envelopes, an LFO and a per-sample filter update.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion};
use wavemorph::dsp::wavetable::WavetableBank;
use wavemorph::synth::PolySynth;
use wavemorph::ParamSnapshot;

use crate::BLOCK_SIZES;

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let bank = Arc::new(WavetableBank::builtin());

    let mut params = ParamSnapshot::default();
    params.wavescan = 1.5;
    params.amp_env.release = 4.0;
    params.lfo.amplitude = 1.0;

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for voices in [1usize, 4, 8] {
            let mut synth = PolySynth::new(48_000.0, 8, Arc::clone(&bank), &params);
            for note in 0..voices {
                synth.note_on(48 + 4 * note as u8, 100);
            }

            group.bench_with_input(
                BenchmarkId::new(format!("{voices}_voices"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        synth.render_block(black_box(&mut buffer));
                    })
                },
            );
        }
    }

    group.finish();
}
