//! Benchmarks for complete engine blocks (voices, chorus, reverb).

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use wavemorph::io::AudioOutput;
use wavemorph::{EngineConfig, WavemorphEngine};

use crate::BLOCK_SIZES;

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");

    for &size in BLOCK_SIZES {
        // Full polyphony with every effect engaged
        let mut engine = WavemorphEngine::new(EngineConfig::default());
        engine.set_parameter("release", 4.0).ok();
        engine.set_parameter("chorus_mix", 0.5).ok();
        engine.set_parameter("wavescan", 2.5).ok();
        for note in [48, 52, 55, 59, 60, 64, 67, 71] {
            engine.note_on(note, 100);
        }

        let mut output = AudioOutput::new(2, size);
        group.bench_with_input(BenchmarkId::new("full_chord", size), &size, |b, _| {
            b.iter(|| {
                engine.render_block(black_box(&mut output), size);
            })
        });

        // Callback path with a wavetable slot swap every block
        let mut engine = WavemorphEngine::new(EngineConfig::default());
        let params = engine.params();
        for note in [57, 60, 64] {
            engine.note_on(note, 100);
        }

        let mut data = vec![0.0f32; size * 2];
        let mut slot = 0.0;
        group.bench_with_input(BenchmarkId::new("interleaved_slot_swap", size), &size, |b, _| {
            b.iter(|| {
                slot = (slot + 1.0) % 20.0;
                params.set_by_name("wavetype_three", slot).ok();
                engine.render_interleaved(black_box(&mut data), 2);
            })
        });
    }

    group.finish();
}
