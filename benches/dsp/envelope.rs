//! Benchmarks for the voice envelopes.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use wavemorph::dsp::envelope::{AdsrParams, Envelope};
use wavemorph::dsp::RenderCtx;

use crate::BLOCK_SIZES;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let ctx = RenderCtx::from_freq(48_000.0, 440.0, 100.0);

    let amp = AdsrParams::new(0.05, 0.2, 0.8, 0.5);
    let filter = AdsrParams::new(0.01, 0.4, 0.1, 1.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Re-struck during release: attack restarts from the tail level
        let mut env = Envelope::from_params(amp);
        group.bench_with_input(BenchmarkId::new("retrigger", size), &size, |b, _| {
            b.iter(|| {
                env.note_on();
                env.render(black_box(&mut buffer[..size / 2]), black_box(&ctx));
                env.note_off(&ctx);
                env.render(black_box(&mut buffer[size / 2..]), black_box(&ctx));
            })
        });

        // Amp and filter envelopes stepped together, as one voice does
        let mut amp_env = Envelope::from_params(amp);
        let mut filter_env = Envelope::from_params(filter);
        amp_env.note_on();
        filter_env.note_on();
        group.bench_with_input(BenchmarkId::new("voice_pair", size), &size, |b, _| {
            b.iter(|| {
                for sample in buffer.iter_mut() {
                    let level = amp_env.next_sample(&ctx);
                    let cutoff_mod = filter_env.next_sample(&ctx);
                    *sample = black_box(level * (1.0 + cutoff_mod));
                }
            })
        });

        // Per-block parameter refresh while held, without a stage reset
        let mut env = Envelope::from_params(amp);
        env.note_on();
        let mut release = 0.5;
        group.bench_with_input(BenchmarkId::new("param_refresh", size), &size, |b, _| {
            b.iter(|| {
                release = if release > 3.5 { 0.5 } else { release + 0.01 };
                env.set_params(AdsrParams { release, ..amp });
                env.render(black_box(&mut buffer), black_box(&ctx));
            })
        });
    }

    group.finish();
}
