//! wavemorph - plays a short chord progression with a wavescan sweep
//!
//! Run with: cargo run --bin wavemorph

use std::thread;
use std::time::Duration;

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use wavemorph::{EngineConfig, WavemorphEngine, MAX_BLOCK_SIZE};

const CHORDS: [[u8; 3]; 4] = [
    [57, 60, 64], // A minor
    [53, 57, 60], // F major
    [48, 52, 55], // C major
    [55, 59, 62], // G major
];
const CHORD_MS: u64 = 2_000;
const SWEEP_STEPS: u64 = 40;

fn main() -> EyreResult<()> {
    color_eyre::install()?;

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;

    println!("=== wavemorph ===");
    println!("Device: {}", device.name().unwrap_or_else(|_| "unknown".into()));
    println!("Sample rate: {} Hz", sample_rate);
    println!("Channels: {}", channels);
    println!();

    let mut engine = WavemorphEngine::new(EngineConfig {
        sample_rate,
        max_block_size: MAX_BLOCK_SIZE,
        channels,
        ..EngineConfig::default()
    });
    let mut handle = engine.connect();

    handle.set_parameter("release", 1.2)?;
    handle.set_parameter("filter_cutoff_amp", 0.4)?;
    handle.set_parameter("lfo_amp", 0.8)?;
    handle.set_parameter("chorus_mix", 0.4)?;

    let stream = device.build_output_stream(
        &config.into(),
        move |data: &mut [f32], _| engine.render_interleaved(data, channels),
        |err| eprintln!("Audio error: {}", err),
        None,
    )?;
    stream.play()?;

    println!("Playing {} chords...", CHORDS.len());
    for (i, chord) in CHORDS.iter().enumerate() {
        println!("  chord {} {:?}", i + 1, chord);
        for &note in chord {
            handle.note_on(note, 100)?;
        }

        // Sweep the wavescan across all five slots while the chord holds
        for step in 0..SWEEP_STEPS {
            let position = 4.0 * step as f32 / (SWEEP_STEPS - 1) as f32;
            handle.set_parameter("wavescan", position)?;
            thread::sleep(Duration::from_millis(CHORD_MS / SWEEP_STEPS));
        }

        for &note in chord {
            handle.note_off(note)?;
        }
    }

    // Let the release and reverb tail ring out
    thread::sleep(Duration::from_millis(2_500));
    println!("Done.");

    Ok(())
}
