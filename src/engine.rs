//! Per-block orchestration.
//!
//! [`WavemorphEngine`] owns the voice pool and the effects chain and runs
//! them in a fixed order every block:
//!
//! ```text
//! SynthParams ──snapshot──→ voices ──→ ch 0 ──copy──→ ch 1..n ──→ chorus ──→ reverb ──→ out
//!                             ↑
//!               note queue ───┘
//! ```
//!
//! Everything the render path touches is allocated in [`WavemorphEngine::new`]
//! or [`WavemorphEngine::prepare`].

use std::sync::Arc;

#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, RingBuffer};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::{chorus::Chorus, reverb::Reverb, wavetable::WavetableBank},
    error::ParamError,
    io::AudioOutput,
    params::{ParamSnapshot, SynthParams},
    synth::poly::PolySynth,
    DEFAULT_VOICE_COUNT, MAX_BLOCK_SIZE, SLOT_COUNT,
};
#[cfg(feature = "rtrb")]
use crate::{error::EngineError, synth::message::SynthMessage};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f32,
    /// Largest block `render_block` is asked for; sizes the scratch buffers.
    pub max_block_size: usize,
    pub channels: usize,
    pub polyphony: usize,
    /// Capacity of the note queue created by `connect`.
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            max_block_size: 512,
            channels: 2,
            polyphony: DEFAULT_VOICE_COUNT,
            queue_capacity: 256,
        }
    }
}

pub struct WavemorphEngine {
    config: EngineConfig,
    params: Arc<SynthParams>,
    synth: PolySynth,
    chorus: Chorus,
    reverb: Reverb,
    applied_slots: [usize; SLOT_COUNT],
    scratch: AudioOutput,
    #[cfg(feature = "rtrb")]
    rx: Option<Consumer<SynthMessage>>,
}

impl WavemorphEngine {
    /// Engine with the built-in wavetable bank.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_bank(config, Arc::new(WavetableBank::builtin()))
    }

    pub fn with_bank(config: EngineConfig, bank: Arc<WavetableBank>) -> Self {
        let config = sanitize(config);
        let params = Arc::new(SynthParams::new());
        let snapshot = params.snapshot();

        Self {
            synth: PolySynth::new(config.sample_rate, config.polyphony, bank, &snapshot),
            chorus: Chorus::new(config.sample_rate, config.channels),
            reverb: Reverb::new(config.sample_rate),
            applied_slots: snapshot.wavetable_slots,
            scratch: AudioOutput::new(config.channels, config.max_block_size),
            params,
            config,
            #[cfg(feature = "rtrb")]
            rx: None,
        }
    }

    /// Re-target the engine at a new stream format. Reallocates the effect
    /// buffers and silences every voice; call it before rendering, never
    /// from the audio callback.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize, channels: usize) {
        self.config = sanitize(EngineConfig {
            sample_rate,
            max_block_size,
            channels,
            ..self.config
        });

        self.synth.set_sample_rate(self.config.sample_rate);
        self.chorus = Chorus::new(self.config.sample_rate, self.config.channels);
        self.reverb = Reverb::new(self.config.sample_rate);
        self.scratch = AudioOutput::new(self.config.channels, self.config.max_block_size);
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn note_on(&mut self, note: u8, velocity: u8) -> usize {
        self.synth.note_on(note, velocity)
    }

    pub fn note_off(&mut self, note: u8) {
        self.synth.note_off(note);
    }

    pub fn all_notes_off(&mut self) {
        self.synth.all_notes_off();
    }

    /// Set a parameter by its host name. Returns the stored (clamped) value.
    pub fn set_parameter(&self, name: &str, value: f32) -> Result<f32, ParamError> {
        self.params.set_by_name(name, value)
    }

    /// Shared parameter store, for control threads.
    pub fn params(&self) -> Arc<SynthParams> {
        Arc::clone(&self.params)
    }

    pub fn synth(&self) -> &PolySynth {
        &self.synth
    }

    /// Render `frame_count` frames into every channel of `output`.
    ///
    /// `frame_count` is limited to the shortest channel buffer. Channels
    /// beyond the prepared count receive a copy of the last prepared one.
    pub fn render_block(&mut self, output: &mut AudioOutput, frame_count: usize) {
        let frames = frame_count.min(output.frames());

        let snapshot = self.params.snapshot();
        self.apply_snapshot(&snapshot);

        self.drain_queue();

        let Some((first, rest)) = output.buffers.split_first_mut() else {
            return;
        };

        let dry = &mut first[..frames];
        self.synth.render_block(dry);
        for channel in rest.iter_mut() {
            channel[..frames].copy_from_slice(dry);
        }

        let prepared = self.chorus.channel_count().min(output.buffers.len());
        let (effected, extra) = output.buffers.split_at_mut(prepared);

        self.chorus.set_depth(snapshot.chorus_depth);
        self.chorus.set_mix(snapshot.chorus_mix);
        for (index, channel) in effected.iter_mut().enumerate() {
            self.chorus.process(index, &mut channel[..frames]);
        }

        self.reverb.set_params(snapshot.reverb);
        match &mut *effected {
            [left, right, ..] => self
                .reverb
                .process_stereo(&mut left[..frames], &mut right[..frames]),
            [mono] => self.reverb.process_mono(&mut mono[..frames]),
            [] => {}
        }

        if let Some(last) = effected.last() {
            for channel in extra.iter_mut() {
                channel[..frames].copy_from_slice(&last[..frames]);
            }
        }
    }

    /// Render into an interleaved buffer, as handed over by callback-style
    /// hosts. Works in chunks of `max_block_size` through the scratch buffers.
    pub fn render_interleaved(&mut self, data: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }

        let total_frames = data.len() / channels;
        let block = self.config.max_block_size;
        let mut scratch = std::mem::take(&mut self.scratch);

        let mut frames_written = 0;
        while frames_written < total_frames {
            let frames = (total_frames - frames_written).min(block);
            self.render_block(&mut scratch, frames);

            let start = frames_written * channels;
            let end = start + frames * channels;
            scratch.interleave_into(&mut data[start..end], channels, frames);

            frames_written += frames;
        }

        data[total_frames * channels..].fill(0.0);
        self.scratch = scratch;
    }

    /// Silence every voice and clear the effect tails.
    pub fn reset(&mut self) {
        self.synth.all_sound_off();
        self.chorus.reset();
        self.reverb.reset();
    }

    /// Create the note queue and return the control-side end of it.
    ///
    /// Calling this again replaces the previous queue; the old handle's
    /// events are no longer delivered.
    #[cfg(feature = "rtrb")]
    pub fn connect(&mut self) -> EngineHandle {
        let (producer, consumer) = RingBuffer::new(self.config.queue_capacity);
        self.rx = Some(consumer);

        EngineHandle {
            producer,
            params: self.params(),
        }
    }

    #[cfg(feature = "rtrb")]
    fn drain_queue(&mut self) {
        if let Some(rx) = self.rx.as_mut() {
            self.synth.drain(rx);
        }
    }

    #[cfg(not(feature = "rtrb"))]
    fn drain_queue(&mut self) {}

    fn apply_snapshot(&mut self, snapshot: &ParamSnapshot) {
        self.synth.apply_params(snapshot);

        for (slot, (&wanted, applied)) in snapshot
            .wavetable_slots
            .iter()
            .zip(self.applied_slots.iter_mut())
            .enumerate()
        {
            if wanted != *applied {
                self.synth.set_wavetable(slot, wanted);
                *applied = wanted;
            }
        }
    }
}

/// Control-thread side of a connected engine.
#[cfg(feature = "rtrb")]
pub struct EngineHandle {
    producer: Producer<SynthMessage>,
    params: Arc<SynthParams>,
}

#[cfg(feature = "rtrb")]
impl EngineHandle {
    pub fn note_on(&mut self, note: u8, velocity: u8) -> Result<(), EngineError> {
        self.send(SynthMessage::NoteOn { note, velocity })
    }

    pub fn note_off(&mut self, note: u8) -> Result<(), EngineError> {
        self.send(SynthMessage::NoteOff { note, velocity: 0 })
    }

    pub fn send(&mut self, msg: SynthMessage) -> Result<(), EngineError> {
        self.producer.push(msg).map_err(|_| EngineError::QueueFull)
    }

    pub fn set_parameter(&self, name: &str, value: f32) -> Result<f32, ParamError> {
        self.params.set_by_name(name, value)
    }

    pub fn params(&self) -> &SynthParams {
        &self.params
    }
}

fn sanitize(config: EngineConfig) -> EngineConfig {
    let sample_rate = if config.sample_rate.is_finite() && config.sample_rate > 0.0 {
        config.sample_rate
    } else {
        EngineConfig::default().sample_rate
    };

    EngineConfig {
        sample_rate,
        max_block_size: config.max_block_size.clamp(1, MAX_BLOCK_SIZE),
        channels: config.channels.max(1),
        polyphony: config.polyphony.max(1),
        queue_capacity: config.queue_capacity.max(1),
    }
}
