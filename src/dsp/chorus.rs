use std::f32::consts::{FRAC_PI_2, TAU};

use crate::dsp::delay::DelayLine;

/*
Chorus Effect
=============

Chorus thickens a sound by mixing the dry signal with a slightly delayed,
pitch-modulated copy. The modulation creates subtle detuning that makes
one voice sound like several playing together.

  1. Input passes through unchanged (dry)
  2. A copy goes through a short delay (centred on 7 ms)
  3. A 1 Hz sine LFO swings the delay time by up to ±5 ms
  4. Dry and wet are blended: out = dry · (1 − mix) + wet · mix

Each channel's LFO runs a quarter cycle ahead of the previous one, so in
stereo the right channel leads the left and the effect spreads out.

Parameters (set once per block)
-------------------------------

  depth  0..1   fraction of MAX_DEPTH_MS the delay time swings by
  mix    0..1   dry/wet blend; 0 is an exact bypass

Delay lines and LFO phase persist across blocks. Only `reset()` clears them.
*/

const CENTRE_DELAY_MS: f32 = 7.0;
const MAX_DEPTH_MS: f32 = 5.0;
const RATE_HZ: f32 = 1.0;

struct ChorusChannel {
    delay_line: DelayLine,
    lfo_phase: f32, // radians
}

pub struct Chorus {
    channels: Vec<ChorusChannel>,
    sample_rate: f32,
    depth: f32,
    mix: f32,
}

impl Chorus {
    /// Allocate one delay line per channel (at least one) at `sample_rate`.
    pub fn new(sample_rate: f32, channels: usize) -> Self {
        let max_delay_s = (CENTRE_DELAY_MS + MAX_DEPTH_MS) / 1000.0;

        let channels = (0..channels.max(1))
            .map(|index| ChorusChannel {
                delay_line: DelayLine::with_duration(max_delay_s, sample_rate),
                lfo_phase: index as f32 * FRAC_PI_2,
            })
            .collect();

        Self {
            channels,
            sample_rate,
            depth: 0.1,
            mix: 0.1,
        }
    }

    pub fn set_depth(&mut self, depth: f32) {
        self.depth = unit(depth);
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix = unit(mix);
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn mix(&self) -> f32 {
        self.mix
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Process one channel in place. Channels beyond the prepared count
    /// pass through untouched.
    pub fn process(&mut self, channel: usize, buffer: &mut [f32]) {
        let Some(state) = self.channels.get_mut(channel) else {
            return;
        };

        let sample_rate = self.sample_rate;
        let phase_inc = TAU * RATE_HZ / sample_rate;
        let depth_ms = self.depth * MAX_DEPTH_MS;
        let mix = self.mix;

        for sample in buffer.iter_mut() {
            let lfo_value = state.lfo_phase.sin();
            let delay_ms = CENTRE_DELAY_MS + lfo_value * depth_ms;
            let delay_samples = (delay_ms * sample_rate / 1000.0).max(1.0);

            let wet = state.delay_line.read_interpolated(delay_samples);
            let dry = *sample;
            state.delay_line.write(dry);

            *sample = dry * (1.0 - mix) + wet * mix;

            state.lfo_phase += phase_inc;
            if state.lfo_phase >= TAU {
                state.lfo_phase -= TAU;
            }
        }
    }

    pub fn reset(&mut self) {
        for (index, channel) in self.channels.iter_mut().enumerate() {
            channel.delay_line.reset();
            channel.lfo_phase = index as f32 * FRAC_PI_2;
        }
    }
}

fn unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
