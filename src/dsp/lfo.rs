//! Low Frequency Oscillator (LFO) used to wobble the voice filter.

use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::context::RenderCtx;

/*
Low Frequency Oscillators
=========================

An LFO is an oscillator running at sub-audio rate (here 0 - 10 Hz). It does
not make sound; its output is added to the filter's cutoff and resonance.

Shapes
------

    Sine       smooth sweep                     ∿∿∿
    Triangle   constant-rate up and down        ╱╲╱╲
    Square     hard switch between +amp / -amp  ┌┐┌┐
    Saw        rising ramp, snap back           ╱│╱│

The parameter value `lfo_shape` selects them in that order (0..=3).

Phase
-----

Phase is normalised to [0, 1) and advances by `frequency / sample_rate` per
sample, wrapping modulo 1.0. Output is bipolar and scaled by the amplitude:

    value ∈ [-amplitude, +amplitude]

Each voice owns an LFO and restarts it when a fresh note claims the voice,
so every note gets the same modulation shape from its start.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LfoShape {
    #[default]
    Sine,
    Triangle,
    Square,
    Saw,
}

impl LfoShape {
    /// Map a parameter value to a shape (clamped to the last shape).
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => LfoShape::Sine,
            1 => LfoShape::Triangle,
            2 => LfoShape::Square,
            _ => LfoShape::Saw,
        }
    }

    /// Bipolar value of this shape at normalised `phase`.
    #[inline]
    pub fn value_at(self, phase: f32) -> f32 {
        match self {
            LfoShape::Sine => (TAU * phase).sin(),
            LfoShape::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            LfoShape::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            LfoShape::Saw => 2.0 * phase - 1.0,
        }
    }
}

/// Shape, rate and depth of an LFO.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LfoParams {
    pub shape: LfoShape,
    pub frequency: f32,
    pub amplitude: f32,
}

impl Default for LfoParams {
    fn default() -> Self {
        Self {
            shape: LfoShape::Sine,
            frequency: 0.5,
            amplitude: 0.0,
        }
    }
}

pub struct Lfo {
    shape: LfoShape,
    frequency: f32,
    amplitude: f32,
    phase: f32,
}

impl Lfo {
    pub fn new(params: LfoParams) -> Self {
        let mut lfo = Self {
            shape: params.shape,
            frequency: 0.0,
            amplitude: 0.0,
            phase: 0.0,
        };
        lfo.set_params(params);
        lfo
    }

    pub fn set_params(&mut self, params: LfoParams) {
        self.shape = params.shape;
        self.frequency = non_negative(params.frequency);
        self.amplitude = non_negative(params.amplitude);
    }

    /// Next control value in `[-amplitude, amplitude]`.
    #[inline]
    pub fn next_sample(&mut self, ctx: &RenderCtx) -> f32 {
        let out = self.shape.value_at(self.phase) * self.amplitude;
        self.phase = (self.phase + self.frequency / ctx.sample_rate).rem_euclid(1.0);
        out
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

fn non_negative(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.max(0.0)
    }
}
