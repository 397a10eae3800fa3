use std::f32::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::context::RenderCtx;

/*
State-Variable Low-Pass
=======================

The voice filter is a TPT (topology-preserving transform) state-variable
filter. Only the low-pass response is used: it darkens the wavetable mix
above `cutoff` with a 12 dB/octave slope, and `resonance` adds a peak at
the cutoff.

Coefficients
------------

    g = tan(π · cutoff / sample_rate)     prewarped integrator gain
    k = 2 − 2 · resonance                 damping (2 = none, → 0 = ringing)

k must stay above zero or the filter self-oscillates and never decays, so
resonance is clamped to MAX_RESONANCE before it gets here. Likewise the
cutoff is kept below 0.45 · sample_rate where tan() would blow up.

Modulation
----------

Cutoff and resonance move every sample:

    cutoff    = base + env · cutoff_amount · CUTOFF_ENV_RANGE_HZ
                     + lfo · LFO_CUTOFF_RANGE_HZ
    resonance = base + env · resonance_amount
                     + lfo · LFO_RESONANCE_DEPTH

`env` is the filter envelope level (0..1), `lfo` is the raw LFO output
(±lfo_amp). Both results are clamped, so any parameter combination is safe.
Coefficients are recomputed every sample; one tan() per voice per sample is
the price of smooth sweeps.
*/

/// Full-scale envelope sweep for `cutoff_amount = ±1`.
pub const CUTOFF_ENV_RANGE_HZ: f32 = 10_000.0;
/// Cutoff swing per unit of LFO output.
pub const LFO_CUTOFF_RANGE_HZ: f32 = 1_000.0;
/// Resonance swing per unit of LFO output.
pub const LFO_RESONANCE_DEPTH: f32 = 0.1;

pub const MIN_CUTOFF_HZ: f32 = 20.0;
pub const MAX_RESONANCE: f32 = 0.98;

/// Upper cutoff bound for a sample rate.
#[inline]
pub fn max_cutoff(sample_rate: f32) -> f32 {
    (sample_rate * 0.45).max(MIN_CUTOFF_HZ)
}

pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory
}

impl SVFilter {
    pub fn new() -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
        }
    }

    /// `(g, k)` for a cutoff and resonance, both clamped to the stable range.
    #[inline]
    pub fn coefficients(cutoff_hz: f32, resonance: f32, sample_rate: f32) -> (f32, f32) {
        let cutoff = clamp_or(cutoff_hz, MIN_CUTOFF_HZ, max_cutoff(sample_rate), MIN_CUTOFF_HZ);
        let resonance = clamp_or(resonance, 0.0, MAX_RESONANCE, 0.0);

        let g = (PI * cutoff / sample_rate).tan();
        let k = 2.0 - 2.0 * resonance;
        (g, k)
    }

    /// Filter one sample, returning the low-pass output.
    #[inline]
    pub fn next_sample(&mut self, sample: f32, g: f32, k: f32) -> f32 {
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        v2
    }

    /// Filter a block with fixed settings.
    pub fn render(&mut self, buffer: &mut [f32], cutoff_hz: f32, resonance: f32, ctx: &RenderCtx) {
        let (g, k) = Self::coefficients(cutoff_hz, resonance, ctx.sample_rate);
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample, g, k);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}

impl Default for SVFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Base settings of the voice filter.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSettings {
    pub cutoff_hz: f32,
    pub resonance: f32,
    /// Envelope → cutoff amount, -1..1.
    pub cutoff_env_amount: f32,
    /// Envelope → resonance amount, -1..1.
    pub resonance_env_amount: f32,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            cutoff_hz: 10_000.0,
            resonance: 0.1,
            cutoff_env_amount: 0.0,
            resonance_env_amount: 0.0,
        }
    }
}

/// SVF low-pass driven by the filter envelope and the LFO.
pub struct ModulatedFilter {
    svf: SVFilter,
    settings: FilterSettings,
}

impl ModulatedFilter {
    pub fn new(settings: FilterSettings) -> Self {
        Self {
            svf: SVFilter::new(),
            settings,
        }
    }

    pub fn set_settings(&mut self, settings: FilterSettings) {
        self.settings = settings;
    }

    pub fn settings(&self) -> FilterSettings {
        self.settings
    }

    /// Cutoff after modulation, clamped to `[MIN_CUTOFF_HZ, max_cutoff(sr)]`.
    #[inline]
    pub fn effective_cutoff(&self, env: f32, lfo: f32, sample_rate: f32) -> f32 {
        let s = &self.settings;
        let cutoff = s.cutoff_hz
            + env * s.cutoff_env_amount * CUTOFF_ENV_RANGE_HZ
            + lfo * LFO_CUTOFF_RANGE_HZ;
        clamp_or(cutoff, MIN_CUTOFF_HZ, max_cutoff(sample_rate), MIN_CUTOFF_HZ)
    }

    /// Resonance after modulation, clamped to `[0, MAX_RESONANCE]`.
    #[inline]
    pub fn effective_resonance(&self, env: f32, lfo: f32) -> f32 {
        let s = &self.settings;
        let resonance = s.resonance + env * s.resonance_env_amount + lfo * LFO_RESONANCE_DEPTH;
        clamp_or(resonance, 0.0, MAX_RESONANCE, 0.0)
    }

    #[inline]
    pub fn next_sample(&mut self, input: f32, env: f32, lfo: f32, ctx: &RenderCtx) -> f32 {
        let cutoff = self.effective_cutoff(env, lfo, ctx.sample_rate);
        let resonance = self.effective_resonance(env, lfo);
        let (g, k) = SVFilter::coefficients(cutoff, resonance, ctx.sample_rate);
        self.svf.next_sample(input, g, k)
    }

    pub fn reset(&mut self) {
        self.svf.reset();
    }
}

/// `clamp` that maps NaN to `fallback` instead of propagating it.
#[inline]
fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}
