//! Reverb - Room Simulation via Delay Networks
//!
//! A Freeverb-style stereo reverberator: the Schroeder topology of parallel
//! comb filters feeding series allpass filters, duplicated per channel.
//!
//! # Architecture (per channel)
//!
//! ```text
//!                ┌──→ [Comb 1] ──┐
//! (L+R)·gain ────┼──→   ...    ──┼──→ (+) ──→ [AP 1] → [AP 2] → [AP 3] → [AP 4] ──→ wet
//!                └──→ [Comb 8] ──┘
//! ```
//!
//! Both channels are fed the same summed input. The right channel's delay
//! lines are `STEREO_SPREAD` samples longer, which decorrelates the tails.
//!
//! ## Comb Filters
//!
//! ```text
//! y[n] = x[n] + feedback * lowpass(y[n - delay])
//! ```
//!
//! The one-pole lowpass in the loop is the damping: high frequencies die
//! faster, like in a real room.
//!
//! ## Allpass Filters
//!
//! ```text
//! y[n] = -g * x[n] + x[n - delay] + g * y[n - delay]
//! ```
//!
//! # Parameters
//!
//! - **Room Size**: comb feedback, 0.7 → 0.98
//! - **Damping**: comb lowpass coefficient, 0 → 0.4
//! - **Dry / Wet**: output levels. `dry = 1, wet = 0` passes the input
//!   through untouched.
//!
//! All delay memory is allocated in `new`; processing never allocates and
//! the tail carries over between blocks until `reset()`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Comb tunings in samples at 44.1 kHz (mutually prime-ish).
const COMB_TUNINGS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
/// Allpass tunings in samples at 44.1 kHz.
const ALLPASS_TUNINGS: [usize; 4] = [556, 441, 341, 225];
const STEREO_SPREAD: usize = 23;
const TUNING_RATE: f32 = 44_100.0;

const FIXED_GAIN: f32 = 0.015;
const SCALE_WET: f32 = 3.0;
const SCALE_DAMP: f32 = 0.4;
const SCALE_ROOM: f32 = 0.28;
const OFFSET_ROOM: f32 = 0.7;
const ALLPASS_FEEDBACK: f32 = 0.5;

/// A damped comb filter (pre-allocated, RT-safe)
pub struct CombFilter {
    buffer: Vec<f32>,
    write_pos: usize,
    feedback: f32,
    damp: f32,
    filter_state: f32,
}

impl CombFilter {
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)],
            write_pos: 0,
            feedback: 0.5,
            damp: 0.5,
            filter_state: 0.0,
        }
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.99);
    }

    pub fn set_damp(&mut self, damp: f32) {
        self.damp = damp.clamp(0.0, 1.0);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.write_pos];

        self.filter_state = output * (1.0 - self.damp) + self.filter_state * self.damp;
        self.buffer[self.write_pos] = input + self.filter_state * self.feedback;

        self.write_pos = (self.write_pos + 1) % self.buffer.len();

        output
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.filter_state = 0.0;
        self.write_pos = 0;
    }
}

/// An allpass filter for reverb diffusion (pre-allocated, RT-safe)
pub struct AllpassFilter {
    buffer: Vec<f32>,
    write_pos: usize,
    feedback: f32,
}

impl AllpassFilter {
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)],
            write_pos: 0,
            feedback: ALLPASS_FEEDBACK,
        }
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.9);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.write_pos];

        let output = -self.feedback * input + delayed;
        self.buffer[self.write_pos] = input + self.feedback * output;

        self.write_pos = (self.write_pos + 1) % self.buffer.len();

        output
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

/// Knob values, all in `0..1`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbParams {
    pub room_size: f32,
    pub damping: f32,
    pub dry: f32,
    pub wet: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            room_size: 0.5,
            damping: 0.5,
            dry: 0.6,
            wet: 0.3,
        }
    }
}

impl ReverbParams {
    fn clamped(self) -> Self {
        Self {
            room_size: unit(self.room_size),
            damping: unit(self.damping),
            dry: unit(self.dry),
            wet: unit(self.wet),
        }
    }
}

struct ReverbChannel {
    combs: [CombFilter; 8],
    allpasses: [AllpassFilter; 4],
}

impl ReverbChannel {
    fn new(sample_rate: f32, spread: usize) -> Self {
        let scale = |tuning: usize| ((tuning + spread) as f32 * sample_rate / TUNING_RATE) as usize;

        Self {
            combs: COMB_TUNINGS.map(|t| CombFilter::new(scale(t))),
            allpasses: ALLPASS_TUNINGS.map(|t| AllpassFilter::new(scale(t))),
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let mut output = 0.0;
        for comb in &mut self.combs {
            output += comb.process(input);
        }
        for allpass in &mut self.allpasses {
            output = allpass.process(output);
        }
        output
    }

    fn set_room(&mut self, feedback: f32, damp: f32) {
        for comb in &mut self.combs {
            comb.set_feedback(feedback);
            comb.set_damp(damp);
        }
    }

    fn reset(&mut self) {
        for comb in &mut self.combs {
            comb.reset();
        }
        for allpass in &mut self.allpasses {
            allpass.reset();
        }
    }
}

/// Stereo reverb with 8 combs and 4 allpasses per channel.
pub struct Reverb {
    left: ReverbChannel,
    right: ReverbChannel,
    params: ReverbParams,
}

impl Reverb {
    pub fn new(sample_rate: f32) -> Self {
        let mut reverb = Self {
            left: ReverbChannel::new(sample_rate, 0),
            right: ReverbChannel::new(sample_rate, STEREO_SPREAD),
            params: ReverbParams::default(),
        };
        reverb.set_params(ReverbParams::default());
        reverb
    }

    pub fn set_params(&mut self, params: ReverbParams) {
        let params = params.clamped();
        let feedback = params.room_size * SCALE_ROOM + OFFSET_ROOM;
        let damp = params.damping * SCALE_DAMP;

        self.left.set_room(feedback, damp);
        self.right.set_room(feedback, damp);
        self.params = params;
    }

    pub fn params(&self) -> ReverbParams {
        self.params
    }

    pub fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        let wet = self.params.wet * SCALE_WET;
        let dry = self.params.dry;

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let input = (*l + *r) * FIXED_GAIN;

            let out_l = self.left.process(input);
            let out_r = self.right.process(input);

            *l = out_l * wet + *l * dry;
            *r = out_r * wet + *r * dry;
        }
    }

    pub fn process_mono(&mut self, buffer: &mut [f32]) {
        let wet = self.params.wet * SCALE_WET;
        let dry = self.params.dry;

        for sample in buffer.iter_mut() {
            let out = self.left.process(*sample * FIXED_GAIN);
            *sample = out * wet + *sample * dry;
        }
    }

    /// Clear every delay line.
    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}

fn unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
