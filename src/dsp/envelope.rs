#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{dsp::context::RenderCtx, MIN_TIME};

/*
ADSR Envelope
=============

Every voice runs two of these: one scales the amplitude, the other sweeps the
filter. Both follow the same linear contour.

  Level
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
        Attack Decay  Sustain  Release

Stage durations are given in seconds and turned into per-sample steps:

    attack step = 1.0 / (attack_time * sample_rate)
    decay step  = (1.0 - sustain) / (decay_time * sample_rate)

Ramps are linear so that stage timings are exact and testable: an attack of
0.1 s at 1 kHz takes exactly 100 samples.

Transitions
-----------

    Idle ──note_on──→ Attack ──level = 1──→ Decay ──level = S──→ Sustain
      ↑                  │                    │                     │
      │                  └──────note_off──────┴──────note_off───────┘
      │                                       ↓
      └──────────────level = 0───────── Release

  * note_off from Attack, Decay or Sustain starts Release at the CURRENT
    level. Releasing half-way through an attack does not jump to sustain.
  * note_on while the envelope is still running (a retrigger or a stolen
    voice) re-enters Attack from the current level instead of snapping to
    zero. The ramp simply continues upwards from wherever it was.

Release snapshots its start level and length at note_off and interpolates
towards zero, so it lands on exactly 0.0 and the voice can be freed.

Parameters can change while a note plays (`set_params` is called once per
block). The running stage keeps going with the new times; a release already
in progress keeps the length it was started with.
*/

/// The current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,    // Gate low, envelope inactive, level = 0
    Attack,  // Ramping up to 1.0
    Decay,   // Reached peak, ramping down to sustain level
    Sustain, // Holding at sustain level while gate is high
    Release, // Gate went low, ramping down to 0
}

/// Stage times in seconds plus the sustain level.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdsrParams {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl AdsrParams {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }
}

impl Default for AdsrParams {
    fn default() -> Self {
        Self::new(0.1, 0.5, 0.9, 0.5)
    }
}

pub struct Envelope {
    attack_time: f32,
    decay_time: f32,
    sustain_level: f32,
    release_time: f32,

    stage: EnvelopeState,
    level: f32,

    decay_start_level: f32,

    release_start_level: f32,
    release_total_samples: u32,
    release_elapsed_samples: u32,
}

impl Envelope {
    pub fn new() -> Self {
        Self::from_params(AdsrParams::default())
    }

    pub fn adsr(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self::from_params(AdsrParams::new(attack, decay, sustain, release))
    }

    pub fn from_params(params: AdsrParams) -> Self {
        let mut env = Self {
            attack_time: MIN_TIME,
            decay_time: MIN_TIME,
            sustain_level: 1.0,
            release_time: MIN_TIME,

            stage: EnvelopeState::Idle,
            level: 0.0,
            decay_start_level: 0.0,
            release_start_level: 0.0,
            release_total_samples: 1,
            release_elapsed_samples: 0,
        };
        env.set_params(params);
        env
    }

    /// Update stage times and sustain level without touching the running stage.
    pub fn set_params(&mut self, params: AdsrParams) {
        self.attack_time = sanitize_time(params.attack);
        self.decay_time = sanitize_time(params.decay);
        self.sustain_level = if params.sustain.is_nan() {
            0.0
        } else {
            params.sustain.clamp(0.0, 1.0)
        };
        self.release_time = sanitize_time(params.release);
    }

    pub fn params(&self) -> AdsrParams {
        AdsrParams::new(
            self.attack_time,
            self.decay_time,
            self.sustain_level,
            self.release_time,
        )
    }

    /// Gate high: (re)enter Attack from the current level.
    pub fn note_on(&mut self) {
        self.stage = EnvelopeState::Attack;
        self.release_elapsed_samples = 0;
    }

    /// Gate low: start the release phase from current level.
    pub fn note_off(&mut self, ctx: &RenderCtx) {
        if matches!(self.stage, EnvelopeState::Idle | EnvelopeState::Release) {
            return;
        }

        self.release_start_level = self.level;
        self.release_total_samples = if self.release_time <= MIN_TIME {
            1
        } else {
            (self.release_time * ctx.sample_rate).round().max(1.0) as u32
        };
        self.release_elapsed_samples = 0;
        self.stage = EnvelopeState::Release;
    }

    /// Advance the envelope by one sample and return the new level.
    #[inline]
    pub fn next_sample(&mut self, ctx: &RenderCtx) -> f32 {
        match self.stage {
            EnvelopeState::Idle => {
                self.level = 0.0;
            }

            EnvelopeState::Attack => {
                self.level += 1.0 / (self.attack_time * ctx.sample_rate);

                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.decay_start_level = 1.0;
                    self.stage = EnvelopeState::Decay;
                }
            }

            EnvelopeState::Decay => {
                let target = self.sustain_level;
                let total_drop = self.decay_start_level - target;
                self.level -= total_drop / (self.decay_time * ctx.sample_rate);

                if self.level <= target {
                    self.level = target;
                    self.stage = EnvelopeState::Sustain;
                }
            }

            EnvelopeState::Sustain => {
                self.level = self.sustain_level;
            }

            EnvelopeState::Release => {
                let progress =
                    self.release_elapsed_samples as f32 / self.release_total_samples as f32;
                self.level = (self.release_start_level * (1.0 - progress)).max(0.0);

                self.release_elapsed_samples = self.release_elapsed_samples.saturating_add(1);

                if self.release_elapsed_samples >= self.release_total_samples {
                    self.level = 0.0;
                    self.stage = EnvelopeState::Idle;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    /// Render a block of envelope values into the buffer.
    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(ctx);
        }
    }

    /// Returns true if the envelope is producing output (not idle).
    pub fn is_active(&self) -> bool {
        !matches!(self.stage, EnvelopeState::Idle)
    }

    /// Reset to idle state.
    pub fn reset(&mut self) {
        self.stage = EnvelopeState::Idle;
        self.level = 0.0;
        self.decay_start_level = 0.0;
        self.release_elapsed_samples = 0;
        self.release_start_level = 0.0;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn state(&self) -> EnvelopeState {
        self.stage
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}

fn sanitize_time(seconds: f32) -> f32 {
    if seconds.is_nan() {
        MIN_TIME
    } else {
        seconds.max(MIN_TIME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn ctx() -> RenderCtx {
        RenderCtx::from_freq(SAMPLE_RATE, 440.0, 100.0)
    }

    fn render_samples(env: &mut Envelope, samples: usize) {
        let ctx = ctx();
        for _ in 0..samples {
            env.next_sample(&ctx);
        }
    }

    #[test]
    fn attack_reaches_full_level() {
        let mut env = Envelope::adsr(0.01, 0.1, 0.7, 0.2);

        env.note_on();
        render_samples(&mut env, (0.01 * SAMPLE_RATE) as usize);

        assert!(env.level() > 0.99, "expected attack to reach full level");
        assert_ne!(env.state(), EnvelopeState::Attack);
    }

    #[test]
    fn sustain_holds_target_level() {
        let sustain = 0.6;
        let mut env = Envelope::adsr(0.01, 0.05, sustain, 0.2);

        env.note_on();
        render_samples(&mut env, ((0.01 + 0.05) * SAMPLE_RATE) as usize + 5);

        assert_eq!(env.state(), EnvelopeState::Sustain);
        assert!((env.level() - sustain).abs() < 1e-6);
    }

    #[test]
    fn release_falls_back_to_idle() {
        let release = 0.03;
        let mut env = Envelope::adsr(0.01, 0.05, 0.5, release);

        env.note_on();
        render_samples(&mut env, 20);

        env.note_off(&ctx());
        render_samples(&mut env, (release * SAMPLE_RATE) as usize + 2);

        assert_eq!(env.level(), 0.0);
        assert_eq!(env.state(), EnvelopeState::Idle);
        assert!(!env.is_active());
    }

    #[test]
    fn early_release_has_no_click() {
        let attack = 0.1;
        let mut env = Envelope::adsr(attack, 0.1, 0.8, 0.05);
        let ctx = ctx();
        let attack_step = 1.0 / (attack * SAMPLE_RATE);

        env.note_on();
        let mut previous = 0.0f32;
        let mut max_jump = 0.0f32;

        for i in 0..200 {
            if i == 10 {
                env.note_off(&ctx);
                assert_eq!(env.state(), EnvelopeState::Release);
            }
            let level = env.next_sample(&ctx);
            max_jump = max_jump.max((level - previous).abs());
            previous = level;
        }

        assert!(max_jump <= attack_step + 1e-6, "jump of {max_jump}");
        assert_eq!(env.state(), EnvelopeState::Idle);
    }

    #[test]
    fn retrigger_continues_from_current_level() {
        let mut env = Envelope::adsr(0.05, 0.05, 0.5, 0.2);
        let ctx = ctx();

        env.note_on();
        render_samples(&mut env, 200);
        env.note_off(&ctx);
        render_samples(&mut env, 50);

        let before = env.level();
        assert!(before > 0.0);

        env.note_on();
        let after = env.next_sample(&ctx);
        assert_eq!(env.state(), EnvelopeState::Attack);
        assert!(after > before);
        assert!(after - before <= 1.0 / (0.05 * SAMPLE_RATE) + 1e-6);
    }

    #[test]
    fn note_off_while_idle_is_ignored() {
        let mut env = Envelope::adsr(0.01, 0.01, 0.5, 0.1);
        env.note_off(&ctx());
        assert_eq!(env.state(), EnvelopeState::Idle);
        assert_eq!(env.next_sample(&ctx()), 0.0);
    }

    #[test]
    fn params_are_clamped() {
        let env = Envelope::from_params(AdsrParams::new(-1.0, f32::NAN, 3.0, 0.0));
        let params = env.params();

        assert_eq!(params.attack, MIN_TIME);
        assert_eq!(params.decay, MIN_TIME);
        assert_eq!(params.sustain, 1.0);
        assert_eq!(params.release, MIN_TIME);
    }
}
