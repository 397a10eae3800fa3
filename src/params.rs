//! Lock-free parameter store.
//!
//! A control thread (UI, host automation, the demo binary) writes named
//! parameters into [`SynthParams`]; the audio thread takes one
//! [`ParamSnapshot`] per block and pushes it into the voices and effects.
//!
//! Values are `f32` bit patterns in `AtomicU32`s. Every access is a relaxed
//! load or store: parameters are independent knobs and a block seeing a mix
//! of old and new values is harmless.

use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::{
        envelope::AdsrParams,
        filter::FilterSettings,
        lfo::{LfoParams, LfoShape},
        reverb::ReverbParams,
    },
    error::ParamError,
    SLOT_COUNT,
};

pub const PARAM_COUNT: usize = 29;

/// Every automatable parameter of the synth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    Wavescan,
    WavetypeOne,
    WavetypeTwo,
    WavetypeThree,
    WavetypeFour,
    WavetypeFive,
    WaveSynth,
    SineSynth,
    Attack,
    Decay,
    Sustain,
    Release,
    Cutoff,
    Resonance,
    FilterAttack,
    FilterDecay,
    FilterSustain,
    FilterRelease,
    FilterCutoffAmp,
    FilterResonanceAmp,
    ChorusDepth,
    ChorusMix,
    RoomSize,
    Damping,
    Dry,
    Wet,
    LfoShape,
    LfoFreq,
    LfoAmp,
}

struct ParamSpec {
    name: &'static str,
    min: f32,
    max: f32,
    default: f32,
    integral: bool,
}

const fn spec(name: &'static str, min: f32, max: f32, default: f32) -> ParamSpec {
    ParamSpec {
        name,
        min,
        max,
        default,
        integral: false,
    }
}

const fn stepped(name: &'static str, max: f32, default: f32) -> ParamSpec {
    ParamSpec {
        name,
        min: 0.0,
        max,
        default,
        integral: true,
    }
}

// Same order as `ParamId`.
const SPECS: [ParamSpec; PARAM_COUNT] = [
    spec("wavescan", 0.0, 4.0, 2.0),
    stepped("wavetype_one", 19.0, 0.0),
    stepped("wavetype_two", 19.0, 2.0),
    stepped("wavetype_three", 19.0, 4.0),
    stepped("wavetype_four", 19.0, 6.0),
    stepped("wavetype_five", 19.0, 8.0),
    spec("wave_synth", 0.0, 2.0, 1.0),
    spec("sine_synth", 0.0, 2.0, 1.0),
    spec("attack", 0.0, 1.0, 0.1),
    spec("decay", 0.0, 1.0, 0.5),
    spec("sustain", 0.0, 1.0, 0.9),
    spec("release", 0.0, 4.0, 0.5),
    spec("cutoff", 100.0, 20_000.0, 10_000.0),
    spec("resonance", 0.0, 1.0, 0.1),
    spec("filter_attack", 0.0, 1.0, 0.1),
    spec("filter_decay", 0.0, 1.0, 0.5),
    spec("filter_sustain", 0.0, 1.0, 0.1),
    spec("filter_release", 0.0, 4.0, 0.5),
    spec("filter_cutoff_amp", -1.0, 1.0, 0.0),
    spec("filter_resonance_amp", -1.0, 1.0, 0.0),
    spec("chorus_depth", 0.0, 1.0, 0.1),
    spec("chorus_mix", 0.0, 1.0, 0.1),
    spec("room_size", 0.0, 1.0, 0.5),
    spec("damping", 0.0, 1.0, 0.5),
    spec("dry", 0.0, 1.0, 0.6),
    spec("wet", 0.0, 1.0, 0.3),
    stepped("lfo_shape", 3.0, 0.0),
    spec("lfo_freq", 0.0, 10.0, 0.5),
    spec("lfo_amp", 0.0, 4.0, 0.0),
];

impl ParamId {
    pub const ALL: [ParamId; PARAM_COUNT] = [
        ParamId::Wavescan,
        ParamId::WavetypeOne,
        ParamId::WavetypeTwo,
        ParamId::WavetypeThree,
        ParamId::WavetypeFour,
        ParamId::WavetypeFive,
        ParamId::WaveSynth,
        ParamId::SineSynth,
        ParamId::Attack,
        ParamId::Decay,
        ParamId::Sustain,
        ParamId::Release,
        ParamId::Cutoff,
        ParamId::Resonance,
        ParamId::FilterAttack,
        ParamId::FilterDecay,
        ParamId::FilterSustain,
        ParamId::FilterRelease,
        ParamId::FilterCutoffAmp,
        ParamId::FilterResonanceAmp,
        ParamId::ChorusDepth,
        ParamId::ChorusMix,
        ParamId::RoomSize,
        ParamId::Damping,
        ParamId::Dry,
        ParamId::Wet,
        ParamId::LfoShape,
        ParamId::LfoFreq,
        ParamId::LfoAmp,
    ];

    /// The wavetable slot selectors, in slot order.
    pub const SLOTS: [ParamId; SLOT_COUNT] = [
        ParamId::WavetypeOne,
        ParamId::WavetypeTwo,
        ParamId::WavetypeThree,
        ParamId::WavetypeFour,
        ParamId::WavetypeFive,
    ];

    fn spec(self) -> &'static ParamSpec {
        &SPECS[self as usize]
    }

    /// Host-facing name, e.g. `"filter_cutoff_amp"`.
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn from_name(name: &str) -> Option<ParamId> {
        ParamId::ALL.into_iter().find(|id| id.name() == name)
    }

    /// Inclusive `(min, max)`.
    pub fn range(self) -> (f32, f32) {
        let spec = self.spec();
        (spec.min, spec.max)
    }

    pub fn default_value(self) -> f32 {
        self.spec().default
    }

    /// Whether values are rounded to whole numbers (table and shape selectors).
    pub fn is_integral(self) -> bool {
        self.spec().integral
    }

    /// Clamp into range, rounding integral parameters.
    pub fn normalize(self, value: f32) -> f32 {
        let spec = self.spec();
        let value = value.clamp(spec.min, spec.max);
        if spec.integral {
            value.round()
        } else {
            value
        }
    }
}

impl FromStr for ParamId {
    type Err = ParamError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        ParamId::from_name(name).ok_or_else(|| ParamError::UnknownParameter(name.to_string()))
    }
}

/// Shared parameter values. Wrap in an `Arc` to hand out to other threads.
pub struct SynthParams {
    values: [AtomicU32; PARAM_COUNT],
}

impl SynthParams {
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|i| AtomicU32::new(SPECS[i].default.to_bits())),
        }
    }

    /// Store `value` after clamping (and rounding, where integral).
    /// Returns the value actually stored. NaN and infinities are rejected.
    pub fn set(&self, id: ParamId, value: f32) -> Result<f32, ParamError> {
        if !value.is_finite() {
            return Err(ParamError::NotFinite { name: id.name() });
        }
        Ok(self.store(id, value))
    }

    pub fn set_by_name(&self, name: &str, value: f32) -> Result<f32, ParamError> {
        let id: ParamId = name.parse()?;
        self.set(id, value)
    }

    pub fn get(&self, id: ParamId) -> f32 {
        f32::from_bits(self.values[id as usize].load(Ordering::Relaxed))
    }

    pub fn reset_to_defaults(&self) {
        for id in ParamId::ALL {
            self.values[id as usize].store(id.default_value().to_bits(), Ordering::Relaxed);
        }
    }

    /// Read every parameter once. Called by the audio thread at block start.
    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot::from_fn(|id| self.get(id))
    }

    /// Overwrite every parameter from `snapshot`. Out-of-range fields are
    /// clamped like any other write; non-finite fields keep their old value.
    pub fn load_snapshot(&self, snapshot: &ParamSnapshot) {
        for id in ParamId::ALL {
            let value = snapshot.value(id);
            if value.is_finite() {
                self.store(id, value);
            }
        }
    }

    fn store(&self, id: ParamId, value: f32) -> f32 {
        let value = id.normalize(value);
        self.values[id as usize].store(value.to_bits(), Ordering::Relaxed);
        value
    }
}

impl Default for SynthParams {
    fn default() -> Self {
        Self::new()
    }
}

/// All parameter values as seen by one block.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSnapshot {
    pub wavescan: f32,
    pub wavetable_slots: [usize; SLOT_COUNT],
    pub wave_volume: f32,
    pub sine_volume: f32,
    pub amp_env: AdsrParams,
    pub filter_env: AdsrParams,
    pub filter: FilterSettings,
    pub chorus_depth: f32,
    pub chorus_mix: f32,
    pub reverb: ReverbParams,
    pub lfo: LfoParams,
}

impl ParamSnapshot {
    fn from_fn(value: impl Fn(ParamId) -> f32) -> Self {
        use ParamId as P;

        Self {
            wavescan: value(P::Wavescan),
            wavetable_slots: ParamId::SLOTS.map(|id| value(id) as usize),
            wave_volume: value(P::WaveSynth),
            sine_volume: value(P::SineSynth),
            amp_env: AdsrParams::new(
                value(P::Attack),
                value(P::Decay),
                value(P::Sustain),
                value(P::Release),
            ),
            filter_env: AdsrParams::new(
                value(P::FilterAttack),
                value(P::FilterDecay),
                value(P::FilterSustain),
                value(P::FilterRelease),
            ),
            filter: FilterSettings {
                cutoff_hz: value(P::Cutoff),
                resonance: value(P::Resonance),
                cutoff_env_amount: value(P::FilterCutoffAmp),
                resonance_env_amount: value(P::FilterResonanceAmp),
            },
            chorus_depth: value(P::ChorusDepth),
            chorus_mix: value(P::ChorusMix),
            reverb: ReverbParams {
                room_size: value(P::RoomSize),
                damping: value(P::Damping),
                dry: value(P::Dry),
                wet: value(P::Wet),
            },
            lfo: LfoParams {
                shape: LfoShape::from_index(value(P::LfoShape) as usize),
                frequency: value(P::LfoFreq),
                amplitude: value(P::LfoAmp),
            },
        }
    }

    /// The field backing `id`, as a parameter value.
    pub fn value(&self, id: ParamId) -> f32 {
        use ParamId as P;

        match id {
            P::Wavescan => self.wavescan,
            P::WavetypeOne => self.wavetable_slots[0] as f32,
            P::WavetypeTwo => self.wavetable_slots[1] as f32,
            P::WavetypeThree => self.wavetable_slots[2] as f32,
            P::WavetypeFour => self.wavetable_slots[3] as f32,
            P::WavetypeFive => self.wavetable_slots[4] as f32,
            P::WaveSynth => self.wave_volume,
            P::SineSynth => self.sine_volume,
            P::Attack => self.amp_env.attack,
            P::Decay => self.amp_env.decay,
            P::Sustain => self.amp_env.sustain,
            P::Release => self.amp_env.release,
            P::Cutoff => self.filter.cutoff_hz,
            P::Resonance => self.filter.resonance,
            P::FilterAttack => self.filter_env.attack,
            P::FilterDecay => self.filter_env.decay,
            P::FilterSustain => self.filter_env.sustain,
            P::FilterRelease => self.filter_env.release,
            P::FilterCutoffAmp => self.filter.cutoff_env_amount,
            P::FilterResonanceAmp => self.filter.resonance_env_amount,
            P::ChorusDepth => self.chorus_depth,
            P::ChorusMix => self.chorus_mix,
            P::RoomSize => self.reverb.room_size,
            P::Damping => self.reverb.damping,
            P::Dry => self.reverb.dry,
            P::Wet => self.reverb.wet,
            P::LfoShape => self.lfo.shape as usize as f32,
            P::LfoFreq => self.lfo.frequency,
            P::LfoAmp => self.lfo.amplitude,
        }
    }
}

impl Default for ParamSnapshot {
    fn default() -> Self {
        Self::from_fn(ParamId::default_value)
    }
}
