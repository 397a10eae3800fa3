use crate::{
    dsp::{
        context::RenderCtx,
        envelope::{Envelope, EnvelopeState},
        filter::ModulatedFilter,
        lfo::Lfo,
        oscillator::{SineOscillator, WavetableOscillator},
        wavetable::WavetableBank,
    },
    params::ParamSnapshot,
};

/*
Voice Signal Flow
=================

One voice plays one note:

    wavetable osc ──× wave_volume──┐
                                   (+)──× amp env ──× velocity ──→ [SVF LP] ──→ out
    sine osc ──────× sine_volume───┘                                  ↑
                                                                      │
                           filter env ──────────────→ cutoff / resonance
                           LFO ─────────────────────→ cutoff / resonance

Lifecycle
---------

    Free ──start──→ Active ──stop──→ Releasing ──amp env idle──→ Free
                      ↑  │                 │
                      └──┴──────start──────┘   (retrigger / steal)

Starting from Free clears filter memory and restarts the oscillators and the
LFO, so every fresh note begins identically. Starting a busy voice keeps all
of that running and only re-enters the envelope attacks, which avoids
clicks on stolen voices.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Playing, envelope in attack/decay/sustain
    Releasing, // Key released, envelope in release phase
}

pub struct Voice {
    note: u8,
    state: VoiceState,
    age: u64,
    ctx: RenderCtx,
    gain: f32,

    wavetable: WavetableOscillator,
    sine: SineOscillator,
    wave_volume: f32,
    sine_volume: f32,

    amp_env: Envelope,
    filter_env: Envelope,
    filter: ModulatedFilter,
    lfo: Lfo,
}

impl Voice {
    /// Build an idle voice with `params` applied and its slots loaded from `bank`.
    pub fn new(bank: &WavetableBank, sample_rate: f32, params: &ParamSnapshot) -> Self {
        let mut voice = Self {
            note: 0,
            state: VoiceState::Free,
            age: 0,
            ctx: RenderCtx::from_freq(sample_rate, 0.0, 0.0),
            gain: 0.0,

            wavetable: WavetableOscillator::new(bank, params.wavetable_slots),
            sine: SineOscillator::new(),
            wave_volume: params.wave_volume,
            sine_volume: params.sine_volume,

            amp_env: Envelope::from_params(params.amp_env),
            filter_env: Envelope::from_params(params.filter_env),
            filter: ModulatedFilter::new(params.filter),
            lfo: Lfo::new(params.lfo),
        };
        voice.apply_params(params);
        voice
    }

    pub fn start(&mut self, note: u8, velocity: u8, age: u64) {
        if self.state == VoiceState::Free {
            self.wavetable.reset();
            self.sine.reset();
            self.filter.reset();
            self.lfo.reset();
        }

        self.note = note;
        self.state = VoiceState::Active;
        self.age = age;

        self.ctx = RenderCtx::from_note(self.ctx.sample_rate, note, velocity as f32);
        self.gain = self.ctx.velocity_gain();

        self.amp_env.note_on();
        self.filter_env.note_on();
    }

    /// Key released: both envelopes enter their release stage.
    pub fn stop(&mut self) {
        if self.state == VoiceState::Active {
            self.state = VoiceState::Releasing;
            self.amp_env.note_off(&self.ctx);
            self.filter_env.note_off(&self.ctx);
        }
    }

    /// Silence immediately and return to the pool.
    pub fn kill(&mut self) {
        self.amp_env.reset();
        self.filter_env.reset();
        self.filter.reset();
        self.free();
    }

    /// Next output sample. Exactly 0.0 while the voice is free.
    #[inline]
    pub fn render_sample(&mut self) -> f32 {
        if self.state == VoiceState::Free {
            return 0.0;
        }

        let ctx = self.ctx;
        let osc = self.wavetable.next_sample(&ctx) * self.wave_volume
            + self.sine.next_sample(&ctx) * self.sine_volume;

        let amp = self.amp_env.next_sample(&ctx);
        let filter_env = self.filter_env.next_sample(&ctx);
        let lfo = self.lfo.next_sample(&ctx);

        let out = self
            .filter
            .next_sample(osc * amp * self.gain, filter_env, lfo, &ctx);

        if !self.amp_env.is_active() {
            self.free();
        }

        out
    }

    /// Add this voice's output onto `out`.
    pub fn render_add(&mut self, out: &mut [f32]) {
        if self.state == VoiceState::Free {
            return;
        }
        for sample in out.iter_mut() {
            *sample += self.render_sample();
        }
    }

    /// Per-block parameter update. Slot selection goes through `set_wavetable`.
    pub fn apply_params(&mut self, params: &ParamSnapshot) {
        self.wavetable.set_wavescan(params.wavescan);
        self.wave_volume = params.wave_volume;
        self.sine_volume = params.sine_volume;

        self.amp_env.set_params(params.amp_env);
        self.filter_env.set_params(params.filter_env);
        self.filter.set_settings(params.filter);
        self.lfo.set_params(params.lfo);
    }

    /// Returns true if the slot actually reloaded.
    pub fn set_wavetable(&mut self, slot: usize, index: usize, bank: &WavetableBank) -> bool {
        self.wavetable.set_table(slot, index, bank)
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.ctx.sample_rate = sample_rate;
    }

    fn free(&mut self) {
        self.state = VoiceState::Free;
        self.note = 0;
    }

    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }

    pub fn is_busy(&self) -> bool {
        !self.is_free()
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn envelope_level(&self) -> f32 {
        self.amp_env.level()
    }

    pub fn envelope_state(&self) -> EnvelopeState {
        self.amp_env.state()
    }

    pub fn table_indices(&self) -> [usize; crate::SLOT_COUNT] {
        self.wavetable.table_indices()
    }
}
