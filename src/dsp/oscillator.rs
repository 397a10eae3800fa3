use std::f32::consts::TAU;

use crate::dsp::context::RenderCtx;
use crate::dsp::wavetable::{read_cycle, WavetableBank, TABLE_LEN};
use crate::SLOT_COUNT;

/*
Wavescanning Oscillator
=======================

The voice's main sound source. Five tables are loaded into five slots and a
single control, the wavescan position, morphs between them:

    wavescan   0.0      1.0      2.0      3.0      4.0
               slot 0 ─ slot 1 ─ slot 2 ─ slot 3 ─ slot 4

A position of 1.25 plays 75% of slot 1 and 25% of slot 2. Each slot is read
at the same phase, so the blend is a true morph rather than a crossfade
between two unrelated oscillators.

Reading a Sample
----------------

  1. Both bracketing slots are read with linear interpolation at `phase`.
  2. The two values are blended by the fractional wavescan position.
  3. On an exact integer position only one slot is read, so wavescan = 2.0
     sounds exactly like slot 2 on its own.

Phase
-----

The phase lives in table space, [0, TABLE_LEN). It is kept in f64 and
wrapped with `rem_euclid` after every step, so a note held for minutes does
not drift out of tune.

Slots own a copy of their table. Switching a slot copies 2048 samples into
memory that was allocated when the oscillator was built; if the requested
index is already loaded nothing happens at all.
*/

struct Slot {
    index: usize,
    samples: Box<[f32]>,
}

pub struct WavetableOscillator {
    slots: [Slot; SLOT_COUNT],
    wavescan: f32,
    phase: f64,
}

impl WavetableOscillator {
    /// Allocate the five slots and load `indices` from `bank`.
    pub fn new(bank: &WavetableBank, indices: [usize; SLOT_COUNT]) -> Self {
        let slots = indices.map(|index| {
            let index = bank.clamp_index(index);
            Slot {
                index,
                samples: bank.table(index).samples().to_vec().into_boxed_slice(),
            }
        });

        Self {
            slots,
            wavescan: 0.0,
            phase: 0.0,
        }
    }

    /// Load table `index` into `slot`. Returns true if the slot changed.
    ///
    /// Out-of-range slots are ignored, out-of-range indices are clamped by
    /// the bank.
    pub fn set_table(&mut self, slot: usize, index: usize, bank: &WavetableBank) -> bool {
        let Some(target) = self.slots.get_mut(slot) else {
            return false;
        };

        let index = bank.clamp_index(index);
        if target.index == index {
            return false;
        }

        target.samples.copy_from_slice(bank.table(index).samples());
        target.index = index;
        true
    }

    pub fn set_tables(&mut self, indices: [usize; SLOT_COUNT], bank: &WavetableBank) {
        for (slot, index) in indices.into_iter().enumerate() {
            self.set_table(slot, index, bank);
        }
    }

    pub fn table_indices(&self) -> [usize; SLOT_COUNT] {
        std::array::from_fn(|slot| self.slots[slot].index)
    }

    pub fn set_wavescan(&mut self, position: f32) {
        self.wavescan = if position.is_nan() {
            0.0
        } else {
            position.clamp(0.0, (SLOT_COUNT - 1) as f32)
        };
    }

    pub fn wavescan(&self) -> f32 {
        self.wavescan
    }

    /// Current read position in table space, `[0, TABLE_LEN)`.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Read at the current phase, then advance by one sample of `ctx.frequency`.
    #[inline]
    pub fn next_sample(&mut self, ctx: &RenderCtx) -> f32 {
        let out = self.read(self.phase);

        let increment =
            ctx.frequency.max(0.0) as f64 * TABLE_LEN as f64 / ctx.sample_rate as f64;
        self.phase = (self.phase + increment).rem_euclid(TABLE_LEN as f64);

        out
    }

    /// Blend the slots bracketing the wavescan position at `phase`.
    #[inline]
    pub fn read(&self, phase: f64) -> f32 {
        let lower = (self.wavescan.floor() as usize).min(SLOT_COUNT - 1);
        let blend = self.wavescan - lower as f32;

        let a = read_cycle(&self.slots[lower].samples, phase);
        if blend == 0.0 {
            return a;
        }

        let b = read_cycle(&self.slots[lower + 1].samples, phase);
        a * (1.0 - blend) + b * blend
    }
}

/// The secondary oscillator mixed under the wavetable.
pub struct SineOscillator {
    phase: f32, // [0, 1)
}

impl SineOscillator {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    #[inline]
    pub fn next_sample(&mut self, ctx: &RenderCtx) -> f32 {
        let out = (TAU * self.phase).sin();
        self.phase = (self.phase + ctx.frequency.max(0.0) / ctx.sample_rate).rem_euclid(1.0);
        out
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

impl Default for SineOscillator {
    fn default() -> Self {
        Self::new()
    }
}
