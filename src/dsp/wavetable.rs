use std::f64::consts::TAU;
use std::io::Read;

use crate::error::WavetableError;

/*
Wavetables
==========

A wavetable is one cycle of a waveform stored as a fixed number of samples.
Playing it back cyclically at different speeds produces different pitches:

    phase increment = frequency * TABLE_LEN / sample_rate

Vocabulary
----------

  cycle       One period of the waveform. Sample 0 follows sample
              TABLE_LEN - 1 seamlessly.

  phase       Fractional read position in [0, TABLE_LEN). The integer part
              picks a sample, the fractional part interpolates towards the
              next one.

  bank        The catalog of tables a voice can load into its five slots.
              Immutable once built; voices copy the tables they need.

Built-in Catalog
----------------

The bank is generated once at start-up by additive synthesis: each recipe
gives an amplitude for harmonics 1..=MAX_HARMONIC. Summing sines keeps every
table band-limited to 64 harmonics, which stays below Nyquist for notes up to
roughly 370 Hz at 48 kHz and rolls off gently above that.

Custom tables can be loaded from single-cycle WAV files with
`Wavetable::from_wav`; they are resampled to TABLE_LEN.
*/

/// Samples per single-cycle table.
pub const TABLE_LEN: usize = 2048;
/// Number of tables in the built-in bank.
pub const TABLE_COUNT: usize = 20;

const MAX_HARMONIC: usize = 64;

pub struct Wavetable {
    name: String,
    samples: Box<[f32]>,
}

impl Wavetable {
    /// Build a table from one cycle of arbitrary length.
    ///
    /// The cycle is resampled to `TABLE_LEN` with linear interpolation and
    /// normalised to a peak of 1.0.
    pub fn from_samples(name: impl Into<String>, cycle: &[f32]) -> Result<Self, WavetableError> {
        let name = name.into();
        if cycle.is_empty() {
            return Err(WavetableError::EmptyTable(name));
        }

        let len = cycle.len();
        let mut samples = vec![0.0f32; TABLE_LEN];
        for (i, out) in samples.iter_mut().enumerate() {
            let pos = i as f64 * len as f64 / TABLE_LEN as f64;
            let i0 = pos.floor() as usize % len;
            let i1 = (i0 + 1) % len;
            let frac = (pos - pos.floor()) as f32;
            *out = cycle[i0] + (cycle[i1] - cycle[i0]) * frac;
        }

        normalise(&mut samples);

        Ok(Self {
            name,
            samples: samples.into_boxed_slice(),
        })
    }

    /// Sum harmonics `1..=MAX_HARMONIC` weighted by `amplitude(h)`.
    pub fn additive(name: impl Into<String>, amplitude: impl Fn(usize) -> f32) -> Self {
        let mut samples = vec![0.0f32; TABLE_LEN];

        for harmonic in 1..=MAX_HARMONIC {
            let amp = amplitude(harmonic);
            if amp == 0.0 {
                continue;
            }
            for (i, out) in samples.iter_mut().enumerate() {
                let phase = TAU * harmonic as f64 * i as f64 / TABLE_LEN as f64;
                *out += amp * phase.sin() as f32;
            }
        }

        normalise(&mut samples);

        Self {
            name: name.into(),
            samples: samples.into_boxed_slice(),
        }
    }

    /// Load one cycle from a WAV stream. Only the first channel is used.
    pub fn from_wav<R: Read>(name: impl Into<String>, reader: R) -> Result<Self, WavetableError> {
        let mut reader = hound::WavReader::new(reader)?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|s| s as f32 * scale))
                    .collect::<Result<_, _>>()?
            }
        };

        let cycle: Vec<f32> = interleaved.into_iter().step_by(channels).collect();
        Self::from_samples(name, &cycle)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Linearly interpolated read at `phase` in `[0, TABLE_LEN)`.
    #[inline]
    pub fn read(&self, phase: f64) -> f32 {
        read_cycle(&self.samples, phase)
    }
}

/// Linear interpolation inside a cyclic buffer of `TABLE_LEN` samples.
#[inline]
pub(crate) fn read_cycle(samples: &[f32], phase: f64) -> f32 {
    let index = phase.floor();
    let i0 = index as usize % TABLE_LEN;
    let i1 = (i0 + 1) % TABLE_LEN;
    let frac = (phase - index) as f32;

    let a = samples[i0];
    let b = samples[i1];
    a + (b - a) * frac
}

fn normalise(samples: &mut [f32]) {
    let peak = samples.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
    if peak > 0.0 {
        for s in samples.iter_mut() {
            *s /= peak;
        }
    }
}

/// Ordered catalog of tables, selectable by index.
pub struct WavetableBank {
    tables: Vec<Wavetable>,
}

impl WavetableBank {
    /// The 20-table catalog every voice starts from.
    pub fn builtin() -> Self {
        let odd = |h: usize| h % 2 == 1;

        let tables = vec![
            Wavetable::additive("Sine", |h| if h == 1 { 1.0 } else { 0.0 }),
            Wavetable::additive("Triangle", |h| {
                if odd(h) {
                    let sign = if (h / 2) % 2 == 0 { 1.0 } else { -1.0 };
                    sign / (h * h) as f32
                } else {
                    0.0
                }
            }),
            Wavetable::additive("Saw", |h| 1.0 / h as f32),
            Wavetable::additive("Square", |h| if odd(h) { 1.0 / h as f32 } else { 0.0 }),
            Wavetable::additive("Pulse 25", |h| pulse(h, 0.25)),
            Wavetable::additive("Pulse 12", |h| pulse(h, 0.125)),
            Wavetable::additive("Organ", |h| match h {
                1 => 1.0,
                2 => 0.8,
                3 => 0.6,
                4 => 0.5,
                6 => 0.3,
                8 => 0.25,
                _ => 0.0,
            }),
            Wavetable::additive("Soft Saw", |h| 1.0 / (h * h) as f32),
            Wavetable::additive("Hollow", |h| {
                if h == 1 || h % 2 == 0 {
                    1.0 / h as f32
                } else {
                    0.0
                }
            }),
            Wavetable::additive("Bell", |h| match h {
                1 => 1.0,
                4 => 0.6,
                7 => 0.45,
                11 => 0.3,
                17 => 0.15,
                _ => 0.0,
            }),
            Wavetable::additive("Formant A", |h| formant(h, 8.0, 2.5)),
            Wavetable::additive("Formant O", |h| formant(h, 3.5, 1.5)),
            Wavetable::additive("Odd Stack", |h| {
                if odd(h) {
                    1.0 / (h as f32).sqrt()
                } else {
                    0.0
                }
            }),
            Wavetable::additive("Even Stack", |h| {
                if h == 1 || h % 2 == 0 {
                    1.0 / (h as f32).sqrt()
                } else {
                    0.0
                }
            }),
            Wavetable::additive("Octaves", |h| {
                if h.is_power_of_two() {
                    1.0 / (1.0 + h.trailing_zeros() as f32)
                } else {
                    0.0
                }
            }),
            Wavetable::additive("Fifths", |h| match h {
                1 => 1.0,
                3 => 0.7,
                6 => 0.5,
                12 => 0.35,
                24 => 0.2,
                _ => 0.0,
            }),
            Wavetable::additive("Buzz", |_| 1.0),
            Wavetable::additive("Bright Saw", |h| 1.0 / (h as f32).sqrt()),
            Wavetable::additive("Warm Square", |h| {
                if odd(h) {
                    (-(h as f32) / 16.0).exp() / h as f32
                } else {
                    0.0
                }
            }),
            Wavetable::additive("Glass", |h| {
                if h % 4 == 1 {
                    (-(h as f32) / 8.0).exp()
                } else {
                    0.0
                }
            }),
        ];

        debug_assert_eq!(tables.len(), TABLE_COUNT);
        Self { tables }
    }

    pub fn from_tables(tables: Vec<Wavetable>) -> Result<Self, WavetableError> {
        if tables.is_empty() {
            return Err(WavetableError::EmptyBank);
        }
        Ok(Self { tables })
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Clamp `index` into `[0, len - 1]`.
    #[inline]
    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.tables.len() - 1)
    }

    /// Table at `index`, clamped. Never fails.
    #[inline]
    pub fn table(&self, index: usize) -> &Wavetable {
        &self.tables[self.clamp_index(index)]
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(Wavetable::name)
    }
}

impl Default for WavetableBank {
    fn default() -> Self {
        Self::builtin()
    }
}

fn pulse(h: usize, duty: f32) -> f32 {
    (std::f32::consts::PI * h as f32 * duty).sin() / h as f32
}

fn formant(h: usize, centre: f32, width: f32) -> f32 {
    let d = (h as f32 - centre) / width;
    (-(d * d)).exp() + if h == 1 { 0.5 } else { 0.0 }
}
