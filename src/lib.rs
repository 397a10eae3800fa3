pub mod dsp; // Allocation-free DSP primitives
pub mod engine; // Per-block orchestration: params → voices → effects
pub mod error;
pub mod io;
pub mod params; // Lock-free parameter store and per-block snapshots
pub mod synth; // Voice management and polyphony

pub use engine::{EngineConfig, WavemorphEngine};
#[cfg(feature = "rtrb")]
pub use engine::EngineHandle;
pub use params::{ParamId, ParamSnapshot, SynthParams};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;

/// Number of wavetable slots a voice can scan across.
pub const SLOT_COUNT: usize = 5;
/// Default polyphony.
pub const DEFAULT_VOICE_COUNT: usize = 8;
