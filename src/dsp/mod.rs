//! Low-level DSP primitives used by the voices and the effects chain.
//!
//! These components are allocation-free and realtime-safe once constructed,
//! making them safe to embed directly inside voice structs. Anything that
//! needs memory (delay lines, wavetable slots) grabs it up front in `new`.

/// Modulated delay chorus.
pub mod chorus;
/// Sample rate / pitch context shared by every block.
pub mod context;
/// Time-domain delay line with fractional reads.
pub mod delay;
/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// State-variable filter and its per-sample modulation.
pub mod filter;
/// Low frequency oscillator.
pub mod lfo;
/// Wavescanning wavetable oscillator and the secondary sine.
pub mod oscillator;
/// Freeverb-style stereo reverb.
pub mod reverb;
/// Single-cycle wavetables and the built-in bank.
pub mod wavetable;

pub use context::RenderCtx;
pub use envelope::{AdsrParams, EnvelopeState};
