//! Control-side error types.
//!
//! Nothing in here is produced on the audio thread. The render path recovers
//! locally (clamping, voice stealing); these errors only surface where a host
//! talks to the engine: parameter writes, wavetable loading and the note queue.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParamError {
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),
    #[error("parameter `{name}` received a non-finite value")]
    NotFinite { name: &'static str },
}

#[derive(Error, Debug)]
pub enum WavetableError {
    #[error("failed to read wavetable audio: {0}")]
    Io(#[from] hound::Error),
    #[error("wavetable `{0}` contains no samples")]
    EmptyTable(String),
    #[error("a wavetable bank needs at least one table")]
    EmptyBank,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EngineError {
    #[error("note queue is full, event dropped")]
    QueueFull,
}
