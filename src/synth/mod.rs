// Purpose: Voice management, polyphony, note events
// This layer sits above the DSP primitives and owns the voice pool

pub mod message;
pub mod poly;
pub mod voice;

pub use message::{MessageReceiver, SynthMessage};
pub use poly::PolySynth;
pub use voice::{Voice, VoiceState};
