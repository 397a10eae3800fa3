//! Real-world scenario benchmarks.
//!
//! These run the voice pool and the whole engine the way a host would,
//! one block at a time.

mod engine;
mod voices;

pub use engine::bench_engine;
pub use voices::bench_voices;
