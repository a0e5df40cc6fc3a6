//! NS-Simulation: synthetic EEG producer
//!
//! Sample synthesis, quality estimation, adaptive pacing and the producer
//! task that emits frames over a message channel.

pub mod pacer;
pub mod producer;
pub mod quality;
pub mod synthesizer;

pub use pacer::*;
pub use producer::*;
pub use quality::*;
pub use synthesizer::*;
