//! Low-level DSP primitives used by the audio graph.
//!
//! These functions are allocation-free and realtime-safe so the render thread
//! can call them from inside the device callback. They stay focused on the
//! signal math; routing and parameter handling live in `graph`.

/// Gain stages and decibel conversion.
pub mod amplify;
/// Interleaving stereo blocks into device buffers.
pub mod merge;
/// Summing and downmixing.
pub mod mix;
/// Phase-accumulating sine oscillator.
pub mod oscillator;

pub use amplify::db_to_amplitude;
pub use oscillator::SineOscillator;
