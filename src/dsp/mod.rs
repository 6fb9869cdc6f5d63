//! Low-level primitives shared by engine implementations.
//!
//! These components are allocation-free once constructed and safe to run on
//! the audio callback thread. They stay focused on the math; scheduling and
//! graph orchestration live in the engine layer above.

/// Scheduled gain parameter timeline (set / linear ramp / cancel).
pub mod automation;
/// Audio-band oscillator waveform synthesis.
pub mod oscillator;
