//! Kick patch - low sine thump.
//!
//! A sine wave carries almost all of its energy at the fundamental, so
//! bound low (40-60 Hz) it reads as a chest-thump rather than a note.
//! The envelope does the work: instant attack, a fast full decay to
//! silence, no sustain.

use crate::{engine::Waveform, stage::Stage};

/// Low sine thump. Bind around 50 Hz.
pub fn kick() -> Stage {
    Stage::gain(
        0.9,
        vec![Stage::envelope(
            0.001,
            0.25,
            0.0,
            0.05,
            vec![Stage::wave(Waveform::Sine)],
        )],
    )
}
