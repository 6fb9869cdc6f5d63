//! Pluck patch - percussive, quickly-decaying note.
//!
//! Short and punchy, for melodies and arpeggios. Triangle wave for a
//! soft, bell-like tone; instant attack, no sustain, quick tail; a
//! bright lowpass lets the upper harmonics through without harshness.
//!
//! Variations: shorter decay (50-80 ms) reads as staccato, longer
//! (200-300 ms) as bell-like; a square wave makes it hollow and
//! synthetic; a darker filter softens the attack.

use crate::{
    engine::{FilterKind, Waveform},
    stage::Stage,
};

/// Percussive, fast-decaying note. Tracks the bound pitch.
pub fn pluck() -> Stage {
    Stage::gain(
        0.7,
        vec![Stage::envelope(
            0.001,
            0.15,
            0.0,
            0.1,
            vec![Stage::filter(
                FilterKind::LowPass,
                4_000.0,
                0.7,
                0.0,
                vec![Stage::wave(Waveform::Triangle)],
            )],
        )],
    )
}
