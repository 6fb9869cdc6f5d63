//! Bass patch - filtered square with body.
//!
//! A square wave has strong low odd harmonics; rolling it off around
//! 500 Hz leaves weight without buzz. High sustain keeps held notes
//! solid under a melody.

use crate::{
    engine::{FilterKind, Waveform},
    stage::Stage,
};

/// Round, sustaining bass. Bind an octave or two below middle C.
pub fn bass() -> Stage {
    Stage::gain(
        0.8,
        vec![Stage::envelope(
            0.005,
            0.1,
            0.8,
            0.15,
            vec![Stage::filter(
                FilterKind::LowPass,
                500.0,
                0.8,
                0.0,
                vec![Stage::wave(Waveform::Square)],
            )],
        )],
    )
}
