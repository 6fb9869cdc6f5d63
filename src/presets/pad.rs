//! Pad patch - slow, layered sustain.

use crate::{
    engine::{FilterKind, Waveform},
    stage::Stage,
};

/// Two-layer sustained wash with a slow swell in and a long tail out.
pub fn pad() -> Stage {
    Stage::gain(
        0.6,
        vec![Stage::envelope(
            0.8,
            0.4,
            0.7,
            1.2,
            vec![Stage::filter(
                FilterKind::LowPass,
                1_200.0,
                0.6,
                0.0,
                vec![
                    Stage::wave(Waveform::Sawtooth),
                    Stage::wave(Waveform::Triangle),
                ],
            )],
        )],
    )
}
