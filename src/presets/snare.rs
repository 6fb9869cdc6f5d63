//! Snare patch - filtered noise burst.

use crate::{
    engine::{FilterKind, Waveform},
    stage::Stage,
};

/// Noise crack over a short triangle body. Ignores pitch except for the
/// body tone, which sits wherever the patch is bound.
pub fn snare() -> Stage {
    Stage::gain(
        0.8,
        vec![
            // The crack: band-limited noise with a fast decay.
            Stage::envelope(
                0.001,
                0.12,
                0.0,
                0.08,
                vec![Stage::filter(
                    FilterKind::BandPass,
                    1_800.0,
                    0.9,
                    0.0,
                    vec![Stage::noise()],
                )],
            ),
            // The body: a quieter, even shorter tonal knock.
            Stage::gain(
                0.4,
                vec![Stage::envelope(
                    0.001,
                    0.06,
                    0.0,
                    0.05,
                    vec![Stage::wave(Waveform::Triangle)],
                )],
            ),
        ],
    )
}
