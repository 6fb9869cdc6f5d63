//! Hi-hat patch - high-passed noise tick.

use crate::{engine::FilterKind, stage::Stage};

/// Closed hi-hat: only the top of the noise spectrum, gone almost
/// immediately.
pub fn hihat() -> Stage {
    Stage::gain(
        0.5,
        vec![Stage::envelope(
            0.001,
            0.05,
            0.0,
            0.03,
            vec![Stage::filter(
                FilterKind::HighPass,
                8_000.0,
                0.7,
                0.0,
                vec![Stage::noise()],
            )],
        )],
    )
}
