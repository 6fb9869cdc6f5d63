use serde::Serialize;

use crate::engine::{AudioEngine, NodeHandle};

/// Frames of white noise to synthesize per press, in seconds. Long enough
/// that the loop point is inaudible as a period.
const NOISE_SECONDS: f32 = 2.0;

/// Unpitched white-noise source.
///
/// Pressing synthesizes a fresh buffer of uniform noise at the engine's
/// sample rate and plays it as an indefinitely looping source, so the
/// node behaves like a continuous generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NoiseStage {}

impl NoiseStage {
    pub fn new() -> Self {
        Self {}
    }

    pub fn press(&self, engine: &mut dyn AudioEngine, at: f64) -> NodeHandle {
        let frames = (NOISE_SECONDS * engine.sample_rate()).ceil() as usize;
        let channel: Vec<f32> = (0..frames).map(|_| fastrand::f32() * 2.0 - 1.0).collect();

        let node = engine.create_buffer(vec![channel], true);
        engine.start(&node, at);
        node
    }
}

impl Default for NoiseStage {
    fn default() -> Self {
        Self::new()
    }
}
