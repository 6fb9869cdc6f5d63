use serde::Serialize;

use crate::engine::{AudioEngine, NodeHandle, Waveform};

/// Pitched oscillator source.
///
/// The one stage whose sound depends on the frequency the tree was bound
/// at; everything else only passes the pitch along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WaveStage {
    #[serde(rename = "type")]
    pub waveform: Waveform,
}

impl WaveStage {
    pub fn new(waveform: Waveform) -> Self {
        Self { waveform }
    }

    pub fn press(&self, engine: &mut dyn AudioEngine, at: f64, frequency: f32) -> NodeHandle {
        let node = engine.create_oscillator(self.waveform, frequency);
        engine.start(&node, at);
        node
    }
}
