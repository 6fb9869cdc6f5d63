use serde::Serialize;

use crate::{
    engine::{AudioEngine, FilterKind, NodeHandle},
    stage::Stage,
};

/// Biquad filter over upstream signals.
///
/// Purely static configuration: pressing constructs the node with its
/// response, center frequency, Q and gain, and schedules nothing. The
/// gain parameter is in dB and only shapes the peaking/shelf responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterStage {
    #[serde(rename = "type")]
    pub kind: FilterKind,
    pub frequency: f32,
    pub q: f32,
    pub gain: f32,
    pub upstreams: Vec<Stage>,
}

impl FilterStage {
    pub fn new(kind: FilterKind, frequency: f32, q: f32, gain: f32, upstreams: Vec<Stage>) -> Self {
        Self {
            kind,
            frequency,
            q,
            gain,
            upstreams,
        }
    }

    pub fn press(&self, engine: &mut dyn AudioEngine) -> NodeHandle {
        engine.create_filter(self.kind, self.frequency, self.q, self.gain)
    }
}
