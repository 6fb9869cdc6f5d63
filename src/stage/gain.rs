use serde::Serialize;

use crate::{
    engine::{AudioEngine, NodeHandle},
    stage::Stage,
};

/// Constant scaling of whatever the upstream stages feed in.
///
/// Pressing configures a static level anchored at the trigger instant;
/// there is no ramp and no scheduled event, so the node never needs to be
/// stopped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GainStage {
    pub level: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub upstreams: Vec<Stage>,
}

impl GainStage {
    pub fn new(level: f32, upstreams: Vec<Stage>) -> Self {
        Self { level, upstreams }
    }

    pub fn press(&self, engine: &mut dyn AudioEngine, at: f64) -> NodeHandle {
        let node = engine.create_gain(self.level);
        engine.set_gain_value(&node, self.level, at);
        node
    }
}
