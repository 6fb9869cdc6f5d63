//! Non-rendering engine that records every scheduled command.
//!
//! [`OfflineEngine`] implements the full [`AudioEngine`] contract without
//! producing audio: node construction, wiring, starts, stops and gain
//! automation are recorded and exposed for inspection, and the clock only
//! moves when the caller advances it. Gain readback evaluates the real
//! automation timeline, so mid-ramp behavior (an envelope released during
//! its decay, say) is observable sample-free.
//!
//! This is the headless double for anything driving the patch core: unit
//! tests here, integration tests, and callers who want to dry-run a
//! patch's schedule before committing it to hardware.

use crate::dsp::automation::Timeline;

use super::{AudioEngine, FilterKind, NodeHandle, NodeId, StopError, Waveform};

const DESTINATION: NodeId = NodeId::from_raw(0);

/// What a recorded node was created as.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeSpec {
    Oscillator {
        waveform: Waveform,
        frequency: f32,
    },
    Buffer {
        channels: Vec<Vec<f32>>,
        looping: bool,
    },
    Gain {
        level: f32,
    },
    Filter {
        kind: FilterKind,
        frequency: f32,
        q: f32,
        gain: f32,
    },
}

impl NodeSpec {
    fn stoppable(&self) -> bool {
        matches!(self, NodeSpec::Oscillator { .. } | NodeSpec::Buffer { .. })
    }
}

/// Everything the engine knows about one constructed node.
#[derive(Debug)]
pub struct RecordedNode {
    id: NodeId,
    spec: NodeSpec,
    connected_to: Vec<NodeId>,
    started_at: Option<f64>,
    stopped_at: Option<f64>,
    automation: Option<Timeline>,
}

impl RecordedNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    /// Destinations this node's output was connected into.
    pub fn connected_to(&self) -> &[NodeId] {
        &self.connected_to
    }

    pub fn started_at(&self) -> Option<f64> {
        self.started_at
    }

    pub fn stopped_at(&self) -> Option<f64> {
        self.stopped_at
    }

    /// The gain automation timeline, for gain-bearing nodes.
    pub fn automation(&self) -> Option<&Timeline> {
        self.automation.as_ref()
    }
}

/// An [`AudioEngine`] that records instead of rendering.
pub struct OfflineEngine {
    sample_rate: f32,
    now: f64,
    nodes: Vec<RecordedNode>,
}

impl OfflineEngine {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            now: 0.0,
            nodes: Vec::new(),
        }
    }

    /// Move the clock forward by `seconds`.
    pub fn advance(&mut self, seconds: f64) {
        assert!(seconds >= 0.0, "the engine clock is monotonic");
        self.now += seconds;
    }

    /// Jump the clock to an absolute time at or after the current one.
    pub fn set_now(&mut self, now: f64) {
        assert!(now >= self.now, "the engine clock is monotonic");
        self.now = now;
    }

    /// Every node constructed so far, in creation order. The destination
    /// is not a constructed node and does not appear here.
    pub fn nodes(&self) -> &[RecordedNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &RecordedNode {
        &self.nodes[Self::index(id)]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut RecordedNode {
        &mut self.nodes[Self::index(id)]
    }

    // Ids are handed out densely starting at 1; 0 is the destination.
    fn index(id: NodeId) -> usize {
        (id.raw() - 1) as usize
    }

    fn create(&mut self, spec: NodeSpec, automation: Option<Timeline>) -> NodeHandle {
        let id = NodeId::from_raw(self.nodes.len() as u64 + 1);
        self.nodes.push(RecordedNode {
            id,
            spec,
            connected_to: Vec::new(),
            started_at: None,
            stopped_at: None,
            automation,
        });
        NodeHandle::new(id)
    }
}

impl AudioEngine for OfflineEngine {
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn now(&self) -> f64 {
        self.now
    }

    fn destination(&self) -> NodeId {
        DESTINATION
    }

    fn create_oscillator(&mut self, waveform: Waveform, frequency: f32) -> NodeHandle {
        self.create(NodeSpec::Oscillator { waveform, frequency }, None)
    }

    fn create_buffer(&mut self, channels: Vec<Vec<f32>>, looping: bool) -> NodeHandle {
        self.create(NodeSpec::Buffer { channels, looping }, None)
    }

    fn create_gain(&mut self, level: f32) -> NodeHandle {
        self.create(NodeSpec::Gain { level }, Some(Timeline::new(level)))
    }

    fn create_filter(
        &mut self,
        kind: FilterKind,
        frequency: f32,
        q: f32,
        gain: f32,
    ) -> NodeHandle {
        self.create(
            NodeSpec::Filter {
                kind,
                frequency,
                q,
                gain,
            },
            None,
        )
    }

    fn connect(&mut self, source: &NodeHandle, destination: NodeId) {
        self.node_mut(source.id()).connected_to.push(destination);
    }

    fn start(&mut self, node: &NodeHandle, at: f64) {
        self.node_mut(node.id()).started_at = Some(at);
    }

    fn can_stop(&self, node: &NodeHandle) -> bool {
        self.node(node.id()).spec.stoppable()
    }

    fn stop(&mut self, node: &NodeHandle, at: f64) -> Result<(), StopError> {
        let record = self.node_mut(node.id());
        if !record.spec.stoppable() {
            return Err(StopError::NotSupported);
        }
        if record.stopped_at.is_some() {
            return Err(StopError::InvalidState);
        }
        record.stopped_at = Some(at);
        Ok(())
    }

    fn set_gain_value(&mut self, node: &NodeHandle, value: f32, at: f64) {
        if let Some(timeline) = &mut self.node_mut(node.id()).automation {
            timeline.set_value(value, at);
        }
    }

    fn ramp_gain_to(&mut self, node: &NodeHandle, value: f32, at: f64) {
        if let Some(timeline) = &mut self.node_mut(node.id()).automation {
            timeline.ramp_to(value, at);
        }
    }

    fn cancel_scheduled_gain(&mut self, node: &NodeHandle, from: f64) {
        if let Some(timeline) = &mut self.node_mut(node.id()).automation {
            timeline.cancel_from(from);
        }
    }

    fn gain_value(&self, node: &NodeHandle) -> f32 {
        match self.node(node.id()).automation.as_ref() {
            Some(timeline) => timeline.value_at(self.now),
            None => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_on_a_gain_node_is_refused_as_unsupported() {
        let mut engine = OfflineEngine::new(48_000.0);
        let gain = engine.create_gain(0.5);

        assert!(!engine.can_stop(&gain));
        assert_eq!(engine.stop(&gain, 0.0), Err(StopError::NotSupported));
    }

    #[test]
    fn double_stop_is_refused_as_invalid_state() {
        let mut engine = OfflineEngine::new(48_000.0);
        let osc = engine.create_oscillator(Waveform::Sine, 440.0);

        assert!(engine.can_stop(&osc));
        assert_eq!(engine.stop(&osc, 1.0), Ok(()));
        assert_eq!(engine.stop(&osc, 2.0), Err(StopError::InvalidState));
        assert_eq!(engine.node(osc.id()).stopped_at(), Some(1.0));
    }

    #[test]
    fn gain_readback_tracks_the_clock() {
        let mut engine = OfflineEngine::new(48_000.0);
        let gain = engine.create_gain(0.0);
        engine.set_gain_value(&gain, 0.0, 0.0);
        engine.ramp_gain_to(&gain, 1.0, 2.0);

        assert!(engine.gain_value(&gain).abs() < 1e-6);
        engine.advance(1.0);
        assert!((engine.gain_value(&gain) - 0.5).abs() < 1e-6);
        engine.set_now(2.0);
        assert!((engine.gain_value(&gain) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn connections_record_fan_in() {
        let mut engine = OfflineEngine::new(48_000.0);
        let gain = engine.create_gain(1.0);
        let osc_a = engine.create_oscillator(Waveform::Sine, 220.0);
        let osc_b = engine.create_oscillator(Waveform::Square, 440.0);

        engine.connect(&gain, engine.destination());
        engine.connect(&osc_a, gain.id());
        engine.connect(&osc_b, gain.id());

        assert_eq!(engine.node(osc_a.id()).connected_to(), [gain.id()]);
        assert_eq!(engine.node(osc_b.id()).connected_to(), [gain.id()]);
        assert_eq!(engine.node(gain.id()).connected_to(), [DESTINATION]);
    }
}
