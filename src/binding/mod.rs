//! Pitch-bound playback trees.
//!
//! Binding a stage tree applies a trigger frequency to every stage,
//! producing an isomorphic tree of [`Binding`]s - same shape, same
//! upstream order, one resolved frequency throughout. The binding tree is
//! where playback state lives: each binding owns at most one live node
//! and walks through three states:
//!
//! ```text
//! Unplayed ──play──▶ Playing ──release/stop──▶ Released
//! ```
//!
//! Bindings are consumed by one play/release cycle and cannot be rewound;
//! re-triggering a patch means binding the stage tree again. The stage
//! tree itself is never touched, so any number of binding trees - at
//! different pitches, overlapping in time - can coexist, each with its
//! own nodes.

use crate::{
    engine::{AudioEngine, NodeHandle, NodeId},
    error::PatchError,
    stage::Stage,
};

/// Where a binding is in its one-shot lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    /// Constructed; no live node yet.
    Unplayed,
    /// Node pressed and wired into the graph.
    Playing,
    /// Stop scheduled on this node and every descendant's.
    Released,
}

/// One stage with a frequency applied, plus its bound upstreams.
#[derive(Debug)]
pub struct Binding<'a> {
    stage: &'a Stage,
    frequency: f32,
    upstreams: Vec<Binding<'a>>,
    node: Option<NodeHandle>,
    state: BindingState,
}

impl<'a> Binding<'a> {
    pub(crate) fn new(stage: &'a Stage, frequency: f32) -> Self {
        let upstreams = stage
            .upstreams()
            .iter()
            .map(|upstream| Binding::new(upstream, frequency))
            .collect();

        Self {
            stage,
            frequency,
            upstreams,
            node: None,
            state: BindingState::Unplayed,
        }
    }

    pub fn stage(&self) -> &Stage {
        self.stage
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn upstreams(&self) -> &[Binding<'a>] {
        &self.upstreams
    }

    pub fn state(&self) -> BindingState {
        self.state
    }

    /// The live node's wiring reference, once playing.
    pub fn node_id(&self) -> Option<NodeId> {
        self.node.as_ref().map(NodeHandle::id)
    }

    /// Bindings in this subtree, self included.
    pub fn node_count(&self) -> usize {
        1 + self
            .upstreams
            .iter()
            .map(Binding::node_count)
            .sum::<usize>()
    }

    /// Instantiate and wire the whole subtree in one depth-first pass.
    ///
    /// Presses this stage's node, connects it into `destination` (many
    /// siblings may fan in to the same destination), then plays every
    /// upstream binding with this node as its destination and the same
    /// `at` - so every node in the tree shares one scheduled start
    /// instant. Returns the node's id for further upward wiring.
    pub fn play(
        &mut self,
        engine: &mut dyn AudioEngine,
        destination: NodeId,
        at: f64,
    ) -> Result<NodeId, PatchError> {
        if self.state != BindingState::Unplayed {
            return Err(PatchError::NotPlayable { state: self.state });
        }

        let node = self.stage.press(engine, at, self.frequency);
        engine.connect(&node, destination);

        let id = node.id();
        self.node = Some(node);
        self.state = BindingState::Playing;

        for upstream in &mut self.upstreams {
            upstream.play(engine, id, at)?;
        }

        Ok(id)
    }

    /// Begin the subtree's decay and schedule every node's stop.
    ///
    /// Two passes. The first asks each node when its own sound will have
    /// fully decayed (envelopes start their down-ramp here) and folds the
    /// answers with max. The second tells every node in the subtree to
    /// stop at that single latest instant - quick decayers wait for slow
    /// ones, which trades early teardown for the guarantee that nothing
    /// is cut off while a sibling is still audibly ramping down. Returns
    /// the shared stop time.
    pub fn release(&mut self, engine: &mut dyn AudioEngine) -> Result<f64, PatchError> {
        if self.state != BindingState::Playing {
            return Err(PatchError::NotReleasable { state: self.state });
        }

        let stop_at = self.schedule_release(engine);
        self.stop(engine, stop_at);
        Ok(stop_at)
    }

    fn schedule_release(&mut self, engine: &mut dyn AudioEngine) -> f64 {
        let mut stop_at = match &self.node {
            Some(node) => self.stage.release(engine, node),
            None => engine.now(),
        };

        for upstream in &mut self.upstreams {
            stop_at = stop_at.max(upstream.schedule_release(engine));
        }

        stop_at
    }

    /// Schedule a stop at `at` on this node and every descendant's.
    ///
    /// Not every node kind can stop (gain and filter nodes just exist),
    /// and a node may already have been stopped; both cases are skipped
    /// so one uniform pass can sweep a heterogeneous tree. Calling this
    /// twice is harmless.
    pub fn stop(&mut self, engine: &mut dyn AudioEngine, at: f64) {
        if let Some(node) = &self.node {
            if engine.can_stop(node) {
                if let Err(err) = engine.stop(node, at) {
                    log::debug!("ignoring stop on node {:?}: {err}", node.id());
                }
            }
        }

        self.state = BindingState::Released;
        for upstream in &mut self.upstreams {
            upstream.stop(engine, at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{offline::OfflineEngine, Waveform};

    fn layered_patch() -> Stage {
        Stage::gain(
            0.8,
            vec![
                Stage::envelope(0.01, 0.1, 0.7, 0.2, vec![Stage::wave(Waveform::Sine)]),
                Stage::noise(),
            ],
        )
    }

    fn assert_same_shape(stage: &Stage, binding: &Binding<'_>, frequency: f32) {
        assert_eq!(binding.frequency(), frequency);
        assert_eq!(binding.stage().kind(), stage.kind());
        assert_eq!(binding.upstreams().len(), stage.upstreams().len());
        for (upstream_stage, upstream_binding) in
            stage.upstreams().iter().zip(binding.upstreams())
        {
            assert_same_shape(upstream_stage, upstream_binding, frequency);
        }
    }

    #[test]
    fn bind_produces_an_isomorphic_tree() {
        let patch = layered_patch();
        let binding = patch.bind(261.6);

        assert_same_shape(&patch, &binding, 261.6);
        assert_eq!(binding.node_count(), 4);
        assert_eq!(binding.state(), BindingState::Unplayed);
        assert!(binding.node_id().is_none());
    }

    #[test]
    fn binding_twice_yields_independent_trees() {
        let patch = layered_patch();
        let mut engine = OfflineEngine::new(48_000.0);
        let destination = engine.destination();

        let mut first = patch.bind(220.0);
        let mut second = patch.bind(330.0);
        first.play(&mut engine, destination, 0.0).unwrap();
        second.play(&mut engine, destination, 0.0).unwrap();

        assert_ne!(first.node_id(), second.node_id());
        assert_eq!(engine.nodes().len(), 8);
    }

    #[test]
    fn play_is_rejected_once_consumed() {
        let patch = layered_patch();
        let mut engine = OfflineEngine::new(48_000.0);
        let destination = engine.destination();

        let mut binding = patch.bind(440.0);
        binding.play(&mut engine, destination, 0.0).unwrap();

        let err = binding.play(&mut engine, destination, 1.0).unwrap_err();
        assert!(matches!(
            err,
            PatchError::NotPlayable {
                state: BindingState::Playing
            }
        ));
    }

    #[test]
    fn release_before_play_is_rejected() {
        let patch = layered_patch();
        let mut engine = OfflineEngine::new(48_000.0);

        let mut binding = patch.bind(440.0);
        let err = binding.release(&mut engine).unwrap_err();
        assert!(matches!(
            err,
            PatchError::NotReleasable {
                state: BindingState::Unplayed
            }
        ));
    }

    #[test]
    fn release_twice_is_rejected() {
        let patch = layered_patch();
        let mut engine = OfflineEngine::new(48_000.0);
        let destination = engine.destination();

        let mut binding = patch.bind(440.0);
        binding.play(&mut engine, destination, 0.0).unwrap();
        binding.release(&mut engine).unwrap();

        let err = binding.release(&mut engine).unwrap_err();
        assert!(matches!(
            err,
            PatchError::NotReleasable {
                state: BindingState::Released
            }
        ));
    }

    #[test]
    fn stop_after_release_is_harmless() {
        let patch = layered_patch();
        let mut engine = OfflineEngine::new(48_000.0);
        let destination = engine.destination();

        let mut binding = patch.bind(440.0);
        binding.play(&mut engine, destination, 0.0).unwrap();
        let stop_at = binding.release(&mut engine).unwrap();

        // Second sweep hits already-stopped sources and unstoppable
        // gain/filter nodes alike; none of it raises.
        binding.stop(&mut engine, stop_at + 1.0);
        assert_eq!(binding.state(), BindingState::Released);
    }
}
