use serde::Serialize;

use crate::{
    engine::{AudioEngine, NodeHandle},
    stage::Stage,
};

/*
Envelope Stage
==============

An envelope is a gain node whose level is automated over the note's life:

  level
    1.0 ┤    ╱╲
        │   ╱  ╲_____________
    S   │  ╱                 ╲
        │ ╱                   ╲
    0.0 ┤╱                     ╲___
        └─┬────┬──────────┬────┬──→ time
          at   +attack    release  +release

Press schedules the attack/decay half as breakpoints relative to the
trigger instant: 0 at `at`, 1.0 at `at`+attack, sustain at
`at`+attack+decay. Sustain then holds indefinitely; there is no scheduled
end until release.

Release is the one non-trivial decay contract in the tree. The note may be
let go mid-attack or mid-decay, so the current level is whatever the ramps
have reached - not 1.0, not sustain. Release reads that actual value,
cancels everything still scheduled, re-anchors at the value it read, and
ramps to zero over the release time. Starting the down-ramp from the real
level is what keeps the takeover click-free.
*/

/// Attack/decay/sustain/release gain contour over upstream signals.
/// Times are seconds, sustain is unit gain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvelopeStage {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    pub upstreams: Vec<Stage>,
}

impl EnvelopeStage {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32, upstreams: Vec<Stage>) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
            upstreams,
        }
    }

    pub fn press(&self, engine: &mut dyn AudioEngine, at: f64) -> NodeHandle {
        let node = engine.create_gain(0.0);

        engine.set_gain_value(&node, 0.0, at);
        engine.ramp_gain_to(&node, 1.0, at + f64::from(self.attack));
        engine.ramp_gain_to(&node, self.sustain, at + f64::from(self.attack + self.decay));

        node
    }

    /// Begin the down-ramp from the level the envelope has actually
    /// reached, and report when it lands on silence.
    pub fn release(&self, engine: &mut dyn AudioEngine, node: &NodeHandle) -> f64 {
        let now = engine.now();
        let current = engine.gain_value(node);

        engine.cancel_scheduled_gain(node, now);
        engine.set_gain_value(node, current, now);

        let silent_at = now + f64::from(self.release);
        engine.ramp_gain_to(node, 0.0, silent_at);
        silent_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::offline::OfflineEngine;

    fn pressed_envelope(engine: &mut OfflineEngine, at: f64) -> (EnvelopeStage, NodeHandle) {
        let stage = EnvelopeStage::new(0.1, 0.2, 0.6, 0.3, vec![]);
        let node = stage.press(engine, at);
        (stage, node)
    }

    #[test]
    fn press_schedules_attack_and_decay_breakpoints() {
        let mut engine = OfflineEngine::new(48_000.0);
        let (_, node) = pressed_envelope(&mut engine, 5.0);

        let automation = engine
            .node(node.id())
            .automation()
            .expect("gain nodes carry automation");

        assert!(automation.value_at(5.0).abs() < 1e-6);
        assert!((automation.value_at(5.1) - 1.0).abs() < 1e-6);
        assert!((automation.value_at(5.3) - 0.6).abs() < 1e-6);
        // Sustain holds with no further events.
        assert!((automation.value_at(60.0) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn release_during_sustain_ramps_from_sustain_level() {
        let mut engine = OfflineEngine::new(48_000.0);
        let (stage, node) = pressed_envelope(&mut engine, 0.0);

        engine.set_now(1.0);
        let silent_at = stage.release(&mut engine, &node);

        assert!((silent_at - 1.3).abs() < 1e-9);
        let automation = engine.node(node.id()).automation().unwrap();
        assert!((automation.value_at(1.0) - 0.6).abs() < 1e-6);
        assert!((automation.value_at(1.15) - 0.3).abs() < 1e-6);
        assert!(automation.value_at(1.3).abs() < 1e-6);
    }

    #[test]
    fn release_mid_attack_starts_from_partial_level() {
        let mut engine = OfflineEngine::new(48_000.0);
        let (stage, node) = pressed_envelope(&mut engine, 0.0);

        engine.set_now(0.05); // halfway up the attack
        let silent_at = stage.release(&mut engine, &node);

        let automation = engine.node(node.id()).automation().unwrap();
        assert!((automation.value_at(0.05) - 0.5).abs() < 1e-6);
        assert!(automation.value_at(silent_at).abs() < 1e-6);
        assert!((silent_at - 0.35).abs() < 1e-9);
    }
}
