//! First-sound unlock helper.
//!
//! Some platforms refuse to open the audio output until a sound has been
//! started from inside a user-interaction handler. [`unlock`] satisfies
//! that policy by playing and immediately releasing a one-node, zero-gain
//! patch: the engine sees a real start command, the listener hears
//! nothing. The whole call is synchronous - no suspension point before
//! the engine's start - which is what lets it run inside the interaction
//! handler where the gate is open.

use crate::{
    engine::{AudioEngine, Waveform},
    error::PatchError,
    stage::Stage,
};

/// Play one inaudible note right now.
pub fn unlock(engine: &mut dyn AudioEngine) -> Result<(), PatchError> {
    let patch = Stage::gain(0.0, vec![Stage::wave(Waveform::Triangle)]);

    let destination = engine.destination();
    let at = engine.now();

    let mut binding = patch.bind(440.0);
    binding.play(engine, destination, at)?;
    binding.release(engine)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::offline::{NodeSpec, OfflineEngine};

    #[test]
    fn plays_and_releases_a_silent_patch() {
        let mut engine = OfflineEngine::new(48_000.0);
        unlock(&mut engine).unwrap();

        // One muted gain, one oscillator, started and stopped at "now".
        assert_eq!(engine.nodes().len(), 2);

        let gain = &engine.nodes()[0];
        assert!(matches!(gain.spec(), NodeSpec::Gain { level } if *level == 0.0));

        let osc = &engine.nodes()[1];
        assert!(matches!(
            osc.spec(),
            NodeSpec::Oscillator {
                waveform: Waveform::Triangle,
                ..
            }
        ));
        assert_eq!(osc.started_at(), Some(0.0));
        assert_eq!(osc.stopped_at(), Some(0.0));
    }
}
