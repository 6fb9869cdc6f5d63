//! End-to-end protocol tests: bind, play, release against the offline
//! engine, checking the schedules the core hands an engine rather than
//! any rendered audio.

use soundstage::{
    engine::{
        offline::{NodeSpec, OfflineEngine},
        AudioEngine, FilterKind, Waveform,
    },
    stage::Stage,
    unlock::unlock,
};

#[test]
fn muted_wave_patch_creates_two_nodes_sharing_one_stop() {
    let patch = Stage::gain(0.0, vec![Stage::wave(Waveform::Triangle)]);
    let mut engine = OfflineEngine::new(48_000.0);
    let destination = engine.destination();

    let mut binding = patch.bind(440.0);
    let root = binding.play(&mut engine, destination, 0.0).unwrap();

    // Exactly two nodes: the muted gain and its oscillator.
    assert_eq!(engine.nodes().len(), 2);

    let gain = engine.node(root);
    assert!(matches!(gain.spec(), NodeSpec::Gain { level } if *level == 0.0));
    assert_eq!(gain.connected_to(), [destination]);
    assert_eq!(gain.started_at(), None);

    let osc = &engine.nodes()[1];
    match osc.spec() {
        NodeSpec::Oscillator {
            waveform,
            frequency,
        } => {
            assert_eq!(*waveform, Waveform::Triangle);
            assert_eq!(*frequency, 440.0);
        }
        other => panic!("expected an oscillator, got {other:?}"),
    }
    assert_eq!(osc.connected_to(), [root]);
    assert_eq!(osc.started_at(), Some(0.0));

    // A wave releases "now", so the 2-node maximum is that same instant.
    let stop_at = binding.release(&mut engine).unwrap();
    assert_eq!(stop_at, 0.0);
    assert_eq!(engine.nodes()[1].stopped_at(), Some(0.0));
    // The gain node has no stop operation; the sweep skips it.
    assert_eq!(engine.nodes()[0].stopped_at(), None);
}

#[test]
fn envelope_released_mid_decay_reanchors_and_stops_the_subtree() {
    let patch = Stage::envelope(0.1, 0.2, 0.6, 0.3, vec![Stage::wave(Waveform::Sine)]);
    let mut engine = OfflineEngine::new(48_000.0);
    let destination = engine.destination();

    let mut binding = patch.bind(220.0);
    let root = binding.play(&mut engine, destination, 5.0).unwrap();

    // Attack/decay breakpoints: 0 @ 5, 1.0 @ 5.1, 0.6 @ 5.3.
    let automation = engine.node(root).automation().unwrap();
    assert!(automation.value_at(5.0).abs() < 1e-6);
    assert!((automation.value_at(5.1) - 1.0).abs() < 1e-6);
    assert!((automation.value_at(5.3) - 0.6).abs() < 1e-6);

    // Let go mid-decay, where the level is 0.9.
    engine.set_now(5.15);
    let stop_at = binding.release(&mut engine).unwrap();
    assert!((stop_at - 5.45).abs() < 1e-9);

    let automation = engine.node(root).automation().unwrap();
    assert!((automation.value_at(5.15) - 0.9).abs() < 1e-6);
    assert!((automation.value_at(5.3) - 0.45).abs() < 1e-6);
    assert!(automation.value_at(5.45).abs() < 1e-6);

    // The oscillator under the envelope waits for the ramp to land.
    let osc = &engine.nodes()[1];
    assert_eq!(osc.stopped_at(), Some(stop_at));
}

#[test]
fn release_stops_every_node_at_the_subtree_maximum() {
    // A fast branch (bare noise) and a slow branch (long envelope) under
    // one gain root.
    let patch = Stage::gain(
        0.5,
        vec![
            Stage::envelope(0.01, 0.05, 0.8, 0.5, vec![Stage::wave(Waveform::Sawtooth)]),
            Stage::noise(),
        ],
    );
    let mut engine = OfflineEngine::new(44_100.0);
    let destination = engine.destination();

    let mut binding = patch.bind(110.0);
    binding.play(&mut engine, destination, 0.0).unwrap();

    engine.set_now(1.0);
    let stop_at = binding.release(&mut engine).unwrap();
    assert!((stop_at - 1.5).abs() < 1e-9);

    // Every stoppable node in the tree gets the same late stop, the
    // immediately-releasable noise source included.
    for node in engine.nodes() {
        match node.spec() {
            NodeSpec::Oscillator { .. } | NodeSpec::Buffer { .. } => {
                assert_eq!(node.stopped_at(), Some(stop_at));
            }
            _ => assert_eq!(node.stopped_at(), None),
        }
    }
}

#[test]
fn every_node_in_a_tree_shares_the_play_instant() {
    let patch = Stage::filter(
        FilterKind::LowPass,
        900.0,
        0.7,
        0.0,
        vec![
            Stage::envelope(0.01, 0.1, 0.7, 0.2, vec![Stage::wave(Waveform::Square)]),
            Stage::noise(),
            Stage::sample(vec![vec![0.25, -0.25]]),
        ],
    );
    let mut engine = OfflineEngine::new(48_000.0);
    let destination = engine.destination();

    let mut binding = patch.bind(330.0);
    binding.play(&mut engine, destination, 2.5).unwrap();

    for node in engine.nodes() {
        match node.spec() {
            // Sources and envelopes schedule against the shared instant.
            NodeSpec::Oscillator { .. } | NodeSpec::Buffer { .. } => {
                assert_eq!(node.started_at(), Some(2.5));
            }
            NodeSpec::Gain { .. } | NodeSpec::Filter { .. } => {
                assert_eq!(node.started_at(), None);
            }
        }
    }
}

#[test]
fn noise_presses_a_long_looping_buffer() {
    let patch = Stage::noise();
    let mut engine = OfflineEngine::new(8_000.0);
    let destination = engine.destination();

    let mut binding = patch.bind(440.0);
    let root = binding.play(&mut engine, destination, 0.0).unwrap();

    match engine.node(root).spec() {
        NodeSpec::Buffer { channels, looping } => {
            assert!(*looping);
            assert_eq!(channels.len(), 1);
            // At least two seconds of audio at the engine's rate.
            assert!(channels[0].len() >= 16_000);
            assert!(channels[0].iter().all(|s| s.abs() <= 1.0));
            // White noise, not silence.
            assert!(channels[0].iter().any(|s| s.abs() > 0.1));
        }
        other => panic!("expected a buffer, got {other:?}"),
    }
}

#[test]
fn sample_press_copies_only_the_selected_range() {
    let data = vec![
        vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5],
        vec![1.0, 0.9, 0.8], // shorter channel
    ];
    let patch = Stage::Sample(soundstage::stage::SampleStage::with_range(
        data,
        Some(1),
        Some(5),
    ));
    let mut engine = OfflineEngine::new(48_000.0);
    let destination = engine.destination();

    let mut binding = patch.bind(440.0);
    let root = binding.play(&mut engine, destination, 0.25).unwrap();

    match engine.node(root).spec() {
        NodeSpec::Buffer { channels, looping } => {
            assert!(!*looping);
            assert_eq!(channels[0], vec![0.1, 0.2, 0.3, 0.4]);
            // The short channel clamps the range to what it holds.
            assert_eq!(channels[1], vec![0.9, 0.8]);
        }
        other => panic!("expected a buffer, got {other:?}"),
    }
    assert_eq!(engine.node(root).started_at(), Some(0.25));
}

#[test]
fn stop_tolerates_unstoppable_and_already_stopped_nodes() {
    let patch = Stage::gain(0.7, vec![Stage::noise()]);
    let mut engine = OfflineEngine::new(48_000.0);
    let destination = engine.destination();

    let mut binding = patch.bind(440.0);
    binding.play(&mut engine, destination, 0.0).unwrap();
    let stop_at = binding.release(&mut engine).unwrap();

    // Sweep again: the noise buffer is already stopped, the gain was
    // never stoppable. Neither raises.
    binding.stop(&mut engine, stop_at + 2.0);
    binding.stop(&mut engine, stop_at + 3.0);

    // The first scheduled stop stands; later sweeps cannot revoke it.
    assert_eq!(engine.nodes()[1].stopped_at(), Some(stop_at));
}

#[test]
fn unlock_opens_the_gate_without_audible_output() {
    let mut engine = OfflineEngine::new(48_000.0);
    unlock(&mut engine).unwrap();

    assert_eq!(engine.nodes().len(), 2);
    assert!(matches!(
        engine.nodes()[0].spec(),
        NodeSpec::Gain { level } if *level == 0.0
    ));
    // The oscillator really started - that is what opens the gate.
    assert_eq!(engine.nodes()[1].started_at(), Some(0.0));
    assert_eq!(engine.nodes()[1].stopped_at(), Some(0.0));
}
