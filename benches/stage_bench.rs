//! Benchmarks for the stage/binding engine.
//!
//! Run with: cargo bench
//!
//! Triggering is the hot path a player hits per note: bind the tree,
//! play it, release it. The offline engine keeps the measurements about
//! the walks and the schedules, not about any device.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use soundstage::{
    engine::{offline::OfflineEngine, AudioEngine, FilterKind, Waveform},
    stage::{factory, Stage},
};

/// A typical subtractive voice: two detunable oscillators into a lowpass
/// filter, shaped by an envelope, trimmed by a root gain.
fn voice_patch() -> Stage {
    Stage::gain(
        0.8,
        vec![Stage::envelope(
            0.01,
            0.15,
            0.7,
            0.25,
            vec![Stage::filter(
                FilterKind::LowPass,
                1_800.0,
                0.9,
                0.0,
                vec![
                    Stage::wave(Waveform::Sawtooth),
                    Stage::wave(Waveform::Square),
                ],
            )],
        )],
    )
}

fn bench_bind(c: &mut Criterion) {
    let patch = voice_patch();
    c.bench_function("stage/bind", |b| {
        b.iter(|| black_box(patch.bind(black_box(440.0))))
    });
}

fn bench_trigger(c: &mut Criterion) {
    let patch = voice_patch();
    c.bench_function("stage/trigger", |b| {
        b.iter(|| {
            let mut engine = OfflineEngine::new(48_000.0);
            let destination = engine.destination();
            let mut binding = patch.bind(440.0);
            binding.play(&mut engine, destination, 0.0).unwrap();
            binding.release(&mut engine).unwrap()
        })
    });
}

fn bench_description_round_trip(c: &mut Criterion) {
    let patch = voice_patch();
    let json = factory::to_json(&patch).unwrap();
    c.bench_function("description/round_trip", |b| {
        b.iter(|| factory::from_json(black_box(&json)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_bind,
    bench_trigger,
    bench_description_round_trip
);
criterion_main!(benches);
