//! Stage trees: immutable, context-free descriptions of sound patches.
//!
//! A stage describes one processing node plus the upstream stages feeding
//! it - a rooted tree whose leaves are sound sources and whose root is the
//! final output stage. Stages carry no playback state: the same tree can be
//! bound and played any number of times, at different pitches, and every
//! trigger gets its own independent nodes.
//!
//! The six kinds and how they answer a trigger:
//!
//! | kind     | parameters                       | upstreams | uses pitch |
//! |----------|----------------------------------|-----------|------------|
//! | wave     | waveform                         | no        | yes        |
//! | noise    | -                                | no        | no         |
//! | sample   | channel data, frame range        | no        | no         |
//! | gain     | level                            | yes       | no         |
//! | envelope | attack, decay, sustain, release  | yes       | no         |
//! | filter   | response, frequency, Q, gain     | yes       | no         |
//!
//! The bound frequency is threaded through every stage regardless, so a
//! wave sitting below a chain of gain/envelope/filter stages still hears
//! the pitch the tree was triggered at.

/// Attack/decay/sustain envelope over upstream signals.
pub mod envelope;
/// Deserialization of stage descriptions (the kind-tag table).
pub mod factory;
/// Biquad filter over upstream signals.
pub mod filter;
/// Constant scaling of upstream signals.
pub mod gain;
/// Looping white-noise source.
pub mod noise;
/// Sampled-audio source with a frame range.
pub mod sample;
/// Pitched oscillator source.
pub mod wave;

use serde::Serialize;

use crate::{
    binding::Binding,
    engine::{AudioEngine, FilterKind, NodeHandle, Waveform},
};

pub use envelope::EnvelopeStage;
pub use filter::FilterStage;
pub use gain::GainStage;
pub use noise::NoiseStage;
pub use sample::SampleStage;
pub use wave::WaveStage;

/// One stage in a patch tree.
///
/// A closed sum over the six kinds. Serializes to the tagged description
/// format (`{"kind": "wave", "type": "sine"}`, ...); parsing back goes
/// through [`factory::from_value`] so unknown tags fail loudly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Stage {
    Wave(WaveStage),
    Noise(NoiseStage),
    Sample(SampleStage),
    Gain(GainStage),
    Envelope(EnvelopeStage),
    Filter(FilterStage),
}

impl Stage {
    pub fn wave(waveform: Waveform) -> Self {
        Stage::Wave(WaveStage::new(waveform))
    }

    pub fn noise() -> Self {
        Stage::Noise(NoiseStage::new())
    }

    /// A sample stage playing the full extent of `data`.
    pub fn sample(data: Vec<Vec<f32>>) -> Self {
        Stage::Sample(SampleStage::new(data))
    }

    pub fn gain(level: f32, upstreams: Vec<Stage>) -> Self {
        Stage::Gain(GainStage::new(level, upstreams))
    }

    pub fn envelope(
        attack: f32,
        decay: f32,
        sustain: f32,
        release: f32,
        upstreams: Vec<Stage>,
    ) -> Self {
        Stage::Envelope(EnvelopeStage::new(attack, decay, sustain, release, upstreams))
    }

    pub fn filter(
        kind: FilterKind,
        frequency: f32,
        q: f32,
        gain: f32,
        upstreams: Vec<Stage>,
    ) -> Self {
        Stage::Filter(FilterStage::new(kind, frequency, q, gain, upstreams))
    }

    /// The serialization tag for this kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Stage::Wave(_) => "wave",
            Stage::Noise(_) => "noise",
            Stage::Sample(_) => "sample",
            Stage::Gain(_) => "gain",
            Stage::Envelope(_) => "envelope",
            Stage::Filter(_) => "filter",
        }
    }

    /// The stages feeding into this one, in connection order.
    pub fn upstreams(&self) -> &[Stage] {
        match self {
            Stage::Wave(_) | Stage::Noise(_) | Stage::Sample(_) => &[],
            Stage::Gain(stage) => &stage.upstreams,
            Stage::Envelope(stage) => &stage.upstreams,
            Stage::Filter(stage) => &stage.upstreams,
        }
    }

    /// Apply a trigger frequency to the whole tree, producing the
    /// isomorphic binding tree. Pure: no engine is touched until the
    /// binding is played.
    pub fn bind(&self, frequency: f32) -> Binding<'_> {
        Binding::new(self, frequency)
    }

    /// Construct this stage's live node and schedule its start at `at`.
    ///
    /// Exactly one node per stage. `at` is passed down from the trigger
    /// rather than read from the engine, so a whole tree instantiated
    /// one node at a time still shares a single start instant.
    pub fn press(&self, engine: &mut dyn AudioEngine, at: f64, frequency: f32) -> NodeHandle {
        match self {
            Stage::Wave(stage) => stage.press(engine, at, frequency),
            Stage::Noise(stage) => stage.press(engine, at),
            Stage::Sample(stage) => stage.press(engine, at),
            Stage::Gain(stage) => stage.press(engine, at),
            Stage::Envelope(stage) => stage.press(engine, at),
            Stage::Filter(stage) => stage.press(engine),
        }
    }

    /// Begin this node's decay and report when it will be fully silent.
    ///
    /// Every kind except envelope has no natural decay and may be stopped
    /// right away, so its answer is simply "now".
    pub fn release(&self, engine: &mut dyn AudioEngine, node: &NodeHandle) -> f64 {
        match self {
            Stage::Envelope(stage) => stage.release(engine, node),
            _ => engine.now(),
        }
    }
}
