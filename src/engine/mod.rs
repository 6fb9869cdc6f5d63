//! Contract between the patch core and an audio engine.
//!
//! The core never touches hardware or a system clock itself. Everything
//! timed or audible goes through an [`AudioEngine`]: node construction,
//! wiring, start/stop scheduling, and gain automation. Engines expose one
//! monotonic time axis (`now`, in seconds) and schedule every event as a
//! future instant on it; nothing here blocks.
//!
//! Node identity is split in two. A [`NodeId`] is a cheap `Copy` reference
//! used for wiring (anything may name a node as a connection target). A
//! [`NodeHandle`] is the owned, non-clonable side: lifecycle operations
//! (`start`, `stop`, parameter scheduling) demand `&NodeHandle`, so only
//! the binding that pressed a node can control it.

/// Non-rendering engine that records every scheduled command.
pub mod offline;
/// cpal-backed engine rendering the node graph on the audio thread.
#[cfg(feature = "realtime")]
pub mod realtime;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Oscillator waveform selection for [`AudioEngine::create_oscillator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// Filter response selection for [`AudioEngine::create_filter`].
///
/// The gain parameter (in dB) only shapes the peaking and shelf responses;
/// the others ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    LowPass,
    HighPass,
    BandPass,
    Notch,
    AllPass,
    Peaking,
    LowShelf,
    HighShelf,
}

/// Copyable wiring reference to an engine node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub const fn from_raw(raw: u64) -> Self {
        NodeId(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Exclusive handle to a live node.
///
/// Deliberately not `Clone`: the handle is created by the engine at
/// construction time, moved into the binding at press time, and dropped
/// when the binding goes away. Whoever holds it is the one authority
/// allowed to start, stop, or automate the node.
#[derive(Debug)]
pub struct NodeHandle {
    id: NodeId,
}

impl NodeHandle {
    pub fn new(id: NodeId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }
}

/// Why a stop command was refused.
///
/// Both variants are benign from the release pass's point of view: a
/// heterogeneous tree is stopped uniformly and nodes that cannot comply
/// are skipped, not treated as failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StopError {
    /// The node kind has no stop operation (gain, filter).
    #[error("node kind cannot be stopped")]
    NotSupported,
    /// The node had already been stopped.
    #[error("node is not in a stoppable state")]
    InvalidState,
}

/// The collaborator every press/play/release walk runs against.
///
/// Engines own the platform side: node internals, the render clock, and
/// the connection graph. The trait is object-safe so the core can be
/// driven through `&mut dyn AudioEngine` regardless of the backend.
pub trait AudioEngine {
    /// Fixed output sample rate in Hz.
    fn sample_rate(&self) -> f32;

    /// Current engine time in seconds. Monotonic, starts near zero.
    fn now(&self) -> f64;

    /// The terminal mix node; playing a patch connects its root here.
    fn destination(&self) -> NodeId;

    fn create_oscillator(&mut self, waveform: Waveform, frequency: f32) -> NodeHandle;

    /// One buffer-playback node over the given per-channel frames.
    fn create_buffer(&mut self, channels: Vec<Vec<f32>>, looping: bool) -> NodeHandle;

    fn create_gain(&mut self, level: f32) -> NodeHandle;

    fn create_filter(&mut self, kind: FilterKind, frequency: f32, q: f32, gain: f32)
        -> NodeHandle;

    /// Feed `source`'s output into `destination`. Many sources may fan in
    /// to one destination; their signals sum.
    fn connect(&mut self, source: &NodeHandle, destination: NodeId);

    /// Schedule the node to begin producing sound at `at`.
    fn start(&mut self, node: &NodeHandle, at: f64);

    /// Whether the node kind supports a stop operation at all.
    fn can_stop(&self, node: &NodeHandle) -> bool;

    /// Schedule the node to go silent at `at`. Once submitted a stop
    /// cannot be revoked.
    fn stop(&mut self, node: &NodeHandle, at: f64) -> Result<(), StopError>;

    /// Pin the node's gain parameter to `value` at time `at`.
    fn set_gain_value(&mut self, node: &NodeHandle, value: f32, at: f64);

    /// Ramp the gain parameter linearly from the previous scheduled event
    /// to `value`, arriving at time `at`.
    fn ramp_gain_to(&mut self, node: &NodeHandle, value: f32, at: f64);

    /// Drop every scheduled gain event at or after `from`.
    fn cancel_scheduled_gain(&mut self, node: &NodeHandle, from: f64);

    /// Current gain parameter value, interpolated if a ramp is in flight.
    /// Nodes without a gain parameter report unity.
    fn gain_value(&self, node: &NodeHandle) -> f32;
}
