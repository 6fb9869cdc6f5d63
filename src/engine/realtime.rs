//! cpal-backed engine rendering the node graph on the audio thread.
//!
//! Two halves, one per thread. The control half implements [`AudioEngine`]:
//! it allocates node ids, keeps a little per-node bookkeeping (stoppability,
//! a shadow automation timeline for gain readback) and ships every
//! construction and scheduling command over a lock-free ring buffer. The
//! render half lives inside the cpal output callback: it drains the command
//! queue, holds the actual node graph, and pulls blocks from the master mix
//! node depth-first, each source summing into its destination.
//!
//! The clock is a frame counter bumped by the render thread after every
//! block; `now()` divides it by the sample rate. Scheduled events compare
//! against per-sample times derived from the same counter, so control-side
//! times and render-side times share one axis.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use biquad::{Biquad, Coefficients, DirectForm1, ToHertz, Type};
use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    SampleFormat,
};
use rtrb::{Consumer, Producer, RingBuffer};
use thiserror::Error;

use crate::{
    dsp::{automation::Timeline, oscillator::Oscillator},
    MAX_BLOCK_SIZE,
};

use super::{AudioEngine, FilterKind, NodeHandle, NodeId, StopError, Waveform};

/// The master mix node every patch ultimately connects into.
const MASTER: NodeId = NodeId::from_raw(0);

const COMMAND_QUEUE_SIZE: usize = 1024;

/// Construction and scheduling traffic, control thread to render thread.
enum Command {
    CreateOscillator {
        id: NodeId,
        waveform: Waveform,
        frequency: f32,
    },
    CreateBuffer {
        id: NodeId,
        channels: Vec<Vec<f32>>,
        looping: bool,
    },
    CreateGain {
        id: NodeId,
        level: f32,
    },
    CreateFilter {
        id: NodeId,
        kind: FilterKind,
        frequency: f32,
        q: f32,
        gain: f32,
    },
    Connect {
        source: NodeId,
        destination: NodeId,
    },
    Start {
        id: NodeId,
        at: f64,
    },
    Stop {
        id: NodeId,
        at: f64,
    },
    SetGain {
        id: NodeId,
        value: f32,
        at: f64,
    },
    RampGain {
        id: NodeId,
        value: f32,
        at: f64,
    },
    CancelGain {
        id: NodeId,
        from: f64,
    },
}

/// Ways bringing the output device up can fail.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no default audio output device")]
    NoOutputDevice,
    #[error("querying default stream config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),
    #[error("building output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error("starting output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
    #[error("unsupported output sample format {0:?}")]
    UnsupportedFormat(SampleFormat),
}

/// Control-side bookkeeping for one node.
struct ControlNode {
    stoppable: bool,
    stopped: bool,
    automation: Option<Timeline>,
}

/// An [`AudioEngine`] that renders for real through the default cpal
/// output device.
pub struct RealtimeEngine {
    sample_rate: f32,
    next_id: u64,
    commands: Producer<Command>,
    frames_done: Arc<AtomicU64>,
    meta: HashMap<NodeId, ControlNode>,
    _stream: cpal::Stream,
}

impl RealtimeEngine {
    /// Open the default output device and start rendering silence.
    pub fn new() -> Result<Self, EngineError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(EngineError::NoOutputDevice)?;
        let supported = device.default_output_config()?;

        let sample_format = supported.sample_format();
        if sample_format != SampleFormat::F32 {
            return Err(EngineError::UnsupportedFormat(sample_format));
        }

        let config = supported.config();
        let sample_rate = config.sample_rate.0 as f32;
        let channels = config.channels as usize;

        let (commands, receiver) = RingBuffer::<Command>::new(COMMAND_QUEUE_SIZE);
        let frames_done = Arc::new(AtomicU64::new(0));
        let mut renderer = Renderer::new(sample_rate, receiver, Arc::clone(&frames_done));

        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                renderer.render(data, channels);
            },
            |err| log::error!("output stream error: {err}"),
            None,
        )?;
        stream.play()?;
        log::info!("realtime engine up: {sample_rate} Hz, {channels} channel(s)");

        Ok(Self {
            sample_rate,
            next_id: 0,
            commands,
            frames_done,
            meta: HashMap::new(),
            _stream: stream,
        })
    }

    fn allocate(&mut self, stoppable: bool, automation: Option<Timeline>) -> NodeHandle {
        self.next_id += 1;
        let id = NodeId::from_raw(self.next_id);
        self.meta.insert(
            id,
            ControlNode {
                stoppable,
                stopped: false,
                automation,
            },
        );
        NodeHandle::new(id)
    }

    fn send(&mut self, command: Command) {
        if self.commands.push(command).is_err() {
            log::warn!("engine command queue is full; dropping command");
        }
    }
}

impl AudioEngine for RealtimeEngine {
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn now(&self) -> f64 {
        let frames = self.frames_done.load(Ordering::Acquire);
        frames as f64 / self.sample_rate as f64
    }

    fn destination(&self) -> NodeId {
        MASTER
    }

    fn create_oscillator(&mut self, waveform: Waveform, frequency: f32) -> NodeHandle {
        let node = self.allocate(true, None);
        self.send(Command::CreateOscillator {
            id: node.id(),
            waveform,
            frequency,
        });
        node
    }

    fn create_buffer(&mut self, channels: Vec<Vec<f32>>, looping: bool) -> NodeHandle {
        let node = self.allocate(true, None);
        self.send(Command::CreateBuffer {
            id: node.id(),
            channels,
            looping,
        });
        node
    }

    fn create_gain(&mut self, level: f32) -> NodeHandle {
        let node = self.allocate(false, Some(Timeline::new(level)));
        self.send(Command::CreateGain {
            id: node.id(),
            level,
        });
        node
    }

    fn create_filter(
        &mut self,
        kind: FilterKind,
        frequency: f32,
        q: f32,
        gain: f32,
    ) -> NodeHandle {
        let node = self.allocate(false, None);
        self.send(Command::CreateFilter {
            id: node.id(),
            kind,
            frequency,
            q,
            gain,
        });
        node
    }

    fn connect(&mut self, source: &NodeHandle, destination: NodeId) {
        self.send(Command::Connect {
            source: source.id(),
            destination,
        });
    }

    fn start(&mut self, node: &NodeHandle, at: f64) {
        self.send(Command::Start { id: node.id(), at });
    }

    fn can_stop(&self, node: &NodeHandle) -> bool {
        self.meta
            .get(&node.id())
            .is_some_and(|meta| meta.stoppable)
    }

    fn stop(&mut self, node: &NodeHandle, at: f64) -> Result<(), StopError> {
        let Some(meta) = self.meta.get_mut(&node.id()) else {
            return Err(StopError::InvalidState);
        };
        if !meta.stoppable {
            return Err(StopError::NotSupported);
        }
        if meta.stopped {
            return Err(StopError::InvalidState);
        }
        meta.stopped = true;

        self.send(Command::Stop { id: node.id(), at });
        Ok(())
    }

    fn set_gain_value(&mut self, node: &NodeHandle, value: f32, at: f64) {
        if let Some(timeline) = self
            .meta
            .get_mut(&node.id())
            .and_then(|meta| meta.automation.as_mut())
        {
            timeline.set_value(value, at);
        }
        self.send(Command::SetGain {
            id: node.id(),
            value,
            at,
        });
    }

    fn ramp_gain_to(&mut self, node: &NodeHandle, value: f32, at: f64) {
        if let Some(timeline) = self
            .meta
            .get_mut(&node.id())
            .and_then(|meta| meta.automation.as_mut())
        {
            timeline.ramp_to(value, at);
        }
        self.send(Command::RampGain {
            id: node.id(),
            value,
            at,
        });
    }

    fn cancel_scheduled_gain(&mut self, node: &NodeHandle, from: f64) {
        if let Some(timeline) = self
            .meta
            .get_mut(&node.id())
            .and_then(|meta| meta.automation.as_mut())
        {
            timeline.cancel_from(from);
        }
        self.send(Command::CancelGain {
            id: node.id(),
            from,
        });
    }

    fn gain_value(&self, node: &NodeHandle) -> f32 {
        match self
            .meta
            .get(&node.id())
            .and_then(|meta| meta.automation.as_ref())
        {
            Some(timeline) => timeline.value_at(self.now()),
            None => 1.0,
        }
    }
}

/// Kind-specific render state for one node.
enum RenderKind {
    Master,
    Oscillator(Oscillator),
    Buffer {
        channels: Vec<Vec<f32>>,
        looping: bool,
    },
    Gain {
        automation: Timeline,
    },
    Filter {
        filter: DirectForm1<f32>,
    },
}

struct RenderNode {
    kind: RenderKind,
    inputs: Vec<NodeId>,
    started_at: Option<f64>,
    stopped_at: Option<f64>,
    buffer: Vec<f32>,
    rendered_block: u64,
}

impl RenderNode {
    fn new(kind: RenderKind) -> Self {
        Self {
            kind,
            inputs: Vec::new(),
            started_at: None,
            stopped_at: None,
            buffer: vec![0.0; MAX_BLOCK_SIZE],
            rendered_block: 0,
        }
    }
}

/// The render-thread half: node graph, command drain, block pull.
struct Renderer {
    sample_rate: f32,
    nodes: HashMap<NodeId, RenderNode>,
    commands: Consumer<Command>,
    frames_done: Arc<AtomicU64>,
    block: u64,
    block_start: u64,
}

impl Renderer {
    fn new(sample_rate: f32, commands: Consumer<Command>, frames_done: Arc<AtomicU64>) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(MASTER, RenderNode::new(RenderKind::Master));

        Self {
            sample_rate,
            nodes,
            commands,
            frames_done,
            block: 0,
            block_start: 0,
        }
    }

    fn render(&mut self, data: &mut [f32], channels: usize) {
        self.drain_commands();

        let channels = channels.max(1);
        for chunk in data.chunks_mut(channels * MAX_BLOCK_SIZE) {
            let frames = chunk.len() / channels;

            self.block += 1;
            self.block_start = self.frames_done.load(Ordering::Relaxed);
            self.render_node(MASTER, frames);

            if let Some(master) = self.nodes.get(&MASTER) {
                for (frame, slots) in chunk.chunks_mut(channels).enumerate() {
                    let sample = master.buffer[frame];
                    for slot in slots.iter_mut() {
                        *slot = sample;
                    }
                }
            }

            self.frames_done.fetch_add(frames as u64, Ordering::Release);
        }
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.pop() {
            match command {
                Command::CreateOscillator {
                    id,
                    waveform,
                    frequency,
                } => {
                    let osc = Oscillator::new(waveform, frequency);
                    self.nodes
                        .insert(id, RenderNode::new(RenderKind::Oscillator(osc)));
                }
                Command::CreateBuffer {
                    id,
                    channels,
                    looping,
                } => {
                    self.nodes
                        .insert(id, RenderNode::new(RenderKind::Buffer { channels, looping }));
                }
                Command::CreateGain { id, level } => {
                    self.nodes.insert(
                        id,
                        RenderNode::new(RenderKind::Gain {
                            automation: Timeline::new(level),
                        }),
                    );
                }
                Command::CreateFilter {
                    id,
                    kind,
                    frequency,
                    q,
                    gain,
                } => {
                    let coefficients =
                        filter_coefficients(kind, frequency, q, gain, self.sample_rate);
                    self.nodes.insert(
                        id,
                        RenderNode::new(RenderKind::Filter {
                            filter: DirectForm1::<f32>::new(coefficients),
                        }),
                    );
                }
                Command::Connect {
                    source,
                    destination,
                } => {
                    if let Some(node) = self.nodes.get_mut(&destination) {
                        node.inputs.push(source);
                    }
                }
                Command::Start { id, at } => {
                    if let Some(node) = self.nodes.get_mut(&id) {
                        node.started_at = Some(at);
                    }
                }
                Command::Stop { id, at } => {
                    if let Some(node) = self.nodes.get_mut(&id) {
                        node.stopped_at = Some(at);
                    }
                }
                Command::SetGain { id, value, at } => {
                    if let Some(RenderKind::Gain { automation }) =
                        self.nodes.get_mut(&id).map(|node| &mut node.kind)
                    {
                        automation.set_value(value, at);
                    }
                }
                Command::RampGain { id, value, at } => {
                    if let Some(RenderKind::Gain { automation }) =
                        self.nodes.get_mut(&id).map(|node| &mut node.kind)
                    {
                        automation.ramp_to(value, at);
                    }
                }
                Command::CancelGain { id, from } => {
                    if let Some(RenderKind::Gain { automation }) =
                        self.nodes.get_mut(&id).map(|node| &mut node.kind)
                    {
                        automation.cancel_from(from);
                    }
                }
            }
        }
    }

    /// Pull one block out of `id`, rendering its inputs first.
    ///
    /// The node is lifted out of the map while its inputs render (the
    /// graph is a tree, so a node never appears among its own inputs).
    /// A per-block stamp makes fan-out re-entry a no-op.
    fn render_node(&mut self, id: NodeId, frames: usize) {
        let mut node = match self.nodes.remove(&id) {
            Some(node) => node,
            None => return,
        };
        if node.rendered_block == self.block {
            self.nodes.insert(id, node);
            return;
        }
        node.rendered_block = self.block;

        // Fan-in: sum every input's block.
        node.buffer[..frames].fill(0.0);
        for index in 0..node.inputs.len() {
            let input = node.inputs[index];
            self.render_node(input, frames);
            if let Some(source) = self.nodes.get(&input) {
                for i in 0..frames {
                    node.buffer[i] += source.buffer[i];
                }
            }
        }

        let sample_rate = self.sample_rate;
        let started = node.started_at;
        let stopped = node.stopped_at;
        let active = |t: f64| {
            started.is_some_and(|s| t >= s) && stopped.map_or(true, |s| t < s)
        };

        match &mut node.kind {
            RenderKind::Master => {}
            RenderKind::Oscillator(osc) => {
                for i in 0..frames {
                    let t = self.frame_time(i);
                    node.buffer[i] = if active(t) {
                        osc.next_sample(sample_rate)
                    } else {
                        0.0
                    };
                }
            }
            RenderKind::Buffer { channels, looping } => {
                for i in 0..frames {
                    let t = self.frame_time(i);
                    node.buffer[i] = match started {
                        Some(start) if active(t) => {
                            let frame = ((t - start) * sample_rate as f64) as usize;
                            mix_channels(channels, frame, *looping)
                        }
                        _ => 0.0,
                    };
                }
            }
            RenderKind::Gain { automation } => {
                for i in 0..frames {
                    let t = self.frame_time(i);
                    node.buffer[i] *= automation.value_at(t);
                }
            }
            RenderKind::Filter { filter } => {
                for i in 0..frames {
                    node.buffer[i] = filter.run(node.buffer[i]);
                }
            }
        }

        self.nodes.insert(id, node);
    }

    fn frame_time(&self, frame: usize) -> f64 {
        (self.block_start + frame as u64) as f64 / self.sample_rate as f64
    }
}

/// Mono mixdown of one buffer frame across its channels.
fn mix_channels(channels: &[Vec<f32>], frame: usize, looping: bool) -> f32 {
    if channels.is_empty() {
        return 0.0;
    }

    let mut sum = 0.0;
    for channel in channels {
        if channel.is_empty() {
            continue;
        }
        let sample = if looping {
            Some(channel[frame % channel.len()])
        } else {
            channel.get(frame).copied()
        };
        if let Some(sample) = sample {
            sum += sample;
        }
    }
    sum / channels.len() as f32
}

fn filter_coefficients(
    kind: FilterKind,
    frequency: f32,
    q: f32,
    gain: f32,
    sample_rate: f32,
) -> Coefficients<f32> {
    // Keep the parameters inside what the coefficient math accepts.
    let nyquist = sample_rate * 0.5;
    let f0 = frequency.clamp(1.0, nyquist * 0.999);
    let q = q.max(0.001);

    let response = match kind {
        FilterKind::LowPass => Type::LowPass,
        FilterKind::HighPass => Type::HighPass,
        FilterKind::BandPass => Type::BandPass,
        FilterKind::Notch => Type::Notch,
        FilterKind::AllPass => Type::AllPass,
        FilterKind::Peaking => Type::PeakingEQ(gain),
        FilterKind::LowShelf => Type::LowShelf(gain),
        FilterKind::HighShelf => Type::HighShelf(gain),
    };

    match Coefficients::<f32>::from_params(response, sample_rate.hz(), f0.hz(), q) {
        Ok(coefficients) => coefficients,
        Err(err) => {
            log::warn!("filter parameters rejected ({err:?}); falling back to passthrough");
            Coefficients {
                a1: 0.0,
                a2: 0.0,
                b0: 1.0,
                b1: 0.0,
                b2: 0.0,
            }
        }
    }
}
