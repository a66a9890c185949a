use std::fmt;

use crate::dsp::{amplify, SineOscillator};

/// Handle to a node inside an [`AudioGraph`](super::AudioGraph).
///
/// Slots are reused after a node is released; the generation makes a stale
/// id fail lookups instead of silently addressing the slot's new occupant.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// The destination node. Present in every graph, never released.
    pub const DESTINATION: NodeId = NodeId {
        index: 0,
        generation: 0,
    };

    pub(crate) fn new(index: usize, generation: u32) -> Self {
        Self {
            index: index as u32,
            generation,
        }
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// What to build when a node is created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeSpec {
    /// Sine oscillator at a fixed frequency (Hz), created idle.
    Oscillator { frequency: f32 },
    /// Gain stage with a linear amplitude factor.
    Gain { amplitude: f32 },
    /// Two-input merger: input 0 becomes the left channel, input 1 the right.
    ChannelMerger,
}

/// Lifecycle of an oscillator. Transitions only move forward.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Created, not yet started. Outputs silence.
    Idle,
    /// Producing sound.
    Running,
    /// Stopped for good. Outputs silence and can never run again.
    Stopped,
}

#[derive(Clone)]
pub struct OscillatorNode {
    frequency: f32,
    state: PlaybackState,
    osc: SineOscillator,
}

impl OscillatorNode {
    fn new(frequency: f32) -> Self {
        Self {
            frequency,
            state: PlaybackState::Idle,
            osc: SineOscillator::new(),
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PlaybackState::Running
    }

    pub(crate) fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
    }

    pub(crate) fn set_state(&mut self, state: PlaybackState) {
        self.state = state;
    }

    pub(crate) fn render(&mut self, out: &mut [f32], sample_rate: f32) {
        if self.is_running() {
            self.osc.render(out, self.frequency, sample_rate);
        } else {
            out.fill(0.0);
        }
    }
}

#[derive(Clone)]
pub struct GainNode {
    /// Target amplitude set from the control side.
    amplitude: f32,
    /// Amplitude reached at the end of the last rendered block.
    current: f32,
}

impl GainNode {
    fn new(amplitude: f32) -> Self {
        Self {
            amplitude,
            current: amplitude,
        }
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub(crate) fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = amplitude;
    }

    pub(crate) fn process(&mut self, block: &mut Block, frames: usize) {
        amplify::apply_gain_ramp(&mut block.left[..frames], self.current, self.amplitude);
        if block.channels == 2 {
            amplify::apply_gain_ramp(&mut block.right[..frames], self.current, self.amplitude);
        }
        self.current = self.amplitude;
    }
}

#[derive(Clone)]
pub enum NodeKind {
    Destination,
    Oscillator(OscillatorNode),
    Gain(GainNode),
    ChannelMerger,
}

impl NodeKind {
    pub(crate) fn from_spec(spec: NodeSpec) -> Self {
        match spec {
            NodeSpec::Oscillator { frequency } => NodeKind::Oscillator(OscillatorNode::new(frequency)),
            NodeSpec::Gain { amplitude } => NodeKind::Gain(GainNode::new(amplitude)),
            NodeSpec::ChannelMerger => NodeKind::ChannelMerger,
        }
    }

    /// Number of input ports.
    pub fn inputs(&self) -> usize {
        match self {
            NodeKind::Destination | NodeKind::Gain(_) => 1,
            NodeKind::Oscillator(_) => 0,
            NodeKind::ChannelMerger => 2,
        }
    }

    /// Whether the node can feed other nodes.
    pub fn has_output(&self) -> bool {
        !matches!(self, NodeKind::Destination)
    }
}

/// Render buffer owned by a node. Mono nodes only use `left`.
#[derive(Clone, Default)]
pub(crate) struct Block {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
    pub channels: usize,
}

impl Block {
    pub fn new(len: usize) -> Self {
        Self {
            left: vec![0.0; len],
            right: vec![0.0; len],
            channels: 1,
        }
    }
}

#[derive(Clone)]
pub(crate) struct Node {
    pub kind: NodeKind,
    pub block: Block,
}
