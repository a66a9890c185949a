//! A small node graph in the shape of the Web Audio API.
//!
//! The same [`AudioGraph`] type plays two roles:
//!
//! - on the control thread it is a *mirror* that validates every command and
//!   answers questions about the current topology;
//! - on the render thread it applies the validated commands and renders
//!   blocks, pulling from the destination backwards.
//!
//! Both copies receive the same command sequence, so they never disagree.

/// Commands that mutate the graph.
pub mod command;
/// Node ids, kinds and per-node state.
pub mod node;

use thiserror::Error;

use crate::dsp::mix;

pub use command::{CommandReceiver, GraphCommand};
pub use node::{GainNode, NodeId, NodeKind, NodeSpec, OscillatorNode, PlaybackState};

use node::{Block, Node};

/// Nodes pre-allocated for rendering. The binaural graph needs five at most;
/// the rest absorbs slack between a stop and the slots being reused.
const DEFAULT_NODE_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("no node {0} in the graph")]
    UnknownNode(NodeId),
    #[error("slot for node {0} is already taken")]
    SlotTaken(NodeId),
    #[error("node {node} has no input {input}")]
    NoSuchInput { node: NodeId, input: usize },
    #[error("node {0} has no output")]
    NoOutput(NodeId),
    #[error("connecting {from} to {to} would create a cycle")]
    Cycle { from: NodeId, to: NodeId },
    #[error("node {0} is not an oscillator")]
    NotAnOscillator(NodeId),
    #[error("node {0} is not a gain stage")]
    NotAGain(NodeId),
    #[error("oscillator {0} can only be started once")]
    AlreadyStarted(NodeId),
    #[error("oscillator {0} is not running")]
    NotRunning(NodeId),
    #[error("invalid parameter value for node {0}")]
    InvalidValue(NodeId),
    #[error("the destination cannot be released")]
    ProtectedDestination,
    #[error("the graph is closed")]
    Closed,
}

/// Directed edge from a node's output to one input of another node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub from: NodeId,
    pub to: NodeId,
    pub input: usize,
}

/// How a node's inputs are gathered before it processes a block.
#[derive(Clone, Copy)]
enum Stage {
    Source,
    Merge,
    Sum,
    Sink,
}

impl Stage {
    fn of(kind: &NodeKind) -> Self {
        match kind {
            NodeKind::Oscillator(_) => Stage::Source,
            NodeKind::ChannelMerger => Stage::Merge,
            NodeKind::Gain(_) => Stage::Sum,
            NodeKind::Destination => Stage::Sink,
        }
    }
}

#[derive(Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
    /// Epoch of the last render pass that visited this slot.
    mark: u64,
}

/// Clones are how a context snapshots its mirror before a batch.
#[derive(Clone)]
pub struct AudioGraph {
    sample_rate: f32,
    slots: Vec<Slot>,
    connections: Vec<Connection>,
    /// Render buffer length; zero for a control-side mirror.
    block_len: usize,
    spare_blocks: Vec<Block>,
    order: Vec<usize>,
    stack: Vec<(usize, bool)>,
    /// Scratch for cycle checks, so a render-side `Connect` never allocates.
    search: Vec<NodeId>,
    seen: Vec<NodeId>,
    epoch: u64,
    closed: bool,
}

impl AudioGraph {
    /// A control-side mirror. It validates commands but cannot render.
    pub fn new(sample_rate: f32) -> Self {
        Self::build(sample_rate, 0, 0)
    }

    /// A render-side graph with buffers for blocks of up to `block_len` frames.
    pub fn for_rendering(sample_rate: f32, block_len: usize) -> Self {
        Self::build(sample_rate, block_len, DEFAULT_NODE_CAPACITY)
    }

    fn build(sample_rate: f32, block_len: usize, capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity.max(1));
        slots.push(Slot {
            generation: 0,
            node: Some(Node {
                kind: NodeKind::Destination,
                block: Block::new(block_len),
            }),
            mark: 0,
        });

        Self {
            sample_rate,
            slots,
            connections: Vec::with_capacity(capacity * 2),
            block_len,
            spare_blocks: (0..capacity).map(|_| Block::new(block_len)).collect(),
            order: Vec::with_capacity(capacity),
            stack: Vec::with_capacity(capacity * 2),
            search: Vec::with_capacity(capacity * 2),
            seen: Vec::with_capacity(capacity),
            epoch: 0,
            closed: false,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Id the next created node should use: the first free slot, or a new one.
    pub fn next_id(&self) -> NodeId {
        self.slots
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, slot)| slot.node.is_none())
            .map(|(index, slot)| NodeId::new(index, slot.generation.wrapping_add(1)))
            .unwrap_or_else(|| NodeId::new(self.slots.len(), 1))
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeKind> {
        self.slot(id).and_then(|slot| slot.node.as_ref()).map(|node| &node.kind)
    }

    pub fn oscillator(&self, id: NodeId) -> Option<&OscillatorNode> {
        match self.node(id) {
            Some(NodeKind::Oscillator(osc)) => Some(osc),
            _ => None,
        }
    }

    pub fn gain(&self, id: NodeId) -> Option<&GainNode> {
        match self.node(id) {
            Some(NodeKind::Gain(gain)) => Some(gain),
            _ => None,
        }
    }

    /// Every live node, destination included.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &NodeKind)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.node
                .as_ref()
                .map(|node| (NodeId::new(index, slot.generation), &node.kind))
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Number of outgoing connections of `id`.
    pub fn outgoing(&self, id: NodeId) -> usize {
        self.connections.iter().filter(|c| c.from == id).count()
    }

    /// Oscillators currently producing sound.
    pub fn running_oscillators(&self) -> impl Iterator<Item = (NodeId, &OscillatorNode)> + '_ {
        self.nodes().filter_map(|(id, kind)| match kind {
            NodeKind::Oscillator(osc) if osc.is_running() => Some((id, osc)),
            _ => None,
        })
    }

    pub fn apply(&mut self, command: GraphCommand) -> Result<(), GraphError> {
        if self.closed {
            return Err(GraphError::Closed);
        }

        match command {
            GraphCommand::Create { id, spec } => self.create(id, spec),
            GraphCommand::Connect { from, to, input } => self.connect(from, to, input),
            GraphCommand::Disconnect { from } => {
                self.slot(from).ok_or(GraphError::UnknownNode(from))?;
                self.connections.retain(|c| c.from != from);
                Ok(())
            }
            GraphCommand::Start { id } => {
                let osc = self.oscillator_mut(id)?;
                if osc.state() != PlaybackState::Idle {
                    return Err(GraphError::AlreadyStarted(id));
                }
                osc.set_state(PlaybackState::Running);
                Ok(())
            }
            GraphCommand::Stop { id } => {
                let osc = self.oscillator_mut(id)?;
                if !osc.is_running() {
                    return Err(GraphError::NotRunning(id));
                }
                osc.set_state(PlaybackState::Stopped);
                Ok(())
            }
            GraphCommand::SetFrequency { id, hz } => {
                if !hz.is_finite() || hz < 0.0 {
                    return Err(GraphError::InvalidValue(id));
                }
                self.oscillator_mut(id)?.set_frequency(hz);
                Ok(())
            }
            GraphCommand::SetGain { id, amplitude } => {
                if !amplitude.is_finite() {
                    return Err(GraphError::InvalidValue(id));
                }
                match self.node_mut(id)? {
                    NodeKind::Gain(gain) => {
                        gain.set_amplitude(amplitude);
                        Ok(())
                    }
                    _ => Err(GraphError::NotAGain(id)),
                }
            }
            GraphCommand::Release { id } => self.release(id),
            GraphCommand::Close => {
                self.closed = true;
                Ok(())
            }
        }
    }

    fn create(&mut self, id: NodeId, spec: NodeSpec) -> Result<(), GraphError> {
        let index = id.index();
        if index == 0 {
            return Err(GraphError::SlotTaken(id));
        }
        match spec {
            NodeSpec::Oscillator { frequency } if !frequency.is_finite() || frequency < 0.0 => {
                return Err(GraphError::InvalidValue(id));
            }
            NodeSpec::Gain { amplitude } if !amplitude.is_finite() => {
                return Err(GraphError::InvalidValue(id));
            }
            _ => {}
        }

        while self.slots.len() <= index {
            self.slots.push(Slot {
                generation: 0,
                node: None,
                mark: 0,
            });
        }

        let slot = &mut self.slots[index];
        if slot.node.is_some() {
            return Err(GraphError::SlotTaken(id));
        }

        let block_len = self.block_len;
        let block = self
            .spare_blocks
            .pop()
            .unwrap_or_else(|| Block::new(block_len));
        slot.generation = id.generation();
        slot.node = Some(Node {
            kind: NodeKind::from_spec(spec),
            block,
        });
        Ok(())
    }

    fn connect(&mut self, from: NodeId, to: NodeId, input: usize) -> Result<(), GraphError> {
        let source = self.node(from).ok_or(GraphError::UnknownNode(from))?;
        if !source.has_output() {
            return Err(GraphError::NoOutput(from));
        }
        let target = self.node(to).ok_or(GraphError::UnknownNode(to))?;
        if input >= target.inputs() {
            return Err(GraphError::NoSuchInput { node: to, input });
        }
        if from == to || self.reaches(to, from) {
            return Err(GraphError::Cycle { from, to });
        }

        let connection = Connection { from, to, input };
        if !self.connections.contains(&connection) {
            self.connections.push(connection);
        }
        Ok(())
    }

    fn release(&mut self, id: NodeId) -> Result<(), GraphError> {
        if id == NodeId::DESTINATION {
            return Err(GraphError::ProtectedDestination);
        }
        self.slot(id).ok_or(GraphError::UnknownNode(id))?;

        self.connections.retain(|c| c.from != id && c.to != id);
        if let Some(node) = self.slots[id.index()].node.take() {
            self.spare_blocks.push(node.block);
        }
        Ok(())
    }

    /// Whether `target` is downstream of `start`.
    fn reaches(&mut self, start: NodeId, target: NodeId) -> bool {
        let mut pending = std::mem::take(&mut self.search);
        let mut seen = std::mem::take(&mut self.seen);
        pending.clear();
        seen.clear();
        pending.push(start);

        let mut found = false;
        while let Some(id) = pending.pop() {
            if id == target {
                found = true;
                break;
            }
            if seen.contains(&id) {
                continue;
            }
            seen.push(id);
            pending.extend(self.connections.iter().filter(|c| c.from == id).map(|c| c.to));
        }

        self.search = pending;
        self.seen = seen;
        found
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation() && slot.node.is_some())
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeKind, GraphError> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
            .map(|node| &mut node.kind)
            .ok_or(GraphError::UnknownNode(id))
    }

    fn oscillator_mut(&mut self, id: NodeId) -> Result<&mut OscillatorNode, GraphError> {
        match self.node_mut(id)? {
            NodeKind::Oscillator(osc) => Ok(osc),
            _ => Err(GraphError::NotAnOscillator(id)),
        }
    }

    /// Render one block of stereo output.
    ///
    /// Only nodes reachable from the destination are processed. A closed graph
    /// renders silence.
    pub fn render_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());
        let frames = left.len();
        debug_assert!(frames <= self.block_len, "block larger than render buffers");

        if self.closed {
            left.fill(0.0);
            right.fill(0.0);
            return;
        }

        self.schedule();
        for i in 0..self.order.len() {
            let index = self.order[i];
            self.process(index, frames);
        }

        if let Some(destination) = self.slots[0].node.as_ref() {
            left.copy_from_slice(&destination.block.left[..frames]);
            right.copy_from_slice(&destination.block.right[..frames]);
        }
    }

    /// Depth-first post-order from the destination into `self.order`.
    fn schedule(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.order.clear();
        self.stack.clear();
        self.stack.push((0, false));

        while let Some((index, expanded)) = self.stack.pop() {
            if expanded {
                self.order.push(index);
                continue;
            }
            if self.slots[index].mark == self.epoch {
                continue;
            }
            self.slots[index].mark = self.epoch;
            self.stack.push((index, true));

            for connection in &self.connections {
                let from = connection.from.index();
                if connection.to.index() == index && self.slots[from].mark != self.epoch {
                    self.stack.push((from, false));
                }
            }
        }
    }

    fn process(&mut self, index: usize, frames: usize) {
        let (mut block, stage) = match self.slots[index].node.as_mut() {
            Some(node) => (std::mem::take(&mut node.block), Stage::of(&node.kind)),
            None => return,
        };

        match stage {
            Stage::Source => block.channels = 1,
            Stage::Merge => {
                block.channels = 2;
                self.gather_mono(index, 0, &mut block.left[..frames]);
                self.gather_mono(index, 1, &mut block.right[..frames]);
            }
            Stage::Sum => {
                block.channels = self.input_channels(index);
                self.gather(index, &mut block, frames);
            }
            Stage::Sink => {
                block.channels = 2;
                self.gather(index, &mut block, frames);
            }
        }

        let sample_rate = self.sample_rate;
        if let Some(node) = self.slots[index].node.as_mut() {
            match &mut node.kind {
                NodeKind::Oscillator(osc) => osc.render(&mut block.left[..frames], sample_rate),
                NodeKind::Gain(gain) => gain.process(&mut block, frames),
                NodeKind::ChannelMerger | NodeKind::Destination => {}
            }
            node.block = block;
        }
    }

    /// Widest channel count among the sources feeding `index` (at least 1).
    fn input_channels(&self, index: usize) -> usize {
        self.connections
            .iter()
            .filter(|c| c.to.index() == index)
            .filter_map(|c| self.slots[c.from.index()].node.as_ref())
            .map(|source| source.block.channels)
            .max()
            .unwrap_or(1)
    }

    /// Sum every source of input 0 into `block`, up-mixing mono to both
    /// channels when the block is stereo.
    fn gather(&self, index: usize, block: &mut Block, frames: usize) {
        block.left[..frames].fill(0.0);
        block.right[..frames].fill(0.0);

        for connection in self.connections.iter().filter(|c| c.to.index() == index) {
            let Some(source) = self.slots[connection.from.index()].node.as_ref() else {
                continue;
            };
            let src = &source.block;
            mix::sum_in_place(&mut block.left[..frames], &src.left[..frames]);
            if block.channels == 2 {
                let right = if src.channels == 2 { &src.right } else { &src.left };
                mix::sum_in_place(&mut block.right[..frames], &right[..frames]);
            }
        }
    }

    /// Sum every source of one input as mono (stereo sources are downmixed).
    fn gather_mono(&self, index: usize, input: usize, out: &mut [f32]) {
        out.fill(0.0);
        let frames = out.len();

        for connection in self
            .connections
            .iter()
            .filter(|c| c.to.index() == index && c.input == input)
        {
            let Some(source) = self.slots[connection.from.index()].node.as_ref() else {
                continue;
            };
            let src = &source.block;
            if src.channels == 2 {
                mix::sum_downmix_in_place(out, &src.left[..frames], &src.right[..frames]);
            } else {
                mix::sum_in_place(out, &src.left[..frames]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::db_to_amplitude;
    use std::f64::consts::TAU;

    const SR: f32 = 48_000.0;

    fn create(graph: &mut AudioGraph, spec: NodeSpec) -> NodeId {
        let id = graph.next_id();
        graph.apply(GraphCommand::Create { id, spec }).unwrap();
        id
    }

    /// left osc → merger:0, right osc → merger:1, merger → gain → destination
    fn binaural(graph: &mut AudioGraph, left: f32, right: f32, amplitude: f32) -> [NodeId; 4] {
        let l = create(graph, NodeSpec::Oscillator { frequency: left });
        let r = create(graph, NodeSpec::Oscillator { frequency: right });
        let merger = create(graph, NodeSpec::ChannelMerger);
        let gain = create(graph, NodeSpec::Gain { amplitude });
        for command in [
            GraphCommand::Connect { from: l, to: merger, input: 0 },
            GraphCommand::Connect { from: r, to: merger, input: 1 },
            GraphCommand::Connect { from: merger, to: gain, input: 0 },
            GraphCommand::Connect { from: gain, to: NodeId::DESTINATION, input: 0 },
            GraphCommand::Start { id: l },
            GraphCommand::Start { id: r },
        ] {
            graph.apply(command).unwrap();
        }
        [l, r, merger, gain]
    }

    #[test]
    fn renders_independent_channels() {
        let mut graph = AudioGraph::for_rendering(SR, 512);
        let amplitude = db_to_amplitude(-15.0);
        binaural(&mut graph, 220.0, 234.0, amplitude);

        let mut left = vec![0.0f32; 512];
        let mut right = vec![0.0f32; 512];
        graph.render_block(&mut left, &mut right);

        for n in [1usize, 50, 333] {
            let t = n as f64 / SR as f64;
            let expected_l = (TAU * 220.0 * t).sin() as f32 * amplitude;
            let expected_r = (TAU * 234.0 * t).sin() as f32 * amplitude;
            assert!((left[n] - expected_l).abs() < 1e-4, "left[{n}]");
            assert!((right[n] - expected_r).abs() < 1e-4, "right[{n}]");
        }
    }

    #[test]
    fn idle_oscillators_are_silent() {
        let mut graph = AudioGraph::for_rendering(SR, 64);
        let osc = create(&mut graph, NodeSpec::Oscillator { frequency: 220.0 });
        graph
            .apply(GraphCommand::Connect { from: osc, to: NodeId::DESTINATION, input: 0 })
            .unwrap();

        let mut left = vec![1.0f32; 64];
        let mut right = vec![1.0f32; 64];
        graph.render_block(&mut left, &mut right);
        assert!(left.iter().chain(right.iter()).all(|&s| s == 0.0));
    }

    #[test]
    fn mono_source_reaches_both_channels() {
        let mut graph = AudioGraph::for_rendering(SR, 64);
        let osc = create(&mut graph, NodeSpec::Oscillator { frequency: 1_000.0 });
        graph
            .apply(GraphCommand::Connect { from: osc, to: NodeId::DESTINATION, input: 0 })
            .unwrap();
        graph.apply(GraphCommand::Start { id: osc }).unwrap();

        let mut left = vec![0.0f32; 64];
        let mut right = vec![0.0f32; 64];
        graph.render_block(&mut left, &mut right);
        assert_eq!(left, right);
        assert!(left.iter().any(|s| s.abs() > 0.1));
    }

    #[test]
    fn oscillators_start_once() {
        let mut graph = AudioGraph::new(SR);
        let osc = create(&mut graph, NodeSpec::Oscillator { frequency: 220.0 });

        assert_eq!(graph.apply(GraphCommand::Stop { id: osc }), Err(GraphError::NotRunning(osc)));
        graph.apply(GraphCommand::Start { id: osc }).unwrap();
        graph.apply(GraphCommand::Stop { id: osc }).unwrap();
        assert_eq!(
            graph.apply(GraphCommand::Start { id: osc }),
            Err(GraphError::AlreadyStarted(osc))
        );
        assert_eq!(graph.oscillator(osc).map(|o| o.state()), Some(PlaybackState::Stopped));
    }

    #[test]
    fn rejects_cycles_and_bad_ports() {
        let mut graph = AudioGraph::new(SR);
        let a = create(&mut graph, NodeSpec::Gain { amplitude: 1.0 });
        let b = create(&mut graph, NodeSpec::Gain { amplitude: 1.0 });
        let osc = create(&mut graph, NodeSpec::Oscillator { frequency: 100.0 });

        graph.apply(GraphCommand::Connect { from: a, to: b, input: 0 }).unwrap();
        assert_eq!(
            graph.apply(GraphCommand::Connect { from: b, to: a, input: 0 }),
            Err(GraphError::Cycle { from: b, to: a })
        );
        assert_eq!(
            graph.apply(GraphCommand::Connect { from: a, to: a, input: 0 }),
            Err(GraphError::Cycle { from: a, to: a })
        );
        assert_eq!(
            graph.apply(GraphCommand::Connect { from: a, to: osc, input: 0 }),
            Err(GraphError::NoSuchInput { node: osc, input: 0 })
        );
        assert_eq!(
            graph.apply(GraphCommand::Connect { from: NodeId::DESTINATION, to: a, input: 0 }),
            Err(GraphError::NoOutput(NodeId::DESTINATION))
        );
    }

    #[test]
    fn released_slots_are_reused_with_new_generation() {
        let mut graph = AudioGraph::new(SR);
        let first = create(&mut graph, NodeSpec::ChannelMerger);
        graph.apply(GraphCommand::Release { id: first }).unwrap();

        let second = create(&mut graph, NodeSpec::ChannelMerger);
        assert_eq!(first.index(), second.index());
        assert_ne!(first, second);
        assert!(graph.node(first).is_none());
        assert_eq!(
            graph.apply(GraphCommand::Disconnect { from: first }),
            Err(GraphError::UnknownNode(first))
        );
    }

    #[test]
    fn release_drops_connections() {
        let mut graph = AudioGraph::new(SR);
        let [l, _, merger, gain] = binaural(&mut graph, 220.0, 230.0, 1.0);
        graph.apply(GraphCommand::Release { id: merger }).unwrap();

        assert_eq!(graph.outgoing(l), 0);
        assert_eq!(graph.outgoing(gain), 1);
        assert_eq!(
            graph.apply(GraphCommand::Release { id: NodeId::DESTINATION }),
            Err(GraphError::ProtectedDestination)
        );
    }

    #[test]
    fn closed_graph_is_silent_and_rejects_commands() {
        let mut graph = AudioGraph::for_rendering(SR, 128);
        binaural(&mut graph, 220.0, 230.0, 1.0);
        graph.apply(GraphCommand::Close).unwrap();

        let mut left = vec![1.0f32; 128];
        let mut right = vec![1.0f32; 128];
        graph.render_block(&mut left, &mut right);
        assert!(left.iter().chain(right.iter()).all(|&s| s == 0.0));
        assert_eq!(graph.apply(GraphCommand::Close), Err(GraphError::Closed));
    }

    #[test]
    fn gain_changes_ramp_over_one_block() {
        let mut graph = AudioGraph::for_rendering(SR, 256);
        let [_, _, _, gain] = binaural(&mut graph, 220.0, 230.0, 1.0);
        let mut left = vec![0.0f32; 256];
        let mut right = vec![0.0f32; 256];
        graph.render_block(&mut left, &mut right);

        graph.apply(GraphCommand::SetGain { id: gain, amplitude: 0.0 }).unwrap();
        graph.render_block(&mut left, &mut right);
        // Ramp reaches silence on the last sample, not the first.
        assert!(left[..64].iter().any(|s| s.abs() > 0.05));
        assert!(left[255].abs() < 1e-6);

        graph.render_block(&mut left, &mut right);
        assert!(left.iter().all(|&s| s == 0.0));
    }
}
