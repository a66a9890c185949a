//! The audio context: the control-side handle to a rendered node graph.
//!
//! An [`AudioContext`] is owned by exactly one engine. Every call validates
//! the change against a mirror of the graph, then queues the command for the
//! render thread; [`AudioContext::commit`] publishes the queued batch in one
//! step so the whole batch lands in the same audio quantum.
//!
//! ```ignore
//! let (mut ctx, mut renderer) = AudioContext::offline(48_000.0, 64);
//! let osc = ctx.create_oscillator(220.0)?;
//! ctx.connect(&osc, &ctx.destination(), 0)?;
//! let running = osc.start(&mut ctx)?;
//! ctx.commit()?;
//! ```

#[cfg(feature = "device")]
pub mod device;
/// Typed handles for nodes owned by a context.
pub mod nodes;
/// Render-thread half of a context.
pub mod renderer;

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use rtrb::{Producer, RingBuffer};
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    graph::{AudioGraph, GraphCommand, NodeId, NodeSpec},
};

pub use nodes::{
    AudioNode, ChannelMerger, Destination, Gain, Oscillator, RunningOscillator, SpentOscillator,
};
pub use renderer::Renderer;

/// Opens an audio context on demand.
///
/// The engine calls this lazily on the first `start()`, and again on the next
/// `start()` if opening failed.
pub trait ContextOpener {
    fn open(&mut self, capacity: usize) -> Result<AudioContext>;
}

impl<F> ContextOpener for F
where
    F: FnMut(usize) -> Result<AudioContext>,
{
    fn open(&mut self, capacity: usize) -> Result<AudioContext> {
        self(capacity)
    }
}

/// Opens the default output device of the default cpal host.
#[cfg(feature = "device")]
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultDevice;

#[cfg(feature = "device")]
impl ContextOpener for DefaultDevice {
    fn open(&mut self, capacity: usize) -> Result<AudioContext> {
        device::open_default(capacity)
    }
}

/// Opens offline contexts and keeps the latest [`Renderer`] for the caller.
///
/// Clones share state, so a test can hand one clone to an engine and pull
/// audio through the other.
#[derive(Clone)]
pub struct OfflineOpener {
    sample_rate: f32,
    renderer: Rc<RefCell<Option<Renderer>>>,
    opened: Rc<Cell<usize>>,
}

impl OfflineOpener {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            renderer: Rc::new(RefCell::new(None)),
            opened: Rc::new(Cell::new(0)),
        }
    }

    /// The renderer of the most recently opened context, if not taken yet.
    pub fn take_renderer(&self) -> Option<Renderer> {
        self.renderer.borrow_mut().take()
    }

    /// Number of contexts opened so far.
    pub fn opened(&self) -> usize {
        self.opened.get()
    }
}

impl ContextOpener for OfflineOpener {
    fn open(&mut self, capacity: usize) -> Result<AudioContext> {
        let (ctx, renderer) = AudioContext::offline(self.sample_rate, capacity);
        *self.renderer.borrow_mut() = Some(renderer);
        self.opened.set(self.opened.get() + 1);
        Ok(ctx)
    }
}

/// What keeps the render side alive.
enum Output {
    /// The caller owns the [`Renderer`] and pulls blocks itself.
    Detached,
    #[cfg(feature = "device")]
    Device(cpal::Stream),
}

impl Output {
    fn shutdown(&mut self) {
        #[cfg(feature = "device")]
        if let Output::Device(stream) = self {
            use cpal::traits::StreamTrait;
            if let Err(err) = stream.pause() {
                tracing::warn!(%err, "failed to pause output stream before closing");
            }
        }
        *self = Output::Detached;
    }
}

/// Mirror and queue as they were before a batch, for
/// [`AudioContext::rollback`].
pub struct Checkpoint {
    graph: AudioGraph,
    pending: usize,
}

pub struct AudioContext {
    graph: AudioGraph,
    commands: Producer<GraphCommand>,
    pending: Vec<GraphCommand>,
    output: Output,
    closed: bool,
}

impl AudioContext {
    /// A context whose renderer is handed back to the caller instead of a
    /// device. Used for tests, benchmarks and offline rendering.
    pub fn offline(sample_rate: f32, capacity: usize) -> (Self, Renderer) {
        let (producer, consumer) = RingBuffer::new(capacity);
        let renderer = Renderer::new(sample_rate, consumer);
        (Self::from_parts(sample_rate, producer, Output::Detached), renderer)
    }

    fn from_parts(sample_rate: f32, commands: Producer<GraphCommand>, output: Output) -> Self {
        Self {
            graph: AudioGraph::new(sample_rate),
            commands,
            pending: Vec::new(),
            output,
            closed: false,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.graph.sample_rate()
    }

    /// Control-side view of the node graph, including queued commands.
    pub fn graph(&self) -> &AudioGraph {
        &self.graph
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Commands applied to the mirror but not yet committed.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn destination(&self) -> Destination {
        Destination
    }

    pub fn create_oscillator(&mut self, frequency: f32) -> Result<Oscillator> {
        let id = self.create(NodeSpec::Oscillator { frequency })?;
        Ok(Oscillator::new(id))
    }

    pub fn create_gain(&mut self, amplitude: f32) -> Result<Gain> {
        let id = self.create(NodeSpec::Gain { amplitude })?;
        Ok(Gain::new(id))
    }

    pub fn create_channel_merger(&mut self) -> Result<ChannelMerger> {
        let id = self.create(NodeSpec::ChannelMerger)?;
        Ok(ChannelMerger::new(id))
    }

    /// Connect the output of `from` to input `input` of `to`.
    pub fn connect(&mut self, from: &impl AudioNode, to: &impl AudioNode, input: usize) -> Result<()> {
        self.submit(GraphCommand::Connect {
            from: from.id(),
            to: to.id(),
            input,
        })
    }

    /// Remove every outgoing connection of `node`.
    pub fn disconnect(&mut self, node: &impl AudioNode) -> Result<()> {
        self.submit(GraphCommand::Disconnect { from: node.id() })
    }

    /// Publish every queued command to the render thread at once.
    ///
    /// On [`Error::QueueFull`] nothing is published and the batch stays queued
    /// for the next commit.
    pub fn commit(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let pending = self.pending.len();
        let free = self.commands.slots();
        let chunk = self
            .commands
            .write_chunk_uninit(pending)
            .map_err(|_| Error::QueueFull { pending, free })?;
        chunk.fill_from_iter(self.pending.drain(..));
        Ok(())
    }

    /// Remember the current mirror and queue length.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            graph: self.graph.clone(),
            pending: self.pending.len(),
        }
    }

    /// Drop every command queued since `checkpoint` and restore the mirror.
    ///
    /// Only uncommitted work is undone; once a commit succeeds the render
    /// side has the commands and a rollback past it would desync the two.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        let dropped = self.pending.len().saturating_sub(checkpoint.pending);
        self.pending.truncate(checkpoint.pending);
        self.graph = checkpoint.graph;
        debug!(dropped, "rolled back uncommitted commands");
    }

    /// Close the context. The render side goes silent and every later call
    /// fails with [`Error::ContextClosed`]. Closing twice is a no-op.
    ///
    /// Stop and disconnect nodes first: closing does not do it for you.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        self.submit(GraphCommand::Close)?;
        let committed = self.commit();
        self.closed = true;
        self.output.shutdown();
        info!(nodes = self.graph.node_count(), "audio context closed");
        committed
    }

    fn create(&mut self, spec: NodeSpec) -> Result<NodeId> {
        let id = self.graph.next_id();
        self.submit(GraphCommand::Create { id, spec })?;
        debug!(%id, ?spec, "created node");
        Ok(id)
    }

    pub(crate) fn submit(&mut self, command: GraphCommand) -> Result<()> {
        if self.closed {
            return Err(Error::ContextClosed);
        }
        self.graph.apply(command)?;
        self.pending.push(command);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PlaybackState;

    #[test]
    fn commit_publishes_batch_to_renderer() {
        let (mut ctx, mut renderer) = AudioContext::offline(48_000.0, 32);
        let osc = ctx.create_oscillator(220.0).unwrap();
        ctx.connect(&osc, &ctx.destination(), 0).unwrap();
        let running = osc.start(&mut ctx).unwrap();
        assert_eq!(ctx.pending(), 3);

        let mut left = vec![0.0f32; 64];
        let mut right = vec![0.0f32; 64];
        renderer.render(&mut left, &mut right);
        assert!(renderer.graph().oscillator(running.id()).is_none());

        ctx.commit().unwrap();
        assert_eq!(ctx.pending(), 0);
        renderer.render(&mut left, &mut right);
        assert_eq!(
            renderer.graph().oscillator(running.id()).map(|o| o.state()),
            Some(PlaybackState::Running)
        );
        assert!(left.iter().any(|s| s.abs() > 0.1));
    }

    #[test]
    fn invalid_commands_never_reach_the_queue() {
        let (mut ctx, _renderer) = AudioContext::offline(48_000.0, 8);
        let merger = ctx.create_channel_merger().unwrap();
        let err = ctx.connect(&merger, &merger, 0).unwrap_err();
        assert!(matches!(err, Error::Graph(_)));
        assert_eq!(ctx.pending(), 1);
    }

    #[test]
    fn full_queue_keeps_batch_pending() {
        let (mut ctx, renderer) = AudioContext::offline(48_000.0, 2);
        for _ in 0..3 {
            ctx.create_gain(1.0).unwrap();
        }
        assert!(matches!(
            ctx.commit(),
            Err(Error::QueueFull { pending: 3, free: 2 })
        ));
        assert_eq!(ctx.pending(), 3);
        assert_eq!(renderer.graph().node_count(), 1);
    }

    #[test]
    fn rollback_forgets_uncommitted_nodes() {
        let (mut ctx, mut renderer) = AudioContext::offline(48_000.0, 4);
        let gain = ctx.create_gain(0.5).unwrap();
        ctx.connect(&gain, &ctx.destination(), 0).unwrap();
        ctx.commit().unwrap();

        let checkpoint = ctx.checkpoint();
        let osc = ctx.create_oscillator(220.0).unwrap();
        ctx.connect(&osc, &gain, 0).unwrap();
        let running = osc.start(&mut ctx).unwrap();
        assert!(matches!(ctx.commit(), Err(Error::QueueFull { pending: 3, free: 2 })));

        ctx.rollback(checkpoint);
        assert_eq!(ctx.pending(), 0);
        assert!(ctx.graph().node(running.id()).is_none());
        assert_eq!(ctx.graph().outgoing(gain.id()), 1);
        assert_eq!(ctx.graph().next_id(), running.id());

        let mut left = vec![0.0f32; 32];
        let mut right = vec![0.0f32; 32];
        renderer.render(&mut left, &mut right);
        assert_eq!(renderer.graph().node_count(), ctx.graph().node_count());
        assert!(left.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn closed_context_rejects_calls() {
        let (mut ctx, mut renderer) = AudioContext::offline(48_000.0, 8);
        ctx.close().unwrap();
        ctx.close().unwrap();
        assert!(ctx.is_closed());
        assert!(matches!(ctx.create_gain(1.0), Err(Error::ContextClosed)));

        let mut left = vec![0.0f32; 16];
        let mut right = vec![0.0f32; 16];
        renderer.render(&mut left, &mut right);
        assert!(renderer.is_closed());
    }
}
