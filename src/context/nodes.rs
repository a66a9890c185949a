//! Handles for nodes created by an [`AudioContext`].
//!
//! Oscillators are one-shot, so their handle changes type as they move
//! through their lifecycle:
//!
//! ```text
//! Oscillator ──start()──▶ RunningOscillator ──stop()──▶ SpentOscillator ──release()
//! ```
//!
//! Each transition consumes the previous handle. There is no way back from
//! `SpentOscillator` to a running one; playing again means creating a new
//! oscillator. Handles are deliberately not `Clone`.

use crate::{
    error::Result,
    graph::{GraphCommand, NodeId},
};

use super::AudioContext;

/// Anything that can be wired with [`AudioContext::connect`].
pub trait AudioNode {
    fn id(&self) -> NodeId;
}

/// The context's output. Always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination;

impl AudioNode for Destination {
    fn id(&self) -> NodeId {
        NodeId::DESTINATION
    }
}

/// A configured oscillator that has not started yet.
#[derive(Debug, PartialEq, Eq)]
pub struct Oscillator {
    id: NodeId,
}

impl Oscillator {
    pub(crate) fn new(id: NodeId) -> Self {
        Self { id }
    }

    pub fn set_frequency(&self, ctx: &mut AudioContext, hz: f32) -> Result<()> {
        ctx.submit(GraphCommand::SetFrequency { id: self.id, hz })
    }

    /// Begin generating. Consumes the handle.
    pub fn start(self, ctx: &mut AudioContext) -> Result<RunningOscillator> {
        ctx.submit(GraphCommand::Start { id: self.id })?;
        Ok(RunningOscillator { id: self.id })
    }

    /// Discard without ever starting.
    pub fn release(self, ctx: &mut AudioContext) -> Result<()> {
        ctx.submit(GraphCommand::Release { id: self.id })
    }
}

impl AudioNode for Oscillator {
    fn id(&self) -> NodeId {
        self.id
    }
}

/// An oscillator that is producing sound.
#[derive(Debug, PartialEq, Eq)]
pub struct RunningOscillator {
    id: NodeId,
}

impl RunningOscillator {
    /// Retune in place. Phase is preserved, so there is no click or gap.
    pub fn set_frequency(&self, ctx: &mut AudioContext, hz: f32) -> Result<()> {
        ctx.submit(GraphCommand::SetFrequency { id: self.id, hz })
    }

    /// Halt generation for good. Consumes the handle.
    pub fn stop(self, ctx: &mut AudioContext) -> Result<SpentOscillator> {
        ctx.submit(GraphCommand::Stop { id: self.id })?;
        Ok(SpentOscillator { id: self.id })
    }
}

impl AudioNode for RunningOscillator {
    fn id(&self) -> NodeId {
        self.id
    }
}

/// A stopped oscillator. It can be disconnected and released, nothing else.
#[derive(Debug, PartialEq, Eq)]
pub struct SpentOscillator {
    id: NodeId,
}

impl SpentOscillator {
    pub fn release(self, ctx: &mut AudioContext) -> Result<()> {
        ctx.submit(GraphCommand::Release { id: self.id })
    }
}

impl AudioNode for SpentOscillator {
    fn id(&self) -> NodeId {
        self.id
    }
}

/// Linear gain stage.
#[derive(Debug, PartialEq, Eq)]
pub struct Gain {
    id: NodeId,
}

impl Gain {
    pub(crate) fn new(id: NodeId) -> Self {
        Self { id }
    }

    pub fn set_amplitude(&self, ctx: &mut AudioContext, amplitude: f32) -> Result<()> {
        ctx.submit(GraphCommand::SetGain {
            id: self.id,
            amplitude,
        })
    }

    pub fn release(self, ctx: &mut AudioContext) -> Result<()> {
        ctx.submit(GraphCommand::Release { id: self.id })
    }
}

impl AudioNode for Gain {
    fn id(&self) -> NodeId {
        self.id
    }
}

/// Two-input merger: input 0 → left channel, input 1 → right channel.
#[derive(Debug, PartialEq, Eq)]
pub struct ChannelMerger {
    id: NodeId,
}

impl ChannelMerger {
    pub const LEFT: usize = 0;
    pub const RIGHT: usize = 1;

    pub(crate) fn new(id: NodeId) -> Self {
        Self { id }
    }

    pub fn release(self, ctx: &mut AudioContext) -> Result<()> {
        ctx.submit(GraphCommand::Release { id: self.id })
    }
}

impl AudioNode for ChannelMerger {
    fn id(&self) -> NodeId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, graph::{GraphError, PlaybackState}};

    #[test]
    fn oscillator_lifecycle_moves_forward() {
        let (mut ctx, _renderer) = AudioContext::offline(48_000.0, 16);
        let osc = ctx.create_oscillator(220.0).unwrap();
        let id = osc.id();

        let running = osc.start(&mut ctx).unwrap();
        running.set_frequency(&mut ctx, 300.0).unwrap();
        assert_eq!(ctx.graph().oscillator(id).map(|o| o.frequency()), Some(300.0));

        let spent = running.stop(&mut ctx).unwrap();
        assert_eq!(
            ctx.graph().oscillator(id).map(|o| o.state()),
            Some(PlaybackState::Stopped)
        );

        spent.release(&mut ctx).unwrap();
        assert!(ctx.graph().node(id).is_none());
    }

    #[test]
    fn merger_routes_by_channel() {
        let (mut ctx, _renderer) = AudioContext::offline(48_000.0, 16);
        let left = ctx.create_oscillator(220.0).unwrap();
        let merger = ctx.create_channel_merger().unwrap();
        ctx.connect(&left, &merger, ChannelMerger::LEFT).unwrap();

        let err = ctx.connect(&left, &merger, 2).unwrap_err();
        assert!(matches!(
            err,
            Error::Graph(GraphError::NoSuchInput { input: 2, .. })
        ));
    }
}
