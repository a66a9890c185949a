//! The beat engine: session state plus the live audio graph that plays it.
//!
//! ```text
//!   left osc  (base)        ─┐
//!                            ├─▶ merger ──▶ gain (10^(dB/20)) ──▶ destination
//!   right osc (base + beat) ─┘
//!     input 0 = left, input 1 = right
//! ```
//!
//! Oscillators and the merger are built fresh on every start and thrown away
//! on stop. The gain stage is created once and reused for every session.
//! While playing, slider edits patch the live nodes in place.

/// Named beat frequencies.
pub mod preset;
/// Session values and the transition function.
pub mod session;

use tracing::{debug, info, warn};

use crate::{
    config::{EngineConfig, Limits},
    context::{
        AudioContext, AudioNode, ChannelMerger, ContextOpener, Gain, RunningOscillator,
    },
    error::Result,
    graph::NodeId,
};

pub use preset::{Preset, UnknownPreset};
pub use session::{Control, Effect, SessionState, Transition};

/// Node ids of a playing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveNodes {
    pub left: NodeId,
    pub right: NodeId,
    pub merger: NodeId,
    pub gain: NodeId,
}

struct LiveGraph {
    left: RunningOscillator,
    right: RunningOscillator,
    merger: ChannelMerger,
}

pub struct BeatEngine {
    config: EngineConfig,
    limits: Limits,
    session: SessionState,
    opener: Box<dyn ContextOpener>,
    context: Option<AudioContext>,
    gain: Option<Gain>,
    live: Option<LiveGraph>,
}

impl BeatEngine {
    /// A stopped engine. No audio resources are touched until the first
    /// [`start`](Self::start).
    pub fn new(config: EngineConfig, opener: impl ContextOpener + 'static) -> Self {
        let limits = config.limits();
        let session = SessionState {
            is_playing: false,
            ..config.session().clamped(&limits)
        };

        Self {
            config,
            limits,
            session,
            opener: Box::new(opener),
            context: None,
            gain: None,
            live: None,
        }
    }

    /// An engine that plays through the default output device.
    #[cfg(feature = "device")]
    pub fn with_default_device(config: EngineConfig) -> Self {
        Self::new(config, crate::context::DefaultDevice)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_playing
    }

    /// The audio context, once the first start has opened it.
    pub fn context(&self) -> Option<&AudioContext> {
        self.context.as_ref()
    }

    pub fn live_nodes(&self) -> Option<LiveNodes> {
        let live = self.live.as_ref()?;
        let gain = self.gain.as_ref()?;
        Some(LiveNodes {
            left: live.left.id(),
            right: live.right.id(),
            merger: live.merger.id(),
            gain: gain.id(),
        })
    }

    pub fn start(&mut self) -> Result<()> {
        self.dispatch(Control::Start)
    }

    pub fn stop(&mut self) -> Result<()> {
        self.dispatch(Control::Stop)
    }

    pub fn toggle(&mut self) -> Result<()> {
        if self.session.is_playing {
            self.stop()
        } else {
            self.start()
        }
    }

    pub fn set_beat_frequency(&mut self, hz: f32) -> Result<()> {
        self.dispatch(Control::SetBeatFrequency(hz))
    }

    pub fn set_base_frequency(&mut self, hz: f32) -> Result<()> {
        self.dispatch(Control::SetBaseFrequency(hz))
    }

    pub fn set_volume(&mut self, db: f32) -> Result<()> {
        self.dispatch(Control::SetVolume(db))
    }

    pub fn select_preset(&mut self, preset: Preset) -> Result<()> {
        self.dispatch(Control::SelectPreset(preset))
    }

    /// Stop, detach the gain stage and close the context.
    ///
    /// Dropping the engine does the same but can only log failures.
    pub fn dispose(mut self) -> Result<()> {
        self.shutdown()
    }

    /// Run one control event through [`SessionState::plan`] and apply its
    /// effect to the graph.
    ///
    /// The session only moves to the planned state once the effect has reached
    /// the render queue. A start or edit that cannot be committed is rolled
    /// back and leaves the engine as it was.
    pub fn dispatch(&mut self, control: Control) -> Result<()> {
        let Transition { next, effect } = self.session.plan(control, &self.limits)?;

        match effect {
            Effect::None => {}
            Effect::Teardown => {
                // Spent oscillators cannot come back, so the session counts
                // as stopped whatever happens below.
                self.session = next;
                let torn_down = self.teardown();
                let committed = self.commit();
                info!("stopped binaural beat");
                return torn_down.and(committed);
            }
            effect => {
                self.apply(effect, &next)?;
                match effect {
                    Effect::Build => info!(
                        left = next.left_frequency(),
                        right = next.right_frequency(),
                        volume = next.volume,
                        "started binaural beat"
                    ),
                    Effect::Retune { left, right } => {
                        debug!(left, right, "retuned live oscillators")
                    }
                    Effect::Regain { amplitude } => debug!(amplitude, "changed live gain"),
                    Effect::None | Effect::Teardown => {}
                }
            }
        }

        self.session = next;
        Ok(())
    }

    /// Queue `effect` as one batch and commit it, or undo it entirely.
    fn apply(&mut self, effect: Effect, session: &SessionState) -> Result<()> {
        let capacity = self.config.command_capacity();
        let ctx = open_context(&mut self.context, self.opener.as_mut(), capacity)?;
        // Leftovers of a stop that did not fit go out on their own first.
        ctx.commit()?;

        let checkpoint = ctx.checkpoint();
        let queued = match effect {
            Effect::Build => wire(ctx, &mut self.gain, session).map(|live| {
                self.live = Some(live);
            }),
            Effect::Retune { left, right } => match &self.live {
                Some(live) => live
                    .left
                    .set_frequency(ctx, left)
                    .and_then(|()| live.right.set_frequency(ctx, right)),
                None => Ok(()),
            },
            Effect::Regain { amplitude } => match &self.gain {
                Some(gain) => gain.set_amplitude(ctx, amplitude),
                None => Ok(()),
            },
            Effect::None | Effect::Teardown => Ok(()),
        };

        let Err(err) = queued.and_then(|()| ctx.commit()) else {
            return Ok(());
        };
        ctx.rollback(checkpoint);
        if matches!(effect, Effect::Build) {
            self.live = None;
        }
        if let Some(gain) = &self.gain {
            if ctx.graph().gain(gain.id()).is_none() {
                self.gain = None;
            }
        }
        warn!(%err, ?effect, "rolled back uncommitted change");
        Err(err)
    }

    fn teardown(&mut self) -> Result<()> {
        let (Some(ctx), Some(live)) = (self.context.as_mut(), self.live.take()) else {
            return Ok(());
        };
        let LiveGraph { left, right, merger } = live;

        let left = left.stop(ctx)?;
        let right = right.stop(ctx)?;
        ctx.disconnect(&left)?;
        ctx.disconnect(&right)?;
        ctx.disconnect(&merger)?;
        if let Some(gain) = &self.gain {
            ctx.disconnect(gain)?;
        }
        left.release(ctx)?;
        right.release(ctx)?;
        merger.release(ctx)?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        match self.context.as_mut() {
            Some(ctx) => ctx.commit(),
            None => Ok(()),
        }
    }

    fn shutdown(&mut self) -> Result<()> {
        let stopped = self.stop();
        let Some(mut ctx) = self.context.take() else {
            return stopped;
        };

        let released = match self.gain.take() {
            Some(gain) => ctx.disconnect(&gain).and_then(|()| gain.release(&mut ctx)),
            None => Ok(()),
        };
        let closed = ctx.close();
        stopped.and(released).and(closed)
    }
}

impl Drop for BeatEngine {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!(%err, "beat engine did not shut down cleanly");
        }
    }
}

/// The engine's context, opening one through `opener` if there is none yet.
fn open_context<'a>(
    context: &'a mut Option<AudioContext>,
    opener: &mut dyn ContextOpener,
    capacity: usize,
) -> Result<&'a mut AudioContext> {
    let ctx = match context.take() {
        Some(ctx) => ctx,
        None => {
            let ctx = opener
                .open(capacity)
                .inspect_err(|err| warn!(%err, "could not open audio context"))?;
            info!(sample_rate = ctx.sample_rate(), "opened audio context");
            ctx
        }
    };
    Ok(context.insert(ctx))
}

/// Build the oscillator pair and merger in front of the gain stage and start
/// both oscillators in the same batch. The gain is created on first use and
/// kept in `slot`.
fn wire(
    ctx: &mut AudioContext,
    slot: &mut Option<Gain>,
    session: &SessionState,
) -> Result<LiveGraph> {
    let gain = match slot.take() {
        Some(gain) => gain,
        None => ctx.create_gain(session.amplitude())?,
    };
    let gain = &*slot.insert(gain);
    gain.set_amplitude(ctx, session.amplitude())?;

    let left = ctx.create_oscillator(session.left_frequency())?;
    let right = ctx.create_oscillator(session.right_frequency())?;
    let merger = ctx.create_channel_merger()?;

    ctx.connect(&left, &merger, ChannelMerger::LEFT)?;
    ctx.connect(&right, &merger, ChannelMerger::RIGHT)?;
    let destination = ctx.destination();
    ctx.connect(&merger, gain, 0)?;
    ctx.connect(gain, &destination, 0)?;

    let left = left.start(ctx)?;
    let right = right.start(ctx)?;
    Ok(LiveGraph { left, right, merger })
}
